//! Run-log parser.
//!
//! Scans an atmosphere-model log line by line and extracts the per-timestep
//! global extrema printed after each diagnostic marker, e.g.
//!
//! ```text
//!  global min, max w -0.1234567E-01  0.2345678E+00
//!  global min, max u -0.3456789E+02  0.4567891E+02
//! ```
//!
//! Markers are described by a small table ([`MarkerPattern`]). The first
//! marker in the table opens a timestep, the last one closes it; a timestep is
//! emitted only once every field named by the table has been staged.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use regex::Regex;
use tracing::debug;

use crate::domain::{DiagnosticRecord, DiagnosticSeries, Field};
use crate::error::{LogcheckError, Result};

/// Scientific-notation token as written by Fortran formatted output.
const FLOAT_TOKEN: &str = r"[-+]?(?:\d+\.?\d*|\.\d+)(?:[EeDd][-+]?\d+)?";

/// A literal log marker followed by a min and a max value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MarkerPattern {
    pub marker: &'static str,
    pub min: Field,
    pub max: Field,
}

/// Markers emitted by the atmosphere model, in per-timestep order.
pub const DEFAULT_MARKERS: [MarkerPattern; 2] = [
    MarkerPattern {
        marker: "global min, max w",
        min: Field::WMin,
        max: Field::WMax,
    },
    MarkerPattern {
        marker: "global min, max u",
        min: Field::UMin,
        max: Field::UMax,
    },
];

#[derive(Debug)]
struct CompiledMarker {
    pattern: MarkerPattern,
    regex: Regex,
}

/// Extracts a [`DiagnosticSeries`] from run-log text.
#[derive(Debug)]
pub struct LogParser {
    markers: Vec<CompiledMarker>,
    fields: Vec<Field>,
}

impl LogParser {
    /// Build a parser for the given marker table.
    pub fn new(markers: &[MarkerPattern]) -> Result<Self> {
        if markers.is_empty() {
            return Err(LogcheckError::InvalidPattern(
                "marker table must not be empty".to_string(),
            ));
        }

        let mut compiled = Vec::with_capacity(markers.len());
        let mut fields = Vec::with_capacity(markers.len() * 2);
        for pattern in markers {
            let source = format!(
                r"{}\s+({})\s+({})",
                regex::escape(pattern.marker),
                FLOAT_TOKEN,
                FLOAT_TOKEN
            );
            let regex = Regex::new(&source)
                .map_err(|e| LogcheckError::InvalidPattern(format!("{}: {}", pattern.marker, e)))?;
            compiled.push(CompiledMarker {
                pattern: *pattern,
                regex,
            });
            fields.push(pattern.min);
            fields.push(pattern.max);
        }

        Ok(Self {
            markers: compiled,
            fields,
        })
    }

    /// Parser for the standard `w` then `u` marker pair.
    pub fn standard() -> Result<Self> {
        Self::new(&DEFAULT_MARKERS)
    }

    /// Fields every emitted record carries.
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// Parse a log file. The handle is closed before returning.
    pub fn parse_file(&self, path: &Path) -> Result<DiagnosticSeries> {
        let file = File::open(path).map_err(|e| LogcheckError::io(path, e))?;
        let series = self
            .parse_reader(BufReader::new(file))
            .map_err(|e| LogcheckError::io(path, e))?;
        debug!(path = %path.display(), timesteps = series.len(), "parsed run log");
        Ok(series)
    }

    /// Parse in-memory log text.
    pub fn parse_str(&self, text: &str) -> DiagnosticSeries {
        let mut state = Staging::default();
        for line in text.lines() {
            self.scan_line(line, &mut state);
        }
        state.finish()
    }

    /// Parse from any buffered reader. Invalid UTF-8 is replaced rather than
    /// rejected.
    pub fn parse_reader<R: BufRead>(&self, mut reader: R) -> std::io::Result<DiagnosticSeries> {
        let mut state = Staging::default();
        let mut buf = Vec::new();
        loop {
            buf.clear();
            if reader.read_until(b'\n', &mut buf)? == 0 {
                break;
            }
            let line = String::from_utf8_lossy(&buf);
            self.scan_line(&line, &mut state);
        }
        Ok(state.finish())
    }

    fn scan_line(&self, line: &str, state: &mut Staging) {
        let last = self.markers.len() - 1;
        for (idx, marker) in self.markers.iter().enumerate() {
            let Some(caps) = marker.regex.captures(line) else {
                continue;
            };
            let (Some(min), Some(max)) = (parse_float(&caps[1]), parse_float(&caps[2])) else {
                continue;
            };

            if idx == 0 {
                // A new opening marker replaces whatever was staged.
                state.current = DiagnosticRecord::new();
                state.open = true;
            } else if !state.open {
                // Out-of-order marker with no timestep open.
                continue;
            }

            state.current.set(marker.pattern.min, min);
            state.current.set(marker.pattern.max, max);

            if idx == last {
                let record = std::mem::take(&mut state.current);
                state.open = false;
                if record.has_all(&self.fields) {
                    state.records.push(record);
                }
            }
        }
    }
}

#[derive(Default)]
struct Staging {
    records: Vec<DiagnosticRecord>,
    current: DiagnosticRecord,
    open: bool,
}

impl Staging {
    /// A partially staged trailing timestep is dropped.
    fn finish(self) -> DiagnosticSeries {
        DiagnosticSeries::new(self.records)
    }
}

/// Parse a Fortran-style float, accepting `D` as an exponent marker.
fn parse_float(token: &str) -> Option<f64> {
    token.replace(['D', 'd'], "E").parse::<f64>().ok()
}
