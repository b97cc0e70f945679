//! End-to-end validation pass: scan, parse, compare, aggregate.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};
use tracing::{info, warn};

use crate::aggregate::{ResultAggregator, RunSummary};
use crate::compare::ComparisonEngine;
use crate::config::{ScanMode, ValidatorConfig};
use crate::domain::{ComparisonResult, DiagnosticSeries, Outcome};
use crate::error::{LogcheckError, Result};
use crate::parser::LogParser;
use crate::report::format_pct;
use crate::scanner::{backfill_expected, ArtifactPairing, DirectoryScanner};

/// SHA-256 of a file's contents, hex encoded.
pub fn file_digest(path: &Path) -> Result<String> {
    let bytes = fs::read(path).map_err(|e| LogcheckError::io(path, e))?;
    Ok(hex::encode(Sha256::digest(&bytes)))
}

/// Digest of the reference log, or `None` when it cannot be read. The
/// pairings already record the read failure as ERROR.
fn reference_digest(path: &Path) -> Option<String> {
    match file_digest(path) {
        Ok(digest) => Some(digest),
        Err(e) => {
            warn!(path = %path.display(), error = %e.with_causes(), "could not digest reference log");
            None
        }
    }
}

/// Runs one validation pass over a logs root.
#[derive(Debug)]
pub struct Validator {
    config: ValidatorConfig,
    parser: LogParser,
    engine: ComparisonEngine,
    scanner: DirectoryScanner,
    aggregator: ResultAggregator,
}

impl Validator {
    pub fn new(config: ValidatorConfig) -> Result<Self> {
        let parser = LogParser::standard()?;
        let engine = ComparisonEngine::with_fields(config.thresholds, parser.fields().to_vec());
        let scanner = DirectoryScanner::new(config.log_pattern.clone());
        let aggregator = ResultAggregator::new(config.allow_missing);
        Ok(Self {
            config,
            parser,
            engine,
            scanner,
            aggregator,
        })
    }

    pub fn config(&self) -> &ValidatorConfig {
        &self.config
    }

    /// Check that the inputs exist before any comparison runs.
    pub fn check_inputs(&self, root: &Path, reference: Option<&Path>) -> Result<()> {
        if !root.is_dir() {
            return Err(LogcheckError::RootNotFound(root.to_path_buf()));
        }
        if self.config.mode == ScanMode::Reference {
            let reference = reference.ok_or(LogcheckError::ReferenceRequired)?;
            if !reference.is_file() {
                return Err(LogcheckError::ReferenceNotFound(reference.to_path_buf()));
            }
        }
        Ok(())
    }

    /// Discover pairings under `root` for the configured protocol.
    pub fn discover(&self, root: &Path, reference: Option<&Path>) -> Result<Vec<ArtifactPairing>> {
        match self.config.mode {
            ScanMode::Reference => {
                let reference = reference.ok_or(LogcheckError::ReferenceRequired)?;
                self.scanner
                    .scan_reference(root, reference, self.config.filter.as_deref())
            }
            ScanMode::Decomposition => {
                let pairings = self.scanner.scan_decomposition(root)?;
                if pairings.is_empty() {
                    info!(root = %root.display(), "no multi-rank runs found; nothing to compare");
                }
                Ok(pairings)
            }
        }
    }

    /// Run the full pass and build the summary.
    pub fn run(&self, root: &Path, reference: Option<&Path>) -> Result<RunSummary> {
        self.check_inputs(root, reference)?;

        let pairings = self.discover(root, reference)?;
        let mut results = self.evaluate(pairings);
        backfill_expected(&mut results, &self.config.expected);

        let reference_digest = match (self.config.mode, reference) {
            (ScanMode::Reference, Some(path)) => reference_digest(path),
            _ => None,
        };

        let summary = self.aggregator.summarize(
            results,
            self.config.mode,
            self.config.thresholds,
            reference_digest,
        );
        info!(
            total = summary.counts.total(),
            matched = summary.counts.matched,
            close = summary.counts.close,
            differ = summary.counts.differ,
            no_log = summary.counts.no_log,
            failed = summary.counts.failed,
            error = summary.counts.error,
            exit_code = summary.exit_code,
            "validation complete"
        );
        Ok(summary)
    }

    /// Evaluate each pairing exactly once, in order. Reference logs shared by
    /// several pairings are parsed once.
    pub fn evaluate(&self, pairings: Vec<ArtifactPairing>) -> Vec<ComparisonResult> {
        let mut references: HashMap<PathBuf, std::result::Result<DiagnosticSeries, String>> =
            HashMap::new();
        let mut results = Vec::with_capacity(pairings.len());

        for pairing in pairings {
            let result = match pairing {
                ArtifactPairing::Missing { name, reason } => {
                    warn!(config = %name, reason = %reason, "no log to compare");
                    ComparisonResult::no_log(name, reason)
                }
                ArtifactPairing::Compare {
                    name,
                    test_log,
                    reference_log,
                } => {
                    let reference = references
                        .entry(reference_log.clone())
                        .or_insert_with(|| {
                            self.parser
                                .parse_file(&reference_log)
                                .map_err(|e| e.with_causes())
                        });
                    let outcome = self.compare_logs(&test_log, reference);
                    ComparisonResult::new(name, outcome)
                }
            };

            match result.stats() {
                Some(stats) => info!(
                    config = %result.name,
                    status = %result.status(),
                    max_error_pct = %format_pct(stats.overall_max()),
                    "compared"
                ),
                None => info!(
                    config = %result.name,
                    status = %result.status(),
                    reason = result.reason().unwrap_or_default(),
                    "compared"
                ),
            }
            results.push(result);
        }

        results
    }

    fn compare_logs(
        &self,
        test_log: &Path,
        reference: &std::result::Result<DiagnosticSeries, String>,
    ) -> Outcome {
        let test = match self.parser.parse_file(test_log) {
            Ok(series) => series,
            Err(e) => {
                return Outcome::Failed {
                    reason: e.with_causes(),
                    timesteps_ref: reference.as_ref().ok().map(|r| r.len()),
                }
            }
        };
        match reference {
            Ok(reference) => self.engine.compare(&test, reference),
            Err(reason) => Outcome::Error {
                reason: reason.clone(),
                timesteps_test: Some(test.len()),
            },
        }
    }
}
