//! Report rendering.
//!
//! Three artifacts are produced from one [`RunSummary`]:
//! - a fixed-width terminal table (optionally colour-tagged, with a per-field
//!   detail section),
//! - a Markdown table suitable for appending to a CI job summary,
//! - a machine-readable JSON report.

use std::fmt::Write as _;
use std::fs::{self, OpenOptions};
use std::io::Write as _;
use std::path::Path;

use crate::aggregate::RunSummary;
use crate::config::ScanMode;
use crate::domain::{ComparisonResult, ComparisonStatus};
use crate::error::{LogcheckError, Result};

const NAME_MIN_WIDTH: usize = 13;
const STATUS_WIDTH: usize = 8;
const STEPS_WIDTH: usize = 13;
const PLACEHOLDER: &str = "-";

const ANSI_RESET: &str = "\x1b[0m";

fn ansi_color(status: ComparisonStatus) -> &'static str {
    match status {
        ComparisonStatus::Match => "\x1b[32m",
        ComparisonStatus::Close => "\x1b[33m",
        ComparisonStatus::Differ | ComparisonStatus::Failed | ComparisonStatus::Error => {
            "\x1b[31m"
        }
        ComparisonStatus::NoLog => "\x1b[36m",
    }
}

/// Markdown status icon.
pub fn status_icon(status: ComparisonStatus) -> &'static str {
    match status {
        ComparisonStatus::Match => "✅",
        ComparisonStatus::Close => "🟡",
        ComparisonStatus::Differ => "❌",
        ComparisonStatus::NoLog => "⚪",
        ComparisonStatus::Failed => "💥",
        ComparisonStatus::Error => "⚠️",
    }
}

/// Format a percent error for display.
pub fn format_pct(value: f64) -> String {
    if value.is_nan() {
        "NaN".to_string()
    } else if value.is_infinite() {
        "inf".to_string()
    } else {
        format!("{:.4}", value)
    }
}

fn steps_cell(result: &ComparisonResult) -> String {
    match result.stats() {
        Some(s) => format!("{}/{}", s.timesteps_test, s.timesteps_ref),
        None => PLACEHOLDER.to_string(),
    }
}

fn max_error_cell(result: &ComparisonResult) -> String {
    match result.stats() {
        Some(s) => format_pct(s.overall_max()),
        None => PLACEHOLDER.to_string(),
    }
}

/// Section heading for the protocol a summary was produced by.
pub fn section_title(mode: ScanMode) -> &'static str {
    match mode {
        ScanMode::Reference => "Reference Comparison",
        ScanMode::Decomposition => "Decomposition Consistency Test",
    }
}

/// One line giving the six-way status breakdown.
pub fn summary_line(summary: &RunSummary) -> String {
    let c = &summary.counts;
    format!(
        "Summary: {} match, {} close, {} differ, {} no log, {} failed, {} error",
        c.matched, c.close, c.differ, c.no_log, c.failed, c.error
    )
}

/// Renders a [`RunSummary`] in human- and machine-readable forms.
#[derive(Debug, Clone, Copy, Default)]
pub struct Reporter {
    color: bool,
    details: bool,
}

impl Reporter {
    pub fn new(color: bool, details: bool) -> Self {
        Self { color, details }
    }

    fn status_cell(&self, status: ComparisonStatus) -> String {
        let padded = format!("{:<width$}", status.as_str(), width = STATUS_WIDTH);
        if self.color {
            format!("{}{}{}", ansi_color(status), padded, ANSI_RESET)
        } else {
            padded
        }
    }

    /// Render the fixed-width terminal table.
    pub fn render_table(&self, summary: &RunSummary) -> String {
        let name_width = summary
            .results
            .iter()
            .map(|r| r.name.chars().count())
            .max()
            .unwrap_or(0)
            .max(NAME_MIN_WIDTH);

        let title = section_title(summary.mode);
        let mut out = String::new();
        let _ = writeln!(out, "{}", title);
        let _ = writeln!(out, "{}\n", "=".repeat(title.chars().count()));
        let header = format!(
            "{:<nw$}  {:<sw$}  {:<tw$}  {}",
            "Configuration",
            "Status",
            "Timesteps",
            "Max Error (%)",
            nw = name_width,
            sw = STATUS_WIDTH,
            tw = STEPS_WIDTH,
        );
        let _ = writeln!(out, "{}", header);
        let _ = writeln!(out, "{}", "-".repeat(header.chars().count()));

        for result in &summary.results {
            let _ = writeln!(
                out,
                "{:<nw$}  {}  {:<tw$}  {}",
                result.name,
                self.status_cell(result.status()),
                steps_cell(result),
                max_error_cell(result),
                nw = name_width,
                tw = STEPS_WIDTH,
            );
        }

        if self.details && !summary.results.is_empty() {
            out.push('\n');
            out.push_str(&self.render_details(summary));
        }

        out.push('\n');
        let _ = writeln!(out, "{}", summary_line(summary));
        out
    }

    /// Per-field breakdown for every result.
    pub fn render_details(&self, summary: &RunSummary) -> String {
        let mut out = String::from("Details:\n");
        for result in &summary.results {
            let _ = writeln!(out, "  {} [{}]", result.name, result.status());
            match result.stats() {
                Some(stats) => {
                    for (field, max) in &stats.max_errors {
                        let avg = stats.avg_errors.get(field).copied().unwrap_or(f64::NAN);
                        let _ = writeln!(
                            out,
                            "    {:<6} max {:>12}%  avg {:>12}%",
                            field.name(),
                            format_pct(*max),
                            format_pct(avg)
                        );
                    }
                    let _ = writeln!(
                        out,
                        "    compared {} timestep(s); first above {}%: {}",
                        stats.timesteps_compared,
                        summary.thresholds.match_pct,
                        stats
                            .first_exceedance
                            .map(|s| s.to_string())
                            .unwrap_or_else(|| PLACEHOLDER.to_string())
                    );
                }
                None => {
                    let _ = writeln!(out, "    {}", result.reason().unwrap_or(PLACEHOLDER));
                }
            }
        }
        out
    }

    /// Render the pipe-delimited Markdown summary.
    pub fn render_markdown(&self, summary: &RunSummary) -> String {
        let mut md = format!("## {}\n\n", section_title(summary.mode));
        md.push_str("| Configuration | Status | Timesteps | Max Error (%) |\n");
        md.push_str("|---|---|---|---|\n");

        for result in &summary.results {
            let status = result.status();
            let name = match (status, result.reason()) {
                (ComparisonStatus::NoLog, Some(reason)) => {
                    format!("{} ({})", escape_cell(&result.name), escape_cell(reason))
                }
                _ => escape_cell(&result.name),
            };
            let _ = writeln!(
                md,
                "| {} | {} {} | {} | {} |",
                name,
                status_icon(status),
                status,
                steps_cell(result),
                max_error_cell(result)
            );
        }

        let _ = writeln!(md, "\n**{}**", summary_line(summary));
        md
    }

    /// Pretty-printed JSON report.
    pub fn render_json(&self, summary: &RunSummary) -> Result<String> {
        Ok(serde_json::to_string_pretty(summary)?)
    }
}

fn escape_cell(text: &str) -> String {
    text.replace('|', "\\|")
}

/// Append `text` to the summary file, creating it if needed.
pub fn append_summary(path: &Path, text: &str) -> Result<()> {
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| LogcheckError::io(path, e))?;
    file.write_all(text.as_bytes())
        .map_err(|e| LogcheckError::io(path, e))?;
    Ok(())
}

/// Write the JSON report, creating parent directories.
pub fn write_json_report(path: &Path, summary: &RunSummary) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| LogcheckError::io(parent, e))?;
    }
    let json = Reporter::default().render_json(summary)?;
    fs::write(path, json).map_err(|e| LogcheckError::io(path, e))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::ResultAggregator;
    use crate::domain::{ErrorStats, Outcome, Thresholds, DIAGNOSTIC_FIELDS};
    use tempfile::TempDir;

    fn stats(max: f64) -> ErrorStats {
        ErrorStats {
            timesteps_test: 10,
            timesteps_ref: 12,
            timesteps_compared: 10,
            max_errors: DIAGNOSTIC_FIELDS.iter().map(|f| (*f, max)).collect(),
            avg_errors: DIAGNOSTIC_FIELDS.iter().map(|f| (*f, max / 2.0)).collect(),
            first_exceedance: None,
        }
    }

    fn sample_summary() -> RunSummary {
        let results = vec![
            ComparisonResult::new("gnu-mpich", Outcome::Match(stats(0.25))),
            ComparisonResult::no_log("cfgB", "Run failed or skipped"),
            ComparisonResult::new(
                "intel-impi",
                Outcome::Failed {
                    reason: "No timesteps found in test file".to_string(),
                    timesteps_ref: Some(12),
                },
            ),
        ];
        ResultAggregator::new(false).summarize(
            results,
            ScanMode::Reference,
            Thresholds::default(),
            None,
        )
    }

    #[test]
    fn test_format_pct() {
        assert_eq!(format_pct(0.5), "0.5000");
        assert_eq!(format_pct(f64::INFINITY), "inf");
        assert_eq!(format_pct(f64::NAN), "NaN");
    }

    #[test]
    fn test_table_plain() {
        let table = Reporter::new(false, false).render_table(&sample_summary());
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines[0], "Reference Comparison");
        assert!(lines[1].chars().all(|c| c == '='));
        assert!(lines[3].starts_with("Configuration"));
        assert!(lines[4].chars().all(|c| c == '-'));

        let gnu = lines.iter().find(|l| l.starts_with("gnu-mpich")).expect("row");
        assert!(gnu.contains("MATCH"));
        assert!(gnu.contains("10/12"));
        assert!(gnu.contains("0.2500"));

        let missing = lines.iter().find(|l| l.starts_with("cfgB")).expect("row");
        assert!(missing.contains("NO_LOG"));
        assert!(missing.trim_end().ends_with('-'));

        assert!(!table.contains('\x1b'));
        assert!(table.contains("Summary: 1 match, 0 close, 0 differ, 1 no log, 1 failed, 0 error"));
    }

    #[test]
    fn test_table_columns_align() {
        let table = Reporter::new(false, false).render_table(&sample_summary());
        let status_cols: Vec<usize> = table
            .lines()
            .filter(|l| l.contains("MATCH") || l.contains("NO_LOG") || l.contains("FAILED"))
            .map(|l| {
                l.find("MATCH")
                    .or_else(|| l.find("NO_LOG"))
                    .or_else(|| l.find("FAILED"))
                    .unwrap_or(0)
            })
            .collect();
        assert_eq!(status_cols.len(), 3);
        assert!(status_cols.windows(2).all(|w| w[0] == w[1]));
    }

    #[test]
    fn test_table_color() {
        let table = Reporter::new(true, false).render_table(&sample_summary());
        assert!(table.contains("\x1b[32mMATCH"));
        assert!(table.contains(ANSI_RESET));
    }

    #[test]
    fn test_table_details() {
        let table = Reporter::new(false, true).render_table(&sample_summary());
        assert!(table.contains("Details:"));
        assert!(table.contains("w_min"));
        assert!(table.contains("u_max"));
        assert!(table.contains("Run failed or skipped"));
        assert!(table.contains("compared 10 timestep(s)"));
    }

    #[test]
    fn test_markdown() {
        let md = Reporter::default().render_markdown(&sample_summary());
        assert!(md.contains("| Configuration | Status | Timesteps | Max Error (%) |"));
        assert!(md.contains("| cfgB (Run failed or skipped) | ⚪ NO_LOG | - | - |"));
        assert!(md.contains("| gnu-mpich | ✅ MATCH | 10/12 | 0.2500 |"));
        // Only NO_LOG rows carry their reason inline.
        assert!(md.contains("| intel-impi | 💥 FAILED | - | - |"));
        assert!(md
            .trim_end()
            .ends_with("**Summary: 1 match, 0 close, 0 differ, 1 no log, 1 failed, 0 error**"));
    }

    #[test]
    fn test_headings_follow_scan_mode() {
        let reference = sample_summary();
        let md = Reporter::default().render_markdown(&reference);
        assert!(md.starts_with("## Reference Comparison\n"));

        let decomposition = ResultAggregator::new(false).summarize(
            vec![ComparisonResult::new(
                "4proc vs 1proc: gnu",
                Outcome::Match(stats(0.0)),
            )],
            ScanMode::Decomposition,
            Thresholds::default(),
            None,
        );
        let md = Reporter::default().render_markdown(&decomposition);
        assert!(md.starts_with("## Decomposition Consistency Test\n"));
        let table = Reporter::new(false, false).render_table(&decomposition);
        assert!(table.starts_with("Decomposition Consistency Test\n"));
    }

    #[test]
    fn test_markdown_escapes_pipes() {
        let summary = ResultAggregator::new(true).summarize(
            vec![ComparisonResult::no_log("a|b", "No log file found")],
            ScanMode::Reference,
            Thresholds::default(),
            None,
        );
        let md = Reporter::default().render_markdown(&summary);
        assert!(md.contains("a\\|b (No log file found)"));
    }

    #[test]
    fn test_append_summary_keeps_existing_content() {
        let tmp = TempDir::new().expect("tempdir");
        let path = tmp.path().join("summary.md");
        fs::write(&path, "# Earlier step\n").expect("seed");

        append_summary(&path, "first\n").expect("append");
        append_summary(&path, "second\n").expect("append");

        let content = fs::read_to_string(&path).expect("read");
        assert_eq!(content, "# Earlier step\nfirst\nsecond\n");
    }

    #[test]
    fn test_write_json_report() {
        let tmp = TempDir::new().expect("tempdir");
        let path = tmp.path().join("reports/nested/logcheck.json");
        write_json_report(&path, &sample_summary()).expect("write");

        let v: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).expect("read")).expect("parse");
        assert_eq!(v["exit_code"], 1);
        assert_eq!(v["counts"]["match"], 1);
        assert_eq!(v["results"].as_array().map(|a| a.len()), Some(3));
        assert_eq!(v["results"][0]["name"], "cfgB");
    }
}
