//! logcheck - log-based regression validator for atmosphere-model runs
//!
//! Compares the per-timestep `global min, max` diagnostics printed to run
//! logs against a trusted reference log, or (with `--decomposition-test`)
//! compares every multi-rank run against the matching single-rank run.
//!
//! Exit codes:
//! - `0`: every comparison is MATCH or CLOSE (and no missing logs unless
//!   `--allow-missing` is given)
//! - `1`: any DIFFER, FAILED or ERROR result, a disallowed NO_LOG result, or
//!   a missing input path

use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use logcheck_core::{
    append_summary, init_tracing, write_json_report, LogFilePattern, Reporter, RunSummary,
    ScanMode, Thresholds, Validator, ValidatorConfig, DEFAULT_CLOSE_THRESHOLD_PCT,
    DEFAULT_MATCH_THRESHOLD_PCT, EXIT_FAILURE,
};
use tracing::{error, info, Level};

#[derive(Parser, Debug)]
#[command(name = "logcheck")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(
    about = "Compare atmosphere-model run-log diagnostics against a reference",
    long_about = None
)]
struct Cli {
    /// Directory holding one subdirectory per run configuration
    logs_root: PathBuf,

    /// Reference log file (required unless --decomposition-test is given)
    reference: Option<PathBuf>,

    /// Percent-error bound below which every field must stay for MATCH
    #[arg(long, default_value_t = DEFAULT_MATCH_THRESHOLD_PCT)]
    threshold: f64,

    /// Percent-error bound below which every field must stay for CLOSE
    /// (raised to --threshold when lower)
    #[arg(long, default_value_t = DEFAULT_CLOSE_THRESHOLD_PCT)]
    close_threshold: f64,

    /// Report missing logs without failing the run
    #[arg(long)]
    allow_missing: bool,

    /// Only check configuration directories whose name contains this text
    #[arg(long)]
    filter: Option<String>,

    /// Compare multi-rank runs against single-rank runs instead of a reference
    #[arg(long)]
    decomposition_test: bool,

    /// Comma-separated configuration names that must be present
    #[arg(long, value_delimiter = ',')]
    expected: Vec<String>,

    /// Append a Markdown summary to this file (e.g. $GITHUB_STEP_SUMMARY)
    #[arg(long, env = "LOGCHECK_SUMMARY_FILE")]
    summary_file: Option<PathBuf>,

    /// Write a JSON report to this path
    #[arg(long)]
    json_report: Option<PathBuf>,

    /// Show per-field error breakdown
    #[arg(long)]
    details: bool,

    /// Disable coloured status output
    #[arg(long)]
    no_color: bool,

    /// Run-log file name prefix
    #[arg(long, default_value = "log.atmosphere.")]
    log_prefix: String,

    /// Run-log file name suffix
    #[arg(long, default_value = ".out")]
    log_suffix: String,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long)]
    log_json: bool,
}

impl Cli {
    fn validator_config(&self) -> Result<ValidatorConfig> {
        let thresholds = Thresholds::new(self.threshold, self.close_threshold)
            .context("Invalid --threshold/--close-threshold")?;
        Ok(ValidatorConfig {
            thresholds,
            allow_missing: self.allow_missing,
            filter: self.filter.clone(),
            expected: self
                .expected
                .iter()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            mode: if self.decomposition_test {
                ScanMode::Decomposition
            } else {
                ScanMode::Reference
            },
            log_pattern: LogFilePattern {
                prefix: self.log_prefix.clone(),
                suffix: self.log_suffix.clone(),
            },
        })
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    init_tracing(cli.log_json, level);

    match run(&cli) {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            error!(error = %format!("{:#}", e), "logcheck aborted");
            eprintln!("Error: {:#}", e);
            ExitCode::from(EXIT_FAILURE as u8)
        }
    }
}

fn run(cli: &Cli) -> Result<u8> {
    let config = cli.validator_config()?;
    let validator = Validator::new(config).context("Failed to build validator")?;

    let reference = match validator.config().mode {
        ScanMode::Reference => cli.reference.as_deref(),
        ScanMode::Decomposition => None,
    };

    validator
        .check_inputs(&cli.logs_root, reference)
        .context("Invalid inputs")?;

    info!(
        root = %cli.logs_root.display(),
        mode = ?validator.config().mode,
        "validating run logs"
    );
    let summary = validator
        .run(&cli.logs_root, reference)
        .context("Validation failed to run")?;

    let color = !cli.no_color && std::io::stdout().is_terminal();
    print_report(cli, &summary, Reporter::new(color, cli.details), reference);

    if let Some(path) = &cli.summary_file {
        let markdown = Reporter::default().render_markdown(&summary);
        append_summary(path, &markdown)
            .with_context(|| format!("Failed to append summary to {}", path.display()))?;
        info!(path = %path.display(), "appended markdown summary");
    }

    if let Some(path) = &cli.json_report {
        write_json_report(path, &summary)
            .with_context(|| format!("Failed to write JSON report to {}", path.display()))?;
        info!(path = %path.display(), "wrote JSON report");
    }

    u8::try_from(summary.exit_code).context("Exit code out of range")
}

fn print_report(cli: &Cli, summary: &RunSummary, reporter: Reporter, reference: Option<&Path>) {
    match summary.mode {
        ScanMode::Reference => {
            println!("Comparing logs under {}", cli.logs_root.display());
            if let Some(reference) = reference {
                println!("Reference: {}", reference.display());
            }
        }
        ScanMode::Decomposition => {
            println!(
                "Decomposition test: multi-rank vs single-rank runs under {}",
                cli.logs_root.display()
            );
            if summary.results.is_empty() {
                println!("No multi-rank runs found; nothing to compare.");
            }
        }
    }
    println!(
        "Thresholds: MATCH < {}%, CLOSE < {}%",
        summary.thresholds.match_pct, summary.thresholds.close_pct
    );
    println!();
    print!("{}", reporter.render_table(summary));

    if summary.allow_missing && summary.counts.no_log > 0 {
        println!(
            "\nNote: {} configuration(s) had no log files (--allow-missing is set, not treated as failure)",
            summary.counts.no_log
        );
    }

    if summary.passed() {
        println!("\n✓ Log comparison passed");
    } else {
        println!("\n✗ Log comparison failed");
    }
}
