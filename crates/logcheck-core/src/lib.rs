//! logcheck core library
//!
//! Validates numerical reproducibility of atmosphere-model runs by comparing
//! the per-timestep global min/max diagnostics printed to run logs:
//! - [`parser`] turns a run log into a [`DiagnosticSeries`]
//! - [`compare`] computes percent errors and classifies a pairing
//! - [`scanner`] discovers artifact directories and pairs them
//! - [`aggregate`] decides the overall verdict
//! - [`report`] renders terminal, Markdown and JSON reports

pub mod aggregate;
pub mod compare;
pub mod config;
pub mod domain;
pub mod error;
pub mod parser;
pub mod report;
pub mod scanner;
pub mod telemetry;
pub mod validator;

pub use aggregate::{ResultAggregator, RunSummary, StatusCounts, EXIT_FAILURE, EXIT_SUCCESS};
pub use compare::{calc_percent_error, ComparisonEngine};
pub use config::{LogFilePattern, ScanMode, ValidatorConfig};
pub use domain::{
    ComparisonResult, ComparisonStatus, DiagnosticRecord, DiagnosticSeries, ErrorStats, Field,
    Outcome, Thresholds, DEFAULT_CLOSE_THRESHOLD_PCT, DEFAULT_MATCH_THRESHOLD_PCT,
    DIAGNOSTIC_FIELDS,
};
pub use error::{LogcheckError, Result};
pub use parser::{LogParser, MarkerPattern, DEFAULT_MARKERS};
pub use report::{append_summary, section_title, write_json_report, Reporter};
pub use scanner::{
    backfill_expected, decomposition_result_name, parse_decomposition_name, ArtifactPairing,
    DirectoryScanner, REASON_NO_LOG_FILE, REASON_RUN_FAILED,
};
pub use telemetry::init_tracing;
pub use validator::{file_digest, Validator};
