//! Domain types shared by the parser, comparison engine and reporters.

pub mod record;
pub mod result;
pub mod thresholds;

pub use record::{DiagnosticRecord, DiagnosticSeries, Field, DIAGNOSTIC_FIELDS};
pub use result::{ComparisonResult, ComparisonStatus, ErrorStats, Outcome};
pub use thresholds::{Thresholds, DEFAULT_CLOSE_THRESHOLD_PCT, DEFAULT_MATCH_THRESHOLD_PCT};
