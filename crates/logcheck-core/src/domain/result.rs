//! Comparison results and their six-way status.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::record::Field;

/// Classification of a single pairing.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ComparisonStatus {
    Match,
    Close,
    Differ,
    NoLog,
    Failed,
    Error,
}

impl ComparisonStatus {
    /// All statuses in reporting order.
    pub const ALL: [ComparisonStatus; 6] = [
        ComparisonStatus::Match,
        ComparisonStatus::Close,
        ComparisonStatus::Differ,
        ComparisonStatus::NoLog,
        ComparisonStatus::Failed,
        ComparisonStatus::Error,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ComparisonStatus::Match => "MATCH",
            ComparisonStatus::Close => "CLOSE",
            ComparisonStatus::Differ => "DIFFER",
            ComparisonStatus::NoLog => "NO_LOG",
            ComparisonStatus::Failed => "FAILED",
            ComparisonStatus::Error => "ERROR",
        }
    }

    /// Whether results with this status carry error statistics.
    pub fn has_stats(&self) -> bool {
        matches!(
            self,
            ComparisonStatus::Match | ComparisonStatus::Close | ComparisonStatus::Differ
        )
    }
}

impl fmt::Display for ComparisonStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Percent-error statistics over the compared timesteps.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ErrorStats {
    pub timesteps_test: usize,
    pub timesteps_ref: usize,
    pub timesteps_compared: usize,
    /// Per-field maximum percent error.
    pub max_errors: BTreeMap<Field, f64>,
    /// Per-field mean percent error.
    pub avg_errors: BTreeMap<Field, f64>,
    /// First compared timestep at which any field reached the MATCH bound.
    pub first_exceedance: Option<usize>,
}

impl ErrorStats {
    /// Largest max error across all fields. NaN wins over any number.
    pub fn overall_max(&self) -> f64 {
        self.max_errors
            .values()
            .copied()
            .fold(0.0, |acc, e| if e.is_nan() || e > acc { e } else { acc })
    }
}

/// What a comparison concluded. Statistics exist only on the numeric branches.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Outcome {
    Match(ErrorStats),
    Close(ErrorStats),
    Differ(ErrorStats),
    NoLog {
        reason: String,
    },
    Failed {
        reason: String,
        timesteps_ref: Option<usize>,
    },
    Error {
        reason: String,
        timesteps_test: Option<usize>,
    },
}

impl Outcome {
    pub fn status(&self) -> ComparisonStatus {
        match self {
            Outcome::Match(_) => ComparisonStatus::Match,
            Outcome::Close(_) => ComparisonStatus::Close,
            Outcome::Differ(_) => ComparisonStatus::Differ,
            Outcome::NoLog { .. } => ComparisonStatus::NoLog,
            Outcome::Failed { .. } => ComparisonStatus::Failed,
            Outcome::Error { .. } => ComparisonStatus::Error,
        }
    }
}

/// A classified comparison tagged with the configuration it belongs to.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ComparisonResult {
    pub name: String,
    #[serde(flatten)]
    pub outcome: Outcome,
}

impl ComparisonResult {
    pub fn new(name: impl Into<String>, outcome: Outcome) -> Self {
        Self {
            name: name.into(),
            outcome,
        }
    }

    /// A pairing whose log could not be located.
    pub fn no_log(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::new(
            name,
            Outcome::NoLog {
                reason: reason.into(),
            },
        )
    }

    pub fn status(&self) -> ComparisonStatus {
        self.outcome.status()
    }

    pub fn stats(&self) -> Option<&ErrorStats> {
        match &self.outcome {
            Outcome::Match(s) | Outcome::Close(s) | Outcome::Differ(s) => Some(s),
            _ => None,
        }
    }

    pub fn reason(&self) -> Option<&str> {
        match &self.outcome {
            Outcome::NoLog { reason }
            | Outcome::Failed { reason, .. }
            | Outcome::Error { reason, .. } => Some(reason),
            _ => None,
        }
    }
}
