//! Percent-error thresholds used to classify a comparison.

use serde::{Deserialize, Serialize};

use crate::error::{LogcheckError, Result};

/// Default MATCH bound, in percent.
pub const DEFAULT_MATCH_THRESHOLD_PCT: f64 = 1.0;

/// Default CLOSE bound, in percent.
pub const DEFAULT_CLOSE_THRESHOLD_PCT: f64 = 5.0;

/// Classification bounds for the per-field maximum percent error.
///
/// A comparison is MATCH when every field's max error is strictly below
/// `match_pct`, CLOSE when every field is strictly below `close_pct`, and
/// DIFFER otherwise.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Thresholds {
    pub match_pct: f64,
    pub close_pct: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            match_pct: DEFAULT_MATCH_THRESHOLD_PCT,
            close_pct: DEFAULT_CLOSE_THRESHOLD_PCT,
        }
    }
}

impl Thresholds {
    /// Create validated thresholds. Both bounds must be finite and
    /// non-negative. A `close_pct` below `match_pct` is raised to it, so a
    /// wide MATCH band never leaves an inverted CLOSE band behind.
    pub fn new(match_pct: f64, close_pct: f64) -> Result<Self> {
        for (label, value) in [("match", match_pct), ("close", close_pct)] {
            if !value.is_finite() || value < 0.0 {
                return Err(LogcheckError::InvalidThreshold(format!(
                    "{} threshold must be a finite, non-negative percentage, got {}",
                    label, value
                )));
            }
        }
        Ok(Self {
            match_pct,
            close_pct: close_pct.max(match_pct),
        })
    }
}
