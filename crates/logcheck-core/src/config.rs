//! Validator configuration.

use serde::{Deserialize, Serialize};

use crate::domain::Thresholds;

/// Which discovery protocol to run.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ScanMode {
    /// Every configuration directory is compared against one reference log.
    #[default]
    Reference,

    /// Every multi-rank run is compared against its single-rank counterpart.
    Decomposition,
}

/// Run-log naming convention: `<prefix>*<suffix>`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LogFilePattern {
    pub prefix: String,
    pub suffix: String,
}

impl Default for LogFilePattern {
    fn default() -> Self {
        Self {
            prefix: "log.atmosphere.".to_string(),
            suffix: ".out".to_string(),
        }
    }
}

impl LogFilePattern {
    pub fn matches(&self, file_name: &str) -> bool {
        file_name.len() >= self.prefix.len() + self.suffix.len()
            && file_name.starts_with(&self.prefix)
            && file_name.ends_with(&self.suffix)
    }
}

/// Everything that shapes one validation pass.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ValidatorConfig {
    /// Classification bounds.
    pub thresholds: Thresholds,

    /// Treat NO_LOG results as informational.
    pub allow_missing: bool,

    /// Only scan configuration directories whose name contains this substring
    /// (reference mode only).
    pub filter: Option<String>,

    /// Configuration names that must appear in the results.
    pub expected: Vec<String>,

    /// Discovery protocol.
    pub mode: ScanMode,

    /// Run-log file naming.
    pub log_pattern: LogFilePattern,
}
