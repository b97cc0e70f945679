//! Error taxonomy for logcheck.
//!
//! Only structural problems surface as [`LogcheckError`]. Anything that goes
//! wrong inside a single pairing is folded into that pairing's
//! [`Outcome`](crate::domain::Outcome) instead.

use std::path::PathBuf;

/// Errors produced while configuring or running a validation pass.
#[derive(Debug, thiserror::Error)]
pub enum LogcheckError {
    #[error("logs root directory not found: {}", .0.display())]
    RootNotFound(PathBuf),

    #[error("reference log file not found: {}", .0.display())]
    ReferenceNotFound(PathBuf),

    #[error("a reference log is required unless decomposition mode is selected")]
    ReferenceRequired,

    #[error("invalid threshold: {0}")]
    InvalidThreshold(String),

    #[error("invalid diagnostic pattern: {0}")]
    InvalidPattern(String),

    #[error("failed to read {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl LogcheckError {
    /// Attach a path to an I/O error.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Message followed by every underlying cause, `: `-separated.
    pub fn with_causes(&self) -> String {
        let mut msg = self.to_string();
        let mut cause = std::error::Error::source(self);
        while let Some(err) = cause {
            msg.push_str(": ");
            msg.push_str(&err.to_string());
            cause = err.source();
        }
        msg
    }
}

/// Result type for logcheck operations.
pub type Result<T> = std::result::Result<T, LogcheckError>;
