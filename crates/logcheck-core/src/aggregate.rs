//! Result aggregation and the overall pass/fail policy.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::ScanMode;
use crate::domain::{ComparisonResult, ComparisonStatus, Thresholds};

/// Process exit code when every comparison is acceptable.
pub const EXIT_SUCCESS: i32 = 0;

/// Process exit code when any comparison is unacceptable.
pub const EXIT_FAILURE: i32 = 1;

/// Number of results per status.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct StatusCounts {
    #[serde(rename = "match")]
    pub matched: usize,
    pub close: usize,
    pub differ: usize,
    pub no_log: usize,
    pub failed: usize,
    pub error: usize,
}

impl StatusCounts {
    pub fn from_results(results: &[ComparisonResult]) -> Self {
        let mut counts = Self::default();
        for result in results {
            *counts.slot(result.status()) += 1;
        }
        counts
    }

    pub fn get(&self, status: ComparisonStatus) -> usize {
        match status {
            ComparisonStatus::Match => self.matched,
            ComparisonStatus::Close => self.close,
            ComparisonStatus::Differ => self.differ,
            ComparisonStatus::NoLog => self.no_log,
            ComparisonStatus::Failed => self.failed,
            ComparisonStatus::Error => self.error,
        }
    }

    fn slot(&mut self, status: ComparisonStatus) -> &mut usize {
        match status {
            ComparisonStatus::Match => &mut self.matched,
            ComparisonStatus::Close => &mut self.close,
            ComparisonStatus::Differ => &mut self.differ,
            ComparisonStatus::NoLog => &mut self.no_log,
            ComparisonStatus::Failed => &mut self.failed,
            ComparisonStatus::Error => &mut self.error,
        }
    }

    pub fn total(&self) -> usize {
        ComparisonStatus::ALL.iter().map(|s| self.get(*s)).sum()
    }
}

/// Final record of one validation pass.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RunSummary {
    pub generated_at: DateTime<Utc>,
    pub mode: ScanMode,
    pub thresholds: Thresholds,
    pub allow_missing: bool,
    /// SHA-256 of the reference log (reference mode only).
    pub reference_digest: Option<String>,
    pub counts: StatusCounts,
    pub exit_code: i32,
    pub results: Vec<ComparisonResult>,
}

impl RunSummary {
    pub fn passed(&self) -> bool {
        self.exit_code == EXIT_SUCCESS
    }
}

/// Decides the overall verdict for a list of results.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResultAggregator {
    allow_missing: bool,
}

impl ResultAggregator {
    pub fn new(allow_missing: bool) -> Self {
        Self { allow_missing }
    }

    /// Whether a single result forces overall failure.
    pub fn is_fatal(&self, status: ComparisonStatus) -> bool {
        match status {
            ComparisonStatus::Match | ComparisonStatus::Close => false,
            ComparisonStatus::NoLog => !self.allow_missing,
            ComparisonStatus::Differ | ComparisonStatus::Failed | ComparisonStatus::Error => true,
        }
    }

    pub fn exit_code(&self, results: &[ComparisonResult]) -> i32 {
        if results.iter().any(|r| self.is_fatal(r.status())) {
            EXIT_FAILURE
        } else {
            EXIT_SUCCESS
        }
    }

    /// Build the run summary. Results are sorted by name.
    pub fn summarize(
        &self,
        mut results: Vec<ComparisonResult>,
        mode: ScanMode,
        thresholds: Thresholds,
        reference_digest: Option<String>,
    ) -> RunSummary {
        results.sort_by(|a, b| a.name.cmp(&b.name));
        RunSummary {
            generated_at: Utc::now(),
            mode,
            thresholds,
            allow_missing: self.allow_missing,
            reference_digest,
            counts: StatusCounts::from_results(&results),
            exit_code: self.exit_code(&results),
            results,
        }
    }
}
