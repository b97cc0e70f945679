//! Percent-error comparison of two diagnostic series.

use std::collections::BTreeMap;

use crate::domain::{
    ComparisonStatus, DiagnosticSeries, ErrorStats, Field, Outcome, Thresholds, DIAGNOSTIC_FIELDS,
};

/// Relative deviation of `test` from `reference`, in percent.
///
/// Zero reference is special-cased: `0` when both are zero, `+inf` otherwise.
pub fn calc_percent_error(test: f64, reference: f64) -> f64 {
    if reference == 0.0 {
        if test == 0.0 {
            0.0
        } else {
            f64::INFINITY
        }
    } else {
        (test - reference).abs() / reference.abs() * 100.0
    }
}

/// Compares a test series against a reference series and classifies the result.
#[derive(Debug, Clone)]
pub struct ComparisonEngine {
    thresholds: Thresholds,
    fields: Vec<Field>,
}

impl Default for ComparisonEngine {
    fn default() -> Self {
        Self::new(Thresholds::default())
    }
}

impl ComparisonEngine {
    /// Engine over the standard four extrema.
    pub fn new(thresholds: Thresholds) -> Self {
        Self::with_fields(thresholds, DIAGNOSTIC_FIELDS.to_vec())
    }

    pub fn with_fields(thresholds: Thresholds, fields: Vec<Field>) -> Self {
        Self { thresholds, fields }
    }

    pub fn thresholds(&self) -> &Thresholds {
        &self.thresholds
    }

    /// Compare `test` against `reference`. Records are aligned by position;
    /// only the overlapping prefix is compared.
    pub fn compare(&self, test: &DiagnosticSeries, reference: &DiagnosticSeries) -> Outcome {
        if test.is_empty() {
            return Outcome::Failed {
                reason: "No timesteps found in test file".to_string(),
                timesteps_ref: Some(reference.len()),
            };
        }
        if reference.is_empty() {
            return Outcome::Error {
                reason: "No timesteps found in reference file".to_string(),
                timesteps_test: Some(test.len()),
            };
        }

        let compared = test.len().min(reference.len());
        let mut max_errors: BTreeMap<Field, f64> =
            self.fields.iter().map(|f| (*f, 0.0)).collect();
        let mut sums: BTreeMap<Field, f64> = self.fields.iter().map(|f| (*f, 0.0)).collect();
        let mut first_exceedance = None;

        for (step, (t, r)) in test.iter().zip(reference.iter()).enumerate() {
            for field in &self.fields {
                // Parsed records always carry every field; a gap compares as NaN.
                let tv = t.get(*field).unwrap_or(f64::NAN);
                let rv = r.get(*field).unwrap_or(f64::NAN);
                let e = calc_percent_error(tv, rv);

                if let Some(max) = max_errors.get_mut(field) {
                    if e.is_nan() || e > *max {
                        *max = e;
                    }
                }
                if let Some(sum) = sums.get_mut(field) {
                    *sum += e;
                }
                if first_exceedance.is_none() && (e.is_nan() || e >= self.thresholds.match_pct) {
                    first_exceedance = Some(step);
                }
            }
        }

        let avg_errors = sums
            .into_iter()
            .map(|(f, sum)| (f, sum / compared as f64))
            .collect();

        let status = self.classify(&max_errors);
        let stats = ErrorStats {
            timesteps_test: test.len(),
            timesteps_ref: reference.len(),
            timesteps_compared: compared,
            max_errors,
            avg_errors,
            first_exceedance,
        };

        match status {
            ComparisonStatus::Match => Outcome::Match(stats),
            ComparisonStatus::Close => Outcome::Close(stats),
            _ => Outcome::Differ(stats),
        }
    }

    /// Classify per-field max errors. First match wins: MATCH, CLOSE, DIFFER.
    /// NaN errors never satisfy a bound.
    pub fn classify(&self, max_errors: &BTreeMap<Field, f64>) -> ComparisonStatus {
        if max_errors.values().all(|e| *e < self.thresholds.match_pct) {
            ComparisonStatus::Match
        } else if max_errors.values().all(|e| *e < self.thresholds.close_pct) {
            ComparisonStatus::Close
        } else {
            ComparisonStatus::Differ
        }
    }
}
