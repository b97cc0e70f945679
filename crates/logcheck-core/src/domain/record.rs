//! Per-timestep diagnostic records and the series parsed from one log.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// A scalar diagnostic tracked per timestep.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    WMin,
    WMax,
    UMin,
    UMax,
}

/// Fields compared by default, in reporting order.
pub const DIAGNOSTIC_FIELDS: [Field; 4] = [Field::WMin, Field::WMax, Field::UMin, Field::UMax];

impl Field {
    /// Field name as it appears in reports.
    pub fn name(&self) -> &'static str {
        match self {
            Field::WMin => "w_min",
            Field::WMax => "w_max",
            Field::UMin => "u_min",
            Field::UMax => "u_max",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One timestep's extracted values.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DiagnosticRecord {
    values: BTreeMap<Field, f64>,
}

impl DiagnosticRecord {
    /// Create an empty record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a record holding the four standard extrema.
    pub fn from_extrema(w_min: f64, w_max: f64, u_min: f64, u_max: f64) -> Self {
        let mut record = Self::new();
        record.set(Field::WMin, w_min);
        record.set(Field::WMax, w_max);
        record.set(Field::UMin, u_min);
        record.set(Field::UMax, u_max);
        record
    }

    pub fn set(&mut self, field: Field, value: f64) {
        self.values.insert(field, value);
    }

    pub fn get(&self, field: Field) -> Option<f64> {
        self.values.get(&field).copied()
    }

    pub fn contains(&self, field: Field) -> bool {
        self.values.contains_key(&field)
    }

    /// Whether every field in `fields` has a value.
    pub fn has_all(&self, fields: &[Field]) -> bool {
        fields.iter().all(|f| self.contains(*f))
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Ordered diagnostic records from one log, in simulation-time order.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DiagnosticSeries {
    records: Vec<DiagnosticRecord>,
}

impl DiagnosticSeries {
    pub fn new(records: Vec<DiagnosticRecord>) -> Self {
        Self { records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[DiagnosticRecord] {
        &self.records
    }

    pub fn iter(&self) -> impl Iterator<Item = &DiagnosticRecord> {
        self.records.iter()
    }
}

impl FromIterator<DiagnosticRecord> for DiagnosticSeries {
    fn from_iter<I: IntoIterator<Item = DiagnosticRecord>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
