use crate::store::StoreError;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImpurityReading {
    pub label: String,
    pub value: f64,
}

impl ImpurityReading {
    pub fn new(label: impl Into<String>, value: f64) -> Self {
        Self {
            label: label.into(),
            value,
        }
    }
}

/// One analysis snapshot's readings, checked on construction: labels are
/// non-empty and unique, values are finite percentages.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ReadingSet(Vec<ImpurityReading>);

impl ReadingSet {
    pub fn new(readings: Vec<ImpurityReading>) -> Result<Self, StoreError> {
        let mut seen = HashSet::new();

        for reading in &readings {
            let label = reading.label.trim();
            if label.is_empty() {
                return Err(StoreError::Validation(
                    "reading label must not be empty".to_string(),
                ));
            }
            if !reading.value.is_finite() || !(0.0..=100.0).contains(&reading.value) {
                return Err(StoreError::Validation(format!(
                    "reading {} has value {} outside 0..=100",
                    label, reading.value
                )));
            }
            if !seen.insert(label.to_ascii_lowercase()) {
                return Err(StoreError::Validation(format!(
                    "duplicate reading label {label}"
                )));
            }
        }

        Ok(Self(readings))
    }

    pub fn as_slice(&self) -> &[ImpurityReading] {
        &self.0
    }
}
