//! Categorical encoders

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Code assigned to a category that was not seen at fit time
pub const UNKNOWN_CODE: f64 = -1.0;

/// One-hot encoder that drops the first (smallest) level.
///
/// A level not seen at fit time encodes as an all-zero row, the same as the
/// dropped first level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OneHotEncoder {
    /// Sorted levels seen at fit time, including the dropped first one
    pub categories: Vec<String>,
}

impl OneHotEncoder {
    pub fn fit(values: &[String]) -> Self {
        let levels: BTreeSet<&str> = values.iter().map(String::as_str).collect();
        Self {
            categories: levels.into_iter().map(str::to_string).collect(),
        }
    }

    /// Number of output columns
    pub fn width(&self) -> usize {
        self.categories.len().saturating_sub(1)
    }

    /// Output column names, `<column>_<level>` for every kept level
    pub fn output_names(&self, column: &str) -> Vec<String> {
        self.categories
            .iter()
            .skip(1)
            .map(|level| format!("{}_{}", column, level))
            .collect()
    }

    /// Index of the hot output column, if any
    pub fn hot_index(&self, value: &str) -> Option<usize> {
        match self.categories.binary_search_by(|c| c.as_str().cmp(value)) {
            Ok(0) | Err(_) => None,
            Ok(index) => Some(index - 1),
        }
    }
}

/// Ordinal encoder with an explicit category order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrdinalEncoder {
    pub categories: Vec<String>,
}

impl OrdinalEncoder {
    pub fn new(categories: Vec<String>) -> Self {
        Self { categories }
    }

    /// Position of `value` in the order, or [`UNKNOWN_CODE`].
    pub fn encode(&self, value: &str) -> f64 {
        self.categories
            .iter()
            .position(|c| c == value)
            .map_or(UNKNOWN_CODE, |i| i as f64)
    }
}
