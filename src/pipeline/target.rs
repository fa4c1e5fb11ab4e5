//! Target column encoding
//!
//! Maps the attrition column to binary 0/1 labels. Numeric 0/1 and the
//! yes/no vocabulary are accepted; anything else is ignored and excluded from
//! training.

use polars::prelude::*;

use super::cleaning::{column_to_string_vec, parse_yes_no};
use crate::error::{AttritionError, Result};

/// Tolerance for floating point comparison when checking binary 0/1 values
const TOLERANCE: f64 = 1e-9;

/// Binary labels for each row of a table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetLabels {
    /// `Some(1)` for leavers, `Some(0)` for stayers, `None` when unmappable
    pub mask: Vec<Option<u8>>,
}

impl TargetLabels {
    pub fn events(&self) -> usize {
        self.mask.iter().filter(|v| **v == Some(1)).count()
    }

    pub fn non_events(&self) -> usize {
        self.mask.iter().filter(|v| **v == Some(0)).count()
    }

    pub fn ignored(&self) -> usize {
        self.mask.iter().filter(|v| v.is_none()).count()
    }

    /// Row indices with a usable label
    pub fn kept_indices(&self) -> Vec<usize> {
        self.mask
            .iter()
            .enumerate()
            .filter_map(|(i, v)| v.map(|_| i))
            .collect()
    }

    /// Labels of the kept rows, in row order
    pub fn kept_labels(&self) -> Vec<u8> {
        self.mask.iter().flatten().copied().collect()
    }
}

/// Map one target value to a label.
fn map_label(raw: &str) -> Option<u8> {
    if let Some(v) = parse_yes_no(raw) {
        return Some(v as u8);
    }
    let number: f64 = raw.trim().parse().ok()?;
    if (number - 1.0).abs() < TOLERANCE {
        Some(1)
    } else if number.abs() < TOLERANCE {
        Some(0)
    } else {
        None
    }
}

/// Encode the target column of `df` as binary labels.
///
/// Fails when the column is absent, empty, entirely missing, or does not
/// contain both classes once mapped.
pub fn encode_target(df: &DataFrame, target: &str) -> Result<TargetLabels> {
    let target_col = df
        .column(target)
        .map_err(|_| AttritionError::ColumnNotFound(target.to_string()))?;

    if target_col.len() == 0 {
        return Err(invalid(target, "column is empty"));
    }

    if target_col.null_count() == target_col.len() {
        return Err(invalid(target, "column contains only null values"));
    }

    let mask: Vec<Option<u8>> = column_to_string_vec(target_col)?
        .iter()
        .map(|v| v.as_deref().and_then(map_label))
        .collect();

    let labels = TargetLabels { mask };

    if labels.events() == 0 || labels.non_events() == 0 {
        return Err(invalid(
            target,
            &format!(
                "needs both classes, found {} leavers and {} stayers",
                labels.events(),
                labels.non_events()
            ),
        ));
    }

    if labels.ignored() > 0 {
        tracing::warn!(
            column = target,
            ignored = labels.ignored(),
            "target values that are neither 0/1 nor yes/no will be ignored"
        );
    }

    Ok(labels)
}

fn invalid(column: &str, reason: &str) -> AttritionError {
    AttritionError::InvalidTarget {
        column: column.to_string(),
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_binary_int_target() {
        let df = df! {
            "target" => [0i32, 1, 0, 1, 0, 1],
            "feature" => [1.0f64, 2.0, 3.0, 4.0, 5.0, 6.0],
        }
        .unwrap();

        let labels = encode_target(&df, "target").unwrap();
        assert_eq!(labels.events(), 3);
        assert_eq!(labels.non_events(), 3);
        assert_eq!(labels.ignored(), 0);
    }

    #[test]
    fn test_encode_binary_float_target() {
        let df = df! {
            "target" => [0.0f64, 1.0, 0.0, 1.0],
        }
        .unwrap();

        let labels = encode_target(&df, "target").unwrap();
        assert_eq!(labels.kept_labels(), vec![0, 1, 0, 1]);
    }

    #[test]
    fn test_encode_yes_no_target() {
        let df = df! {
            "a_quitte_l_entreprise" => ["Oui", "Non", " non ", "Yes", "peut-etre"],
        }
        .unwrap();

        let labels = encode_target(&df, "a_quitte_l_entreprise").unwrap();
        assert_eq!(labels.mask, vec![Some(1), Some(0), Some(0), Some(1), None]);
        assert_eq!(labels.ignored(), 1);
        assert_eq!(labels.kept_indices(), vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_non_binary_numeric_values_ignored() {
        let df = df! {
            "target" => [1i32, 2, 0, 1],
        }
        .unwrap();

        let labels = encode_target(&df, "target").unwrap();
        assert_eq!(labels.mask, vec![Some(1), None, Some(0), Some(1)]);
    }

    #[test]
    fn test_single_class_is_error() {
        let df = df! {
            "target" => ["Non", "Non", "Non"],
        }
        .unwrap();

        let err = encode_target(&df, "target").unwrap_err();
        assert!(matches!(err, AttritionError::InvalidTarget { .. }));
    }

    #[test]
    fn test_missing_target_column() {
        let df = df! { "feature" => [1.0f64] }.unwrap();
        let err = encode_target(&df, "target").unwrap_err();
        assert!(matches!(err, AttritionError::ColumnNotFound(_)));
    }

    #[test]
    fn test_empty_target() {
        let df = df! {
            "target" => Vec::<i32>::new(),
            "feature" => Vec::<f64>::new(),
        }
        .unwrap();

        let result = encode_target(&df, "target");
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("empty"));
    }

    #[test]
    fn test_all_null_target() {
        let df = df! {
            "target" => [None::<String>, None, None],
            "feature" => [1.0f64, 2.0, 3.0],
        }
        .unwrap();

        let result = encode_target(&df, "target");
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("null"));
    }
}
