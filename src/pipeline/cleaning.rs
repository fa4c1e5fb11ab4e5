//! Cleaning primitives
//!
//! Stateless value normalization used by feature engineering and, through the
//! scalar helpers, by serving-side payload normalization. None of these
//! functions fail on dirty values: anything unrecognized becomes missing so
//! that downstream imputation can absorb it.

use std::collections::HashSet;

use polars::prelude::*;

use crate::error::{AttritionError, Result};

/// Spellings mapped to 1 (compared after trimming and lower-casing)
const YES_VALUES: [&str; 6] = ["yes", "y", "oui", "o", "true", "1"];

/// Spellings mapped to 0 (compared after trimming and lower-casing)
const NO_VALUES: [&str; 5] = ["no", "n", "non", "false", "0"];

/// Gender spellings mapped to 1 (compared after trimming and upper-casing)
const MALE_VALUES: [&str; 5] = ["M", "H", "HOMME", "MALE", "1"];

/// Gender spellings mapped to 0 (compared after trimming and upper-casing)
const FEMALE_VALUES: [&str; 4] = ["F", "FEMME", "FEMALE", "0"];

/// Strings that stand for a missing percentage
const MISSING_TOKENS: [&str; 4] = ["", "nan", "none", "null"];

/// Parse one yes/no spelling into 0/1.
pub fn parse_yes_no(raw: &str) -> Option<i64> {
    let value = raw.trim().to_lowercase();
    if YES_VALUES.contains(&value.as_str()) {
        Some(1)
    } else if NO_VALUES.contains(&value.as_str()) {
        Some(0)
    } else {
        None
    }
}

/// Parse one gender spelling into 0 (female) or 1 (male).
///
/// Shared by training-time encoding and payload normalization so both sides
/// accept the same vocabulary.
pub fn parse_gender(raw: &str) -> Option<i64> {
    let value = raw.trim().to_uppercase();
    if MALE_VALUES.contains(&value.as_str()) {
        Some(1)
    } else if FEMALE_VALUES.contains(&value.as_str()) {
        Some(0)
    } else {
        None
    }
}

/// Parse one percentage string into a ratio.
///
/// "15%" and "15 %" give 0.15, "0.10" stays 0.10. This is a heuristic: any
/// parsed value strictly greater than 1 is read as percentage points and
/// divided by 100, so a genuine ratio of 1.5 would be misread as 0.015 and
/// "1%" is read as the ratio 1.0.
pub fn parse_percent(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if MISSING_TOKENS.contains(&trimmed.to_lowercase().as_str()) {
        return None;
    }
    let number = trimmed.strip_suffix('%').unwrap_or(trimmed).trim();
    let parsed: f64 = number.parse().ok()?;
    ratio_from_number(parsed)
}

/// Apply the percentage-points heuristic to an already numeric value.
pub fn ratio_from_number(value: f64) -> Option<f64> {
    if !value.is_finite() {
        return None;
    }
    Some(if value > 1.0 { value / 100.0 } else { value })
}

/// Map a column of yes/no spellings to a nullable Int64 column of 0/1.
pub fn yes_no_to_int(values: &Column) -> Result<Column> {
    let mapped: Vec<Option<i64>> = column_to_string_vec(values)?
        .iter()
        .map(|v| v.as_deref().and_then(parse_yes_no))
        .collect();
    Ok(Column::new(values.name().clone(), mapped))
}

/// Map a column of percentage strings (or numbers) to a Float64 ratio column.
///
/// See [`parse_percent`] for the `> 1` heuristic.
pub fn percent_to_ratio(values: &Column) -> Result<Column> {
    let mapped: Vec<Option<f64>> = column_to_string_vec(values)?
        .iter()
        .map(|v| v.as_deref().and_then(parse_percent))
        .collect();
    Ok(Column::new(values.name().clone(), mapped))
}

/// Elementwise division that never divides by zero.
///
/// The result is missing wherever the numerator is missing, or the
/// denominator is missing or not strictly positive. The output keeps the
/// numerator's name.
pub fn safe_divide(numerator: &Column, denominator: &Column) -> Result<Column> {
    if numerator.len() != denominator.len() {
        return Err(AttritionError::Shape {
            expected: format!("{} denominator values", numerator.len()),
            actual: format!("{} denominator values", denominator.len()),
        });
    }
    let num = column_to_f64_vec(numerator)?;
    let den = column_to_f64_vec(denominator)?;
    Ok(Column::new(
        numerator.name().clone(),
        divide_values(&num, &den),
    ))
}

/// Slice form of [`safe_divide`], used when the denominator is derived.
pub fn divide_values(num: &[Option<f64>], den: &[Option<f64>]) -> Vec<Option<f64>> {
    num.iter()
        .zip(den.iter())
        .map(|(n, d)| match (n, d) {
            (Some(n), Some(d)) if *d > 0.0 => Some(n / d),
            _ => None,
        })
        .collect()
}

/// Drop every candidate column holding at most one distinct value.
///
/// Missing counts as a value, so a column mixing one value with nulls is
/// kept. Candidates absent from the table are ignored.
pub fn drop_constant_columns(df: DataFrame, candidates: &[&str]) -> Result<DataFrame> {
    let mut to_drop: Vec<String> = Vec::new();

    for name in candidates {
        let Ok(column) = df.column(name) else {
            continue;
        };
        let distinct: HashSet<Option<String>> =
            column_to_string_vec(column)?.into_iter().collect();
        if distinct.len() <= 1 {
            to_drop.push(name.to_string());
        }
    }

    if to_drop.is_empty() {
        return Ok(df);
    }
    tracing::debug!(columns = ?to_drop, "dropping constant columns");
    Ok(df.drop_many(&to_drop))
}

/// Convert a column to its canonical string form, one entry per row.
///
/// Integers print without a fractional part and floats use Rust's shortest
/// round-trip formatting, so `3`, `3.0` and `"3"` share one form. Every
/// categorical comparison in the crate goes through this function.
pub fn column_to_string_vec(col: &Column) -> Result<Vec<Option<String>>> {
    let values: Vec<Option<String>> = match col.dtype() {
        DataType::String => col
            .str()?
            .into_iter()
            .map(|v| v.map(|s| s.to_string()))
            .collect(),
        DataType::Int8 | DataType::Int16 | DataType::Int32 | DataType::Int64 => {
            let cast = col.cast(&DataType::Int64)?;
            cast.i64()?
                .into_iter()
                .map(|v| v.map(|n| n.to_string()))
                .collect()
        }
        DataType::UInt8 | DataType::UInt16 | DataType::UInt32 | DataType::UInt64 => {
            let cast = col.cast(&DataType::UInt64)?;
            cast.u64()?
                .into_iter()
                .map(|v| v.map(|n| n.to_string()))
                .collect()
        }
        DataType::Float32 | DataType::Float64 => {
            let cast = col.cast(&DataType::Float64)?;
            cast.f64()?
                .into_iter()
                .map(|v| v.filter(|n| !n.is_nan()).map(|n| format!("{}", n)))
                .collect()
        }
        DataType::Boolean => col
            .bool()?
            .into_iter()
            .map(|v| v.map(|b| b.to_string()))
            .collect(),
        DataType::Null => vec![None; col.len()],
        _ => {
            let cast = col.cast(&DataType::String)?;
            cast.str()?
                .into_iter()
                .map(|v| v.map(|s| s.to_string()))
                .collect()
        }
    };

    Ok(values)
}

/// Coerce a column to numbers, one entry per row.
///
/// Strings are trimmed and parsed, booleans become 0/1, NaN becomes missing.
/// Anything that does not coerce is missing rather than an error.
pub fn column_to_f64_vec(col: &Column) -> Result<Vec<Option<f64>>> {
    let values: Vec<Option<f64>> = match col.dtype() {
        DataType::String => col
            .str()?
            .into_iter()
            .map(|v| v.and_then(|s| s.trim().parse::<f64>().ok()))
            .collect(),
        DataType::Boolean => col
            .bool()?
            .into_iter()
            .map(|v| v.map(|b| if b { 1.0 } else { 0.0 }))
            .collect(),
        DataType::Null => vec![None; col.len()],
        dtype if dtype.is_primitive_numeric() => {
            let cast = col.cast(&DataType::Float64)?;
            cast.f64()?.into_iter().collect()
        }
        _ => match col.cast(&DataType::Float64) {
            Ok(cast) => cast.f64()?.into_iter().collect(),
            Err(_) => vec![None; col.len()],
        },
    };

    Ok(values
        .into_iter()
        .map(|v| v.filter(|x| x.is_finite()))
        .collect())
}
