//! Payload alignment to the expected feature layout

use polars::prelude::*;

use super::payload::{FeatureValue, Payload};
use crate::error::Result;

fn value_column(name: &str, value: Option<&FeatureValue>) -> Column {
    let name: PlSmallStr = name.into();
    match value {
        None | Some(FeatureValue::Missing) => Column::full_null(name, 1, &DataType::Null),
        Some(FeatureValue::Bool(b)) => Column::new(name, [*b]),
        Some(FeatureValue::Int(i)) => Column::new(name, [*i]),
        Some(FeatureValue::Float(f)) => Column::new(name, [*f]),
        Some(FeatureValue::Str(s)) => Column::new(name, [s.as_str()]),
    }
}

/// Build a one-row table whose columns are exactly `expected`, in order.
///
/// Each column holds the payload value, or a null when the key is absent.
/// Keys not in `expected` are discarded.
pub fn align(payload: &Payload, expected: &[String]) -> Result<DataFrame> {
    let columns: Vec<Column> = expected
        .iter()
        .map(|name| value_column(name, payload.get(name)))
        .collect();
    Ok(DataFrame::new(columns)?)
}
