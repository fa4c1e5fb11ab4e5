//! Prediction payloads and their normalization

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::pipeline::cleaning::{parse_gender, parse_percent, parse_yes_no, ratio_from_number};
use crate::pipeline::features::{GENDER, OVERTIME, SALARY_RAISE};

/// One value of a payload. JSON `null` is [`FeatureValue::Missing`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FeatureValue {
    Missing,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

impl FeatureValue {
    pub fn is_missing(&self) -> bool {
        matches!(self, FeatureValue::Missing)
    }
}

impl From<i64> for FeatureValue {
    fn from(v: i64) -> Self {
        FeatureValue::Int(v)
    }
}

impl From<f64> for FeatureValue {
    fn from(v: f64) -> Self {
        FeatureValue::Float(v)
    }
}

impl From<bool> for FeatureValue {
    fn from(v: bool) -> Self {
        FeatureValue::Bool(v)
    }
}

impl From<&str> for FeatureValue {
    fn from(v: &str) -> Self {
        FeatureValue::Str(v.to_string())
    }
}

impl From<String> for FeatureValue {
    fn from(v: String) -> Self {
        FeatureValue::Str(v)
    }
}

/// Feature name to value, as received from a caller
pub type Payload = BTreeMap<String, FeatureValue>;

/// Expected features a payload lacks or leaves null
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PayloadCheck {
    pub missing: Vec<String>,
    pub nulls: Vec<String>,
}

impl PayloadCheck {
    pub fn is_complete(&self) -> bool {
        self.missing.is_empty() && self.nulls.is_empty()
    }
}

/// List expected features absent from `payload` and those present but null.
pub fn check_payload(payload: &Payload, expected: &[String]) -> PayloadCheck {
    let mut check = PayloadCheck::default();
    for name in expected {
        match payload.get(name) {
            None => check.missing.push(name.clone()),
            Some(value) if value.is_missing() => check.nulls.push(name.clone()),
            Some(_) => {}
        }
    }
    check
}

fn normalize_gender(value: &FeatureValue) -> Option<FeatureValue> {
    match value {
        FeatureValue::Str(s) => parse_gender(s).map(FeatureValue::Int),
        FeatureValue::Bool(b) => Some(FeatureValue::Int(i64::from(*b))),
        _ => None,
    }
}

fn normalize_yes_no(value: &FeatureValue) -> Option<FeatureValue> {
    match value {
        FeatureValue::Str(s) => parse_yes_no(s).map(FeatureValue::Int),
        FeatureValue::Bool(b) => Some(FeatureValue::Int(i64::from(*b))),
        _ => None,
    }
}

fn normalize_percent(value: &FeatureValue) -> Option<FeatureValue> {
    let ratio = match value {
        FeatureValue::Str(s) => parse_percent(s),
        FeatureValue::Int(i) => ratio_from_number(*i as f64),
        FeatureValue::Float(f) => ratio_from_number(*f),
        _ => None,
    };
    ratio.map(FeatureValue::Float)
}

/// Coerce human-entered values to the types the pipeline was trained on.
///
/// Values that do not match a known spelling are left untouched; imputation
/// treats them like any other unparseable value.
pub fn normalize_payload(payload: &Payload) -> Payload {
    let mut normalized = payload.clone();
    let rules: [(&str, fn(&FeatureValue) -> Option<FeatureValue>); 3] = [
        (GENDER, normalize_gender),
        (OVERTIME, normalize_yes_no),
        (SALARY_RAISE, normalize_percent),
    ];

    for (name, rule) in rules {
        if let Some(value) = normalized.get_mut(name) {
            if let Some(replacement) = rule(value) {
                *value = replacement;
            }
        }
    }
    normalized
}
