//! Feature engineering
//!
//! Applies the cleaning primitives to the raw HR columns and derives the
//! engineered signal columns. Every step is optional on column presence and
//! the steps run in a fixed order: later derivations read columns that
//! earlier steps normalized.

use polars::prelude::*;
use serde::Serialize;

use super::cleaning::{
    column_to_f64_vec, column_to_string_vec, divide_values, drop_constant_columns, parse_gender,
    percent_to_ratio, safe_divide, yes_no_to_int,
};
use crate::error::Result;

pub const ATTRITION: &str = "a_quitte_l_entreprise";
pub const OVERTIME: &str = "heure_supplementaires";
pub const SALARY_RAISE: &str = "augmentation_salaire_precedente";
pub const GENDER: &str = "genre";
pub const AGE: &str = "age";
pub const TOTAL_EXPERIENCE: &str = "annee_experience_totale";
pub const YEARS_AT_COMPANY: &str = "annees_dans_l_entreprise";
pub const YEARS_IN_ROLE: &str = "annees_dans_le_poste_actuel";
pub const CURRENT_SCORE: &str = "note_evaluation_actuelle";
pub const PREVIOUS_SCORE: &str = "note_evaluation_precedente";

/// Spellings of the previous-employers column, preferred first
pub const PREVIOUS_EMPLOYERS: [&str; 2] = [
    "nombre_experiences_precedents",
    "nombre_experiences_precedentes",
];

/// Columns known to be constant in the HR export
pub const CONSTANT_CANDIDATES: [&str; 2] = ["nombre_heures_travailless", "ayant_enfants"];

pub const ROLE_CHANGED: &str = "changement_poste";
pub const EMPLOYER_CHANGE_RATE: &str = "proba_chgt_experience_par_an";
pub const ADULT_EMPLOYER_CHANGE_RATE: &str = "proba_chgt_experience_par_an_adulte";
pub const ADULT_EXPERIENCE_RATIO: &str = "ratio_experience_vie_adulte";
pub const SCORE_DELTA: &str = "evolution_note";

/// Age at which working life is assumed to start
const ADULT_AGE: f64 = 18.0;

/// Apply cleaning and derive engineered features.
///
/// Never fails because an optional source column is absent or holds dirty
/// values; those cases produce missing values instead.
///
/// # Arguments
/// * `df` - Raw HR extract; it is not modified
///
/// # Returns
/// A new DataFrame with cleaned flags, ratios and derived columns, and with
/// known constant columns removed
pub fn add_engineered_features(df: &DataFrame) -> Result<DataFrame> {
    let mut out = df.clone();

    // 1. yes/no flags
    for name in [ATTRITION, OVERTIME] {
        let mapped = match out.column(name) {
            Ok(column) => yes_no_to_int(column)?,
            Err(_) => continue,
        };
        out.with_column(mapped)?;
    }

    // 2. percentage raise
    let raise = match out.column(SALARY_RAISE) {
        Ok(column) => Some(percent_to_ratio(column)?),
        Err(_) => None,
    };
    if let Some(raise) = raise {
        out.with_column(raise)?;
    }

    // 3. gender
    let gender = match out.column(GENDER) {
        Ok(column) => encode_gender(column)?,
        Err(_) => None,
    };
    if let Some(gender) = gender {
        out.with_column(gender)?;
    }

    // 4. known constants
    let mut out = drop_constant_columns(out, &CONSTANT_CANDIDATES)?;

    // 5. role change
    if let (Some(company), Some(role)) = (
        numeric_values(&out, YEARS_AT_COMPANY)?,
        numeric_values(&out, YEARS_IN_ROLE)?,
    ) {
        let changed: Vec<Option<i64>> = company
            .iter()
            .zip(role.iter())
            .map(|(c, r)| match (c, r) {
                (Some(c), Some(r)) => Some(i64::from(c > r)),
                _ => None,
            })
            .collect();
        out.with_column(Column::new(ROLE_CHANGED.into(), changed))?;
    }

    // 6. experience rates
    let employers = PREVIOUS_EMPLOYERS
        .iter()
        .find(|name| out.column(name).is_ok())
        .copied();
    let adult_years: Option<Vec<Option<f64>>> = numeric_values(&out, AGE)?
        .map(|ages| ages.into_iter().map(|a| a.map(|a| a - ADULT_AGE)).collect());

    if let Some(employers) = employers {
        let rate = match out.column(TOTAL_EXPERIENCE) {
            Ok(total) => Some(
                safe_divide(out.column(employers)?, total)?
                    .with_name(EMPLOYER_CHANGE_RATE.into()),
            ),
            Err(_) => None,
        };
        if let Some(rate) = rate {
            out.with_column(rate)?;
        }

        if let (Some(counts), Some(adult_years)) =
            (numeric_values(&out, employers)?, &adult_years)
        {
            let rate = divide_values(&counts, adult_years);
            out.with_column(Column::new(ADULT_EMPLOYER_CHANGE_RATE.into(), rate))?;
        }
    }

    if let (Some(total), Some(adult_years)) =
        (numeric_values(&out, TOTAL_EXPERIENCE)?, &adult_years)
    {
        let ratio = divide_values(&total, adult_years);
        out.with_column(Column::new(ADULT_EXPERIENCE_RATIO.into(), ratio))?;
    }

    // 7. evaluation delta
    if let (Some(current), Some(previous)) = (
        numeric_values(&out, CURRENT_SCORE)?,
        numeric_values(&out, PREVIOUS_SCORE)?,
    ) {
        let delta: Vec<Option<f64>> = current
            .iter()
            .zip(previous.iter())
            .map(|(c, p)| match (c, p) {
                (Some(c), Some(p)) => Some(c - p),
                _ => None,
            })
            .collect();
        out.with_column(Column::new(SCORE_DELTA.into(), delta))?;
    }

    Ok(out)
}

/// Numeric view of a column, or `None` when the column is absent.
fn numeric_values(df: &DataFrame, name: &str) -> Result<Option<Vec<Option<f64>>>> {
    match df.column(name) {
        Ok(column) => Ok(Some(column_to_f64_vec(column)?)),
        Err(_) => Ok(None),
    }
}

/// Recode gender to 0/1 when every present value is a known spelling.
///
/// A column with no present value is left untouched.
fn encode_gender(column: &Column) -> Result<Option<Column>> {
    let values = column_to_string_vec(column)?;
    if values.iter().all(Option::is_none) {
        return Ok(None);
    }

    let mapped: Vec<Option<i64>> = values
        .iter()
        .map(|v| v.as_deref().and_then(parse_gender))
        .collect();
    let all_known = values
        .iter()
        .zip(mapped.iter())
        .all(|(raw, code)| raw.is_none() || code.is_some());
    if !all_known {
        return Ok(None);
    }

    Ok(Some(Column::new(column.name().clone(), mapped)))
}

/// Data-quality indicators over the engineered table
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct IncoherenceMetrics {
    /// Rows violating total experience >= tenure >= years in role
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hierarchy_violations: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hierarchy_violation_ratio: Option<f64>,
    /// Among rows with no previous employer, share whose total experience
    /// exceeds their tenure
    #[serde(skip_serializing_if = "Option::is_none")]
    pub experience_gap_without_previous_ratio: Option<f64>,
}

/// Count rows whose experience columns contradict each other.
///
/// Rows with a missing value in the hierarchy check count as violations.
pub fn compute_incoherence_metrics(df: &DataFrame) -> Result<IncoherenceMetrics> {
    let mut metrics = IncoherenceMetrics::default();

    let total = df.column(TOTAL_EXPERIENCE).ok();
    let company = df.column(YEARS_AT_COMPANY).ok();
    let role = df.column(YEARS_IN_ROLE).ok();

    if let (Some(total), Some(company), Some(role)) = (total, company, role) {
        let total = column_to_f64_vec(total)?;
        let company = column_to_f64_vec(company)?;
        let role = column_to_f64_vec(role)?;

        let violations = total
            .iter()
            .zip(company.iter())
            .zip(role.iter())
            .filter(|((t, c), r)| match (t, c, r) {
                (Some(t), Some(c), Some(r)) => !(t >= c && c >= r),
                _ => true,
            })
            .count();

        metrics.hierarchy_violations = Some(violations);
        if df.height() > 0 {
            metrics.hierarchy_violation_ratio = Some(violations as f64 / df.height() as f64);
        }
    }

    let employers = PREVIOUS_EMPLOYERS
        .iter()
        .find_map(|name| df.column(name).ok());

    if let (Some(employers), Some(total), Some(company)) = (employers, total, company) {
        let employers = column_to_f64_vec(employers)?;
        let total = column_to_f64_vec(total)?;
        let company = column_to_f64_vec(company)?;

        let gaps: Vec<bool> = employers
            .iter()
            .zip(total.iter().zip(company.iter()))
            .filter(|(e, _)| **e == Some(0.0))
            .map(|(_, (t, c))| match (t, c) {
                (Some(t), Some(c)) => t - c > 0.0,
                _ => false,
            })
            .collect();

        if !gaps.is_empty() {
            let positive = gaps.iter().filter(|g| **g).count();
            metrics.experience_gap_without_previous_ratio =
                Some(positive as f64 / gaps.len() as f64);
        }
    }

    Ok(metrics)
}
