//! Column-group classification
//!
//! Partitions the columns of a processed table into the six semantic groups
//! that share one preprocessing recipe. Membership comes from a hardcoded
//! catalogue filtered to the columns actually present; ordinal category
//! orders come from the data.

use std::collections::{BTreeSet, HashSet};
use std::fmt;

use polars::prelude::*;
use serde::{Deserialize, Serialize};

use super::cleaning::column_to_string_vec;
use crate::error::Result;

/// Semantic group of a column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupKind {
    Continuous,
    LogNumeric,
    Discrete,
    Binary,
    Nominal,
    Ordinal,
}

impl GroupKind {
    /// All groups, in transformer output order
    pub const ALL: [GroupKind; 6] = [
        GroupKind::Continuous,
        GroupKind::LogNumeric,
        GroupKind::Discrete,
        GroupKind::Binary,
        GroupKind::Nominal,
        GroupKind::Ordinal,
    ];

    /// Reference catalogue for this group
    pub fn catalogue(self) -> &'static [&'static str] {
        match self {
            GroupKind::Continuous => &CONTINUOUS,
            GroupKind::LogNumeric => &LOG_NUMERIC,
            GroupKind::Discrete => &DISCRETE,
            GroupKind::Binary => &BINARY,
            GroupKind::Nominal => &NOMINAL,
            GroupKind::Ordinal => &ORDINAL,
        }
    }

    pub fn is_categorical(self) -> bool {
        matches!(self, GroupKind::Nominal | GroupKind::Ordinal)
    }
}

impl fmt::Display for GroupKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            GroupKind::Continuous => "continuous",
            GroupKind::LogNumeric => "log-numeric",
            GroupKind::Discrete => "discrete",
            GroupKind::Binary => "binary",
            GroupKind::Nominal => "nominal",
            GroupKind::Ordinal => "ordinal",
        };
        f.write_str(name)
    }
}

const CONTINUOUS: [&str; 6] = [
    "age",
    "augmentation_salaire_precedente",
    "proba_chgt_experience_par_an",
    "proba_chgt_experience_par_an_adulte",
    "ratio_experience_vie_adulte",
    "evolution_note",
];

// right-skewed amounts and durations
const LOG_NUMERIC: [&str; 7] = [
    "revenu_mensuel",
    "distance_domicile_travail",
    "annee_experience_totale",
    "annees_dans_l_entreprise",
    "annees_dans_le_poste_actuel",
    "annees_depuis_la_derniere_promotion",
    "annes_sous_responsable_actuel",
];

const DISCRETE: [&str; 7] = [
    "nombre_experiences_precedentes",
    "nombre_experiences_precedents",
    "nombre_participation_pee",
    "nb_formations_suivies",
    "nombre_employee_sous_responsabilite",
    "note_evaluation_precedente",
    "note_evaluation_actuelle",
];

const BINARY: [&str; 3] = ["genre", "heure_supplementaires", "changement_poste"];

const NOMINAL: [&str; 4] = ["statut_marital", "departement", "poste", "domaine_etude"];

const ORDINAL: [&str; 7] = [
    "niveau_education",
    "niveau_hierarchique_poste",
    "frequence_deplacement",
    "satisfaction_employee_environnement",
    "satisfaction_employee_nature_travail",
    "satisfaction_employee_equipe",
    "satisfaction_employee_equilibre_pro_perso",
];

/// Columns of a processed table, partitioned by preprocessing recipe.
///
/// `ord_categories[i]` is the category order of `ordinal[i]`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureGroups {
    pub continuous: Vec<String>,
    pub log_numeric: Vec<String>,
    pub discrete: Vec<String>,
    pub binary: Vec<String>,
    pub nominal: Vec<String>,
    pub ordinal: Vec<String>,
    pub ord_categories: Vec<Vec<String>>,
}

impl FeatureGroups {
    /// Columns of one group
    pub fn columns(&self, kind: GroupKind) -> &[String] {
        match kind {
            GroupKind::Continuous => &self.continuous,
            GroupKind::LogNumeric => &self.log_numeric,
            GroupKind::Discrete => &self.discrete,
            GroupKind::Binary => &self.binary,
            GroupKind::Nominal => &self.nominal,
            GroupKind::Ordinal => &self.ordinal,
        }
    }

    fn columns_mut(&mut self, kind: GroupKind) -> &mut Vec<String> {
        match kind {
            GroupKind::Continuous => &mut self.continuous,
            GroupKind::LogNumeric => &mut self.log_numeric,
            GroupKind::Discrete => &mut self.discrete,
            GroupKind::Binary => &mut self.binary,
            GroupKind::Nominal => &mut self.nominal,
            GroupKind::Ordinal => &mut self.ordinal,
        }
    }

    /// Every grouped column, in transformer order
    pub fn all_columns(&self) -> Vec<&str> {
        GroupKind::ALL
            .iter()
            .flat_map(|kind| self.columns(*kind).iter().map(String::as_str))
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        GroupKind::ALL.iter().all(|kind| self.columns(*kind).is_empty())
    }
}

/// Classify the columns of `df` (minus `target`) into feature groups.
///
/// Catalogue entries absent from the table are skipped. Each ordinal column
/// gets its distinct non-missing values as category order, sorted
/// numerically when every value is a finite number and lexicographically
/// otherwise. That order is only meaningful when the values sort in business order
/// (numeric levels do; labels such as "Frequent"/"Occasionnel" do not).
///
/// # Arguments
/// * `df` - Engineered table to classify
/// * `target` - Name of the target column, never placed in a group
pub fn classify_columns(df: &DataFrame, target: &str) -> Result<FeatureGroups> {
    let present: HashSet<String> = df
        .get_column_names()
        .iter()
        .map(|s| s.to_string())
        .collect();

    let mut groups = FeatureGroups::default();
    let mut claimed: HashSet<&str> = HashSet::new();

    for kind in GroupKind::ALL {
        for name in kind.catalogue() {
            if *name == target || !present.contains(*name) || !claimed.insert(*name) {
                continue;
            }
            groups.columns_mut(kind).push(name.to_string());
        }
    }

    let mut ord_categories = Vec::with_capacity(groups.ordinal.len());
    for name in &groups.ordinal {
        ord_categories.push(observed_categories(df.column(name)?)?);
    }
    groups.ord_categories = ord_categories;

    tracing::debug!(
        grouped = groups.all_columns().len(),
        present = present.len(),
        "classified columns"
    );

    Ok(groups)
}

/// Distinct non-missing values of a column in deterministic order.
pub fn observed_categories(column: &Column) -> Result<Vec<String>> {
    let distinct: BTreeSet<String> = column_to_string_vec(column)?
        .into_iter()
        .flatten()
        .collect();
    let mut values: Vec<String> = distinct.into_iter().collect();

    // numeric order only when every level is a finite number
    let numeric: Option<Vec<f64>> = values
        .iter()
        .map(|v| v.parse::<f64>().ok().filter(|n| n.is_finite()))
        .collect();
    if let Some(numbers) = numeric {
        let mut pairs: Vec<(f64, String)> = numbers.into_iter().zip(values).collect();
        pairs.sort_by(|a, b| a.0.total_cmp(&b.0).then_with(|| a.1.cmp(&b.1)));
        values = pairs.into_iter().map(|(_, v)| v).collect();
    }

    Ok(values)
}
