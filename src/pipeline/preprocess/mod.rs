//! Preprocessor assembly
//!
//! Turns [`FeatureGroups`] into a column transformer: one recipe per
//! non-empty group (impute, optional transform, encode, scale). Fitting
//! learns per-column statistics; the fitted form is serializable and is what
//! the pipeline artifact persists.
//!
//! Output layout: groups in [`GroupKind::ALL`] order, columns in group order,
//! one-hot outputs of a column contiguous and in sorted level order.

pub mod encode;
pub mod impute;
pub mod scale;

pub use encode::{OneHotEncoder, OrdinalEncoder, UNKNOWN_CODE};
pub use impute::ImputeStrategy;
pub use scale::StandardScaler;

use faer::Mat;
use polars::prelude::*;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use super::cleaning::{column_to_f64_vec, column_to_string_vec};
use super::groups::{FeatureGroups, GroupKind};
use crate::error::{AttritionError, Result};

/// Value transform applied after imputation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumericTransform {
    Identity,
    Log1p,
}

/// How a group turns values into model inputs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    Numeric,
    OneHot,
    Ordinal,
}

/// Unfitted recipe for one group
#[derive(Debug, Clone, PartialEq)]
pub struct GroupPipeline {
    pub kind: GroupKind,
    pub columns: Vec<String>,
    pub impute: ImputeStrategy,
    pub transform: NumericTransform,
    pub encoding: Encoding,
    pub scale: bool,
    /// Category order per column, ordinal groups only
    pub ord_categories: Vec<Vec<String>>,
}

impl GroupPipeline {
    fn for_group(kind: GroupKind, groups: &FeatureGroups) -> Self {
        let (impute, transform, encoding, scale) = match kind {
            GroupKind::Continuous | GroupKind::Discrete => (
                ImputeStrategy::Median,
                NumericTransform::Identity,
                Encoding::Numeric,
                true,
            ),
            GroupKind::LogNumeric => (
                ImputeStrategy::Median,
                NumericTransform::Log1p,
                Encoding::Numeric,
                true,
            ),
            GroupKind::Binary => (
                ImputeStrategy::MostFrequent,
                NumericTransform::Identity,
                Encoding::Numeric,
                true,
            ),
            GroupKind::Nominal => (
                ImputeStrategy::MostFrequent,
                NumericTransform::Identity,
                Encoding::OneHot,
                false,
            ),
            GroupKind::Ordinal => (
                ImputeStrategy::MostFrequent,
                NumericTransform::Identity,
                Encoding::Ordinal,
                true,
            ),
        };

        let ord_categories = if kind == GroupKind::Ordinal {
            groups.ord_categories.clone()
        } else {
            Vec::new()
        };

        Self {
            kind,
            columns: groups.columns(kind).to_vec(),
            impute,
            transform,
            encoding,
            scale,
            ord_categories,
        }
    }

    fn fit_column(&self, index: usize, column: &Column) -> Result<FittedColumn> {
        let name = column.name().to_string();
        let transform = match self.encoding {
            Encoding::Numeric => {
                let values = column_to_f64_vec(column)?;
                let present = column.len() - column.null_count();
                if present > 0 && values.iter().all(Option::is_none) {
                    return Err(AttritionError::NonNumericColumn(name));
                }
                let fill = impute::numeric_fill(self.impute, &values);
                let log1p = self.transform == NumericTransform::Log1p;
                let prepared: Vec<f64> = values
                    .iter()
                    .map(|v| numeric_value(v.unwrap_or(fill), log1p))
                    .collect();
                let scaler = if self.scale {
                    StandardScaler::fit(&prepared)
                } else {
                    StandardScaler::identity()
                };
                ColumnTransform::Numeric {
                    fill,
                    log1p,
                    scaler,
                }
            }
            Encoding::OneHot => {
                let labels = column_to_string_vec(column)?;
                let fill = impute::most_frequent_label(&labels).unwrap_or_default();
                let imputed: Vec<String> = labels
                    .into_iter()
                    .map(|v| v.unwrap_or_else(|| fill.clone()))
                    .collect();
                ColumnTransform::OneHot {
                    encoder: OneHotEncoder::fit(&imputed),
                    fill,
                }
            }
            Encoding::Ordinal => {
                let labels = column_to_string_vec(column)?;
                let fill = impute::most_frequent_label(&labels).unwrap_or_default();
                let encoder =
                    OrdinalEncoder::new(self.ord_categories.get(index).cloned().unwrap_or_default());
                let codes: Vec<f64> = labels
                    .iter()
                    .map(|v| encoder.encode(v.as_deref().unwrap_or(&fill)))
                    .collect();
                let scaler = if self.scale {
                    StandardScaler::fit(&codes)
                } else {
                    StandardScaler::identity()
                };
                ColumnTransform::Ordinal {
                    fill,
                    encoder,
                    scaler,
                }
            }
        };

        Ok(FittedColumn {
            name,
            group: self.kind,
            transform,
        })
    }
}

#[inline]
fn numeric_value(value: f64, log1p: bool) -> f64 {
    if log1p {
        scale::log1p_clipped(value)
    } else {
        value
    }
}

/// Unfitted column transformer
#[derive(Debug, Clone, PartialEq)]
pub struct Preprocessor {
    pipelines: Vec<GroupPipeline>,
}

/// Build one sub-pipeline per non-empty group; unclaimed columns are dropped.
///
/// # Arguments
/// * `groups` - Column classification from [`classify_columns`](super::groups::classify_columns)
///
/// # Returns
/// An unfitted [`Preprocessor`]; call [`Preprocessor::fit`] on the training rows
pub fn build_preprocessor(groups: &FeatureGroups) -> Preprocessor {
    let pipelines = GroupKind::ALL
        .iter()
        .filter(|kind| !groups.columns(**kind).is_empty())
        .map(|kind| GroupPipeline::for_group(*kind, groups))
        .collect();
    Preprocessor { pipelines }
}

impl Preprocessor {
    pub fn pipelines(&self) -> &[GroupPipeline] {
        &self.pipelines
    }

    /// Learn imputation, encoding and scaling statistics from `df`.
    pub fn fit(&self, df: &DataFrame) -> Result<FittedPreprocessor> {
        let mut columns = Vec::new();
        for pipeline in &self.pipelines {
            for (index, name) in pipeline.columns.iter().enumerate() {
                let column = df
                    .column(name)
                    .map_err(|_| AttritionError::ColumnNotFound(name.clone()))?;
                columns.push(pipeline.fit_column(index, column)?);
            }
        }

        let fitted = FittedPreprocessor { columns };
        tracing::debug!(
            inputs = fitted.columns.len(),
            outputs = fitted.output_width(),
            rows = df.height(),
            "fitted preprocessor"
        );
        Ok(fitted)
    }
}

/// Learned per-column statistics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "encoding", rename_all = "snake_case")]
pub enum ColumnTransform {
    Numeric {
        fill: f64,
        log1p: bool,
        scaler: StandardScaler,
    },
    OneHot {
        fill: String,
        encoder: OneHotEncoder,
    },
    Ordinal {
        fill: String,
        encoder: OrdinalEncoder,
        scaler: StandardScaler,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FittedColumn {
    pub name: String,
    pub group: GroupKind,
    pub transform: ColumnTransform,
}

impl FittedColumn {
    fn width(&self) -> usize {
        match &self.transform {
            ColumnTransform::OneHot { encoder, .. } => encoder.width(),
            _ => 1,
        }
    }

    fn output_names(&self) -> Vec<String> {
        match &self.transform {
            ColumnTransform::OneHot { encoder, .. } => encoder.output_names(&self.name),
            _ => vec![self.name.clone()],
        }
    }

    /// Output columns produced from `column`, each of length `column.len()`
    fn transform_column(&self, column: &Column) -> Result<Vec<Vec<f64>>> {
        match &self.transform {
            ColumnTransform::Numeric {
                fill,
                log1p,
                scaler,
            } => {
                let values = column_to_f64_vec(column)?;
                Ok(vec![values
                    .iter()
                    .map(|v| scaler.transform(numeric_value(v.unwrap_or(*fill), *log1p)))
                    .collect()])
            }
            ColumnTransform::OneHot { fill, encoder } => {
                let labels = column_to_string_vec(column)?;
                let mut outputs = vec![vec![0.0; labels.len()]; encoder.width()];
                for (row, label) in labels.iter().enumerate() {
                    if let Some(hot) = encoder.hot_index(label.as_deref().unwrap_or(fill)) {
                        outputs[hot][row] = 1.0;
                    }
                }
                Ok(outputs)
            }
            ColumnTransform::Ordinal {
                fill,
                encoder,
                scaler,
            } => {
                let labels = column_to_string_vec(column)?;
                Ok(vec![labels
                    .iter()
                    .map(|v| scaler.transform(encoder.encode(v.as_deref().unwrap_or(fill))))
                    .collect()])
            }
        }
    }
}

/// Fitted column transformer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FittedPreprocessor {
    columns: Vec<FittedColumn>,
}

impl FittedPreprocessor {
    pub fn columns(&self) -> &[FittedColumn] {
        &self.columns
    }

    /// Raw columns the transformer reads, in output order
    pub fn input_columns(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn output_width(&self) -> usize {
        self.columns.iter().map(FittedColumn::width).sum()
    }

    /// Names of the matrix columns produced by [`Self::transform`]
    pub fn feature_names_out(&self) -> Vec<String> {
        self.columns
            .iter()
            .flat_map(FittedColumn::output_names)
            .collect()
    }

    /// Transform `df` into a dense design matrix.
    ///
    /// Every input column must be present; extra columns are ignored.
    pub fn transform(&self, df: &DataFrame) -> Result<Mat<f64>> {
        let n_rows = df.height();

        let blocks: Vec<Vec<Vec<f64>>> = self
            .columns
            .par_iter()
            .map(|fitted| {
                let column = df
                    .column(&fitted.name)
                    .map_err(|_| AttritionError::ColumnNotFound(fitted.name.clone()))?;
                fitted.transform_column(column)
            })
            .collect::<Result<Vec<_>>>()?;

        let mut x = Mat::<f64>::zeros(n_rows, self.output_width());
        let mut j = 0;
        for block in blocks {
            for values in block {
                for (i, v) in values.into_iter().enumerate() {
                    x[(i, j)] = v;
                }
                j += 1;
            }
        }

        Ok(x)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::groups::classify_columns;

    fn training_frame() -> DataFrame {
        df! {
            "a_quitte_l_entreprise" => [1i64, 0, 0, 1],
            "age" => [Some(30.0f64), Some(40.0), None, Some(50.0)],
            "revenu_mensuel" => [1000.0f64, 3000.0, -5.0, 8000.0],
            "genre" => [Some(1i64), None, Some(0), Some(1)],
            "statut_marital" => [Some("Marie"), Some("Celibataire"), None, Some("Marie")],
            "niveau_education" => [1i64, 2, 3, 2],
        }
        .unwrap()
    }

    fn fitted() -> FittedPreprocessor {
        let df = training_frame();
        let groups = classify_columns(&df, "a_quitte_l_entreprise").unwrap();
        build_preprocessor(&groups).fit(&df).unwrap()
    }

    #[test]
    fn test_build_skips_empty_groups() {
        let df = training_frame();
        let groups = classify_columns(&df, "a_quitte_l_entreprise").unwrap();
        let pre = build_preprocessor(&groups);
        let kinds: Vec<GroupKind> = pre.pipelines().iter().map(|p| p.kind).collect();
        assert_eq!(
            kinds,
            vec![
                GroupKind::Continuous,
                GroupKind::LogNumeric,
                GroupKind::Binary,
                GroupKind::Nominal,
                GroupKind::Ordinal
            ]
        );
        assert_eq!(pre.pipelines()[1].transform, NumericTransform::Log1p);
        assert!(!pre.pipelines()[3].scale);
    }

    #[test]
    fn test_feature_names_out_order() {
        let fitted = fitted();
        assert_eq!(
            fitted.feature_names_out(),
            vec![
                "age",
                "revenu_mensuel",
                "genre",
                "statut_marital_Marie",
                "niveau_education"
            ]
        );
        assert_eq!(
            fitted.input_columns(),
            vec!["age", "revenu_mensuel", "genre", "statut_marital", "niveau_education"]
        );
    }

    #[test]
    fn test_transform_shape_and_imputation() {
        let fitted = fitted();
        let x = fitted.transform(&training_frame()).unwrap();
        assert_eq!(x.nrows(), 4);
        assert_eq!(x.ncols(), 5);

        // missing age imputed with the median (40) then standardized like it
        assert!((x[(2, 0)] - x[(1, 0)]).abs() < 1e-12);

        // missing marital status imputed with the most frequent level
        assert_eq!(x[(2, 3)], 1.0);
        assert_eq!(x[(1, 3)], 0.0);

        // scaled numeric columns are centred
        let mean: f64 = (0..4).map(|i| x[(i, 1)]).sum::<f64>() / 4.0;
        assert!(mean.abs() < 1e-9);
    }

    #[test]
    fn test_unknown_levels() {
        let fitted = fitted();
        let serving = df! {
            "age" => [35.0f64],
            "revenu_mensuel" => [2000.0f64],
            "genre" => [0i64],
            "statut_marital" => ["Veuf"],
            "niveau_education" => [9i64],
        }
        .unwrap();
        let x = fitted.transform(&serving).unwrap();
        assert_eq!(x[(0, 3)], 0.0);

        let ColumnTransform::Ordinal { scaler, .. } = &fitted.columns()[4].transform else {
            panic!("expected ordinal column");
        };
        assert!((x[(0, 4)] - scaler.transform(UNKNOWN_CODE)).abs() < 1e-12);
    }

    #[test]
    fn test_missing_claimed_column_is_error() {
        let fitted = fitted();
        let partial = df! { "age" => [35.0f64] }.unwrap();
        let err = fitted.transform(&partial).unwrap_err();
        assert!(matches!(err, AttritionError::ColumnNotFound(_)));
    }

    #[test]
    fn test_extra_columns_ignored() {
        let fitted = fitted();
        let mut df = training_frame();
        df.with_column(Column::new("id_employee".into(), [1i64, 2, 3, 4]))
            .unwrap();
        let x = fitted.transform(&df).unwrap();
        assert_eq!(x.ncols(), 5);
    }

    #[test]
    fn test_fitted_round_trips_through_json() {
        let fitted = fitted();
        let json = serde_json::to_string(&fitted).unwrap();
        let back: FittedPreprocessor = serde_json::from_str(&json).unwrap();
        assert_eq!(back, fitted);
    }

    #[test]
    fn test_all_missing_numeric_imputes_zero() {
        let df = df! {
            "target" => [0i64, 1],
            "age" => [None::<f64>, None],
        }
        .unwrap();
        let groups = classify_columns(&df, "target").unwrap();
        let fitted = build_preprocessor(&groups).fit(&df).unwrap();
        let ColumnTransform::Numeric { fill, .. } = &fitted.columns()[0].transform else {
            panic!("expected numeric column");
        };
        assert_eq!(*fill, 0.0);
    }

    #[test]
    fn test_unparsed_numeric_column_is_error() {
        let df = df! {
            "target" => [0i64, 1, 0],
            "heure_supplementaires" => ["Oui", "Non", "Oui"],
        }
        .unwrap();
        let groups = classify_columns(&df, "target").unwrap();
        assert_eq!(groups.binary, vec!["heure_supplementaires"]);

        let err = build_preprocessor(&groups).fit(&df).unwrap_err();
        assert!(
            matches!(err, AttritionError::NonNumericColumn(ref name) if name == "heure_supplementaires")
        );
    }
}
