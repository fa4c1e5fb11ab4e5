//! Training orchestration and artifact export

use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use polars::prelude::*;
use serde::{Deserialize, Serialize};

use super::artifact::{
    AttritionPipeline, EXPECTED_FEATURES_FILE, METRICS_FILE, MODEL_CARD_FILE, PIPELINE_FILE,
};
use super::logistic::LogisticRegression;
use super::metrics::SplitMetrics;
use super::split::stratified_split;
use crate::error::{AttritionError, Result};
use crate::pipeline::features::ATTRITION;
use crate::pipeline::groups::{classify_columns, FeatureGroups};
use crate::pipeline::preprocess::build_preprocessor;
use crate::pipeline::target::encode_target;
use crate::report::model_card::ModelCard;

/// Training parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainConfig {
    pub target: String,
    pub test_size: f64,
    pub seed: u64,
    /// Decision threshold used for confusion matrices and the model card
    pub threshold: f64,
    pub alpha: f64,
    pub max_iter: usize,
    pub learning_rate: f64,
    pub model_version: String,
}

impl Default for TrainConfig {
    fn default() -> Self {
        let classifier = LogisticRegression::new();
        Self {
            target: ATTRITION.to_string(),
            test_size: 0.10,
            seed: 42,
            threshold: 0.5,
            alpha: classifier.alpha,
            max_iter: classifier.max_iter,
            learning_rate: classifier.learning_rate,
            model_version: "dev".to_string(),
        }
    }
}

/// Everything produced by one training run
#[derive(Debug, Clone)]
pub struct TrainedModel {
    pub config: TrainConfig,
    pub pipeline: AttritionPipeline,
    /// Raw input columns in table order, target excluded
    pub expected_features: Vec<String>,
    pub groups: FeatureGroups,
    pub train_metrics: SplitMetrics,
    pub test_metrics: SplitMetrics,
    /// Rows dropped because their target value did not map to 0/1
    pub ignored_rows: usize,
}

/// Metrics document written next to the artifacts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsReport {
    pub train: SplitMetrics,
    pub test: SplitMetrics,
}

/// Where [`export_artifacts`] wrote each file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPaths {
    pub pipeline: PathBuf,
    pub expected_features: PathBuf,
    pub model_card: PathBuf,
    pub metrics: PathBuf,
}

impl ArtifactPaths {
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            pipeline: dir.join(PIPELINE_FILE),
            expected_features: dir.join(EXPECTED_FEATURES_FILE),
            model_card: dir.join(MODEL_CARD_FILE),
            metrics: dir.join(METRICS_FILE),
        }
    }

    pub fn all(&self) -> [&Path; 4] {
        [
            &self.pipeline,
            &self.expected_features,
            &self.model_card,
            &self.metrics,
        ]
    }

    /// Files that already exist and would be overwritten
    pub fn existing(&self) -> Vec<&Path> {
        self.all().into_iter().filter(|p| p.exists()).collect()
    }
}

fn take_rows(df: &DataFrame, rows: &[usize]) -> Result<DataFrame> {
    let idx = IdxCa::from_vec(
        "idx".into(),
        rows.iter().map(|i| *i as IdxSize).collect(),
    );
    Ok(df.take(&idx)?)
}

fn pick<T: Copy>(values: &[T], rows: &[usize]) -> Vec<T> {
    rows.iter().map(|i| values[*i]).collect()
}

/// Train a preprocessor and classifier on a processed table.
pub fn train_pipeline(df: &DataFrame, config: &TrainConfig) -> Result<TrainedModel> {
    let labels = encode_target(df, &config.target)?;
    let kept = take_rows(df, &labels.kept_indices())?;
    let y = labels.kept_labels();

    let x = kept.drop(&config.target)?;
    let expected_features: Vec<String> = x
        .get_column_names()
        .iter()
        .map(|s| s.to_string())
        .collect();

    let groups = classify_columns(&kept, &config.target)?;
    if groups.is_empty() {
        return Err(AttritionError::Shape {
            expected: "at least one recognised feature column".to_string(),
            actual: format!("{} unrecognised columns", expected_features.len()),
        });
    }

    let split = stratified_split(&y, config.test_size, config.seed)?;
    let x_train = take_rows(&x, &split.train)?;
    let x_test = take_rows(&x, &split.test)?;
    let y_train = pick(&y, &split.train);
    let y_test = pick(&y, &split.test);

    tracing::info!(
        train = y_train.len(),
        test = y_test.len(),
        features = expected_features.len(),
        "training attrition model"
    );

    let preprocessor = build_preprocessor(&groups).fit(&x_train)?;
    let design = preprocessor.transform(&x_train)?;

    let mut classifier = LogisticRegression::new()
        .with_alpha(config.alpha)
        .with_max_iter(config.max_iter)
        .with_learning_rate(config.learning_rate);
    classifier.fit(&design, &y_train)?;

    let pipeline = AttritionPipeline::new(config.target.clone(), preprocessor, classifier);

    let train_scores = pipeline.predict_proba(&x_train)?;
    let test_scores = pipeline.predict_proba(&x_test)?;

    Ok(TrainedModel {
        config: config.clone(),
        train_metrics: SplitMetrics::evaluate(&y_train, &train_scores, config.threshold),
        test_metrics: SplitMetrics::evaluate(&y_test, &test_scores, config.threshold),
        pipeline,
        expected_features,
        groups,
        ignored_rows: labels.ignored(),
    })
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(writer, value)?;
    Ok(())
}

/// Write pipeline, expected features, model card and metrics into `dir`.
pub fn export_artifacts(model: &TrainedModel, dir: &Path) -> Result<ArtifactPaths> {
    fs::create_dir_all(dir)?;
    let paths = ArtifactPaths::in_dir(dir);

    model.pipeline.save(&paths.pipeline)?;
    write_json(&paths.expected_features, &model.expected_features)?;
    ModelCard::from_trained(model).save(&paths.model_card)?;
    write_json(
        &paths.metrics,
        &MetricsReport {
            train: model.train_metrics.clone(),
            test: model.test_metrics.clone(),
        },
    )?;

    tracing::info!(dir = %dir.display(), "exported artifacts");
    Ok(paths)
}
