//! Persisted pipeline artifact

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use faer::Mat;
use polars::prelude::*;
use serde::{Deserialize, Serialize};

use super::logistic::LogisticRegression;
use crate::error::{AttritionError, Result};
use crate::pipeline::preprocess::FittedPreprocessor;

/// Current on-disk format of `pipeline.json`
pub const ARTIFACT_FORMAT_VERSION: u32 = 1;

pub const PIPELINE_FILE: &str = "pipeline.json";
pub const EXPECTED_FEATURES_FILE: &str = "expected_features.json";
pub const MODEL_CARD_FILE: &str = "model_card.json";
pub const METRICS_FILE: &str = "metrics.json";

/// Fitted preprocessor plus classifier, scored as one unit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttritionPipeline {
    pub format_version: u32,
    pub target: String,
    pub preprocessor: FittedPreprocessor,
    pub classifier: LogisticRegression,
}

impl AttritionPipeline {
    pub fn new(
        target: impl Into<String>,
        preprocessor: FittedPreprocessor,
        classifier: LogisticRegression,
    ) -> Self {
        Self {
            format_version: ARTIFACT_FORMAT_VERSION,
            target: target.into(),
            preprocessor,
            classifier,
        }
    }

    /// Design matrix for `df`
    pub fn transform(&self, df: &DataFrame) -> Result<Mat<f64>> {
        self.preprocessor.transform(df)
    }

    /// Leaver probability for each row of `df`
    pub fn predict_proba(&self, df: &DataFrame) -> Result<Vec<f64>> {
        let x = self.transform(df)?;
        self.classifier.predict_proba(&x)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(writer, self)?;
        tracing::info!(path = %path.display(), "saved pipeline artifact");
        Ok(())
    }

    /// Load a pipeline written by [`Self::save`].
    pub fn load(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(AttritionError::ArtifactNotFound(path.to_path_buf()));
        }
        let reader = BufReader::new(File::open(path)?);
        let pipeline: Self = serde_json::from_reader(reader)?;

        if pipeline.format_version != ARTIFACT_FORMAT_VERSION {
            return Err(AttritionError::ArtifactVersion {
                found: pipeline.format_version,
                expected: ARTIFACT_FORMAT_VERSION,
            });
        }
        if !pipeline.classifier.is_fitted() {
            return Err(AttritionError::NotFitted);
        }

        tracing::info!(
            path = %path.display(),
            inputs = pipeline.preprocessor.columns().len(),
            "loaded pipeline artifact"
        );
        Ok(pipeline)
    }
}
