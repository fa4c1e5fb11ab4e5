//! Model card: a JSON summary of one trained model
//!
//! Written next to the pipeline artifact. Serving reads the default
//! threshold and model version from it when no explicit value is configured.

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::error::{AttritionError, Result};
use crate::model::train::TrainedModel;

/// Hyperparameters of the fitted classifier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifierParams {
    pub alpha: f64,
    pub max_iter: usize,
    pub tol: f64,
    pub learning_rate: f64,
    pub class_weight: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelCard {
    pub target: String,
    pub model_type: String,
    pub classifier_params: ClassifierParams,
    pub default_threshold: f64,
    pub train_size: usize,
    pub test_size: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub train_average_precision: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub test_average_precision: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub train_roc_auc: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub test_roc_auc: Option<f64>,
    pub n_expected_features: usize,
    pub model_version: String,
    pub created_at: String,
}

impl ModelCard {
    pub fn from_trained(model: &TrainedModel) -> Self {
        let clf = &model.pipeline.classifier;
        Self {
            target: model.config.target.clone(),
            model_type: "logistic_regression".to_string(),
            classifier_params: ClassifierParams {
                alpha: clf.alpha,
                max_iter: clf.max_iter,
                tol: clf.tol,
                learning_rate: clf.learning_rate,
                class_weight: if clf.balanced { "balanced" } else { "none" }.to_string(),
            },
            default_threshold: model.config.threshold,
            train_size: model.train_metrics.rows,
            test_size: model.test_metrics.rows,
            train_average_precision: model.train_metrics.average_precision,
            test_average_precision: model.test_metrics.average_precision,
            train_roc_auc: model.train_metrics.roc_auc,
            test_roc_auc: model.test_metrics.roc_auc,
            n_expected_features: model.expected_features.len(),
            model_version: model.config.model_version.clone(),
            created_at: Utc::now().to_rfc3339(),
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        serde_json::from_reader(BufReader::new(file)).map_err(|e| {
            AttritionError::Config(format!("unreadable model card {}: {}", path.display(), e))
        })
    }

    /// Load the card if present; a missing file is not an error.
    pub fn load_optional(path: &Path) -> Result<Option<Self>> {
        if path.is_file() {
            Self::load(path).map(Some)
        } else {
            Ok(None)
        }
    }
}
