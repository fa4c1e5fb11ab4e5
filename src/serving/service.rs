//! Prediction service

use rayon::prelude::*;
use serde::Serialize;

use super::align::align;
use super::config::{load_expected_features, ServingConfig};
use super::payload::{self, normalize_payload, Payload, PayloadCheck};
use crate::error::{AttritionError, Result};
use crate::model::artifact::AttritionPipeline;

/// Scored payload
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Prediction {
    pub probability: f64,
    pub decision: u8,
    pub threshold: f64,
    pub model_version: String,
}

/// Loaded artifacts plus configuration; immutable once built
#[derive(Debug)]
pub struct Predictor {
    config: ServingConfig,
    expected_features: Vec<String>,
    pipeline: AttritionPipeline,
}

impl Predictor {
    /// Load expected features and pipeline from `config.models_dir`.
    pub fn load(config: ServingConfig) -> Result<Self> {
        let expected_features = load_expected_features(&config.expected_features_path())?;
        let pipeline = AttritionPipeline::load(&config.pipeline_path())?;
        Self::new(config, expected_features, pipeline)
    }

    /// Assemble a predictor, checking that every column the pipeline reads is
    /// an expected feature.
    pub fn new(
        config: ServingConfig,
        expected_features: Vec<String>,
        pipeline: AttritionPipeline,
    ) -> Result<Self> {
        let unknown: Vec<&str> = pipeline
            .preprocessor
            .input_columns()
            .into_iter()
            .filter(|c| !expected_features.iter().any(|e| e == c))
            .collect();
        if !unknown.is_empty() {
            return Err(AttritionError::Config(format!(
                "pipeline reads columns missing from the expected features: {}",
                unknown.join(", ")
            )));
        }

        tracing::info!(
            models_dir = %config.models_dir.display(),
            threshold = config.threshold,
            model_version = %config.model_version,
            features = expected_features.len(),
            "predictor ready"
        );

        Ok(Self {
            config,
            expected_features,
            pipeline,
        })
    }

    pub fn config(&self) -> &ServingConfig {
        &self.config
    }

    pub fn expected_features(&self) -> &[String] {
        &self.expected_features
    }

    pub fn pipeline(&self) -> &AttritionPipeline {
        &self.pipeline
    }

    /// Missing and null expected features of `payload`, after normalization.
    pub fn check_payload(&self, payload: &Payload) -> PayloadCheck {
        payload::check_payload(&normalize_payload(payload), &self.expected_features)
    }

    /// Leaver probability for one complete payload.
    ///
    /// An incomplete payload is rejected before anything is scored.
    ///
    /// # Arguments
    /// * `payload` - Feature values keyed by column name; unknown keys are ignored
    ///
    /// # Returns
    /// The probability of leaving, or [`AttritionError::IncompletePayload`]
    /// listing the missing and null expected features
    pub fn predict_proba(&self, payload: &Payload) -> Result<f64> {
        let normalized = normalize_payload(payload);
        let check = payload::check_payload(&normalized, &self.expected_features);
        if !check.is_complete() {
            return Err(AttritionError::IncompletePayload {
                missing: check.missing,
                nulls: check.nulls,
            });
        }

        let row = align(&normalized, &self.expected_features)?;
        let probabilities = self.pipeline.predict_proba(&row)?;
        probabilities
            .first()
            .copied()
            .ok_or_else(|| AttritionError::Shape {
                expected: "1 prediction".to_string(),
                actual: "0 predictions".to_string(),
            })
    }

    /// 1 when `probability` reaches the threshold, else 0
    pub fn decide(&self, probability: f64) -> u8 {
        u8::from(probability >= self.config.threshold)
    }

    pub fn predict(&self, payload: &Payload) -> Result<Prediction> {
        let probability = self.predict_proba(payload)?;
        Ok(Prediction {
            probability,
            decision: self.decide(probability),
            threshold: self.config.threshold,
            model_version: self.config.model_version.clone(),
        })
    }

    /// Score many payloads; results keep input order.
    pub fn predict_batch(&self, payloads: &[Payload]) -> Vec<Result<Prediction>> {
        payloads.par_iter().map(|p| self.predict(p)).collect()
    }
}
