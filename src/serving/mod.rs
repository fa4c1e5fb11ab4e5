//! Serving module - payload normalization, alignment and cached prediction
//!
//! The free functions below score through the process-wide [`SERVING`]
//! cache, which loads its configuration from the environment on first use.

pub mod align;
pub mod cache;
pub mod config;
pub mod payload;
pub mod service;

pub use align::align;
pub use cache::{ServingState, SERVING};
pub use config::{load_expected_features, ServingConfig, ServingOverrides};
pub use payload::{normalize_payload, FeatureValue, Payload, PayloadCheck};
pub use service::{Prediction, Predictor};

use crate::error::Result;

/// Leaver probability for `payload` using the cached predictor.
pub fn predict_proba(payload: &Payload) -> Result<f64> {
    SERVING.get_or_load()?.predict_proba(payload)
}

/// Missing and null expected features of `payload`.
pub fn check_payload(payload: &Payload) -> Result<PayloadCheck> {
    Ok(SERVING.get_or_load()?.check_payload(payload))
}

/// Apply the configured threshold to `probability`.
pub fn decide(probability: f64) -> Result<u8> {
    Ok(SERVING.get_or_load()?.decide(probability))
}

/// Forget the cached predictor and configuration.
pub fn reset_cache() {
    SERVING.reset();
}
