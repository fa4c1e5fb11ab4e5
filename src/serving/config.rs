//! Serving configuration and expected-feature loading
//!
//! Each setting resolves from, in order: an explicit value, the environment,
//! the model card next to the artifacts, then a built-in default. Empty
//! environment variables count as unset.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{AttritionError, Result};
use crate::model::artifact::{EXPECTED_FEATURES_FILE, MODEL_CARD_FILE, PIPELINE_FILE};
use crate::report::model_card::ModelCard;

pub const MODELS_DIR_ENV: &str = "ATTRISK_MODELS_DIR";
pub const THRESHOLD_ENV: &str = "MODEL_THRESHOLD";
pub const MODEL_VERSION_ENV: &str = "MODEL_VERSION";

pub const DEFAULT_MODELS_DIR: &str = "models";
pub const DEFAULT_THRESHOLD: f64 = 0.5;
pub const DEFAULT_MODEL_VERSION: &str = "dev";

/// Values given explicitly, e.g. on the command line
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ServingOverrides {
    pub models_dir: Option<PathBuf>,
    pub threshold: Option<f64>,
    pub model_version: Option<String>,
}

/// Resolved serving configuration
#[derive(Debug, Clone, PartialEq)]
pub struct ServingConfig {
    pub models_dir: PathBuf,
    pub threshold: f64,
    pub model_version: String,
}

impl ServingConfig {
    /// Resolve from overrides and the process environment.
    pub fn resolve(overrides: &ServingOverrides) -> Result<Self> {
        Self::resolve_with(overrides, |key| std::env::var(key).ok())
    }

    /// Resolve from the process environment alone.
    pub fn from_env() -> Result<Self> {
        Self::resolve(&ServingOverrides::default())
    }

    /// Resolve with an injectable environment lookup.
    pub fn resolve_with<F>(overrides: &ServingOverrides, env: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |key: &str| env(key).filter(|v| !v.trim().is_empty());

        let models_dir = overrides
            .models_dir
            .clone()
            .or_else(|| lookup(MODELS_DIR_ENV).map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_MODELS_DIR));

        let card = ModelCard::load_optional(&models_dir.join(MODEL_CARD_FILE))?;

        let threshold = match (overrides.threshold, lookup(THRESHOLD_ENV)) {
            (Some(t), _) => t,
            (None, Some(raw)) => raw.trim().parse::<f64>().map_err(|_| {
                AttritionError::Config(format!("{} is not a number: '{}'", THRESHOLD_ENV, raw))
            })?,
            (None, None) => card
                .as_ref()
                .map_or(DEFAULT_THRESHOLD, |c| c.default_threshold),
        };
        validate_threshold(threshold)?;

        let model_version = overrides
            .model_version
            .clone()
            .or_else(|| lookup(MODEL_VERSION_ENV))
            .or_else(|| card.as_ref().map(|c| c.model_version.clone()))
            .unwrap_or_else(|| DEFAULT_MODEL_VERSION.to_string());

        Ok(Self {
            models_dir,
            threshold,
            model_version,
        })
    }

    pub fn pipeline_path(&self) -> PathBuf {
        self.models_dir.join(PIPELINE_FILE)
    }

    pub fn expected_features_path(&self) -> PathBuf {
        self.models_dir.join(EXPECTED_FEATURES_FILE)
    }

    pub fn model_card_path(&self) -> PathBuf {
        self.models_dir.join(MODEL_CARD_FILE)
    }
}

/// A decision threshold must be a probability.
pub fn validate_threshold(threshold: f64) -> Result<()> {
    if (0.0..=1.0).contains(&threshold) {
        Ok(())
    } else {
        Err(AttritionError::Config(format!(
            "threshold must lie in [0, 1], got {}",
            threshold
        )))
    }
}

/// Load the frozen expected-feature list.
///
/// The file must hold a JSON array of distinct strings.
pub fn load_expected_features(path: &Path) -> Result<Vec<String>> {
    if !path.is_file() {
        return Err(AttritionError::ArtifactNotFound(path.to_path_buf()));
    }
    let invalid = |reason: String| AttritionError::InvalidExpectedFeatures {
        path: path.to_path_buf(),
        reason,
    };

    let text = fs::read_to_string(path)?;
    let value: serde_json::Value =
        serde_json::from_str(&text).map_err(|e| invalid(e.to_string()))?;

    let items = value
        .as_array()
        .ok_or_else(|| invalid("must be a list of strings".to_string()))?;

    let mut names = Vec::with_capacity(items.len());
    let mut seen = HashSet::new();
    for item in items {
        let name = item
            .as_str()
            .ok_or_else(|| invalid(format!("non-string entry {}", item)))?;
        if !seen.insert(name) {
            return Err(invalid(format!("duplicate feature '{}'", name)));
        }
        names.push(name.to_string());
    }

    tracing::debug!(path = %path.display(), features = names.len(), "loaded expected features");
    Ok(names)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::tempdir;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    fn write_card(dir: &Path, threshold: f64, version: &str) {
        let card = serde_json::json!({
            "target": "a_quitte_l_entreprise",
            "model_type": "logistic_regression",
            "classifier_params": {
                "alpha": 0.001, "max_iter": 10, "tol": 1e-6,
                "learning_rate": 0.5, "class_weight": "balanced"
            },
            "default_threshold": threshold,
            "train_size": 9,
            "test_size": 1,
            "n_expected_features": 3,
            "model_version": version,
            "created_at": "2024-01-01T00:00:00+00:00"
        });
        fs::write(dir.join(MODEL_CARD_FILE), card.to_string()).unwrap();
    }

    #[test]
    fn test_defaults() {
        let dir = tempdir().unwrap();
        let overrides = ServingOverrides {
            models_dir: Some(dir.path().to_path_buf()),
            ..Default::default()
        };
        let cfg = ServingConfig::resolve_with(&overrides, lookup(&[])).unwrap();
        assert_eq!(cfg.threshold, DEFAULT_THRESHOLD);
        assert_eq!(cfg.model_version, DEFAULT_MODEL_VERSION);
    }

    #[test]
    fn test_models_dir_from_env() {
        let dir = tempdir().unwrap();
        let path = dir.path().to_string_lossy().to_string();
        let cfg = ServingConfig::resolve_with(
            &ServingOverrides::default(),
            lookup(&[(MODELS_DIR_ENV, &path)]),
        )
        .unwrap();
        assert_eq!(cfg.models_dir, dir.path());
        assert_eq!(cfg.pipeline_path(), dir.path().join(PIPELINE_FILE));
    }

    #[test]
    fn test_precedence_explicit_env_card() {
        let dir = tempdir().unwrap();
        write_card(dir.path(), 0.3, "card-v1");
        let base = ServingOverrides {
            models_dir: Some(dir.path().to_path_buf()),
            ..Default::default()
        };

        let cfg = ServingConfig::resolve_with(&base, lookup(&[])).unwrap();
        assert_eq!(cfg.threshold, 0.3);
        assert_eq!(cfg.model_version, "card-v1");

        let env = lookup(&[(THRESHOLD_ENV, "0.4"), (MODEL_VERSION_ENV, "env-v2")]);
        let cfg = ServingConfig::resolve_with(&base, env).unwrap();
        assert_eq!(cfg.threshold, 0.4);
        assert_eq!(cfg.model_version, "env-v2");

        let explicit = ServingOverrides {
            threshold: Some(0.7),
            model_version: Some("cli-v3".to_string()),
            ..base
        };
        let env = lookup(&[(THRESHOLD_ENV, "0.4"), (MODEL_VERSION_ENV, "env-v2")]);
        let cfg = ServingConfig::resolve_with(&explicit, env).unwrap();
        assert_eq!(cfg.threshold, 0.7);
        assert_eq!(cfg.model_version, "cli-v3");
    }

    #[test]
    fn test_empty_env_is_unset() {
        let dir = tempdir().unwrap();
        let overrides = ServingOverrides {
            models_dir: Some(dir.path().to_path_buf()),
            ..Default::default()
        };
        let cfg =
            ServingConfig::resolve_with(&overrides, lookup(&[(THRESHOLD_ENV, "  ")])).unwrap();
        assert_eq!(cfg.threshold, DEFAULT_THRESHOLD);
    }

    #[test]
    fn test_bad_threshold() {
        let dir = tempdir().unwrap();
        let overrides = ServingOverrides {
            models_dir: Some(dir.path().to_path_buf()),
            ..Default::default()
        };
        for raw in ["abc", "1.5", "-0.1"] {
            let err = ServingConfig::resolve_with(&overrides, lookup(&[(THRESHOLD_ENV, raw)]))
                .unwrap_err();
            assert!(matches!(err, AttritionError::Config(_)), "{}", raw);
        }
    }

    #[test]
    fn test_load_expected_features() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(EXPECTED_FEATURES_FILE);

        fs::write(&path, r#"["age", "genre"]"#).unwrap();
        assert_eq!(load_expected_features(&path).unwrap(), vec!["age", "genre"]);

        for bad in [r#"{"age": 1}"#, r#"["age", 3]"#, r#"["age", "age"]"#, "not json"] {
            fs::write(&path, bad).unwrap();
            let err = load_expected_features(&path).unwrap_err();
            assert!(
                matches!(err, AttritionError::InvalidExpectedFeatures { .. }),
                "{}",
                bad
            );
        }
    }

    #[test]
    fn test_missing_expected_features_file() {
        let dir = tempdir().unwrap();
        let err = load_expected_features(&dir.path().join(EXPECTED_FEATURES_FILE)).unwrap_err();
        assert!(matches!(err, AttritionError::ArtifactNotFound(_)));
    }
}
