//! Command-line argument definitions using clap

use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};

use crate::pipeline::features::ATTRITION;
use crate::serving::config::{
    ServingOverrides, DEFAULT_MODELS_DIR, MODELS_DIR_ENV, MODEL_VERSION_ENV, THRESHOLD_ENV,
};

/// attrisk - Employee attrition risk scoring
#[derive(Parser, Debug)]
#[command(name = "attrisk")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Clean a raw HR extract and add engineered features
    Features {
        /// Raw input file (CSV or Parquet)
        #[arg(short, long)]
        input: PathBuf,

        /// Output file (CSV or Parquet, determined by extension).
        /// Defaults to the input directory with a '_features' suffix.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show the column groups and ordinal orders of a processed table
    Groups {
        /// Processed input file (CSV or Parquet)
        #[arg(short, long)]
        input: PathBuf,

        /// Target column, excluded from every group
        #[arg(short, long, default_value = ATTRITION)]
        target: String,
    },

    /// Train the attrition model and export its artifacts
    Train(TrainArgs),

    /// Score one JSON payload or an array of payloads
    Predict(PredictArgs),
}

#[derive(Args, Debug)]
pub struct TrainArgs {
    /// Processed input file (CSV or Parquet)
    #[arg(short, long)]
    pub input: PathBuf,

    /// Target column name
    #[arg(short, long, default_value = ATTRITION)]
    pub target: String,

    /// Run feature engineering on the input before training
    #[arg(long, default_value = "false")]
    pub raw: bool,

    /// Directory receiving the artifacts
    #[arg(long, env = MODELS_DIR_ENV, default_value = DEFAULT_MODELS_DIR)]
    pub models_dir: PathBuf,

    /// Decision threshold recorded in the model card
    #[arg(long, default_value = "0.5", value_parser = validate_probability)]
    pub threshold: f64,

    /// Share of rows held out for evaluation
    #[arg(long, default_value = "0.1", value_parser = validate_test_size)]
    pub test_size: f64,

    /// Seed of the stratified split
    #[arg(long, default_value = "42")]
    pub seed: u64,

    /// Maximum gradient descent iterations
    #[arg(long, default_value = "2000")]
    pub max_iter: usize,

    /// L2 regularization strength
    #[arg(long, default_value = "0.001")]
    pub alpha: f64,

    /// Version string recorded in the model card
    #[arg(long, env = MODEL_VERSION_ENV, default_value = "dev")]
    pub model_version: String,

    /// Skip interactive confirmation prompts
    #[arg(long, default_value = "false")]
    pub no_confirm: bool,
}

#[derive(Args, Debug)]
pub struct PredictArgs {
    /// JSON file holding one object or an array of objects
    #[arg(short, long)]
    pub payload: PathBuf,

    /// Directory holding the artifacts
    #[arg(long, env = MODELS_DIR_ENV)]
    pub models_dir: Option<PathBuf>,

    /// Decision threshold (defaults to the model card value)
    #[arg(long, env = THRESHOLD_ENV, value_parser = validate_probability)]
    pub threshold: Option<f64>,

    /// Model version reported with each prediction
    #[arg(long, env = MODEL_VERSION_ENV)]
    pub model_version: Option<String>,

    /// Print predictions as JSON instead of a table
    #[arg(long, default_value = "false")]
    pub json: bool,
}

impl PredictArgs {
    pub fn overrides(&self) -> ServingOverrides {
        ServingOverrides {
            models_dir: self.models_dir.clone(),
            threshold: self.threshold,
            model_version: self.model_version.clone(),
        }
    }
}

/// Default output path for the `features` command: `<stem>_features.<ext>`
pub fn features_output_path(input: &Path, output: Option<&Path>) -> PathBuf {
    if let Some(output) = output {
        return output.to_path_buf();
    }
    let parent = input.parent().unwrap_or_else(|| Path::new("."));
    let stem = input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("output");
    let extension = input
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("parquet");
    parent.join(format!("{}_features.{}", stem, extension))
}

fn parse_number(s: &str) -> Result<f64, String> {
    s.trim()
        .parse()
        .map_err(|_| format!("'{}' is not a valid number", s))
}

/// Validator for probability thresholds
fn validate_probability(s: &str) -> Result<f64, String> {
    let value = parse_number(s)?;
    if !(0.0..=1.0).contains(&value) {
        Err(format!("threshold must be between 0.0 and 1.0, got {}", value))
    } else {
        Ok(value)
    }
}

/// Validator for the held-out share
fn validate_test_size(s: &str) -> Result<f64, String> {
    let value = parse_number(s)?;
    if value <= 0.0 || value >= 1.0 {
        Err(format!(
            "test_size must be strictly between 0.0 and 1.0, got {}",
            value
        ))
    } else {
        Ok(value)
    }
}
