//! Subcommand runners

use std::fs;
use std::path::Path;
use std::time::Instant;

use anyhow::{Context, Result};
use console::style;

use super::args::{features_output_path, PredictArgs, TrainArgs};
use super::prompts::confirm_overwrite;
use crate::error::AttritionError;
use crate::model::train::{export_artifacts, train_pipeline, ArtifactPaths, TrainConfig};
use crate::pipeline::features::{add_engineered_features, compute_incoherence_metrics};
use crate::pipeline::groups::classify_columns;
use crate::pipeline::loader::{dataset_stats, load_dataset, save_dataset};
use crate::report::summary::{
    display_groups, display_incoherence, display_predictions, PredictionRow, TrainingSummary,
};
use crate::serving::config::ServingConfig;
use crate::serving::payload::Payload;
use crate::serving::service::Predictor;
use crate::utils::{
    create_spinner, finish_with_success, finish_with_warning, print_banner, print_completion,
    print_info, print_step_header, print_success, print_train_config, print_warning,
};

fn print_dataset_stats(df: &polars::prelude::DataFrame) {
    let stats = dataset_stats(df);
    println!("\n    {} Dataset Statistics:", style("✧").cyan());
    println!("      Rows: {}", stats.rows);
    println!("      Columns: {}", stats.columns);
    println!("      Estimated memory: {:.2} MB", stats.memory_mb);
}

/// `features`: engineer features and write the processed table
pub fn run_features(input: &Path, output: Option<&Path>) -> Result<()> {
    print_banner(env!("CARGO_PKG_VERSION"));
    let output = features_output_path(input, output);

    print_step_header(1, "Load Raw Data");
    let df = load_dataset(input)
        .with_context(|| format!("Failed to load dataset: {}", input.display()))?;
    print_dataset_stats(&df);

    print_step_header(2, "Feature Engineering");
    let spinner = create_spinner("Cleaning values and deriving features...");
    let mut engineered = add_engineered_features(&df)?;
    finish_with_success(&spinner, "Features engineered");
    print_info(&format!(
        "{} columns in, {} columns out",
        df.width(),
        engineered.width()
    ));

    let metrics = compute_incoherence_metrics(&engineered)?;
    display_incoherence(&metrics);

    print_step_header(3, "Save");
    save_dataset(&mut engineered, &output)
        .with_context(|| format!("Failed to write {}", output.display()))?;
    print_success(&format!("Wrote {}", output.display()));

    print_completion("Feature engineering complete!");
    Ok(())
}

/// `groups`: print the column groups of a processed table
pub fn run_groups(input: &Path, target: &str) -> Result<()> {
    let df = load_dataset(input)
        .with_context(|| format!("Failed to load dataset: {}", input.display()))?;
    let groups = classify_columns(&df, target)?;
    display_groups(&groups);

    let grouped = groups.all_columns();
    let unclaimed: Vec<String> = df
        .get_column_names()
        .iter()
        .map(|s| s.to_string())
        .filter(|c| c != target && !grouped.contains(&c.as_str()))
        .collect();
    if !unclaimed.is_empty() {
        println!();
        print_warning(&format!(
            "{} column(s) not used by the model: {}",
            unclaimed.len(),
            unclaimed.join(", ")
        ));
    }
    Ok(())
}

/// `train`: fit the model and export artifacts
pub fn run_train(args: &TrainArgs) -> Result<()> {
    print_banner(env!("CARGO_PKG_VERSION"));
    print_train_config(
        &args.input,
        &args.target,
        &args.models_dir,
        args.test_size,
        args.threshold,
    );

    let paths = ArtifactPaths::in_dir(&args.models_dir);
    let existing = paths.existing();
    if !existing.is_empty() && !args.no_confirm && !confirm_overwrite(&existing)? {
        println!("Cancelled by user.");
        return Ok(());
    }

    print_step_header(1, "Load Data");
    let step_start = Instant::now();
    let mut df = load_dataset(&args.input)
        .with_context(|| format!("Failed to load dataset: {}", args.input.display()))?;
    if args.raw {
        df = add_engineered_features(&df)?;
        print_info("Applied feature engineering to the raw input");
    }
    print_dataset_stats(&df);
    print_info(&format!("Loaded in {:.2?}", step_start.elapsed()));

    print_step_header(2, "Train");
    let config = TrainConfig {
        target: args.target.clone(),
        test_size: args.test_size,
        seed: args.seed,
        threshold: args.threshold,
        alpha: args.alpha,
        max_iter: args.max_iter,
        model_version: args.model_version.clone(),
        ..TrainConfig::default()
    };
    let spinner = create_spinner("Fitting preprocessor and classifier...");
    let model = train_pipeline(&df, &config).context("Training failed")?;
    if model.ignored_rows > 0 {
        finish_with_warning(
            &spinner,
            &format!(
                "Model trained; {} rows with an unusable target were skipped",
                model.ignored_rows
            ),
        );
    } else {
        finish_with_success(&spinner, "Model trained");
    }

    display_groups(&model.groups);
    TrainingSummary::from_trained(&model).display();

    print_step_header(3, "Export Artifacts");
    let written = export_artifacts(&model, &args.models_dir).with_context(|| {
        format!("Failed to export artifacts to {}", args.models_dir.display())
    })?;
    for path in written.all() {
        print_success(&format!("Wrote {}", path.display()));
    }

    print_completion("Training complete!");
    Ok(())
}

/// Parse a payload file holding one object or an array of objects
pub fn read_payloads(path: &Path) -> Result<Vec<Payload>> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read payload file: {}", path.display()))?;
    let value: serde_json::Value = serde_json::from_str(&text)
        .with_context(|| format!("Invalid JSON in {}", path.display()))?;

    let items = match value {
        serde_json::Value::Array(items) => items,
        object @ serde_json::Value::Object(_) => vec![object],
        _ => anyhow::bail!("Payload must be a JSON object or an array of objects"),
    };

    items
        .into_iter()
        .enumerate()
        .map(|(i, item)| {
            serde_json::from_value(item).with_context(|| format!("Record {} is not an object", i))
        })
        .collect()
}

/// `predict`: score payloads with the exported artifacts
pub fn run_predict(args: &PredictArgs) -> Result<()> {
    let config = ServingConfig::resolve(&args.overrides())?;
    let predictor = Predictor::load(config).context("Failed to load model artifacts")?;
    let payloads = read_payloads(&args.payload)?;

    let rows: Vec<PredictionRow> = predictor
        .predict_batch(&payloads)
        .into_iter()
        .map(|result| match result {
            Ok(prediction) => PredictionRow::Scored(prediction),
            Err(AttritionError::IncompletePayload { missing, nulls }) => {
                PredictionRow::Rejected { missing, nulls }
            }
            Err(e) => PredictionRow::Failed(e.to_string()),
        })
        .collect();

    if args.json {
        let output: Vec<serde_json::Value> = rows
            .iter()
            .map(|row| match row {
                PredictionRow::Scored(p) => serde_json::to_value(p),
                PredictionRow::Rejected { missing, nulls } => Ok(serde_json::json!({
                    "error": "incomplete payload",
                    "missing": missing,
                    "nulls": nulls,
                })),
                PredictionRow::Failed(message) => Ok(serde_json::json!({ "error": message })),
            })
            .collect::<serde_json::Result<_>>()?;
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        display_predictions(&rows);
    }

    let scored = rows
        .iter()
        .filter(|r| matches!(r, PredictionRow::Scored(_)))
        .count();
    tracing::info!(records = rows.len(), scored, "prediction run finished");
    Ok(())
}
