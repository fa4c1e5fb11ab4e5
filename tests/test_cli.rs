//! Tests for CLI argument parsing and end-to-end subcommand runs

#[path = "common/mod.rs"]
mod common;

use assert_cmd::Command;
use attrisk::cli::{Cli, Commands};
use attrisk::model::train::ArtifactPaths;
use attrisk::pipeline::loader::load_dataset;
use clap::Parser;
use common::*;
use predicates::prelude::*;
use std::path::{Path, PathBuf};

const SERVING_ENV: [&str; 3] = ["ATTRISK_MODELS_DIR", "MODEL_THRESHOLD", "MODEL_VERSION"];

fn attrisk() -> Command {
    let mut cmd = Command::cargo_bin("attrisk").unwrap();
    for key in SERVING_ENV {
        cmd.env_remove(key);
    }
    cmd
}

fn train_into(input: &Path, models_dir: &Path) {
    attrisk()
        .args(["train", "--no-confirm", "-i"])
        .arg(input)
        .arg("--models-dir")
        .arg(models_dir)
        .assert()
        .success();
}

#[test]
fn test_train_default_values() {
    let cli = Cli::parse_from(["attrisk", "train", "-i", "data.csv"]);
    let Commands::Train(args) = cli.command else {
        panic!("expected the train subcommand");
    };

    assert_eq!(args.target, "a_quitte_l_entreprise");
    assert_eq!(args.threshold, 0.5, "Default threshold should be 0.5");
    assert_eq!(args.test_size, 0.1, "Default test size should be 0.1");
    assert_eq!(args.seed, 42);
    assert_eq!(args.max_iter, 2000);
    assert!(!args.raw);
    assert!(!args.no_confirm, "Default no_confirm should be false");
}

#[test]
fn test_train_custom_values() {
    let cli = Cli::parse_from([
        "attrisk",
        "train",
        "-i",
        "data.parquet",
        "--raw",
        "--threshold",
        "0.35",
        "--test-size",
        "0.2",
        "--seed",
        "7",
        "--models-dir",
        "out/models",
        "--model-version",
        "2026.10",
    ]);
    let Commands::Train(args) = cli.command else {
        panic!("expected the train subcommand");
    };

    assert!(args.raw);
    assert_eq!(args.threshold, 0.35);
    assert_eq!(args.test_size, 0.2);
    assert_eq!(args.seed, 7);
    assert_eq!(args.models_dir, PathBuf::from("out/models"));
    assert_eq!(args.model_version, "2026.10");
}

#[test]
fn test_train_rejects_invalid_threshold() {
    let result = Cli::try_parse_from(["attrisk", "train", "-i", "data.csv", "--threshold", "1.5"]);
    assert!(result.is_err(), "threshold > 1.0 should be rejected");

    let result = Cli::try_parse_from(["attrisk", "train", "-i", "data.csv", "--test-size", "1"]);
    assert!(result.is_err(), "test size of 1 should be rejected");
}

#[test]
fn test_predict_overrides() {
    let cli = Cli::parse_from([
        "attrisk",
        "predict",
        "-p",
        "payload.json",
        "--threshold",
        "0.4",
        "--json",
    ]);
    let Commands::Predict(args) = cli.command else {
        panic!("expected the predict subcommand");
    };

    assert!(args.json);
    let overrides = args.overrides();
    assert_eq!(overrides.threshold, Some(0.4));
    assert_eq!(overrides.model_version, None);
}

#[test]
fn test_features_and_groups_parse() {
    let cli = Cli::parse_from(["attrisk", "features", "-i", "raw.csv", "-o", "out.parquet"]);
    match cli.command {
        Commands::Features { input, output } => {
            assert_eq!(input, PathBuf::from("raw.csv"));
            assert_eq!(output, Some(PathBuf::from("out.parquet")));
        }
        _ => panic!("expected the features subcommand"),
    }

    let cli = Cli::parse_from(["attrisk", "groups", "-i", "processed.csv"]);
    match cli.command {
        Commands::Groups { target, .. } => assert_eq!(target, "a_quitte_l_entreprise"),
        _ => panic!("expected the groups subcommand"),
    }
}

#[test]
fn test_missing_subcommand_is_error() {
    assert!(Cli::try_parse_from(["attrisk"]).is_err());
}

#[test]
fn test_features_command_writes_output() {
    let mut raw = create_raw_hr_dataframe(60, 12);
    let (dir, input) = create_temp_csv(&mut raw);
    let output = dir.path().join("processed.csv");

    attrisk()
        .args(["features", "-i"])
        .arg(&input)
        .arg("-o")
        .arg(&output)
        .assert()
        .success();

    let processed = load_dataset(&output).unwrap();
    assert_eq!(processed.height(), 60);
    assert!(processed.column("nombre_heures_travailless").is_err());
    assert!(processed.column("changement_poste").is_ok());
}

#[test]
fn test_groups_command_lists_groups() {
    let mut df = create_processed_dataframe(60, 12);
    let (_dir, input) = create_temp_csv(&mut df);

    attrisk()
        .args(["groups", "-i"])
        .arg(&input)
        .assert()
        .success()
        .stdout(predicate::str::contains("statut_marital"))
        .stdout(predicate::str::contains("id_employee"));
}

#[test]
fn test_train_then_predict_json() {
    let mut df = create_processed_dataframe(200, 1);
    let (dir, input) = create_temp_csv(&mut df);
    let models_dir = dir.path().join("models");

    train_into(&input, &models_dir);
    for path in ArtifactPaths::in_dir(&models_dir).all() {
        assert!(path.is_file(), "{} not written", path.display());
    }

    let mut incomplete = human_payload();
    incomplete.remove("age");
    let payload_path = dir.path().join("payloads.json");
    std::fs::write(
        &payload_path,
        serde_json::to_string(&vec![human_payload(), incomplete]).unwrap(),
    )
    .unwrap();

    attrisk()
        .args(["predict", "--json", "-p"])
        .arg(&payload_path)
        .arg("--models-dir")
        .arg(&models_dir)
        .assert()
        .success()
        .stdout(predicate::str::contains("\"probability\""))
        .stdout(predicate::str::contains("\"model_version\": \"dev\""))
        .stdout(predicate::str::contains("incomplete payload"));
}

#[test]
fn test_train_from_raw_extract() {
    let mut raw = create_raw_hr_dataframe(200, 1);
    let (dir, input) = create_temp_csv(&mut raw);
    let models_dir = dir.path().join("models");

    attrisk()
        .args(["train", "--raw", "--no-confirm", "-i"])
        .arg(&input)
        .arg("--models-dir")
        .arg(&models_dir)
        .assert()
        .success();

    assert!(ArtifactPaths::in_dir(&models_dir).pipeline.is_file());
}

#[test]
fn test_predict_without_artifacts_fails() {
    let dir = tempfile::tempdir().unwrap();
    let payload_path = dir.path().join("payload.json");
    std::fs::write(&payload_path, serde_json::to_string(&human_payload()).unwrap()).unwrap();

    attrisk()
        .args(["predict", "-p"])
        .arg(&payload_path)
        .arg("--models-dir")
        .arg(dir.path().join("nowhere"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to load model artifacts"));
}
