//! Shared test utilities and fixture generators

#![allow(dead_code)]

use polars::prelude::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::path::PathBuf;
use tempfile::TempDir;

use attrisk::model::train::{export_artifacts, train_pipeline, TrainConfig, TrainedModel};
use attrisk::pipeline::features::add_engineered_features;
use attrisk::serving::{FeatureValue, Payload};

pub const TARGET: &str = "a_quitte_l_entreprise";

/// Create a raw HR extract the way it arrives from the source systems
///
/// This DataFrame includes:
/// - `a_quitte_l_entreprise`: "Oui"/"Non", driven by overtime and satisfaction
/// - `genre`: "F"/"M"
/// - `heure_supplementaires`: "Oui"/"Non"
/// - `augmentation_salaire_precedente`: percentage strings such as "11 %"
/// - `nombre_heures_travailless`: constant, dropped by feature engineering
/// - experience columns that always satisfy total >= tenure >= role, with at
///   least one year of total experience so no derived ratio is missing
pub fn create_raw_hr_dataframe(rows: usize, seed: u64) -> DataFrame {
    let mut rng = StdRng::seed_from_u64(seed);

    let mut id = Vec::with_capacity(rows);
    let mut age = Vec::with_capacity(rows);
    let mut genre = Vec::with_capacity(rows);
    let mut revenu = Vec::with_capacity(rows);
    let mut statut = Vec::with_capacity(rows);
    let mut departement = Vec::with_capacity(rows);
    let mut poste = Vec::with_capacity(rows);
    let mut previous = Vec::with_capacity(rows);
    let mut total_exp = Vec::with_capacity(rows);
    let mut tenure = Vec::with_capacity(rows);
    let mut role = Vec::with_capacity(rows);
    let mut satisfaction = Vec::with_capacity(rows);
    let mut note_prev = Vec::with_capacity(rows);
    let mut note_curr = Vec::with_capacity(rows);
    let mut level = Vec::with_capacity(rows);
    let mut overtime = Vec::with_capacity(rows);
    let mut raise = Vec::with_capacity(rows);
    let mut distance = Vec::with_capacity(rows);
    let mut travel = Vec::with_capacity(rows);
    let mut hours = Vec::with_capacity(rows);
    let mut left = Vec::with_capacity(rows);

    let statuses = ["Celibataire", "Marie", "Divorce"];
    let departments = ["Commercial", "Consulting", "Ressources Humaines"];
    let roles = ["Consultant", "Manager", "Cadre Commercial", "Tech Lead"];
    let travels = ["Aucun", "Occasionnel", "Frequent"];

    for i in 0..rows {
        let a: i64 = rng.gen_range(20..60);
        let exp: i64 = rng.gen_range(1..=(a - 18));
        let ten: i64 = rng.gen_range(0..=exp);
        let rol: i64 = rng.gen_range(0..=ten);
        let sat: i64 = rng.gen_range(1..=4);
        let ot = rng.gen_bool(0.3);

        let mut p_leave = 0.08;
        if ot {
            p_leave += 0.45;
        }
        if sat == 1 {
            p_leave += 0.25;
        }
        let leaves = match i {
            0 => true,
            1 => false,
            _ => rng.gen_bool(p_leave),
        };

        id.push(i as i64 + 1);
        age.push(a);
        genre.push(if rng.gen_bool(0.5) { "F" } else { "M" });
        revenu.push(rng.gen_range(1500.0..15000.0f64).round());
        statut.push(statuses[rng.gen_range(0..statuses.len())]);
        departement.push(departments[rng.gen_range(0..departments.len())]);
        poste.push(roles[rng.gen_range(0..roles.len())]);
        previous.push(rng.gen_range(0..6i64));
        total_exp.push(exp);
        tenure.push(ten);
        role.push(rol);
        satisfaction.push(sat);
        note_prev.push(rng.gen_range(1..=4i64));
        note_curr.push(rng.gen_range(1..=4i64));
        level.push(rng.gen_range(1..=5i64));
        overtime.push(if ot { "Oui" } else { "Non" });
        raise.push(format!("{} %", rng.gen_range(11..=25)));
        distance.push(rng.gen_range(1..30i64));
        travel.push(travels[rng.gen_range(0..travels.len())]);
        hours.push(80i64);
        left.push(if leaves { "Oui" } else { "Non" });
    }

    df! {
        "id_employee" => id,
        "age" => age,
        "genre" => genre,
        "revenu_mensuel" => revenu,
        "statut_marital" => statut,
        "departement" => departement,
        "poste" => poste,
        "nombre_experiences_precedentes" => previous,
        "annee_experience_totale" => total_exp,
        "annees_dans_l_entreprise" => tenure,
        "annees_dans_le_poste_actuel" => role,
        "satisfaction_employee_environnement" => satisfaction,
        "note_evaluation_precedente" => note_prev,
        "note_evaluation_actuelle" => note_curr,
        "niveau_hierarchique_poste" => level,
        "heure_supplementaires" => overtime,
        "augmentation_salaire_precedente" => raise,
        "distance_domicile_travail" => distance,
        "frequence_deplacement" => travel,
        "nombre_heures_travailless" => hours,
        "a_quitte_l_entreprise" => left,
    }
    .unwrap()
}

/// Raw extract passed through feature engineering
pub fn create_processed_dataframe(rows: usize, seed: u64) -> DataFrame {
    add_engineered_features(&create_raw_hr_dataframe(rows, seed)).unwrap()
}

/// Create a temporary directory with a test CSV file
pub fn create_temp_csv(df: &mut DataFrame) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let csv_path = temp_dir.path().join("test_data.csv");

    let mut file = std::fs::File::create(&csv_path).unwrap();
    CsvWriter::new(&mut file).finish(df).unwrap();

    (temp_dir, csv_path)
}

/// Build a payload from one row of a table, nulls included
pub fn payload_from_row(df: &DataFrame, row: usize) -> Payload {
    let mut payload = Payload::new();
    for column in df.get_columns() {
        let value = match column.get(row).unwrap() {
            AnyValue::Null => FeatureValue::Missing,
            AnyValue::Boolean(b) => FeatureValue::Bool(b),
            AnyValue::Int32(v) => FeatureValue::Int(v as i64),
            AnyValue::Int64(v) => FeatureValue::Int(v),
            AnyValue::Float64(v) => FeatureValue::Float(v),
            AnyValue::String(s) => FeatureValue::Str(s.to_string()),
            other => FeatureValue::Str(other.to_string()),
        };
        payload.insert(column.name().to_string(), value);
    }
    payload
}

/// A complete payload for the processed layout, typed the way a human would
pub fn human_payload() -> Payload {
    let entries: Vec<(&str, FeatureValue)> = vec![
        ("id_employee", 9999i64.into()),
        ("age", 35i64.into()),
        ("genre", "Homme".into()),
        ("revenu_mensuel", 5000.0.into()),
        ("statut_marital", "Marie".into()),
        ("departement", "Consulting".into()),
        ("poste", "Consultant".into()),
        ("nombre_experiences_precedentes", 2i64.into()),
        ("annee_experience_totale", 10i64.into()),
        ("annees_dans_l_entreprise", 5i64.into()),
        ("annees_dans_le_poste_actuel", 3i64.into()),
        ("satisfaction_employee_environnement", 2i64.into()),
        ("note_evaluation_precedente", 3i64.into()),
        ("note_evaluation_actuelle", 3i64.into()),
        ("niveau_hierarchique_poste", 2i64.into()),
        ("heure_supplementaires", "Oui".into()),
        ("augmentation_salaire_precedente", "11 %".into()),
        ("distance_domicile_travail", 12i64.into()),
        ("frequence_deplacement", "Occasionnel".into()),
        ("changement_poste", 1i64.into()),
        ("proba_chgt_experience_par_an", 0.2.into()),
        ("proba_chgt_experience_par_an_adulte", (2.0 / 17.0).into()),
        ("ratio_experience_vie_adulte", (10.0 / 17.0).into()),
        ("evolution_note", 0.0.into()),
    ];
    entries
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect()
}

/// Train on `df` with default settings and export the artifacts to a temp dir
pub fn train_and_export(df: &DataFrame) -> (TempDir, TrainedModel) {
    let temp_dir = TempDir::new().unwrap();
    let model = train_pipeline(df, &TrainConfig::default()).unwrap();
    export_artifacts(&model, temp_dir.path()).unwrap();
    (temp_dir, model)
}
