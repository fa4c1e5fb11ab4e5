//! Terminal summaries for training, grouping and prediction results

use comfy_table::{presets::UTF8_FULL_CONDENSED, Attribute, Cell, Color, Table};
use console::style;

use crate::model::metrics::SplitMetrics;
use crate::model::train::TrainedModel;
use crate::pipeline::features::IncoherenceMetrics;
use crate::pipeline::groups::{FeatureGroups, GroupKind};
use crate::serving::service::Prediction;

fn print_section(icon: &str, title: &str) {
    println!();
    println!("    {} {}", style(icon).cyan(), style(title).white().bold());
    println!("    {}", style("─".repeat(50)).dim());
    println!();
}

fn print_indented(table: &Table) {
    for line in table.to_string().lines() {
        println!("    {}", line);
    }
}

fn metric_cell(value: Option<f64>) -> Cell {
    match value {
        Some(v) => {
            let color = if v >= 0.8 {
                Color::Green
            } else if v >= 0.6 {
                Color::Yellow
            } else {
                Color::Red
            };
            Cell::new(format!("{:.3}", v)).fg(color)
        }
        None => Cell::new("n/a").fg(Color::DarkGrey),
    }
}

fn header(names: &[&str]) -> Vec<Cell> {
    names
        .iter()
        .map(|n| Cell::new(n).add_attribute(Attribute::Bold))
        .collect()
}

/// Summary of one training run
#[derive(Debug)]
pub struct TrainingSummary {
    pub expected_features: usize,
    pub model_inputs: usize,
    pub design_columns: usize,
    pub ignored_rows: usize,
    pub train: SplitMetrics,
    pub test: SplitMetrics,
}

impl TrainingSummary {
    pub fn from_trained(model: &TrainedModel) -> Self {
        let pre = &model.pipeline.preprocessor;
        Self {
            expected_features: model.expected_features.len(),
            model_inputs: pre.columns().len(),
            design_columns: pre.output_width(),
            ignored_rows: model.ignored_rows,
            train: model.train_metrics.clone(),
            test: model.test_metrics.clone(),
        }
    }

    pub fn table(&self) -> Table {
        let mut table = Table::new();
        table.load_preset(UTF8_FULL_CONDENSED);
        table.set_header(header(&["Metric", "Train", "Test"]));

        table.add_row(vec![
            Cell::new("Rows"),
            Cell::new(self.train.rows),
            Cell::new(self.test.rows),
        ]);
        table.add_row(vec![
            Cell::new("Leavers"),
            Cell::new(self.train.positives),
            Cell::new(self.test.positives),
        ]);
        table.add_row(vec![
            Cell::new("Average precision"),
            metric_cell(self.train.average_precision),
            metric_cell(self.test.average_precision),
        ]);
        table.add_row(vec![
            Cell::new("ROC AUC"),
            metric_cell(self.train.roc_auc),
            metric_cell(self.test.roc_auc),
        ]);
        table.add_row(vec![
            Cell::new(format!("TP / FP @ {:.2}", self.test.threshold)),
            Cell::new(format!(
                "{} / {}",
                self.train.confusion.true_positives, self.train.confusion.false_positives
            )),
            Cell::new(format!(
                "{} / {}",
                self.test.confusion.true_positives, self.test.confusion.false_positives
            )),
        ]);
        table.add_row(vec![
            Cell::new(format!("FN / TN @ {:.2}", self.test.threshold)),
            Cell::new(format!(
                "{} / {}",
                self.train.confusion.false_negatives, self.train.confusion.true_negatives
            )),
            Cell::new(format!(
                "{} / {}",
                self.test.confusion.false_negatives, self.test.confusion.true_negatives
            )),
        ]);
        table
    }

    pub fn display(&self) {
        print_section("📋", "TRAINING SUMMARY");
        println!(
            "    {} expected features, {} used by the model, {} design columns",
            style(self.expected_features).cyan().bold(),
            style(self.model_inputs).cyan().bold(),
            style(self.design_columns).cyan().bold()
        );
        if self.ignored_rows > 0 {
            println!(
                "    {} rows skipped for an unmappable target",
                style(self.ignored_rows).yellow().bold()
            );
        }
        println!();
        print_indented(&self.table());
    }
}

/// Table of the column groups and their ordinal orders
pub fn groups_table(groups: &FeatureGroups) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    table.set_header(header(&["Group", "Columns"]));

    for kind in GroupKind::ALL {
        let columns = groups.columns(kind);
        if columns.is_empty() {
            continue;
        }
        let listing = if kind == GroupKind::Ordinal {
            columns
                .iter()
                .zip(&groups.ord_categories)
                .map(|(name, order)| format!("{} [{}]", name, order.join(" < ")))
                .collect::<Vec<_>>()
                .join("\n")
        } else {
            columns.join("\n")
        };
        table.add_row(vec![
            Cell::new(kind.to_string()).fg(Color::Cyan),
            Cell::new(listing),
        ]);
    }
    table
}

pub fn display_groups(groups: &FeatureGroups) {
    print_section("🗂️", "COLUMN GROUPS");
    print_indented(&groups_table(groups));
}

/// Table of data-quality checks on an engineered table
pub fn incoherence_table(metrics: &IncoherenceMetrics) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    table.set_header(header(&["Check", "Value"]));

    let pct = |v: Option<f64>| v.map_or("n/a".to_string(), |r| format!("{:.1}%", r * 100.0));

    table.add_row(vec![
        Cell::new("Experience hierarchy violations"),
        Cell::new(
            metrics
                .hierarchy_violations
                .map_or("n/a".to_string(), |n| n.to_string()),
        ),
    ]);
    table.add_row(vec![
        Cell::new("Violation ratio"),
        Cell::new(pct(metrics.hierarchy_violation_ratio)),
    ]);
    table.add_row(vec![
        Cell::new("Experience gap without previous employer"),
        Cell::new(pct(metrics.experience_gap_without_previous_ratio)),
    ]);
    table
}

pub fn display_incoherence(metrics: &IncoherenceMetrics) {
    print_section("🔎", "DATA COHERENCE");
    print_indented(&incoherence_table(metrics));
}

/// Outcome of scoring one record
#[derive(Debug)]
pub enum PredictionRow {
    Scored(Prediction),
    Rejected { missing: Vec<String>, nulls: Vec<String> },
    Failed(String),
}

pub fn predictions_table(rows: &[PredictionRow]) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    table.set_header(header(&["#", "Probability", "Decision", "Details"]));

    for (i, row) in rows.iter().enumerate() {
        let cells = match row {
            PredictionRow::Scored(p) => vec![
                Cell::new(i),
                Cell::new(format!("{:.4}", p.probability)),
                Cell::new(if p.decision == 1 { "leave" } else { "stay" }).fg(
                    if p.decision == 1 {
                        Color::Red
                    } else {
                        Color::Green
                    },
                ),
                Cell::new(format!("threshold {:.2}, model {}", p.threshold, p.model_version)),
            ],
            PredictionRow::Rejected { missing, nulls } => {
                let mut details = Vec::new();
                if !missing.is_empty() {
                    details.push(format!("missing: {}", missing.join(", ")));
                }
                if !nulls.is_empty() {
                    details.push(format!("null: {}", nulls.join(", ")));
                }
                vec![
                    Cell::new(i),
                    Cell::new("-"),
                    Cell::new("rejected").fg(Color::Yellow),
                    Cell::new(details.join("\n")),
                ]
            }
            PredictionRow::Failed(message) => vec![
                Cell::new(i),
                Cell::new("-"),
                Cell::new("error").fg(Color::Red),
                Cell::new(message),
            ],
        };
        table.add_row(cells);
    }
    table
}

pub fn display_predictions(rows: &[PredictionRow]) {
    print_section("🎯", "PREDICTIONS");
    print_indented(&predictions_table(rows));
}
