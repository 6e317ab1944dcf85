//! Model training commands

use anyhow::Result;
use colored::Colorize;
use saf_engine::training::{
    self, BoostingParams, ClassMetrics, ClassificationReport, GeneratorConfig, SyntheticRow,
    TrainingConfig,
};
use serde_json::json;
use std::path::Path;
use tabled::Tabled;

use crate::output::{format_percent, print_info, print_json, print_success, print_table, OutputFormat};

/// Row for the classification report table
#[derive(Tabled)]
struct ReportRow {
    #[tabled(rename = "Class")]
    class: String,
    #[tabled(rename = "Precision")]
    precision: String,
    #[tabled(rename = "Recall")]
    recall: String,
    #[tabled(rename = "F1")]
    f1: String,
    #[tabled(rename = "Support")]
    support: usize,
}

impl ReportRow {
    fn new(class: &str, metrics: &ClassMetrics) -> Self {
        Self {
            class: class.to_string(),
            precision: format!("{:.2}", metrics.precision),
            recall: format!("{:.2}", metrics.recall),
            f1: format!("{:.2}", metrics.f1),
            support: metrics.support,
        }
    }
}

#[derive(Tabled)]
struct RetrainRow {
    #[tabled(rename = "Iteration")]
    iteration: usize,
    #[tabled(rename = "Sample Seed")]
    seed: String,
    #[tabled(rename = "Accuracy")]
    accuracy: String,
}

fn dataset(samples: usize, seed: u64) -> Result<Vec<SyntheticRow>> {
    training::generate(&GeneratorConfig {
        samples,
        seed,
        ..Default::default()
    })
}

fn print_report(report: &ClassificationReport) {
    println!("{} {:.4}", "Accuracy:".bold(), report.accuracy);
    print_table(&[
        ReportRow::new("0 (declined)", &report.classes[0]),
        ReportRow::new("1 (chose SAF)", &report.classes[1]),
        ReportRow::new("macro avg", &report.macro_avg),
        ReportRow::new("weighted avg", &report.weighted_avg),
    ]);
}

/// Train on a fresh synthetic dataset and save the ensemble
pub fn train(
    samples: usize,
    seed: u64,
    boosting: BoostingParams,
    output: &Path,
    data_output: Option<&Path>,
    format: OutputFormat,
) -> Result<()> {
    let rows = dataset(samples, seed)?;
    if let Some(path) = data_output {
        training::write_csv(&rows, path)?;
    }

    let config = TrainingConfig {
        boosting,
        ..Default::default()
    };
    let model = training::train_model(&rows, &config)?;
    let checksum = training::save_ensemble(&model.ensemble, output)?;

    match format {
        OutputFormat::Json => print_json(&json!({
            "model_path": output.display().to_string(),
            "sha256": checksum,
            "train_rows": model.train_rows,
            "test_rows": model.test_set.len(),
            "trained_at": model.ensemble.metadata.as_ref().map(|m| m.trained_at.to_rfc3339()),
            "report": model.report,
        }))?,
        OutputFormat::Table => {
            if let Some(path) = data_output {
                print_info(&format!("Dataset written: {}", path.display()));
            }
            print_info(&format!(
                "Trained {} trees on {} rows, evaluated on {}",
                model.ensemble.trees.len(),
                model.train_rows,
                model.test_set.len()
            ));
            print_report(&model.report);
            print_success(&format!("Model saved: {}", output.display()));
            println!("SHA-256: {}", checksum.cyan());
        }
    }

    Ok(())
}

/// Refit on resampled subsets and report held-out accuracy per iteration
pub fn retrain(
    samples: usize,
    seed: u64,
    boosting: BoostingParams,
    iterations: usize,
    sample_size: usize,
    format: OutputFormat,
) -> Result<()> {
    let rows = dataset(samples, seed)?;
    let config = TrainingConfig {
        boosting,
        ..Default::default()
    };
    let model = training::train_model(&rows, &config)?;
    let steps = training::simulate_retraining(&rows, &model, &config, iterations, sample_size)?;

    match format {
        OutputFormat::Json => print_json(&steps)?,
        OutputFormat::Table => {
            println!("{}", "Retraining Simulation".bold());
            let table: Vec<RetrainRow> = steps
                .iter()
                .map(|step| RetrainRow {
                    iteration: step.iteration,
                    seed: step
                        .sample_seed
                        .map_or_else(|| "initial".to_string(), |s| s.to_string()),
                    accuracy: format_percent(step.accuracy),
                })
                .collect();
            print_table(&table);
        }
    }

    Ok(())
}
