//! Offline training pipeline
//!
//! Generates the synthetic passenger dataset, fits the boosted ensemble the
//! server loads, and runs the retraining and miles-rate analyses.

mod boosting;
mod dataset;
mod evaluation;

pub use boosting::{fit, BoostingParams};
pub use dataset::{
    chose_saf, generate, sample_rows, train_test_split, write_csv, GeneratorConfig, SyntheticRow,
    TrainingMatrix, ACCEPTED_PREMIUM, CSV_HEADER, DISTANCES_KM, GOLD_MILES_THRESHOLD, PREMIUMS,
};
pub use evaluation::{accuracy, classification_report, ClassMetrics, ClassificationReport};

use crate::classifier::{compute_checksum, EnsembleMetadata, TreeEnsemble};
use crate::encoder::Vocabularies;
use crate::pricing::{self, SafMilesParams};
use anyhow::{bail, Context, Result};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

/// Probability above which a row is predicted to choose SAF
pub const DECISION_THRESHOLD: f64 = 0.5;

/// Settings for one training run
#[derive(Debug, Clone)]
pub struct TrainingConfig {
    pub boosting: BoostingParams,
    pub test_fraction: f64,
    pub split_seed: u64,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            boosting: BoostingParams::default(),
            test_fraction: 0.2,
            split_seed: 42,
        }
    }
}

/// A fitted ensemble with its held-out evaluation
#[derive(Debug, Clone)]
pub struct TrainedModel {
    pub ensemble: TreeEnsemble,
    pub report: ClassificationReport,
    pub train_rows: usize,
    /// Held-out rows, kept for retraining evaluation
    pub test_set: TrainingMatrix,
}

/// Accuracy after one retraining round; iteration 0 is the initial model
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RetrainingStep {
    pub iteration: usize,
    pub sample_seed: Option<u64>,
    pub accuracy: f64,
}

/// Total dataset profit at one miles rate
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KProfit {
    pub k: f64,
    pub total_profit: f64,
}

fn predict_labels(ensemble: &TreeEnsemble, matrix: &TrainingMatrix) -> Vec<bool> {
    matrix
        .rows
        .iter()
        .map(|row| ensemble.predict_row(row) > DECISION_THRESHOLD)
        .collect()
}

/// Split, fit and evaluate on the held-out rows
pub fn train_model(rows: &[SyntheticRow], config: &TrainingConfig) -> Result<TrainedModel> {
    if rows.is_empty() {
        bail!("Cannot train on an empty dataset");
    }

    let vocabularies = Vocabularies::fitted()?;
    let (train_idx, test_idx) = train_test_split(rows.len(), config.test_fraction, config.split_seed);
    let train = TrainingMatrix::from_rows(train_idx.iter().map(|&i| &rows[i]), &vocabularies)?;
    let test_set = TrainingMatrix::from_rows(test_idx.iter().map(|&i| &rows[i]), &vocabularies)?;

    info!(
        train_rows = train.len(),
        test_rows = test_set.len(),
        n_estimators = config.boosting.n_estimators,
        "Fitting gradient boosted ensemble"
    );

    let ensemble = fit(&train.rows, &train.labels, &config.boosting).with_metadata(EnsembleMetadata {
        trained_at: Utc::now(),
        training_rows: train.len(),
        learning_rate: config.boosting.learning_rate,
        max_depth: config.boosting.max_depth,
    });

    let report = classification_report(&predict_labels(&ensemble, &test_set), &test_set.labels);
    info!(accuracy = report.accuracy, "Training complete");

    Ok(TrainedModel {
        ensemble,
        report,
        train_rows: train.len(),
        test_set,
    })
}

/// Refit on fresh samples of the dataset and score each refit on the held-out rows
pub fn simulate_retraining(
    rows: &[SyntheticRow],
    model: &TrainedModel,
    config: &TrainingConfig,
    iterations: usize,
    sample_size: usize,
) -> Result<Vec<RetrainingStep>> {
    let vocabularies = Vocabularies::fitted()?;
    let mut steps = vec![RetrainingStep {
        iteration: 0,
        sample_seed: None,
        accuracy: model.report.accuracy,
    }];

    for iteration in 1..=iterations {
        let seed = config.split_seed + iteration as u64;
        let sample = sample_rows(rows, sample_size, seed);
        let matrix = TrainingMatrix::from_rows(&sample, &vocabularies)?;
        let ensemble = fit(&matrix.rows, &matrix.labels, &config.boosting);
        let accuracy = accuracy(&predict_labels(&ensemble, &model.test_set), &model.test_set.labels);

        info!(iteration, seed, accuracy, "Retraining iteration complete");
        steps.push(RetrainingStep {
            iteration,
            sample_seed: Some(seed),
            accuracy,
        });
    }

    Ok(steps)
}

/// Dataset profit for each miles rate; only rows that chose SAF contribute
pub fn optimize_k(rows: &[SyntheticRow], k_values: &[f64]) -> Result<Vec<KProfit>> {
    k_values
        .iter()
        .map(|&k| {
            let params = SafMilesParams::TRAINING.with_k(k);
            let total_profit = rows
                .iter()
                .filter(|row| row.chose_saf)
                .map(|row| {
                    let miles = pricing::saf_miles(row.premium, row.saf_blend, row.distance_km, &params)?;
                    Ok(pricing::profit(row.premium, miles, pricing::MILE_COST))
                })
                .sum::<Result<f64>>()
                .with_context(|| format!("Miles rate k = {} is out of range", k))?;
            Ok(KProfit { k, total_profit })
        })
        .collect()
}

/// Write the ensemble artifact, returning its SHA-256
pub fn save_ensemble(ensemble: &TreeEnsemble, path: impl AsRef<Path>) -> Result<String> {
    let path = path.as_ref();
    let bytes = serde_json::to_vec_pretty(ensemble).context("Failed to serialize ensemble")?;
    std::fs::write(path, &bytes).with_context(|| format!("Failed to write {}", path.display()))?;

    let checksum = compute_checksum(&bytes);
    info!(path = %path.display(), sha256 = %checksum, trees = ensemble.trees.len(), "Model saved");
    Ok(checksum)
}
