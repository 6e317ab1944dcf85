//! SAF Miles Predictor CLI
//!
//! A command-line tool for generating training data, training and analysing
//! the purchase model, and querying a running predictor service.

mod client;
mod commands;
mod output;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use commands::{analysis, dataset, predict, train};
use saf_engine::pricing::{EQUILIBRIUM_MILE_VALUE, MILE_COST};
use saf_engine::training::BoostingParams;
use saf_engine::PassengerInput;
use std::path::PathBuf;

/// SAF Miles Predictor CLI
#[derive(Parser)]
#[command(name = "saf")]
#[command(author, version, about = "CLI for the SAF Miles Predictor", long_about = None)]
pub struct Cli {
    /// API endpoint URL (can also be set via SAF_API_URL env var)
    #[arg(long, env = "SAF_API_URL", default_value = "http://localhost:8000")]
    pub api_url: String,

    /// Output format
    #[arg(long, short, default_value = "table")]
    pub format: output::OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Synthetic dataset options
#[derive(Args, Clone, Copy)]
pub struct DatasetArgs {
    /// Number of synthetic passengers
    #[arg(long, default_value_t = 1000)]
    pub samples: usize,

    /// Random seed
    #[arg(long, default_value_t = 42)]
    pub seed: u64,
}

/// Gradient boosting options
#[derive(Args, Clone, Copy)]
pub struct BoostingArgs {
    /// Number of boosting rounds
    #[arg(long, default_value_t = 100)]
    pub n_estimators: usize,

    #[arg(long, default_value_t = 0.1)]
    pub learning_rate: f64,

    #[arg(long, default_value_t = 6)]
    pub max_depth: usize,
}

impl From<BoostingArgs> for BoostingParams {
    fn from(args: BoostingArgs) -> Self {
        BoostingParams {
            n_estimators: args.n_estimators,
            learning_rate: args.learning_rate,
            max_depth: args.max_depth,
            ..Default::default()
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Generate the synthetic passenger dataset as CSV
    Generate {
        #[command(flatten)]
        dataset: DatasetArgs,

        /// Output CSV path
        #[arg(long, short, default_value = "saf_demo_data.csv")]
        output: PathBuf,
    },

    /// Train the purchase classifier and save it for the server
    Train {
        #[command(flatten)]
        dataset: DatasetArgs,

        #[command(flatten)]
        boosting: BoostingArgs,

        /// Model artifact path
        #[arg(long, short, default_value = "saf_model.json")]
        output: PathBuf,

        /// Also write the generated dataset to this CSV
        #[arg(long)]
        data_output: Option<PathBuf>,
    },

    /// Simulate retraining on resampled subsets
    Retrain {
        #[command(flatten)]
        dataset: DatasetArgs,

        #[command(flatten)]
        boosting: BoostingArgs,

        /// Retraining rounds
        #[arg(long, default_value_t = 3)]
        iterations: usize,

        /// Rows drawn per round
        #[arg(long, default_value_t = 200)]
        sample_size: usize,
    },

    /// Compare total profit across miles rates
    Optimize {
        #[command(flatten)]
        dataset: DatasetArgs,

        /// Candidate miles per premium dollar
        #[arg(long, value_delimiter = ',', default_value = "80,100,120")]
        k: Vec<f64>,
    },

    /// Check whether an offer is acceptable to airline and customer
    Equilibrium {
        #[arg(long)]
        premium: f64,

        #[arg(long)]
        saf_miles: u64,

        /// Airline cost per mile
        #[arg(long, default_value_t = MILE_COST)]
        mile_cost: f64,

        /// Customer value per mile
        #[arg(long, default_value_t = EQUILIBRIUM_MILE_VALUE)]
        mile_value: f64,
    },

    /// Score an offer against a running server
    Predict {
        /// Loyalty tier (Gold, Silver, None)
        #[arg(long)]
        tier: String,

        /// Cabin class (Business, Economy)
        #[arg(long)]
        cabin: String,

        /// Route, e.g. HKG-LHR
        #[arg(long)]
        route: String,

        #[arg(long)]
        distance_km: f64,

        /// SAF premium in dollars
        #[arg(long)]
        premium: f64,

        /// SAF blend ratio between 0 and 1
        #[arg(long)]
        saf_blend: f64,

        #[arg(long, default_value_t = 0.0)]
        current_saf_miles: f64,

        #[arg(long, default_value_t = 0.0)]
        saf_flights_taken: f64,
    },

    /// Check server health
    Health,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Generate { dataset: d, output } => {
            dataset::generate(d.samples, d.seed, &output, cli.format)?;
        }
        Commands::Train {
            dataset: d,
            boosting,
            output,
            data_output,
        } => {
            train::train(
                d.samples,
                d.seed,
                boosting.into(),
                &output,
                data_output.as_deref(),
                cli.format,
            )?;
        }
        Commands::Retrain {
            dataset: d,
            boosting,
            iterations,
            sample_size,
        } => {
            train::retrain(d.samples, d.seed, boosting.into(), iterations, sample_size, cli.format)?;
        }
        Commands::Optimize { dataset: d, k } => {
            analysis::optimize(&k, d.samples, d.seed, cli.format)?;
        }
        Commands::Equilibrium {
            premium,
            saf_miles,
            mile_cost,
            mile_value,
        } => {
            analysis::equilibrium(premium, saf_miles, mile_cost, mile_value, cli.format)?;
        }
        Commands::Predict {
            tier,
            cabin,
            route,
            distance_km,
            premium,
            saf_blend,
            current_saf_miles,
            saf_flights_taken,
        } => {
            let client = client::ApiClient::new(&cli.api_url)?;
            let input = PassengerInput {
                tier,
                cabin,
                route,
                distance_km,
                premium,
                saf_blend,
                current_saf_miles,
                saf_flights_taken,
            };
            predict::predict(&client, input, cli.format).await?;
        }
        Commands::Health => {
            let client = client::ApiClient::new(&cli.api_url)?;
            predict::health(&client, cli.format).await?;
        }
    }

    Ok(())
}
