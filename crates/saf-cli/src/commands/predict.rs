//! Commands that talk to a running predictor service

use anyhow::Result;
use colored::Colorize;
use saf_engine::{PassengerInput, PredictionOutcome};

use crate::client::ApiClient;
use crate::output::{
    color_probability, color_status, format_usd, print_error, print_json, print_success, OutputFormat,
};

/// Score one offer against the service
pub async fn predict(client: &ApiClient, input: PassengerInput, format: OutputFormat) -> Result<()> {
    let outcome = client.predict(&input).await?;

    if let OutputFormat::Json = format {
        return print_json(&outcome);
    }

    match outcome {
        PredictionOutcome::Scored(result) => {
            println!("{}", "SAF Offer".bold());
            println!("{}", "=".repeat(50));
            println!(
                "Passenger:        {} / {} / {}",
                input.tier.cyan(),
                input.cabin.cyan(),
                input.route.cyan()
            );
            println!("Premium:          {}", format_usd(input.premium));
            println!();
            println!("Probability:      {}", color_probability(result.probability));
            println!("SAF miles:        {}", result.saf_miles);
            println!("Miles balance:    {}", result.updated_saf_miles_total);
            println!("CO2 reduction:    {} kg", result.co2_reduction);
            println!("Net price:        {}", format_usd(result.net_price));
            println!("Profit:           {}", format_usd(result.profit).green());
        }
        PredictionOutcome::Failed(failure) => {
            print_error(&failure.error);
            anyhow::bail!("Offer could not be scored");
        }
    }

    Ok(())
}

/// Check service health
pub async fn health(client: &ApiClient, format: OutputFormat) -> Result<()> {
    let result = client.health().await?;

    match format {
        OutputFormat::Json => print_json(&result)?,
        OutputFormat::Table => {
            if result.status == "healthy" {
                print_success(&format!("Service is {}", color_status(&result.status)));
            } else {
                print_error(&format!("Service is {}", color_status(&result.status)));
            }
        }
    }

    Ok(())
}
