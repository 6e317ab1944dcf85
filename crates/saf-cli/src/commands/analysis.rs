//! Pricing analysis commands

use anyhow::Result;
use colored::Colorize;
use saf_engine::pricing;
use saf_engine::training::{self, GeneratorConfig, KProfit};
use serde_json::json;
use tabled::Tabled;

use crate::output::{format_usd, print_json, print_table, yes_no, OutputFormat};

#[derive(Tabled)]
struct ProfitRow {
    #[tabled(rename = "k")]
    k: f64,
    #[tabled(rename = "Total Profit")]
    total_profit: String,
    #[tabled(rename = "Best")]
    best: String,
}

/// Highest-profit entry; ties keep the first
fn best_k(results: &[KProfit]) -> Option<&KProfit> {
    results
        .iter()
        .fold(None, |best: Option<&KProfit>, r| match best {
            Some(b) if b.total_profit >= r.total_profit => Some(b),
            _ => Some(r),
        })
}

/// Total dataset profit for each candidate miles rate
pub fn optimize(k_values: &[f64], samples: usize, seed: u64, format: OutputFormat) -> Result<()> {
    let rows = training::generate(&GeneratorConfig {
        samples,
        seed,
        ..Default::default()
    })?;
    let results = training::optimize_k(&rows, k_values)?;
    let best = best_k(&results).map(|b| b.k);

    match format {
        OutputFormat::Json => print_json(&json!({ "results": results, "best_k": best }))?,
        OutputFormat::Table => {
            println!("{}", "Miles Rate Optimization".bold());
            let table: Vec<ProfitRow> = results
                .iter()
                .map(|r| ProfitRow {
                    k: r.k,
                    total_profit: format_usd(r.total_profit),
                    best: if Some(r.k) == best { "*".green().to_string() } else { String::new() },
                })
                .collect();
            print_table(&table);
        }
    }

    Ok(())
}

/// Check whether an offer works for both the airline and the customer
pub fn equilibrium(
    premium: f64,
    saf_miles: u64,
    mile_cost: f64,
    mile_value: f64,
    format: OutputFormat,
) -> Result<()> {
    let result = pricing::check_equilibrium(premium, saf_miles, mile_cost, mile_value);

    match format {
        OutputFormat::Json => print_json(&json!({
            "premium": premium,
            "saf_miles": saf_miles,
            "airline_ok": result.airline_ok,
            "customer_ok": result.customer_ok,
            "equilibrium": result.holds(),
        }))?,
        OutputFormat::Table => {
            println!("{}", "Equilibrium Check".bold());
            println!("{}", "=".repeat(50));
            println!(
                "Airline cost of miles:  {}  (covered: {})",
                format_usd(mile_cost * saf_miles as f64),
                yes_no(result.airline_ok)
            );
            println!(
                "Customer value of miles: {}  (worth it: {})",
                format_usd(mile_value * saf_miles as f64),
                yes_no(result.customer_ok)
            );
            println!("{} {}", "Equilibrium:".bold(), yes_no(result.holds()));
        }
    }

    Ok(())
}
