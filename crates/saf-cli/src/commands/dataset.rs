//! Synthetic dataset commands

use anyhow::Result;
use saf_engine::training::{self, GeneratorConfig, SyntheticRow};
use std::path::Path;
use tabled::Tabled;

use crate::output::{print_info, print_json, print_success, print_table, OutputFormat};

/// Rows shown in the table preview
const PREVIEW_ROWS: usize = 5;

#[derive(Tabled)]
struct PreviewRow {
    #[tabled(rename = "User")]
    user_id: usize,
    #[tabled(rename = "Tier")]
    tier: String,
    #[tabled(rename = "Cabin")]
    cabin: String,
    #[tabled(rename = "Route")]
    route: String,
    #[tabled(rename = "Premium")]
    premium: f64,
    #[tabled(rename = "Blend")]
    saf_blend: f64,
    #[tabled(rename = "SAF Miles")]
    saf_miles: u64,
    #[tabled(rename = "Chose SAF")]
    chose_saf: u8,
}

impl From<&SyntheticRow> for PreviewRow {
    fn from(row: &SyntheticRow) -> Self {
        Self {
            user_id: row.user_id,
            tier: row.tier.clone(),
            cabin: row.cabin.clone(),
            route: row.route.clone(),
            premium: row.premium,
            saf_blend: row.saf_blend,
            saf_miles: row.saf_miles,
            chose_saf: u8::from(row.chose_saf),
        }
    }
}

/// Generate the synthetic dataset and write it as CSV
pub fn generate(samples: usize, seed: u64, output: &Path, format: OutputFormat) -> Result<()> {
    let rows = training::generate(&GeneratorConfig {
        samples,
        seed,
        ..Default::default()
    })?;
    training::write_csv(&rows, output)?;

    match format {
        OutputFormat::Json => print_json(&rows[..rows.len().min(PREVIEW_ROWS)])?,
        OutputFormat::Table => {
            let chose = rows.iter().filter(|r| r.chose_saf).count();
            print_success(&format!("Dataset generated: {}", output.display()));
            print_info(&format!("{} rows, {} chose SAF", rows.len(), chose));
            let preview: Vec<PreviewRow> = rows.iter().take(PREVIEW_ROWS).map(PreviewRow::from).collect();
            print_table(&preview);
        }
    }

    Ok(())
}
