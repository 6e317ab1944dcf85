//! Synthetic passenger dataset for offline training

use crate::encoder::{Category, Vocabularies, CABINS, ROUTES, TIERS};
use crate::error::EngineError;
use crate::features::NUM_FEATURES;
use crate::models::FeatureVector;
use crate::pricing::{self, DemandParams, SafMilesParams};
use anyhow::{Context, Result};
use rand::distributions::{Distribution, WeightedIndex};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::Path;

/// Tier sampling weights, aligned with `TIERS`
const TIER_WEIGHTS: [f64; 3] = [0.3, 0.4, 0.3];

/// Cabin sampling weights, aligned with `CABINS`
const CABIN_WEIGHTS: [f64; 2] = [0.6, 0.4];

/// Flight distances sampled for synthetic rows (km)
pub const DISTANCES_KM: [f64; 5] = [9600.0, 2560.0, 12970.0, 7390.0, 1690.0];

/// Premiums offered in synthetic rows
pub const PREMIUMS: [f64; 5] = [15.0, 20.0, 25.0, 30.0, 35.0];

/// Miles a Gold passenger needs before a high premium still converts
pub const GOLD_MILES_THRESHOLD: u64 = 3000;

/// Highest premium every passenger accepts
pub const ACCEPTED_PREMIUM: f64 = 25.0;

pub const CSV_HEADER: &str =
    "user_id,tier,cabin,route,distance_km,premium,saf_blend,fuel_burn,saf_miles,co2_reduction,net_price,demand,chose_saf";

/// Settings for the synthetic generator
#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    pub samples: usize,
    pub seed: u64,
    pub miles: SafMilesParams,
    pub demand: DemandParams,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            samples: 1000,
            seed: 42,
            miles: SafMilesParams::TRAINING,
            demand: DemandParams::default(),
        }
    }
}

/// One synthetic passenger with derived columns and label
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyntheticRow {
    pub user_id: usize,
    pub tier: String,
    pub cabin: String,
    pub route: String,
    pub distance_km: f64,
    pub premium: f64,
    pub saf_blend: f64,
    pub fuel_burn: f64,
    pub saf_miles: u64,
    pub co2_reduction: f64,
    pub net_price: f64,
    pub demand: f64,
    pub chose_saf: bool,
}

impl SyntheticRow {
    pub fn features(&self, vocabularies: &Vocabularies) -> Result<FeatureVector, EngineError> {
        Ok(FeatureVector {
            tier_code: vocabularies.encode(Category::Tier, &self.tier)?,
            cabin_code: vocabularies.encode(Category::Cabin, &self.cabin)?,
            route_code: vocabularies.encode(Category::Route, &self.route)?,
            distance_km: self.distance_km,
            premium: self.premium,
            saf_blend: self.saf_blend,
            saf_miles: self.saf_miles,
        })
    }

    fn to_csv_line(&self) -> String {
        format!(
            "{},{},{},{},{},{},{},{},{},{},{},{},{}",
            self.user_id,
            self.tier,
            self.cabin,
            self.route,
            self.distance_km,
            self.premium,
            self.saf_blend,
            self.fuel_burn,
            self.saf_miles,
            self.co2_reduction,
            self.net_price,
            self.demand,
            u8::from(self.chose_saf)
        )
    }
}

/// Ground-truth purchase rule the classifier learns
pub fn chose_saf(tier: &str, premium: f64, saf_miles: u64) -> bool {
    premium <= ACCEPTED_PREMIUM || (tier == "Gold" && saf_miles >= GOLD_MILES_THRESHOLD)
}

/// Generate the synthetic dataset deterministically from the seed
pub fn generate(config: &GeneratorConfig) -> Result<Vec<SyntheticRow>> {
    let mut rng = StdRng::seed_from_u64(config.seed);
    let tier_dist = WeightedIndex::new(TIER_WEIGHTS).context("Invalid tier weights")?;
    let cabin_dist = WeightedIndex::new(CABIN_WEIGHTS).context("Invalid cabin weights")?;

    let mut rows = Vec::with_capacity(config.samples);
    for user_id in 1..=config.samples {
        let tier = TIERS[tier_dist.sample(&mut rng)];
        let cabin = CABINS[cabin_dist.sample(&mut rng)];
        let route = *ROUTES.choose(&mut rng).context("Empty route list")?;
        let distance_km = *DISTANCES_KM.choose(&mut rng).context("Empty distance list")?;
        let premium = *PREMIUMS.choose(&mut rng).context("Empty premium list")?;
        let saf_blend = pricing::round_dp(rng.gen_range(0.1..0.3), 2);
        let fuel_burn = pricing::round_dp(rng.gen_range(5000.0..50000.0), 0);

        let saf_miles = pricing::saf_miles(premium, saf_blend, distance_km, &config.miles)?;
        let net_price = pricing::net_price(premium, saf_miles, pricing::MILE_VALUE);

        rows.push(SyntheticRow {
            user_id,
            tier: tier.to_string(),
            cabin: cabin.to_string(),
            route: route.to_string(),
            distance_km,
            premium,
            saf_blend,
            fuel_burn,
            saf_miles,
            co2_reduction: pricing::co2_reduction(fuel_burn, saf_blend),
            net_price,
            demand: pricing::demand(net_price, &config.demand),
            chose_saf: chose_saf(tier, premium, saf_miles),
        });
    }

    Ok(rows)
}

/// Feature matrix and labels in classifier column order
#[derive(Debug, Clone, Default)]
pub struct TrainingMatrix {
    pub rows: Vec<[f64; NUM_FEATURES]>,
    pub labels: Vec<bool>,
}

impl TrainingMatrix {
    pub fn from_rows<'a>(
        rows: impl IntoIterator<Item = &'a SyntheticRow>,
        vocabularies: &Vocabularies,
    ) -> Result<Self, EngineError> {
        let mut matrix = TrainingMatrix::default();
        for row in rows {
            matrix.rows.push(row.features(vocabularies)?.to_row());
            matrix.labels.push(row.chose_saf);
        }
        Ok(matrix)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Shuffle row indices and split off a test fraction
pub fn train_test_split(n: usize, test_fraction: f64, seed: u64) -> (Vec<usize>, Vec<usize>) {
    let mut indices: Vec<usize> = (0..n).collect();
    let mut rng = StdRng::seed_from_u64(seed);
    indices.shuffle(&mut rng);

    let test_len = ((n as f64) * test_fraction.clamp(0.0, 1.0)).ceil() as usize;
    let train = indices.split_off(test_len.min(n));
    (train, indices)
}

/// Draw `count` distinct rows without replacement
pub fn sample_rows(rows: &[SyntheticRow], count: usize, seed: u64) -> Vec<SyntheticRow> {
    let mut rng = StdRng::seed_from_u64(seed);
    rows.choose_multiple(&mut rng, count.min(rows.len()))
        .cloned()
        .collect()
}

/// Write rows as CSV with a header
pub fn write_csv(rows: &[SyntheticRow], path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let file = std::fs::File::create(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    let mut writer = std::io::BufWriter::new(file);

    writeln!(writer, "{}", CSV_HEADER)?;
    for row in rows {
        writeln!(writer, "{}", row.to_csv_line())?;
    }
    writer.flush().context("Failed to flush dataset")?;
    Ok(())
}
