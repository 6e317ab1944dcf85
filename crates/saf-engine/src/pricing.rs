//! Closed-form pricing and demand formulas
//!
//! All functions are pure. Constants mirror the values the classifier was
//! built around; changing them changes what the model sees.

use crate::error::EngineError;
use serde::{Deserialize, Serialize};

/// Fuel burn used for every CO2 estimate (kg), not derived per flight
pub const FUEL_BURN_KG: f64 = 36_056.0;

/// CO2 emitted per kg of conventional jet fuel
pub const CO2_PER_KG_FUEL: f64 = 2.66;

/// Customer-side value of one SAF mile
pub const MILE_VALUE: f64 = 0.005;

/// Airline-side cost basis of one SAF mile
pub const MILE_COST: f64 = 0.004;

/// Customer-side mile value used by the equilibrium check
pub const EQUILIBRIUM_MILE_VALUE: f64 = 0.05;

/// Parameters of the SAF-miles formula
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SafMilesParams {
    pub k: f64,
    pub w1: f64,
    pub w2: f64,
    pub scarcity_rate: f64,
}

impl SafMilesParams {
    /// Formula applied by the scoring service
    pub const SERVING: SafMilesParams = SafMilesParams {
        k: 100.0,
        w1: 0.5,
        w2: 0.3,
        scarcity_rate: 0.002,
    };

    /// Formula applied when synthesizing training data (no scarcity factor)
    pub const TRAINING: SafMilesParams = SafMilesParams {
        k: 100.0,
        w1: 0.5,
        w2: 0.3,
        scarcity_rate: 1.0,
    };

    pub fn with_k(self, k: f64) -> Self {
        Self { k, ..self }
    }
}

impl Default for SafMilesParams {
    fn default() -> Self {
        Self::SERVING
    }
}

/// SAF miles earned for a premium, truncated toward zero.
///
/// Fails when the premium is large enough that the miles no longer fit a `u64`.
pub fn saf_miles(
    premium: f64,
    saf_blend: f64,
    distance_km: f64,
    params: &SafMilesParams,
) -> Result<u64, EngineError> {
    let raw = (params.k * premium)
        * (1.0 + params.w1 * saf_blend + params.w2 * (distance_km / 10_000.0))
        * params.scarcity_rate;
    if raw.is_nan() || raw <= 0.0 {
        return Ok(0);
    }
    if raw >= u64::MAX as f64 {
        return Err(EngineError::InvalidNumericInput {
            field: "premium",
            value: premium,
            reason: "SAF miles out of range",
        });
    }
    Ok(raw.trunc() as u64)
}

/// CO2 reduction (kg) for the blended share of a fuel burn
pub fn co2_reduction(fuel_burn_kg: f64, saf_blend: f64) -> f64 {
    fuel_burn_kg * saf_blend * CO2_PER_KG_FUEL
}

/// Premium net of the customer-side value of the earned miles
pub fn net_price(premium: f64, saf_miles: u64, mile_value: f64) -> f64 {
    premium - mile_value * saf_miles as f64
}

/// Premium net of the airline-side cost of the earned miles
pub fn profit(premium: f64, saf_miles: u64, mile_cost: f64) -> f64 {
    premium - mile_cost * saf_miles as f64
}

/// Parameters of the constant-elasticity demand curve
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DemandParams {
    pub base_demand: f64,
    pub reference_price: f64,
    pub elasticity: f64,
}

impl Default for DemandParams {
    fn default() -> Self {
        Self {
            base_demand: 100.0,
            reference_price: 20.0,
            elasticity: 0.5,
        }
    }
}

/// Expected demand at a net price; a free or paid-to-fly offer lifts demand by half
pub fn demand(net_price: f64, params: &DemandParams) -> f64 {
    if net_price <= 0.0 {
        return params.base_demand * 1.5;
    }
    params.base_demand * (net_price / params.reference_price).powf(-params.elasticity)
}

/// Whether an offer works for both sides of the trade
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Equilibrium {
    /// Premium covers the airline's cost of the miles
    pub airline_ok: bool,
    /// Miles are worth more to the customer than the premium
    pub customer_ok: bool,
}

impl Equilibrium {
    pub fn holds(&self) -> bool {
        self.airline_ok && self.customer_ok
    }
}

pub fn check_equilibrium(premium: f64, saf_miles: u64, mile_cost: f64, mile_value: f64) -> Equilibrium {
    let miles = saf_miles as f64;
    Equilibrium {
        airline_ok: premium > mile_cost * miles,
        customer_ok: premium < mile_value * miles,
    }
}

/// Round to a number of decimal places
pub fn round_dp(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}
