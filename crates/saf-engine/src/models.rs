//! Core data models for the SAF miles predictor

use serde::{Deserialize, Serialize};

/// Passenger offer submitted for scoring
///
/// Categorical fields stay as raw strings so an unknown value can still be
/// echoed back verbatim; the encoder decides membership.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PassengerInput {
    pub tier: String,
    pub cabin: String,
    pub route: String,
    pub distance_km: f64,
    pub premium: f64,
    pub saf_blend: f64,
    #[serde(default)]
    pub current_saf_miles: f64,
    #[serde(default)]
    pub saf_flights_taken: f64,
}

/// Feature vector for classifier inference, in training column order
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    pub tier_code: u32,
    pub cabin_code: u32,
    pub route_code: u32,
    pub distance_km: f64,
    pub premium: f64,
    pub saf_blend: f64,
    pub saf_miles: u64,
}

/// Scored offer returned to the caller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    pub probability: f64,
    pub saf_miles: u64,
    pub co2_reduction: f64,
    pub net_price: f64,
    pub profit: f64,
    /// Passenger's miles balance after this purchase
    #[serde(rename = "current_saf_miles")]
    pub updated_saf_miles_total: f64,
    #[serde(rename = "selectedInputs")]
    pub echoed_inputs: PassengerInput,
}

impl PredictionResult {
    /// Decision recorded in the outcome log
    pub fn chose_saf(&self) -> bool {
        self.probability > 0.5
    }
}

/// Failed scoring attempt, still carrying the submitted inputs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionFailure {
    pub error: String,
    #[serde(rename = "selectedInputs")]
    pub echoed_inputs: PassengerInput,
}

/// Outcome of scoring one request: always an echo plus a result or an error
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PredictionOutcome {
    Scored(PredictionResult),
    Failed(PredictionFailure),
}

impl PredictionOutcome {
    pub fn echoed_inputs(&self) -> &PassengerInput {
        match self {
            PredictionOutcome::Scored(result) => &result.echoed_inputs,
            PredictionOutcome::Failed(failure) => &failure.echoed_inputs,
        }
    }

    pub fn is_scored(&self) -> bool {
        matches!(self, PredictionOutcome::Scored(_))
    }
}
