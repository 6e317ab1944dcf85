//! Feature assembly for classifier inference
//!
//! Validates the numeric inputs, derives SAF miles and encodes the
//! categorical columns into the fixed training column order.

use crate::encoder::{Category, Vocabularies};
use crate::error::EngineError;
use crate::models::{FeatureVector, PassengerInput};
use crate::pricing::{saf_miles, SafMilesParams};

/// Number of input columns the classifier expects
pub const NUM_FEATURES: usize = 7;

/// Classifier input columns, in order
pub const FEATURE_COLUMNS: [&str; NUM_FEATURES] = [
    "tier_encoded",
    "cabin_encoded",
    "route_encoded",
    "distance_km",
    "premium",
    "saf_blend",
    "saf_miles",
];

impl FeatureVector {
    /// Row in `FEATURE_COLUMNS` order
    pub fn to_row(&self) -> [f64; NUM_FEATURES] {
        [
            self.tier_code as f64,
            self.cabin_code as f64,
            self.route_code as f64,
            self.distance_km,
            self.premium,
            self.saf_blend,
            self.saf_miles as f64,
        ]
    }
}

/// Builds feature vectors from passenger inputs
#[derive(Debug, Clone)]
pub struct FeatureAssembler {
    vocabularies: Vocabularies,
    miles_params: SafMilesParams,
}

impl FeatureAssembler {
    pub fn new(vocabularies: Vocabularies, miles_params: SafMilesParams) -> Self {
        Self {
            vocabularies,
            miles_params,
        }
    }

    pub fn assemble(&self, input: &PassengerInput) -> Result<FeatureVector, EngineError> {
        validate(input)?;

        let miles = saf_miles(
            input.premium,
            input.saf_blend,
            input.distance_km,
            &self.miles_params,
        )?;

        Ok(FeatureVector {
            tier_code: self.vocabularies.encode(Category::Tier, &input.tier)?,
            cabin_code: self.vocabularies.encode(Category::Cabin, &input.cabin)?,
            route_code: self.vocabularies.encode(Category::Route, &input.route)?,
            distance_km: input.distance_km,
            premium: input.premium,
            saf_blend: input.saf_blend,
            saf_miles: miles,
        })
    }
}

/// Check numeric fields for range and finiteness
pub fn validate(input: &PassengerInput) -> Result<(), EngineError> {
    require_positive("distance_km", input.distance_km)?;
    require_positive("premium", input.premium)?;
    require_finite("saf_blend", input.saf_blend)?;
    if !(0.0..=1.0).contains(&input.saf_blend) {
        return Err(EngineError::InvalidNumericInput {
            field: "saf_blend",
            value: input.saf_blend,
            reason: "must be within [0, 1]",
        });
    }
    require_non_negative("current_saf_miles", input.current_saf_miles)?;
    require_non_negative("saf_flights_taken", input.saf_flights_taken)?;
    Ok(())
}

fn require_finite(field: &'static str, value: f64) -> Result<(), EngineError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(EngineError::InvalidNumericInput {
            field,
            value,
            reason: "must be finite",
        })
    }
}

fn require_positive(field: &'static str, value: f64) -> Result<(), EngineError> {
    require_finite(field, value)?;
    if value > 0.0 {
        Ok(())
    } else {
        Err(EngineError::InvalidNumericInput {
            field,
            value,
            reason: "must be positive",
        })
    }
}

fn require_non_negative(field: &'static str, value: f64) -> Result<(), EngineError> {
    require_finite(field, value)?;
    if value >= 0.0 {
        Ok(())
    } else {
        Err(EngineError::InvalidNumericInput {
            field,
            value,
            reason: "must not be negative",
        })
    }
}
