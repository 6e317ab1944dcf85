//! Pricing and inference engine
//!
//! Turns a passenger offer into a scored result: derive SAF miles, encode the
//! categorical columns, ask the classifier for a purchase probability, then
//! apply the closed-form CO2, net price and profit formulas.

use crate::classifier::Classifier;
use crate::decision_log::{DecisionLog, DecisionRecord};
use crate::encoder::Vocabularies;
use crate::error::EngineError;
use crate::features::FeatureAssembler;
use crate::models::{PassengerInput, PredictionFailure, PredictionOutcome, PredictionResult};
use crate::observability::{EngineMetrics, StructuredLogger};
use crate::pricing::{self, SafMilesParams};
use std::sync::Arc;
use std::time::Instant;

/// Constants of the pricing formulas
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PricingParams {
    pub miles: SafMilesParams,
    pub fuel_burn_kg: f64,
    pub mile_value: f64,
    pub mile_cost: f64,
}

impl Default for PricingParams {
    fn default() -> Self {
        Self {
            miles: SafMilesParams::SERVING,
            fuel_burn_kg: pricing::FUEL_BURN_KG,
            mile_value: pricing::MILE_VALUE,
            mile_cost: pricing::MILE_COST,
        }
    }
}

/// Stateless scoring engine shared by all requests
pub struct PricingEngine {
    classifier: Arc<dyn Classifier>,
    assembler: FeatureAssembler,
    params: PricingParams,
    decision_log: DecisionLog,
    metrics: EngineMetrics,
    logger: StructuredLogger,
}

impl PricingEngine {
    /// Build an engine with the default formulas and no decision log
    pub fn new(classifier: Arc<dyn Classifier>) -> Result<Self, EngineError> {
        Self::with_params(classifier, PricingParams::default())
    }

    pub fn with_params(classifier: Arc<dyn Classifier>, params: PricingParams) -> Result<Self, EngineError> {
        let vocabularies = Vocabularies::fitted()?;
        Ok(Self {
            classifier,
            assembler: FeatureAssembler::new(vocabularies, params.miles),
            params,
            decision_log: DecisionLog::disabled(),
            metrics: EngineMetrics::new(),
            logger: StructuredLogger::new("saf-engine"),
        })
    }

    pub fn with_decision_log(mut self, decision_log: DecisionLog) -> Self {
        self.decision_log = decision_log;
        self
    }

    pub fn with_logger(mut self, logger: StructuredLogger) -> Self {
        self.logger = logger;
        self
    }

    /// Score an offer, returning the typed error on failure
    pub fn predict(&self, input: &PassengerInput) -> Result<PredictionResult, EngineError> {
        let features = self.assembler.assemble(input)?;

        let raw = self.classifier.predict_proba(&features)?;
        if !raw.is_finite() {
            return Err(EngineError::Inference(format!(
                "classifier returned non-finite probability {}",
                raw
            )));
        }
        let probability = raw.clamp(0.0, 1.0);

        let miles = features.saf_miles;
        let co2 = pricing::co2_reduction(self.params.fuel_burn_kg, input.saf_blend);
        let net_price = pricing::net_price(input.premium, miles, self.params.mile_value);
        let profit = pricing::profit(input.premium, miles, self.params.mile_cost);

        Ok(PredictionResult {
            probability: pricing::round_dp(probability, 3),
            saf_miles: miles,
            co2_reduction: pricing::round_dp(co2, 0),
            net_price: pricing::round_dp(net_price, 2),
            profit: pricing::round_dp(profit, 2),
            updated_saf_miles_total: input.current_saf_miles + miles as f64,
            echoed_inputs: input.clone(),
        })
    }

    /// Score an offer; never fails, the inputs always come back
    pub fn evaluate(&self, input: PassengerInput) -> (PredictionOutcome, Option<EngineError>) {
        let start = Instant::now();
        let outcome = self.predict(&input);
        let elapsed = start.elapsed();
        self.metrics.observe_prediction_latency(elapsed.as_secs_f64());

        match outcome {
            Ok(result) => {
                self.metrics.inc_predictions();
                self.logger.log_prediction(
                    &input.tier,
                    &input.route,
                    input.premium,
                    result.saf_miles,
                    result.probability,
                    elapsed.as_micros(),
                );
                self.decision_log.record(DecisionRecord {
                    tier: input.tier.clone(),
                    premium: input.premium,
                    saf_miles: result.saf_miles,
                    chose_saf: result.chose_saf(),
                });
                (PredictionOutcome::Scored(result), None)
            }
            Err(err) => {
                self.metrics.inc_prediction_errors(err.kind());
                self.logger.log_prediction_failure(err.kind(), &err.to_string());
                let failure = PredictionFailure {
                    error: format!("Internal Error: {}", err),
                    echoed_inputs: input,
                };
                (PredictionOutcome::Failed(failure), Some(err))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::ModelFormat;
    use crate::models::FeatureVector;

    /// Classifier returning a fixed probability
    struct FixedClassifier(f64);

    impl Classifier for FixedClassifier {
        fn predict_proba(&self, _features: &FeatureVector) -> Result<f64, EngineError> {
            Ok(self.0)
        }

        fn format(&self) -> ModelFormat {
            ModelFormat::TreeEnsemble
        }
    }

    /// Classifier that echoes the premium as a probability, to prove feature wiring
    struct PremiumClassifier;

    impl Classifier for PremiumClassifier {
        fn predict_proba(&self, features: &FeatureVector) -> Result<f64, EngineError> {
            Ok(features.premium / 100.0)
        }

        fn format(&self) -> ModelFormat {
            ModelFormat::TreeEnsemble
        }
    }

    fn engine(p: f64) -> PricingEngine {
        PricingEngine::new(Arc::new(FixedClassifier(p))).unwrap()
    }

    fn reference_input() -> PassengerInput {
        PassengerInput {
            tier: "Gold".to_string(),
            cabin: "Business".to_string(),
            route: "HKG-LHR".to_string(),
            distance_km: 9600.0,
            premium: 25.0,
            saf_blend: 0.2,
            current_saf_miles: 0.0,
            saf_flights_taken: 0.0,
        }
    }

    #[test]
    fn test_reference_passenger() {
        let result = engine(0.8123).predict(&reference_input()).unwrap();
        assert_eq!(result.saf_miles, 6);
        assert_eq!(result.co2_reduction, 19182.0);
        assert_eq!(result.net_price, 24.97);
        assert_eq!(result.profit, 24.98);
        assert_eq!(result.probability, 0.812);
        assert_eq!(result.updated_saf_miles_total, 6.0);
        assert_eq!(result.echoed_inputs, reference_input());
    }

    #[test]
    fn test_miles_total_accumulates_balance() {
        let mut input = reference_input();
        input.current_saf_miles = 120.5;
        let result = engine(0.5).predict(&input).unwrap();
        assert_eq!(result.updated_saf_miles_total, 126.5);
    }

    #[test]
    fn test_zero_blend_has_zero_co2() {
        let mut input = reference_input();
        input.saf_blend = 0.0;
        let result = engine(0.5).predict(&input).unwrap();
        assert_eq!(result.co2_reduction, 0.0);
    }

    #[test]
    fn test_co2_doubles_with_blend() {
        let mut input = reference_input();
        input.saf_blend = 0.1;
        let single = engine(0.5).predict(&input).unwrap().co2_reduction;
        input.saf_blend = 0.2;
        let double = engine(0.5).predict(&input).unwrap().co2_reduction;
        assert!((double - 2.0 * single).abs() <= 1.0);
    }

    #[test]
    fn test_probability_is_clamped() {
        assert_eq!(engine(1.7).predict(&reference_input()).unwrap().probability, 1.0);
        assert_eq!(engine(-0.2).predict(&reference_input()).unwrap().probability, 0.0);
        assert_eq!(engine(0.99999).predict(&reference_input()).unwrap().probability, 1.0);
    }

    #[test]
    fn test_non_finite_probability_is_an_error() {
        let err = engine(f64::NAN).predict(&reference_input()).unwrap_err();
        assert_eq!(err.kind(), "inference");
    }

    #[test]
    fn test_classifier_sees_assembled_features() {
        let engine = PricingEngine::new(Arc::new(PremiumClassifier)).unwrap();
        let result = engine.predict(&reference_input()).unwrap();
        assert_eq!(result.probability, 0.25);
    }

    #[test]
    fn test_unknown_route_echoes_inputs() {
        let mut input = reference_input();
        input.route = "HKG-XYZ".to_string();

        let (outcome, err) = engine(0.5).evaluate(input.clone());
        assert_eq!(err.unwrap().kind(), "unknown_category_value");
        match outcome {
            PredictionOutcome::Failed(failure) => {
                assert!(failure.error.starts_with("Internal Error: "));
                assert!(failure.error.contains("HKG-XYZ"));
                assert_eq!(failure.echoed_inputs, input);
            }
            other => panic!("expected failure, got {:?}", other),
        }
    }

    #[test]
    fn test_repeated_calls_are_identical() {
        let engine = engine(0.63);
        let first = engine.evaluate(reference_input()).0;
        for _ in 0..10 {
            assert_eq!(engine.evaluate(reference_input()).0, first);
        }
    }

    #[test]
    fn test_miles_monotonic_through_engine() {
        let engine = engine(0.5);
        let mut last = 0;
        for premium in [1.0, 5.0, 15.0, 20.0, 25.0, 30.0, 35.0, 100.0, 500.0] {
            let mut input = reference_input();
            input.premium = premium;
            let miles = engine.predict(&input).unwrap().saf_miles;
            assert!(miles >= last);
            last = miles;
        }
    }

    #[test]
    fn test_overflowing_premium_fails_in_band() {
        let engine = engine(0.5);
        for premium in [1e20, 1e307] {
            let mut input = reference_input();
            input.premium = premium;
            let (outcome, err) = engine.evaluate(input.clone());
            assert_eq!(err.unwrap().kind(), "invalid_numeric_input");
            match outcome {
                PredictionOutcome::Failed(failure) => {
                    assert!(failure.error.contains("premium"), "{}", failure.error);
                    assert_eq!(failure.echoed_inputs, input);
                }
                other => panic!("expected failure, got {:?}", other),
            }
        }
    }
}
