//! Engine library for the SAF miles predictor
//!
//! This crate provides the core functionality for:
//! - Categorical encoding and feature assembly
//! - Closed-form SAF miles, CO2, net price and profit formulas
//! - Purchase-probability classifiers (native tree ensembles and ONNX)
//! - Best-effort decision logging
//! - Offline dataset generation and model training
//! - Metrics and structured logging

pub mod classifier;
pub mod decision_log;
pub mod encoder;
pub mod engine;
pub mod error;
pub mod features;
pub mod models;
pub mod observability;
pub mod pricing;
pub mod training;

pub use classifier::{load_classifier, Classifier, LoadedClassifier, ModelFormat, ModelInfo};
pub use decision_log::{DecisionLog, DecisionRecord};
pub use engine::{PricingEngine, PricingParams};
pub use error::EngineError;
pub use models::*;
pub use observability::{EngineMetrics, StructuredLogger};
