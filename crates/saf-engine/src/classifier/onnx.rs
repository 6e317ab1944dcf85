//! ONNX classifier inference using tract
//!
//! Accepts binary classifiers exported from external trainers: one `[1, 7]`
//! f32 input and a probability output, either `[1, 2]` (class 1 is taken) or
//! a single value.

use super::{Classifier, ModelFormat};
use crate::error::EngineError;
use crate::features::NUM_FEATURES;
use crate::models::FeatureVector;
use anyhow::{Context, Result};
use std::time::Instant;
use tract_onnx::prelude::*;
use tracing::{debug, warn};

/// Maximum inference latency before warning
const MAX_INFERENCE_MS: u128 = 5;

type TractModel = SimplePlan<TypedFact, Box<dyn TypedOp>, Graph<TypedFact, Box<dyn TypedOp>>>;

/// ONNX-based classifier backed by an optimized tract plan
pub struct OnnxClassifier {
    model: TractModel,
}

impl OnnxClassifier {
    /// Create a classifier from model bytes
    pub fn new(model_bytes: &[u8]) -> Result<Self> {
        let model = tract_onnx::onnx()
            .model_for_read(&mut std::io::Cursor::new(model_bytes))
            .context("Failed to parse ONNX model")?
            .with_input_fact(0, f32::fact([1, NUM_FEATURES]).into())
            .context("Failed to set input shape")?
            .into_optimized()
            .context("Failed to optimize model")?
            .into_runnable()
            .context("Failed to create runnable model")?;
        Ok(Self { model })
    }

    fn features_to_tensor(features: &FeatureVector) -> Result<Tensor> {
        let data: Vec<f32> = features.to_row().iter().map(|v| *v as f32).collect();
        let array = tract_ndarray::Array2::from_shape_vec((1, NUM_FEATURES), data)
            .context("Failed to shape input row")?;
        Ok(array.into())
    }

    /// Pick the class-1 probability out of the model outputs
    fn positive_probability(outputs: &[TValue]) -> Result<f64> {
        // Prefer a two-column probability tensor; labels come first in most exports.
        for output in outputs.iter().rev() {
            if output.datum_type() != f32::datum_type() {
                continue;
            }
            let values: Vec<f32> = output.to_array_view::<f32>()?.iter().copied().collect();
            match output.shape().last() {
                Some(2) if values.len() == 2 => return Ok(values[1] as f64),
                _ if values.len() == 1 => return Ok(values[0] as f64),
                _ => continue,
            }
        }
        anyhow::bail!("Model produced no probability output")
    }

    fn run(&self, features: &FeatureVector) -> Result<f64> {
        let input = Self::features_to_tensor(features)?;
        let result = self.model.run(tvec!(input.into()))?;
        Self::positive_probability(&result)
    }
}

impl Classifier for OnnxClassifier {
    fn predict_proba(&self, features: &FeatureVector) -> Result<f64, EngineError> {
        let start = Instant::now();

        let probability = self
            .run(features)
            .map_err(|e| EngineError::Inference(format!("{:#}", e)))?;

        let elapsed = start.elapsed();
        if elapsed.as_millis() > MAX_INFERENCE_MS {
            warn!(elapsed_ms = elapsed.as_millis(), "Inference exceeded {}ms target", MAX_INFERENCE_MS);
        } else {
            debug!(elapsed_us = elapsed.as_micros(), "Inference completed");
        }

        Ok(probability)
    }

    fn format(&self) -> ModelFormat {
        ModelFormat::Onnx
    }
}
