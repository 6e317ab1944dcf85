//! Error taxonomy for the pricing and inference engine

use thiserror::Error;

/// Errors produced by the engine.
///
/// `UnknownCategoryValue`, `InvalidNumericInput` and `Inference` are
/// per-request failures and are reported back to the caller alongside the
/// echoed inputs. `ModelUnavailable` and `MalformedVocabulary` only occur
/// while the service is being assembled and must abort startup.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    #[error("unknown {category} value '{value}'")]
    UnknownCategoryValue { category: String, value: String },

    #[error("invalid {field} = {value}: {reason}")]
    InvalidNumericInput {
        field: &'static str,
        value: f64,
        reason: &'static str,
    },

    #[error("classifier unavailable at {path}: {reason}")]
    ModelUnavailable { path: String, reason: String },

    #[error("malformed {category} vocabulary")]
    MalformedVocabulary { category: String },

    #[error("inference failed: {0}")]
    Inference(String),
}

impl EngineError {
    /// Short label used for metrics and structured logs
    pub fn kind(&self) -> &'static str {
        match self {
            EngineError::UnknownCategoryValue { .. } => "unknown_category_value",
            EngineError::InvalidNumericInput { .. } => "invalid_numeric_input",
            EngineError::ModelUnavailable { .. } => "model_unavailable",
            EngineError::MalformedVocabulary { .. } => "malformed_vocabulary",
            EngineError::Inference(_) => "inference",
        }
    }

    /// True for errors caused by the request payload rather than the service
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            EngineError::UnknownCategoryValue { .. } | EngineError::InvalidNumericInput { .. }
        )
    }
}
