//! Purchase-probability classifiers
//!
//! The engine only sees the [`Classifier`] trait. Two artifact formats are
//! supported: the native gradient-boosted tree ensemble written by the
//! training tool (`.json`) and ONNX binary classifiers (`.onnx`).

mod onnx;
mod tree_ensemble;

pub use onnx::OnnxClassifier;
pub use tree_ensemble::{EnsembleMetadata, RegressionTree, TreeEnsemble, TreeNode};

use crate::error::EngineError;
use crate::models::FeatureVector;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

/// Trait for purchase-probability classifiers
pub trait Classifier: Send + Sync {
    /// Probability that the passenger takes the SAF offer
    fn predict_proba(&self, features: &FeatureVector) -> Result<f64, EngineError>;

    /// Artifact format backing this classifier
    fn format(&self) -> ModelFormat;
}

/// On-disk classifier formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelFormat {
    TreeEnsemble,
    Onnx,
}

impl ModelFormat {
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => Some(ModelFormat::TreeEnsemble),
            Some(ext) if ext.eq_ignore_ascii_case("onnx") => Some(ModelFormat::Onnx),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ModelFormat::TreeEnsemble => "tree_ensemble",
            ModelFormat::Onnx => "onnx",
        }
    }
}

/// Identity of the artifact the service is scoring with
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelInfo {
    pub path: String,
    pub format: ModelFormat,
    pub sha256: String,
    pub size_bytes: usize,
}

/// A classifier loaded from disk together with its identity
#[derive(Clone)]
pub struct LoadedClassifier {
    pub classifier: Arc<dyn Classifier>,
    pub info: ModelInfo,
}

/// Load a classifier artifact, optionally pinning its SHA-256
///
/// Any failure here is fatal for the service: there is no fallback model.
pub fn load_classifier(
    path: impl AsRef<Path>,
    expected_sha256: Option<&str>,
) -> Result<LoadedClassifier, EngineError> {
    let path = path.as_ref();
    let unavailable = |reason: String| EngineError::ModelUnavailable {
        path: path.display().to_string(),
        reason,
    };

    let format = ModelFormat::from_path(path)
        .ok_or_else(|| unavailable("unsupported extension, expected .json or .onnx".to_string()))?;

    let bytes = std::fs::read(path).map_err(|e| unavailable(e.to_string()))?;
    let checksum = compute_checksum(&bytes);

    if let Some(expected) = expected_sha256 {
        if !expected.eq_ignore_ascii_case(&checksum) {
            warn!(expected = %expected, actual = %checksum, "Classifier checksum mismatch");
            return Err(unavailable(format!(
                "checksum mismatch: expected {}, got {}",
                expected, checksum
            )));
        }
    }

    let classifier: Arc<dyn Classifier> = match format {
        ModelFormat::TreeEnsemble => Arc::new(TreeEnsemble::from_slice(&bytes).map_err(unavailable)?),
        ModelFormat::Onnx => Arc::new(OnnxClassifier::new(&bytes).map_err(|e| unavailable(format!("{:#}", e)))?),
    };

    info!(
        path = %path.display(),
        format = format.as_str(),
        sha256 = %checksum,
        size_bytes = bytes.len(),
        "Classifier loaded"
    );

    Ok(LoadedClassifier {
        classifier,
        info: ModelInfo {
            path: path.display().to_string(),
            format,
            sha256: checksum,
            size_bytes: bytes.len(),
        },
    })
}

/// Compute SHA256 checksum of data
pub fn compute_checksum(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

/// Logistic function mapping a margin to a probability
pub(crate) fn sigmoid(margin: f64) -> f64 {
    1.0 / (1.0 + (-margin).exp())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn stump_json() -> String {
        let ensemble = TreeEnsemble::single_stump(4, 25.5, 2.0, -2.0);
        serde_json::to_string(&ensemble).unwrap()
    }

    #[test]
    fn test_format_from_extension() {
        assert_eq!(
            ModelFormat::from_path(Path::new("saf_model.json")),
            Some(ModelFormat::TreeEnsemble)
        );
        assert_eq!(
            ModelFormat::from_path(Path::new("saf_model.ONNX")),
            Some(ModelFormat::Onnx)
        );
        assert_eq!(ModelFormat::from_path(Path::new("saf_model.pkl")), None);
    }

    #[test]
    fn test_missing_file_is_model_unavailable() {
        let err = load_classifier("/nonexistent/saf_model.json", None).err().unwrap();
        assert_eq!(err.kind(), "model_unavailable");
    }

    #[test]
    fn test_load_tree_ensemble_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("saf_model.json");
        std::fs::File::create(&path)
            .unwrap()
            .write_all(stump_json().as_bytes())
            .unwrap();

        let loaded = load_classifier(&path, None).unwrap();
        assert_eq!(loaded.info.format, ModelFormat::TreeEnsemble);
        assert_eq!(loaded.info.sha256.len(), 64);
        assert_eq!(loaded.info.size_bytes, stump_json().len());
        assert_eq!(loaded.classifier.format(), ModelFormat::TreeEnsemble);
    }

    #[test]
    fn test_checksum_pinning() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("saf_model.json");
        let body = stump_json();
        std::fs::write(&path, &body).unwrap();

        let good = compute_checksum(body.as_bytes());
        assert!(load_classifier(&path, Some(&good.to_uppercase())).is_ok());

        let err = load_classifier(&path, Some("deadbeef")).err().unwrap();
        assert!(err.to_string().contains("checksum mismatch"));
    }

    #[test]
    fn test_garbage_json_is_model_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("saf_model.json");
        std::fs::write(&path, b"{not json").unwrap();
        let err = load_classifier(&path, None).err().unwrap();
        assert_eq!(err.kind(), "model_unavailable");
    }

    #[test]
    fn test_garbage_onnx_is_model_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("saf_model.onnx");
        std::fs::write(&path, b"definitely not protobuf").unwrap();
        let err = load_classifier(&path, None).err().unwrap();
        assert_eq!(err.kind(), "model_unavailable");
    }

    #[test]
    fn test_sigmoid() {
        assert_eq!(sigmoid(0.0), 0.5);
        assert!(sigmoid(10.0) > 0.99);
        assert!(sigmoid(-10.0) < 0.01);
    }
}
