//! Gradient-boosted tree ensemble in the native JSON artifact format

use super::{sigmoid, Classifier, ModelFormat};
use crate::error::EngineError;
use crate::features::{FEATURE_COLUMNS, NUM_FEATURES};
use crate::models::FeatureVector;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Current artifact format version
pub const FORMAT_VERSION: u32 = 1;

/// A node of a regression tree; rows with `x[feature] < threshold` go left
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TreeNode {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        value: f64,
    },
}

/// Regression tree stored as a flat node list rooted at index 0
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegressionTree {
    pub nodes: Vec<TreeNode>,
}

impl RegressionTree {
    pub fn leaf(value: f64) -> Self {
        Self {
            nodes: vec![TreeNode::Leaf { value }],
        }
    }

    /// Leaf value reached by a row
    pub fn evaluate(&self, row: &[f64]) -> f64 {
        let mut idx = 0;
        loop {
            match &self.nodes[idx] {
                TreeNode::Leaf { value } => return *value,
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    idx = if row[*feature] < *threshold { *left } else { *right };
                }
            }
        }
    }

    pub fn depth(&self) -> usize {
        fn walk(nodes: &[TreeNode], idx: usize) -> usize {
            match &nodes[idx] {
                TreeNode::Leaf { .. } => 0,
                TreeNode::Split { left, right, .. } => 1 + walk(nodes, *left).max(walk(nodes, *right)),
            }
        }
        if self.nodes.is_empty() {
            0
        } else {
            walk(&self.nodes, 0)
        }
    }

    /// Children must point forward so evaluation always terminates
    fn validate(&self, tree_idx: usize) -> Result<(), String> {
        if self.nodes.is_empty() {
            return Err(format!("tree {} has no nodes", tree_idx));
        }
        for (idx, node) in self.nodes.iter().enumerate() {
            match node {
                TreeNode::Leaf { value } if !value.is_finite() => {
                    return Err(format!("tree {} node {} has a non-finite leaf", tree_idx, idx));
                }
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    if *feature >= NUM_FEATURES {
                        return Err(format!("tree {} node {} splits on unknown feature {}", tree_idx, idx, feature));
                    }
                    if threshold.is_nan() {
                        return Err(format!("tree {} node {} has a NaN threshold", tree_idx, idx));
                    }
                    for child in [*left, *right] {
                        if child <= idx || child >= self.nodes.len() {
                            return Err(format!("tree {} node {} has invalid child {}", tree_idx, idx, child));
                        }
                    }
                }
                TreeNode::Leaf { .. } => {}
            }
        }
        Ok(())
    }
}

/// Provenance recorded alongside the trees
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnsembleMetadata {
    pub trained_at: DateTime<Utc>,
    pub training_rows: usize,
    pub learning_rate: f64,
    pub max_depth: usize,
}

/// Binary classifier: `p = sigmoid(base_margin + sum(tree(x)))`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeEnsemble {
    pub format_version: u32,
    pub feature_names: Vec<String>,
    pub base_margin: f64,
    pub trees: Vec<RegressionTree>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<EnsembleMetadata>,
}

impl TreeEnsemble {
    pub fn new(base_margin: f64, trees: Vec<RegressionTree>) -> Self {
        Self {
            format_version: FORMAT_VERSION,
            feature_names: FEATURE_COLUMNS.iter().map(|c| c.to_string()).collect(),
            base_margin,
            trees,
            metadata: None,
        }
    }

    pub fn with_metadata(mut self, metadata: EnsembleMetadata) -> Self {
        self.metadata = Some(metadata);
        self
    }

    /// Parse and validate a serialized ensemble
    pub fn from_slice(bytes: &[u8]) -> Result<Self, String> {
        let ensemble: TreeEnsemble =
            serde_json::from_slice(bytes).map_err(|e| format!("invalid ensemble JSON: {}", e))?;
        ensemble.validate()?;
        Ok(ensemble)
    }

    /// Reject artifacts built for a different feature layout
    pub fn validate(&self) -> Result<(), String> {
        if self.format_version != FORMAT_VERSION {
            return Err(format!(
                "unsupported format version {}, expected {}",
                self.format_version, FORMAT_VERSION
            ));
        }
        if self.feature_names.iter().map(String::as_str).ne(FEATURE_COLUMNS.iter().copied()) {
            return Err(format!(
                "feature columns {:?} do not match {:?}",
                self.feature_names, FEATURE_COLUMNS
            ));
        }
        if !self.base_margin.is_finite() {
            return Err("base margin is not finite".to_string());
        }
        for (idx, tree) in self.trees.iter().enumerate() {
            tree.validate(idx)?;
        }
        Ok(())
    }

    /// Raw log-odds for a row
    pub fn margin(&self, row: &[f64]) -> f64 {
        self.base_margin + self.trees.iter().map(|t| t.evaluate(row)).sum::<f64>()
    }

    pub fn predict_row(&self, row: &[f64]) -> f64 {
        sigmoid(self.margin(row))
    }

    #[cfg(test)]
    pub(crate) fn single_stump(feature: usize, threshold: f64, left: f64, right: f64) -> Self {
        Self::new(
            0.0,
            vec![RegressionTree {
                nodes: vec![
                    TreeNode::Split {
                        feature,
                        threshold,
                        left: 1,
                        right: 2,
                    },
                    TreeNode::Leaf { value: left },
                    TreeNode::Leaf { value: right },
                ],
            }],
        )
    }
}

impl Classifier for TreeEnsemble {
    fn predict_proba(&self, features: &FeatureVector) -> Result<f64, EngineError> {
        Ok(self.predict_row(&features.to_row()))
    }

    fn format(&self) -> ModelFormat {
        ModelFormat::TreeEnsemble
    }
}
