//! Gradient boosting of regression trees on the logistic loss
//!
//! Second-order boosting with exact greedy split search: each round fits a
//! tree to the gradient and hessian of the log loss, leaves carry
//! `-G / (H + lambda)` scaled by the learning rate.

use crate::classifier::{sigmoid, RegressionTree, TreeEnsemble, TreeNode};
use crate::features::NUM_FEATURES;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Hyperparameters for boosting
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoostingParams {
    pub n_estimators: usize,
    pub learning_rate: f64,
    pub max_depth: usize,
    /// L2 regularization on leaf weights
    pub lambda: f64,
    /// Minimum loss reduction to keep a split
    pub gamma: f64,
    /// Minimum hessian sum in each child
    pub min_child_weight: f64,
}

impl Default for BoostingParams {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            learning_rate: 0.1,
            max_depth: 6,
            lambda: 1.0,
            gamma: 0.0,
            min_child_weight: 1.0,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Split {
    feature: usize,
    threshold: f64,
    gain: f64,
}

struct TreeBuilder<'a> {
    rows: &'a [[f64; NUM_FEATURES]],
    grad: &'a [f64],
    hess: &'a [f64],
    params: &'a BoostingParams,
    nodes: Vec<TreeNode>,
}

impl<'a> TreeBuilder<'a> {
    fn build(mut self, indices: &mut [usize]) -> RegressionTree {
        self.grow(indices, 0);
        RegressionTree { nodes: self.nodes }
    }

    fn grow(&mut self, indices: &mut [usize], depth: usize) -> usize {
        let node_id = self.nodes.len();
        self.nodes.push(TreeNode::Leaf { value: 0.0 });

        let (g_sum, h_sum) = self.sums(indices);

        if depth < self.params.max_depth {
            if let Some(split) = self.best_split(indices, g_sum, h_sum) {
                let mid = partition(indices, |&i| self.rows[i][split.feature] < split.threshold);
                let (left_idx, right_idx) = indices.split_at_mut(mid);
                let left = self.grow(left_idx, depth + 1);
                let right = self.grow(right_idx, depth + 1);
                self.nodes[node_id] = TreeNode::Split {
                    feature: split.feature,
                    threshold: split.threshold,
                    left,
                    right,
                };
                return node_id;
            }
        }

        let weight = -g_sum / (h_sum + self.params.lambda);
        self.nodes[node_id] = TreeNode::Leaf {
            value: weight * self.params.learning_rate,
        };
        node_id
    }

    fn sums(&self, indices: &[usize]) -> (f64, f64) {
        indices
            .iter()
            .fold((0.0, 0.0), |(g, h), &i| (g + self.grad[i], h + self.hess[i]))
    }

    fn score(&self, g: f64, h: f64) -> f64 {
        g * g / (h + self.params.lambda)
    }

    fn best_split(&self, indices: &[usize], g_sum: f64, h_sum: f64) -> Option<Split> {
        if indices.len() < 2 {
            return None;
        }

        let parent = self.score(g_sum, h_sum);
        let mut best: Option<Split> = None;
        let mut sorted = indices.to_vec();

        for feature in 0..NUM_FEATURES {
            sorted.sort_by(|&a, &b| self.rows[a][feature].total_cmp(&self.rows[b][feature]));

            let (mut g_left, mut h_left) = (0.0, 0.0);
            for pos in 0..sorted.len() - 1 {
                let i = sorted[pos];
                g_left += self.grad[i];
                h_left += self.hess[i];

                let value = self.rows[i][feature];
                let next = self.rows[sorted[pos + 1]][feature];
                if value == next {
                    continue;
                }

                let (g_right, h_right) = (g_sum - g_left, h_sum - h_left);
                if h_left < self.params.min_child_weight || h_right < self.params.min_child_weight {
                    continue;
                }

                let gain = 0.5 * (self.score(g_left, h_left) + self.score(g_right, h_right) - parent)
                    - self.params.gamma;
                if gain > 0.0 && best.map_or(true, |b| gain > b.gain) {
                    best = Some(Split {
                        feature,
                        threshold: (value + next) / 2.0,
                        gain,
                    });
                }
            }
        }

        best
    }
}

/// Move rows matching `pred` to the front, returning how many matched
fn partition<F: Fn(&usize) -> bool>(indices: &mut [usize], pred: F) -> usize {
    let mut mid = 0;
    for i in 0..indices.len() {
        if pred(&indices[i]) {
            indices.swap(i, mid);
            mid += 1;
        }
    }
    mid
}

/// Fit a boosted ensemble; the initial prediction is 0.5 (zero margin)
pub fn fit(rows: &[[f64; NUM_FEATURES]], labels: &[bool], params: &BoostingParams) -> TreeEnsemble {
    debug_assert_eq!(rows.len(), labels.len());

    let n = rows.len();
    let targets: Vec<f64> = labels.iter().map(|&l| if l { 1.0 } else { 0.0 }).collect();
    let mut margins = vec![0.0; n];
    let mut grad = vec![0.0; n];
    let mut hess = vec![0.0; n];
    let mut trees = Vec::with_capacity(params.n_estimators);

    for round in 0..params.n_estimators {
        for i in 0..n {
            let p = sigmoid(margins[i]);
            grad[i] = p - targets[i];
            hess[i] = (p * (1.0 - p)).max(1e-16);
        }

        let mut indices: Vec<usize> = (0..n).collect();
        let tree = TreeBuilder {
            rows,
            grad: &grad,
            hess: &hess,
            params,
            nodes: Vec::new(),
        }
        .build(&mut indices);

        for (margin, row) in margins.iter_mut().zip(rows) {
            *margin += tree.evaluate(row);
        }

        if round % 25 == 0 {
            debug!(round, nodes = tree.nodes.len(), "Boosting round complete");
        }
        trees.push(tree);
    }

    TreeEnsemble::new(0.0, trees)
}
