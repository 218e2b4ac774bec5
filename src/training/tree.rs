//! CART regression tree

use super::importance::ImportanceKind;
use super::regressor::{check_fit_input, check_predict_columns, Regressor};
use crate::data::FeatureTable;
use crate::error::{ModelBenchError, Result};
use ndarray::{Array1, Array2, ArrayView1};
use rand::seq::index::sample;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Decision tree node
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum TreeNode {
    Leaf {
        value: f64,
        n_samples: usize,
    },
    Split {
        feature_idx: usize,
        threshold: f64,
        left: Box<TreeNode>,
        right: Box<TreeNode>,
        n_samples: usize,
    },
}

impl TreeNode {
    fn predict_row(&self, row: ArrayView1<f64>) -> f64 {
        let mut node = self;
        loop {
            match node {
                TreeNode::Leaf { value, .. } => return *value,
                TreeNode::Split {
                    feature_idx,
                    threshold,
                    left,
                    right,
                    ..
                } => {
                    node = if row[*feature_idx] <= *threshold {
                        left
                    } else {
                        right
                    };
                }
            }
        }
    }

    /// Depth of the deepest leaf (a lone leaf has depth 0)
    pub fn depth(&self) -> usize {
        match self {
            TreeNode::Leaf { .. } => 0,
            TreeNode::Split { left, right, .. } => 1 + left.depth().max(right.depth()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct FittedTree {
    root: TreeNode,
    columns: Vec<String>,
    importances: Array1<f64>,
}

/// Best split found for one feature: (feature, threshold, sse reduction)
type SplitCandidate = (usize, f64, f64);

/// Regression tree minimizing squared error
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionTreeRegressor {
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    /// Features considered per split; `None` means all
    pub max_features: Option<usize>,
    pub random_state: Option<u64>,
    fitted: Option<FittedTree>,
}

impl Default for DecisionTreeRegressor {
    fn default() -> Self {
        Self::new()
    }
}

impl DecisionTreeRegressor {
    /// Unbounded depth, splits on every feature
    pub fn new() -> Self {
        Self {
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: None,
            random_state: None,
            fitted: None,
        }
    }

    /// Depth limit
    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }

    /// Minimum rows needed to split a node
    pub fn with_min_samples_split(mut self, min_samples: usize) -> Self {
        self.min_samples_split = min_samples.max(2);
        self
    }

    /// Minimum rows per leaf
    pub fn with_min_samples_leaf(mut self, min_samples: usize) -> Self {
        self.min_samples_leaf = min_samples.max(1);
        self
    }

    /// Random subset of features tried per split
    pub fn with_max_features(mut self, max_features: usize) -> Self {
        self.max_features = Some(max_features.max(1));
        self
    }

    /// Seed for the feature subset
    pub fn with_random_state(mut self, seed: u64) -> Self {
        self.random_state = Some(seed);
        self
    }

    /// Root of the fitted tree
    pub fn root(&self) -> Option<&TreeNode> {
        self.fitted.as_ref().map(|f| &f.root)
    }

    /// Fit on raw arrays; used directly by the forest and boosting models
    pub(crate) fn fit_arrays(&mut self, x: &Array2<f64>, y: &Array1<f64>, columns: Vec<String>) {
        let n_features = x.ncols();
        let mut rng = match self.random_state {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };

        let mut importances = vec![0.0; n_features];
        let indices: Vec<usize> = (0..x.nrows()).collect();
        let root = self.build(x, y, &indices, 0, &mut importances, &mut rng);

        let total: f64 = importances.iter().sum();
        if total > 0.0 {
            for imp in &mut importances {
                *imp /= total;
            }
        }

        self.fitted = Some(FittedTree {
            root,
            columns,
            importances: Array1::from_vec(importances),
        });
    }

    pub(crate) fn predict_array(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let fitted = self.fitted.as_ref().ok_or(ModelBenchError::ModelNotFitted)?;
        Ok(x.rows().into_iter().map(|row| fitted.root.predict_row(row)).collect())
    }

    fn build(
        &self,
        x: &Array2<f64>,
        y: &Array1<f64>,
        indices: &[usize],
        depth: usize,
        importances: &mut [f64],
        rng: &mut ChaCha8Rng,
    ) -> TreeNode {
        let n_samples = indices.len();
        let (sum, sq_sum) = indices
            .iter()
            .fold((0.0, 0.0), |(s, q), &i| (s + y[i], q + y[i] * y[i]));
        let mean = sum / n_samples as f64;
        let sse = sq_sum - sum * sum / n_samples as f64;

        let should_stop = n_samples < self.min_samples_split
            || n_samples < 2 * self.min_samples_leaf
            || self.max_depth.map_or(false, |d| depth >= d)
            || sse <= 1e-12;

        if should_stop {
            return TreeNode::Leaf {
                value: mean,
                n_samples,
            };
        }

        let candidates = self.candidate_features(x.ncols(), rng);
        let Some((feature_idx, threshold, gain)) = self.best_split(x, y, indices, &candidates, sse)
        else {
            return TreeNode::Leaf {
                value: mean,
                n_samples,
            };
        };

        let (left_idx, right_idx): (Vec<usize>, Vec<usize>) = indices
            .iter()
            .partition(|&&i| x[[i, feature_idx]] <= threshold);

        importances[feature_idx] += gain;

        let left = Box::new(self.build(x, y, &left_idx, depth + 1, importances, rng));
        let right = Box::new(self.build(x, y, &right_idx, depth + 1, importances, rng));

        TreeNode::Split {
            feature_idx,
            threshold,
            left,
            right,
            n_samples,
        }
    }

    fn candidate_features(&self, n_features: usize, rng: &mut ChaCha8Rng) -> Vec<usize> {
        match self.max_features {
            Some(k) if k < n_features => {
                let mut picked = sample(rng, n_features, k).into_vec();
                picked.sort_unstable();
                picked
            }
            _ => (0..n_features).collect(),
        }
    }

    /// Scan each candidate feature in parallel with prefix sums over sorted values
    fn best_split(
        &self,
        x: &Array2<f64>,
        y: &Array1<f64>,
        indices: &[usize],
        features: &[usize],
        parent_sse: f64,
    ) -> Option<SplitCandidate> {
        let min_leaf = self.min_samples_leaf;
        let n = indices.len();

        let per_feature: Vec<Option<SplitCandidate>> = features
            .par_iter()
            .map(|&feature_idx| {
                let mut order: Vec<(f64, f64)> =
                    indices.iter().map(|&i| (x[[i, feature_idx]], y[i])).collect();
                order.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));

                let total_sum: f64 = order.iter().map(|(_, v)| v).sum();
                let total_sq: f64 = order.iter().map(|(_, v)| v * v).sum();

                let mut left_sum = 0.0;
                let mut left_sq = 0.0;
                let mut best: Option<SplitCandidate> = None;

                for k in 0..n - 1 {
                    let (value, target) = order[k];
                    left_sum += target;
                    left_sq += target * target;

                    let left_n = k + 1;
                    let right_n = n - left_n;
                    if left_n < min_leaf || right_n < min_leaf {
                        continue;
                    }
                    let next_value = order[k + 1].0;
                    if next_value <= value {
                        continue;
                    }

                    let right_sum = total_sum - left_sum;
                    let right_sq = total_sq - left_sq;
                    let left_sse = left_sq - left_sum * left_sum / left_n as f64;
                    let right_sse = right_sq - right_sum * right_sum / right_n as f64;
                    let gain = parent_sse - left_sse - right_sse;

                    if gain > 1e-12 && best.map_or(true, |b| gain > b.2) {
                        best = Some((feature_idx, (value + next_value) / 2.0, gain));
                    }
                }

                best
            })
            .collect();

        per_feature.into_iter().flatten().fold(None, |acc, cand| match acc {
            Some(best) if best.2 >= cand.2 => Some(best),
            _ => Some(cand),
        })
    }
}

impl Regressor for DecisionTreeRegressor {
    fn fit(&mut self, x: &FeatureTable, y: &Array1<f64>) -> Result<()> {
        self.fitted = None;
        check_fit_input(x, y)?;
        self.fit_arrays(x.values(), y, x.columns().to_vec());
        Ok(())
    }

    fn predict(&self, x: &FeatureTable) -> Result<Array1<f64>> {
        let fitted = self.fitted.as_ref().ok_or(ModelBenchError::ModelNotFitted)?;
        check_predict_columns(&fitted.columns, x)?;
        self.predict_array(x.values())
    }

    fn fresh(&self) -> Box<dyn Regressor> {
        Box::new(self.clone_params())
    }

    fn importance_kind(&self) -> ImportanceKind {
        ImportanceKind::TreeBased
    }

    fn feature_importances(&self) -> Option<Array1<f64>> {
        self.fitted.as_ref().map(|f| f.importances.clone())
    }

    fn feature_names(&self) -> Option<&[String]> {
        self.fitted.as_ref().map(|f| f.columns.as_slice())
    }
}

impl DecisionTreeRegressor {
    fn clone_params(&self) -> Self {
        Self {
            max_depth: self.max_depth,
            min_samples_split: self.min_samples_split,
            min_samples_leaf: self.min_samples_leaf,
            max_features: self.max_features,
            random_state: self.random_state,
            fitted: None,
        }
    }
}
