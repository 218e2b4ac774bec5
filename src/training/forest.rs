//! Random forest regressor

use super::importance::ImportanceKind;
use super::regressor::{check_fit_input, check_predict_columns, Regressor};
use super::tree::DecisionTreeRegressor;
use crate::data::FeatureTable;
use crate::error::{ModelBenchError, Result};
use ndarray::{Array1, Axis};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Strategy for the number of features tried at each split
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum MaxFeatures {
    Sqrt,
    Log2,
    Fraction(f64),
    Fixed(usize),
    All,
}

impl MaxFeatures {
    fn resolve(&self, n_features: usize) -> usize {
        let k = match *self {
            MaxFeatures::Sqrt => (n_features as f64).sqrt().ceil() as usize,
            MaxFeatures::Log2 => (n_features as f64).log2().ceil() as usize,
            MaxFeatures::Fraction(f) => (n_features as f64 * f).ceil() as usize,
            MaxFeatures::Fixed(n) => n,
            MaxFeatures::All => n_features,
        };
        k.clamp(1, n_features.max(1))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct FittedForest {
    trees: Vec<DecisionTreeRegressor>,
    columns: Vec<String>,
    importances: Array1<f64>,
}

/// Bagged regression trees, built in parallel
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RandomForestRegressor {
    pub n_estimators: usize,
    pub max_depth: Option<usize>,
    pub min_samples_leaf: usize,
    pub max_features: MaxFeatures,
    pub bootstrap: bool,
    pub random_state: Option<u64>,
    fitted: Option<FittedForest>,
}

impl Default for RandomForestRegressor {
    fn default() -> Self {
        Self::new(100)
    }
}

impl RandomForestRegressor {
    /// Forest of `n_estimators` bootstrapped trees
    pub fn new(n_estimators: usize) -> Self {
        Self {
            n_estimators,
            max_depth: None,
            min_samples_leaf: 1,
            max_features: MaxFeatures::All,
            bootstrap: true,
            random_state: None,
            fitted: None,
        }
    }

    /// Depth limit for every tree
    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }

    /// Minimum rows per leaf
    pub fn with_min_samples_leaf(mut self, min_samples: usize) -> Self {
        self.min_samples_leaf = min_samples.max(1);
        self
    }

    /// Features considered at each split
    pub fn with_max_features(mut self, max_features: MaxFeatures) -> Self {
        self.max_features = max_features;
        self
    }

    /// Sample rows with replacement per tree
    pub fn with_bootstrap(mut self, bootstrap: bool) -> Self {
        self.bootstrap = bootstrap;
        self
    }

    /// Seed for row and feature sampling
    pub fn with_random_state(mut self, seed: u64) -> Self {
        self.random_state = Some(seed);
        self
    }

    /// Trees in the fitted forest, 0 before fit
    pub fn n_trees(&self) -> usize {
        self.fitted.as_ref().map_or(0, |f| f.trees.len())
    }
}

impl Regressor for RandomForestRegressor {
    fn fit(&mut self, x: &FeatureTable, y: &Array1<f64>) -> Result<()> {
        self.fitted = None;
        check_fit_input(x, y)?;
        if self.n_estimators == 0 {
            return Err(ModelBenchError::ConfigError(
                "random forest needs at least one tree".to_string(),
            ));
        }

        let n_samples = x.nrows();
        let n_features = x.ncols();
        let max_features = self.max_features.resolve(n_features);
        let base_seed = self.random_state.unwrap_or_else(rand::random);
        let values = x.values();

        let trees: Vec<DecisionTreeRegressor> = (0..self.n_estimators)
            .into_par_iter()
            .map(|tree_idx| {
                let seed = base_seed.wrapping_add(tree_idx as u64);
                let mut rng = ChaCha8Rng::seed_from_u64(seed);

                let mut tree = DecisionTreeRegressor::new()
                    .with_min_samples_leaf(self.min_samples_leaf)
                    .with_max_features(max_features)
                    .with_random_state(seed);
                if let Some(depth) = self.max_depth {
                    tree = tree.with_max_depth(depth);
                }

                if self.bootstrap {
                    let sample: Vec<usize> =
                        (0..n_samples).map(|_| rng.gen_range(0..n_samples)).collect();
                    let xs = values.select(Axis(0), &sample);
                    let ys: Array1<f64> = sample.iter().map(|&i| y[i]).collect();
                    tree.fit_arrays(&xs, &ys, Vec::new());
                } else {
                    tree.fit_arrays(values, y, Vec::new());
                }
                tree
            })
            .collect();

        let mut importances = Array1::<f64>::zeros(n_features);
        for tree in &trees {
            if let Some(imp) = tree.feature_importances() {
                importances += &imp;
            }
        }
        let total = importances.sum();
        if total > 0.0 {
            importances /= total;
        }

        self.fitted = Some(FittedForest {
            trees,
            columns: x.columns().to_vec(),
            importances,
        });
        Ok(())
    }

    fn predict(&self, x: &FeatureTable) -> Result<Array1<f64>> {
        let fitted = self.fitted.as_ref().ok_or(ModelBenchError::ModelNotFitted)?;
        check_predict_columns(&fitted.columns, x)?;

        let per_tree: Vec<Array1<f64>> = fitted
            .trees
            .par_iter()
            .map(|tree| tree.predict_array(x.values()))
            .collect::<Result<Vec<_>>>()?;

        let mut sum = Array1::<f64>::zeros(x.nrows());
        for pred in &per_tree {
            sum += pred;
        }
        Ok(sum / fitted.trees.len() as f64)
    }

    fn fresh(&self) -> Box<dyn Regressor> {
        Box::new(Self {
            n_estimators: self.n_estimators,
            max_depth: self.max_depth,
            min_samples_leaf: self.min_samples_leaf,
            max_features: self.max_features,
            bootstrap: self.bootstrap,
            random_state: self.random_state,
            fitted: None,
        })
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
