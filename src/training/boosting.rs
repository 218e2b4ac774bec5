//! Gradient boosted regression trees
//!
//! Squared-loss boosting: each round fits a shallow tree to the current
//! residuals and adds its shrunken prediction to the ensemble.

use super::importance::ImportanceKind;
use super::regressor::{check_fit_input, check_predict_columns, Regressor};
use super::tree::DecisionTreeRegressor;
use crate::data::FeatureTable;
use crate::error::{ModelBenchError, Result};
use ndarray::{Array1, Axis};
use rand::seq::index::sample;
use rand::{RngCore, SeedableRng};
use rand_xoshiro::Xoshiro256PlusPlus;
use serde::{Deserialize, Serialize};

/// Gradient boosting configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradientBoostingConfig {
    /// Number of boosting rounds (trees)
    pub n_estimators: usize,
    /// Shrinkage applied to every tree
    pub learning_rate: f64,
    pub max_depth: usize,
    pub min_samples_leaf: usize,
    /// Fraction of rows drawn (without replacement) per round
    pub subsample: f64,
    pub random_state: Option<u64>,
}

impl Default for GradientBoostingConfig {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            learning_rate: 0.1,
            max_depth: 3,
            min_samples_leaf: 1,
            subsample: 1.0,
            random_state: Some(42),
        }
    }
}

impl GradientBoostingConfig {
    fn validate(&self) -> Result<()> {
        if self.n_estimators == 0 {
            return Err(ModelBenchError::ConfigError(
                "n_estimators must be at least 1".to_string(),
            ));
        }
        if !(self.learning_rate > 0.0) {
            return Err(ModelBenchError::ConfigError(format!(
                "learning_rate must be positive, got {}",
                self.learning_rate
            )));
        }
        if !(self.subsample > 0.0 && self.subsample <= 1.0) {
            return Err(ModelBenchError::ConfigError(format!(
                "subsample must be in (0, 1], got {}",
                self.subsample
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct FittedBoosting {
    initial_prediction: f64,
    trees: Vec<DecisionTreeRegressor>,
    columns: Vec<String>,
    importances: Array1<f64>,
    /// Training MSE after each round
    train_loss: Vec<f64>,
}

/// Gradient boosting regressor
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GradientBoostingRegressor {
    config: GradientBoostingConfig,
    fitted: Option<FittedBoosting>,
}

impl Default for GradientBoostingRegressor {
    fn default() -> Self {
        Self::new(GradientBoostingConfig::default())
    }
}

impl GradientBoostingRegressor {
    /// Unfitted booster; the config is validated at fit time
    pub fn new(config: GradientBoostingConfig) -> Self {
        Self {
            config,
            fitted: None,
        }
    }

    /// Boosting hyperparameters
    pub fn config(&self) -> &GradientBoostingConfig {
        &self.config
    }

    /// Training loss per boosting round, if fitted
    pub fn train_loss(&self) -> Option<&[f64]> {
        self.fitted.as_ref().map(|f| f.train_loss.as_slice())
    }
}

impl Regressor for GradientBoostingRegressor {
    fn fit(&mut self, x: &FeatureTable, y: &Array1<f64>) -> Result<()> {
        self.fitted = None;
        check_fit_input(x, y)?;
        self.config.validate()?;

        let values = x.values();
        let n_samples = values.nrows();
        let n_rows = ((n_samples as f64) * self.config.subsample).ceil() as usize;
        let n_rows = n_rows.clamp(1, n_samples);

        let mut rng = match self.config.random_state {
            Some(seed) => Xoshiro256PlusPlus::seed_from_u64(seed),
            None => Xoshiro256PlusPlus::from_entropy(),
        };

        let initial_prediction = y.mean().unwrap_or(0.0);
        let mut predictions = Array1::from_elem(n_samples, initial_prediction);
        let mut importances = Array1::<f64>::zeros(values.ncols());
        let mut trees = Vec::with_capacity(self.config.n_estimators);
        let mut train_loss = Vec::with_capacity(self.config.n_estimators);

        for _ in 0..self.config.n_estimators {
            let residuals = y - &predictions;

            let mut tree = DecisionTreeRegressor::new()
                .with_max_depth(self.config.max_depth)
                .with_min_samples_leaf(self.config.min_samples_leaf)
                .with_random_state(rng.next_u64());

            if n_rows < n_samples {
                let rows = sample(&mut rng, n_samples, n_rows).into_vec();
                let xs = values.select(Axis(0), &rows);
                let rs: Array1<f64> = rows.iter().map(|&i| residuals[i]).collect();
                tree.fit_arrays(&xs, &rs, Vec::new());
            } else {
                tree.fit_arrays(values, &residuals, Vec::new());
            }

            // every row moves, including those left out of this round's sample
            let update = tree.predict_array(values)?;
            predictions.scaled_add(self.config.learning_rate, &update);

            if let Some(imp) = tree.feature_importances() {
                importances += &imp;
            }

            let mse = (y - &predictions).mapv(|e| e * e).mean().unwrap_or(0.0);
            train_loss.push(mse);
            trees.push(tree);
        }

        let total = importances.sum();
        if total > 0.0 {
            importances /= total;
        }

        tracing::debug!(
            rounds = trees.len(),
            final_train_mse = train_loss.last().copied().unwrap_or(0.0),
            "gradient boosting fitted"
        );

        self.fitted = Some(FittedBoosting {
            initial_prediction,
            trees,
            columns: x.columns().to_vec(),
            importances,
            train_loss,
        });
        Ok(())
    }

    fn predict(&self, x: &FeatureTable) -> Result<Array1<f64>> {
        let fitted = self.fitted.as_ref().ok_or(ModelBenchError::ModelNotFitted)?;
        check_predict_columns(&fitted.columns, x)?;

        let mut predictions = Array1::from_elem(x.nrows(), fitted.initial_prediction);
        for tree in &fitted.trees {
            let update = tree.predict_array(x.values())?;
            predictions.scaled_add(self.config.learning_rate, &update);
        }
        Ok(predictions)
    }

    fn fresh(&self) -> Box<dyn Regressor> {
        Box::new(Self::new(self.config.clone()))
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

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;

    fn data() -> (FeatureTable, Array1<f64>) {
        let x = Array2::from_shape_fn((80, 2), |(i, j)| {
            if j == 0 {
                i as f64 / 8.0
            } else {
                ((i * 7) % 11) as f64
            }
        });
        let y = x.map_axis(Axis(1), |r| r[0].sin() * 4.0 + 0.5 * r[1]);
        (FeatureTable::from_array(x), y)
    }

    #[test]
    fn test_training_loss_decreases() {
        let (x, y) = data();
        let mut model = GradientBoostingRegressor::new(GradientBoostingConfig {
            n_estimators: 50,
            ..Default::default()
        });
        model.fit(&x, &y).unwrap();

        let loss = model.train_loss().unwrap();
        assert_eq!(loss.len(), 50);
        assert!(loss[49] < loss[0]);
        for pair in loss.windows(2) {
            assert!(pair[1] <= pair[0] + 1e-12);
        }
    }

    #[test]
    fn test_subsampled_boosting_fits() {
        let (x, y) = data();
        let mut model = GradientBoostingRegressor::new(GradientBoostingConfig {
            n_estimators: 80,
            subsample: 0.7,
            random_state: Some(3),
            ..Default::default()
        });
        model.fit(&x, &y).unwrap();

        let pred = model.predict(&x).unwrap();
        let mse = (&pred - &y).mapv(|e| e * e).mean().unwrap();
        let var = y.mapv(|v| (v - y.mean().unwrap()).powi(2)).mean().unwrap();
        assert!(mse < 0.1 * var);
    }

    #[test]
    fn test_invalid_config() {
        let (x, y) = data();
        let mut model = GradientBoostingRegressor::new(GradientBoostingConfig {
            subsample: 0.0,
            ..Default::default()
        });
        assert!(matches!(model.fit(&x, &y), Err(ModelBenchError::ConfigError(_))));
    }

    #[test]
    fn test_single_round_is_shrunken_tree() {
        let (x, y) = data();
        let config = GradientBoostingConfig {
            n_estimators: 1,
            learning_rate: 1.0,
            max_depth: 2,
            ..Default::default()
        };
        let mut boosted = GradientBoostingRegressor::new(config);
        boosted.fit(&x, &y).unwrap();

        let mut tree = DecisionTreeRegressor::new().with_max_depth(2);
        let centered = &y - y.mean().unwrap();
        tree.fit(&x, &centered).unwrap();

        let expected = tree.predict(&x).unwrap() + y.mean().unwrap();
        let got = boosted.predict(&x).unwrap();
        for (a, b) in got.iter().zip(expected.iter()) {
            assert!((a - b).abs() < 1e-9);
        }
    }
}
