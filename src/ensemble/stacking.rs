//! Stacking regressor

use crate::data::FeatureTable;
use crate::error::{ModelBenchError, Result};
use crate::training::{KFold, Regressor, RidgeRegression};
use ndarray::{concatenate, Array1, Array2, Axis};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::debug;

/// Configuration for stacking ensemble
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StackingConfig {
    /// Number of folds used to build out-of-fold base predictions
    pub n_folds: usize,
    /// Whether to include original features in the final estimator's input
    pub passthrough: bool,
    /// Seed for the fold shuffle
    pub random_state: Option<u64>,
}

impl Default for StackingConfig {
    fn default() -> Self {
        Self {
            n_folds: 5,
            passthrough: false,
            random_state: Some(42),
        }
    }
}

/// Fits a final estimator on out-of-fold predictions of the base models.
///
/// For prediction the base models are refit on the full training data.
/// The final estimator sees one `pred_<name>` column per base model,
/// followed by the input columns when `passthrough` is set.
#[derive(Debug)]
pub struct StackingRegressor {
    config: StackingConfig,
    base: Vec<(String, Box<dyn Regressor>)>,
    final_estimator: Box<dyn Regressor>,
    fitted: bool,
}

impl StackingRegressor {
    /// Default config with a ridge final estimator
    pub fn new(base: Vec<(String, Box<dyn Regressor>)>) -> Result<Self> {
        Self::with_config(base, StackingConfig::default())
    }

    /// Needs a non-empty base with unique names and at least 2 folds
    pub fn with_config(base: Vec<(String, Box<dyn Regressor>)>, config: StackingConfig) -> Result<Self> {
        if base.is_empty() {
            return Err(ModelBenchError::ConfigError(
                "stacking regressor needs at least one base model".to_string(),
            ));
        }
        if config.n_folds < 2 {
            return Err(ModelBenchError::ConfigError(format!(
                "stacking needs at least 2 folds, got {}",
                config.n_folds
            )));
        }
        let mut seen = HashSet::with_capacity(base.len());
        if let Some((name, _)) = base.iter().find(|(name, _)| !seen.insert(name.as_str())) {
            return Err(ModelBenchError::ConfigError(format!(
                "duplicate base model name '{}'",
                name
            )));
        }
        Ok(Self {
            config,
            base,
            final_estimator: Box::new(RidgeRegression::new(1.0)),
            fitted: false,
        })
    }

    /// Replace the default ridge final estimator
    pub fn with_final_estimator(mut self, estimator: Box<dyn Regressor>) -> Self {
        self.final_estimator = estimator;
        self
    }

    /// Fold and passthrough settings
    pub fn config(&self) -> &StackingConfig {
        &self.config
    }

    /// Model fitted on the base predictions
    pub fn final_estimator(&self) -> &dyn Regressor {
        self.final_estimator.as_ref()
    }

    fn meta_columns(&self, x: &FeatureTable) -> Result<Vec<String>> {
        let mut columns: Vec<String> = self.base.iter().map(|(n, _)| format!("pred_{}", n)).collect();
        if self.config.passthrough {
            if let Some(clash) = x.columns().iter().find(|c| columns.contains(c)) {
                return Err(ModelBenchError::ConfigError(format!(
                    "passthrough column '{}' collides with a base prediction column",
                    clash
                )));
            }
            columns.extend(x.columns().iter().cloned());
        }
        Ok(columns)
    }

    fn meta_table(&self, x: &FeatureTable, base_predictions: Array2<f64>) -> Result<FeatureTable> {
        let values = if self.config.passthrough {
            concatenate(Axis(1), &[base_predictions.view(), x.values().view()])?
        } else {
            base_predictions
        };
        FeatureTable::new(self.meta_columns(x)?, values)
    }

    fn out_of_fold(&self, x: &FeatureTable, y: &Array1<f64>) -> Result<Array2<f64>> {
        let kfold = KFold {
            n_splits: self.config.n_folds,
            shuffle: true,
            random_state: self.config.random_state,
        };
        let splits = kfold.split(x.nrows())?;
        let mut oof = Array2::zeros((x.nrows(), self.base.len()));

        for (j, (name, model)) in self.base.iter().enumerate() {
            for split in &splits {
                let x_train = x.select_rows(&split.train_indices);
                let y_train = y.select(Axis(0), &split.train_indices);
                let mut fold_model = model.fresh();
                fold_model
                    .fit(&x_train, &y_train)
                    .map_err(|e| ModelBenchError::fit_failure(name.as_str(), &e))?;

                let pred = fold_model.predict(&x.select_rows(&split.test_indices))?;
                for (local, &row) in split.test_indices.iter().enumerate() {
                    oof[[row, j]] = pred[local];
                }
            }
            debug!(base = %name, folds = splits.len(), "out-of-fold predictions ready");
        }
        Ok(oof)
    }
}

impl Regressor for StackingRegressor {
    fn fit(&mut self, x: &FeatureTable, y: &Array1<f64>) -> Result<()> {
        crate::training::check_fit_input(x, y)?;
        self.fitted = false;
        self.meta_columns(x)?;

        let oof = self.out_of_fold(x, y)?;
        let meta = self.meta_table(x, oof)?;
        self.final_estimator
            .fit(&meta, y)
            .map_err(|e| ModelBenchError::fit_failure("final_estimator", &e))?;

        for (name, model) in self.base.iter_mut() {
            model
                .fit(x, y)
                .map_err(|e| ModelBenchError::fit_failure(name.as_str(), &e))?;
        }

        self.fitted = true;
        Ok(())
    }

    fn predict(&self, x: &FeatureTable) -> Result<Array1<f64>> {
        if !self.fitted {
            return Err(ModelBenchError::ModelNotFitted);
        }

        let mut base_predictions = Array2::zeros((x.nrows(), self.base.len()));
        for (j, (_, model)) in self.base.iter().enumerate() {
            base_predictions.column_mut(j).assign(&model.predict(x)?);
        }
        self.final_estimator.predict(&self.meta_table(x, base_predictions)?)
    }

    fn fresh(&self) -> Box<dyn Regressor> {
        Box::new(Self {
            config: self.config.clone(),
            base: self
                .base
                .iter()
                .map(|(name, m)| (name.clone(), m.fresh()))
                .collect(),
            final_estimator: self.final_estimator.fresh(),
            fitted: false,
        })
    }
}
