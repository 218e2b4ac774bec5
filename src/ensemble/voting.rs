//! Voting regressor

use crate::data::FeatureTable;
use crate::error::{ModelBenchError, Result};
use crate::training::Regressor;
use ndarray::Array1;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// How per-model predictions are combined for each row
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub enum AggregationMethod {
    /// Weighted mean
    Mean,
    /// Weighted median
    Median,
    /// Weighted mean after dropping `trim_ratio / 2` of the models at each end
    TrimmedMean { trim_ratio: f64 },
}

/// Combines the predictions of independently fitted regressors.
///
/// Weights default to uniform and are normalized to sum to one.
#[derive(Debug)]
pub struct VotingRegressor {
    components: Vec<(String, Box<dyn Regressor>)>,
    weights: Option<Vec<f64>>,
    aggregation: AggregationMethod,
    fitted: bool,
}

impl VotingRegressor {
    /// Uniform-weighted mean over at least one component
    pub fn new(components: Vec<(String, Box<dyn Regressor>)>) -> Result<Self> {
        if components.is_empty() {
            return Err(ModelBenchError::ConfigError(
                "voting regressor needs at least one component".to_string(),
            ));
        }
        Ok(Self {
            components,
            weights: None,
            aggregation: AggregationMethod::Mean,
            fitted: false,
        })
    }

    /// Set model weights, one per component
    pub fn with_weights(mut self, weights: Vec<f64>) -> Result<Self> {
        if weights.len() != self.components.len() {
            return Err(ModelBenchError::ConfigError(format!(
                "{} components but {} weights",
                self.components.len(),
                weights.len()
            )));
        }
        let sum: f64 = weights.iter().sum();
        if weights.iter().any(|w| *w < 0.0 || !w.is_finite()) || sum <= 0.0 {
            return Err(ModelBenchError::ConfigError(
                "voting weights must be non-negative with a positive sum".to_string(),
            ));
        }
        self.weights = Some(weights.iter().map(|w| w / sum).collect());
        Ok(self)
    }

    /// How component predictions are combined
    pub fn with_aggregation(mut self, method: AggregationMethod) -> Self {
        self.aggregation = method;
        self
    }

    /// Normalized weights actually applied
    pub fn weights(&self) -> Vec<f64> {
        let n = self.components.len();
        self.weights
            .clone()
            .unwrap_or_else(|| vec![1.0 / n as f64; n])
    }

    /// Combine already computed predictions, one array per component
    pub fn aggregate(&self, predictions: &[Array1<f64>]) -> Result<Array1<f64>> {
        let weights = self.weights();
        if predictions.len() != weights.len() {
            return Err(ModelBenchError::dimension_mismatch(
                format!("{} prediction arrays", weights.len()),
                format!("{} prediction arrays", predictions.len()),
            ));
        }
        let n_samples = predictions.first().map_or(0, |p| p.len());
        if predictions.iter().any(|p| p.len() != n_samples) {
            return Err(ModelBenchError::dimension_mismatch(
                format!("{} predictions per model", n_samples),
                "ragged prediction arrays",
            ));
        }

        Ok(Array1::from_shape_fn(n_samples, |i| {
            let mut row: Vec<(f64, f64)> = predictions
                .iter()
                .zip(weights.iter())
                .map(|(pred, &w)| (pred[i], w))
                .collect();
            match self.aggregation {
                AggregationMethod::Mean => row.iter().map(|(v, w)| v * w).sum::<f64>(),
                AggregationMethod::Median => weighted_median(&mut row),
                AggregationMethod::TrimmedMean { trim_ratio } => trimmed_mean(&mut row, trim_ratio),
            }
        }))
    }
}

fn sort_by_value(row: &mut [(f64, f64)]) {
    row.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(Ordering::Equal));
}

fn weighted_median(row: &mut [(f64, f64)]) -> f64 {
    sort_by_value(row);
    let half = row.iter().map(|(_, w)| w).sum::<f64>() / 2.0;
    let mut cumulative = 0.0;
    for &(value, weight) in row.iter() {
        cumulative += weight;
        if cumulative >= half {
            return value;
        }
    }
    row.last().map_or(0.0, |(v, _)| *v)
}

fn trimmed_mean(row: &mut [(f64, f64)], trim_ratio: f64) -> f64 {
    sort_by_value(row);
    let n_trim = ((row.len() as f64 * trim_ratio.clamp(0.0, 1.0)) / 2.0).floor() as usize;
    let kept = if n_trim > 0 && row.len() > 2 * n_trim {
        &row[n_trim..row.len() - n_trim]
    } else {
        &row[..]
    };

    let weight_sum: f64 = kept.iter().map(|(_, w)| w).sum();
    if weight_sum > 0.0 {
        kept.iter().map(|(v, w)| v * w).sum::<f64>() / weight_sum
    } else {
        0.0
    }
}

impl Regressor for VotingRegressor {
    fn fit(&mut self, x: &FeatureTable, y: &Array1<f64>) -> Result<()> {
        crate::training::check_fit_input(x, y)?;
        self.fitted = false;
        for (name, model) in self.components.iter_mut() {
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
        let predictions = self
            .components
            .iter()
            .map(|(_, m)| m.predict(x))
            .collect::<Result<Vec<_>>>()?;
        self.aggregate(&predictions)
    }

    fn fresh(&self) -> Box<dyn Regressor> {
        Box::new(Self {
            components: self
                .components
                .iter()
                .map(|(name, m)| (name.clone(), m.fresh()))
                .collect(),
            weights: self.weights.clone(),
            aggregation: self.aggregation,
            fitted: false,
        })
    }
}
