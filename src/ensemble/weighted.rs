//! Fixed-weight linear combination of regressors

use crate::data::FeatureTable;
use crate::error::{ModelBenchError, Result};
use crate::training::Regressor;
use ndarray::{Array1, Array2};
use tracing::debug;

/// One member of a [`WeightedEnsemble`]
#[derive(Debug)]
pub struct WeightedComponent {
    pub name: String,
    pub model: Box<dyn Regressor>,
    pub weight: f64,
}

impl WeightedComponent {
    /// Named model with its weight
    pub fn new(name: impl Into<String>, model: Box<dyn Regressor>, weight: f64) -> Self {
        Self {
            name: name.into(),
            model,
            weight,
        }
    }
}

/// Predicts `Σ weight_i · prediction_i`.
///
/// Weights are used as given; they need not sum to one.
#[derive(Debug)]
pub struct WeightedEnsemble {
    components: Vec<WeightedComponent>,
    fitted: bool,
}

impl WeightedEnsemble {
    /// Ensemble over at least one component with finite weights
    pub fn new(components: Vec<WeightedComponent>) -> Result<Self> {
        if components.is_empty() {
            return Err(ModelBenchError::ConfigError(
                "weighted ensemble needs at least one component".to_string(),
            ));
        }
        if let Some(c) = components.iter().find(|c| !c.weight.is_finite()) {
            return Err(ModelBenchError::ConfigError(format!(
                "weight for '{}' is not finite",
                c.name
            )));
        }
        Ok(Self {
            components,
            fitted: false,
        })
    }

    /// Pair `models` with `weights` by position.
    ///
    /// `models` must be in insertion order; the i-th weight applies to the
    /// i-th model.
    pub fn from_parts(models: Vec<(String, Box<dyn Regressor>)>, weights: Vec<f64>) -> Result<Self> {
        if models.len() != weights.len() {
            return Err(ModelBenchError::ConfigError(format!(
                "{} models but {} weights",
                models.len(),
                weights.len()
            )));
        }
        Self::new(
            models
                .into_iter()
                .zip(weights)
                .map(|((name, model), weight)| WeightedComponent::new(name, model, weight))
                .collect(),
        )
    }

    /// Components in construction order
    pub fn components(&self) -> &[WeightedComponent] {
        &self.components
    }

    /// Weights in component order, as given
    pub fn weights(&self) -> Vec<f64> {
        self.components.iter().map(|c| c.weight).collect()
    }

    /// Fit on a raw matrix; columns are named `feature_0..`
    pub fn fit_array(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        self.fit(&FeatureTable::from_array(x.clone()), y)
    }

    /// Predict on a raw matrix named the same way as in [`fit_array`](Self::fit_array)
    pub fn predict_array(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        self.predict(&FeatureTable::from_array(x.clone()))
    }
}

impl Regressor for WeightedEnsemble {
    fn fit(&mut self, x: &FeatureTable, y: &Array1<f64>) -> Result<()> {
        crate::training::check_fit_input(x, y)?;
        self.fitted = false;

        for component in self.components.iter_mut() {
            component
                .model
                .fit(x, y)
                .map_err(|e| ModelBenchError::fit_failure(&component.name, &e))?;
            debug!(component = %component.name, weight = component.weight, "fitted ensemble component");
        }

        self.fitted = true;
        Ok(())
    }

    fn predict(&self, x: &FeatureTable) -> Result<Array1<f64>> {
        if !self.fitted {
            return Err(ModelBenchError::ModelNotFitted);
        }

        let mut combined = Array1::zeros(x.nrows());
        for component in &self.components {
            let pred = component.model.predict(x)?;
            combined.scaled_add(component.weight, &pred);
        }
        Ok(combined)
    }

    fn fresh(&self) -> Box<dyn Regressor> {
        Box::new(Self {
            components: self
                .components
                .iter()
                .map(|c| WeightedComponent::new(c.name.clone(), c.model.fresh(), c.weight))
                .collect(),
            fitted: false,
        })
    }
}
