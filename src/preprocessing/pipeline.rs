//! Transformer chain ending in a regressor

use super::{PolynomialFeatures, StandardScaler, Transformer};
use crate::data::FeatureTable;
use crate::error::{ModelBenchError, Result};
use crate::training::{ImportanceKind, Regressor, RidgeRegression};
use ndarray::Array1;

/// Fits each transformer on the output of the previous one, then the
/// final regressor on the fully transformed table.
///
/// Importances and coefficients come from the final regressor and are
/// therefore aligned to the transformed columns, not the raw input.
#[derive(Debug)]
pub struct Pipeline {
    steps: Vec<Box<dyn Transformer>>,
    model: Box<dyn Regressor>,
    input_columns: Option<Vec<String>>,
}

impl Pipeline {
    /// Pipeline with no transformers yet
    pub fn new(model: Box<dyn Regressor>) -> Self {
        Self {
            steps: Vec::new(),
            model,
            input_columns: None,
        }
    }

    /// Append a transformer before the final regressor
    pub fn with_step(mut self, step: Box<dyn Transformer>) -> Self {
        self.steps.push(step);
        self
    }

    /// Standardize, expand to `degree`, then ridge with `alpha`
    pub fn polynomial_regression(degree: usize, alpha: f64) -> Self {
        Self::new(Box::new(RidgeRegression::new(alpha)))
            .with_step(Box::new(StandardScaler::new()))
            .with_step(Box::new(PolynomialFeatures::new(degree)))
    }

    /// Number of transformers
    pub fn n_steps(&self) -> usize {
        self.steps.len()
    }

    /// Final regressor
    pub fn model(&self) -> &dyn Regressor {
        self.model.as_ref()
    }

    /// Run the fitted transformers over `x`
    pub fn transform(&self, x: &FeatureTable) -> Result<FeatureTable> {
        let mut current = x.clone();
        for step in &self.steps {
            current = step.transform(&current)?;
        }
        Ok(current)
    }
}

impl Regressor for Pipeline {
    fn fit(&mut self, x: &FeatureTable, y: &Array1<f64>) -> Result<()> {
        self.input_columns = None;
        crate::training::check_fit_input(x, y)?;

        let mut current = x.clone();
        for step in self.steps.iter_mut() {
            current = step.fit_transform(&current)?;
        }
        self.model.fit(&current, y)?;
        self.input_columns = Some(x.columns().to_vec());
        Ok(())
    }

    fn predict(&self, x: &FeatureTable) -> Result<Array1<f64>> {
        let columns = self
            .input_columns
            .as_ref()
            .ok_or(ModelBenchError::ModelNotFitted)?;
        crate::training::check_predict_columns(columns, x)?;
        self.model.predict(&self.transform(x)?)
    }

    fn fresh(&self) -> Box<dyn Regressor> {
        Box::new(Self {
            steps: self.steps.iter().map(|s| s.fresh()).collect(),
            model: self.model.fresh(),
            input_columns: None,
        })
    }

    fn importance_kind(&self) -> ImportanceKind {
        self.model.importance_kind()
    }

    fn feature_importances(&self) -> Option<Array1<f64>> {
        self.model.feature_importances()
    }

    fn coefficients(&self) -> Option<Array1<f64>> {
        self.model.coefficients()
    }

    fn feature_names(&self) -> Option<&[String]> {
        self.model.feature_names()
    }
}
