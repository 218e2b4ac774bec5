//! The regressor capability set shared by every model and ensemble

use super::importance::ImportanceKind;
use crate::data::FeatureTable;
use crate::error::{ModelBenchError, Result};
use ndarray::Array1;
use std::fmt::Debug;

/// A model that can be fit on labeled tabular data and produce point predictions.
///
/// `fresh` returns an unfitted instance with the same hyperparameters. The
/// harness uses it to give every cross-validation fold its own model, and
/// ensembles use it so that no two ensembles ever share fitted state.
pub trait Regressor: Send + Sync + Debug {
    /// Fit the model in place
    fn fit(&mut self, x: &FeatureTable, y: &Array1<f64>) -> Result<()>;

    /// Predict one value per input row
    fn predict(&self, x: &FeatureTable) -> Result<Array1<f64>>;

    /// Unfitted copy with identical hyperparameters
    fn fresh(&self) -> Box<dyn Regressor>;

    /// Which importance report this model type can produce
    fn importance_kind(&self) -> ImportanceKind {
        ImportanceKind::NotAvailable
    }

    /// Impurity-based importances aligned to the fitted columns
    fn feature_importances(&self) -> Option<Array1<f64>> {
        None
    }

    /// Linear coefficients aligned to the fitted columns
    fn coefficients(&self) -> Option<Array1<f64>> {
        None
    }

    /// Columns seen during `fit`, if fitted
    fn feature_names(&self) -> Option<&[String]> {
        None
    }
}

/// Shared precondition for `fit`: non-empty, row-aligned input
pub(crate) fn check_fit_input(x: &FeatureTable, y: &Array1<f64>) -> Result<()> {
    if x.nrows() != y.len() {
        return Err(ModelBenchError::dimension_mismatch(
            format!("y length = {}", x.nrows()),
            format!("y length = {}", y.len()),
        ));
    }
    if x.nrows() == 0 {
        return Err(ModelBenchError::ValidationError(
            "cannot fit on an empty table".to_string(),
        ));
    }
    if x.values().iter().chain(y.iter()).any(|v| !v.is_finite()) {
        return Err(ModelBenchError::ValidationError(
            "input contains NaN or infinite values".to_string(),
        ));
    }
    Ok(())
}

/// Shared precondition for `predict`: same ordered columns as seen in `fit`
pub(crate) fn check_predict_columns(fitted: &[String], x: &FeatureTable) -> Result<()> {
    if fitted != x.columns() {
        return Err(ModelBenchError::dimension_mismatch(
            format!("columns {:?}", fitted),
            format!("columns {:?}", x.columns()),
        ));
    }
    Ok(())
}
