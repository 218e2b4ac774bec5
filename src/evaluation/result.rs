//! Per-model evaluation outcome

use super::metrics::RegressionMetrics;
use crate::training::{CvResults, FeatureImportance, Regressor};
use serde::{Deserialize, Serialize};

/// Everything measured for one model, together with the model fitted on the
/// full training split
#[derive(Debug)]
pub struct ModelResult {
    name: String,
    model: Box<dyn Regressor>,
    metrics: RegressionMetrics,
    cv: CvResults,
    importance: Option<FeatureImportance>,
    fit_time_secs: f64,
}

impl ModelResult {
    pub(crate) fn new(
        name: String,
        model: Box<dyn Regressor>,
        metrics: RegressionMetrics,
        cv: CvResults,
        importance: Option<FeatureImportance>,
        fit_time_secs: f64,
    ) -> Self {
        Self {
            name,
            model,
            metrics,
            cv,
            importance,
            fit_time_secs,
        }
    }

    /// Name the model was evaluated under
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The model fitted on the full training split
    pub fn model(&self) -> &dyn Regressor {
        self.model.as_ref()
    }

    /// Take ownership of the fitted model
    pub fn into_model(self) -> Box<dyn Regressor> {
        self.model
    }

    /// Test-split metrics
    pub fn metrics(&self) -> &RegressionMetrics {
        &self.metrics
    }

    /// Test-split RMSE
    pub fn rmse(&self) -> f64 {
        self.metrics.rmse
    }

    /// Test-split MAE
    pub fn mae(&self) -> f64 {
        self.metrics.mae
    }

    /// Test-split R²
    pub fn r2(&self) -> f64 {
        self.metrics.r2
    }

    /// Mean R² over the cross-validation folds on the training split
    pub fn cv_r2_mean(&self) -> f64 {
        self.cv.mean_score
    }

    /// Per-fold cross-validation scores
    pub fn cv(&self) -> &CvResults {
        &self.cv
    }

    /// Importance report, when the model kind has one
    pub fn importance(&self) -> Option<&FeatureImportance> {
        self.importance.as_ref()
    }

    /// Wall time of the final fit on the full training split
    pub fn fit_time_secs(&self) -> f64 {
        self.fit_time_secs
    }
}

/// A model that was skipped in a batch run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailedModel {
    pub name: String,
    pub reason: String,
}
