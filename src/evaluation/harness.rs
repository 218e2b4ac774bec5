//! Train, cross-validate and score regressors on a fixed split

use super::comparison::ComparisonTable;
use super::config::EvaluationConfig;
use super::metrics::{r2, RegressionMetrics};
use super::result::{FailedModel, ModelResult};
use crate::data::{validate_alignment, DatasetSplit, FeatureTable};
use crate::error::{ModelBenchError, Result};
use crate::training::{CvResults, CvSplit, ImportanceKind, ModelRegistry, Regressor};
use ndarray::{Array1, Axis};
use rayon::prelude::*;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Outcome of [`Evaluator::evaluate_all`]
#[derive(Debug, Default)]
pub struct BatchEvaluation {
    /// Successful evaluations in registration order
    pub results: Vec<ModelResult>,
    /// Models whose fit failed; their siblings were still evaluated
    pub failures: Vec<FailedModel>,
}

impl BatchEvaluation {
    /// Comparison table of the successful results, failures attached
    pub fn comparison(&self) -> ComparisonTable {
        ComparisonTable::from_results(&self.results).with_failures(self.failures.clone())
    }

    /// Result for the model registered as `name`
    pub fn get(&self, name: &str) -> Option<&ModelResult> {
        self.results.iter().find(|r| r.name() == name)
    }
}

/// Evaluation harness
#[derive(Debug, Clone, Default)]
pub struct Evaluator {
    config: EvaluationConfig,
}

impl Evaluator {
    /// Harness over a validated config
    pub fn new(config: EvaluationConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Active evaluation settings
    pub fn config(&self) -> &EvaluationConfig {
        &self.config
    }

    /// Cross-validate on the training split, fit on all of it, then score on
    /// the test split.
    ///
    /// `model` is fitted in place and returned inside the result.
    pub fn evaluate(
        &self,
        model: Box<dyn Regressor>,
        x_train: &FeatureTable,
        x_test: &FeatureTable,
        y_train: &Array1<f64>,
        y_test: &Array1<f64>,
        name: &str,
    ) -> Result<ModelResult> {
        validate_alignment(x_train, x_test, y_train, y_test)?;
        let importance = model.importance_kind();
        self.run(model, importance, x_train, x_test, y_train, y_test, name)
    }

    /// [`Evaluator::evaluate`] over a prepared split
    pub fn evaluate_split(
        &self,
        model: Box<dyn Regressor>,
        split: &DatasetSplit,
        name: &str,
    ) -> Result<ModelResult> {
        self.evaluate(
            model,
            &split.x_train,
            &split.x_test,
            &split.y_train,
            &split.y_test,
            name,
        )
    }

    /// Evaluate every registered model in order.
    ///
    /// A model that fails to fit, predict or score is recorded in
    /// [`BatchEvaluation::failures`] and skipped. Dimension and configuration
    /// errors abort the whole run.
    pub fn evaluate_all(&self, registry: ModelRegistry, split: &DatasetSplit) -> Result<BatchEvaluation> {
        validate_alignment(&split.x_train, &split.x_test, &split.y_train, &split.y_test)?;

        let mut batch = BatchEvaluation::default();
        for entry in registry {
            let outcome = self.run(
                entry.model,
                entry.importance,
                &split.x_train,
                &split.x_test,
                &split.y_train,
                &split.y_test,
                &entry.name,
            );
            match outcome {
                Ok(result) => batch.results.push(result),
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => {
                    let reason = match e {
                        ModelBenchError::FitFailure { reason, .. } => reason,
                        other => other.to_string(),
                    };
                    warn!(model = %entry.name, %reason, "model skipped");
                    batch.failures.push(FailedModel {
                        name: entry.name,
                        reason,
                    });
                }
            }
        }

        info!(
            evaluated = batch.results.len(),
            failed = batch.failures.len(),
            "batch evaluation complete"
        );
        Ok(batch)
    }

    /// Mean R² over k folds of `(x, y)`, each fold on a fresh copy of `model`
    pub fn cross_val_score(
        &self,
        model: &dyn Regressor,
        x: &FeatureTable,
        y: &Array1<f64>,
        name: &str,
    ) -> Result<CvResults> {
        if x.nrows() != y.len() {
            return Err(ModelBenchError::dimension_mismatch(
                format!("y length = {}", x.nrows()),
                format!("y length = {}", y.len()),
            ));
        }
        let splits = self.config.kfold().split(x.nrows())?;

        let scores = if self.config.parallel_folds {
            splits
                .par_iter()
                .map(|split| score_fold(model, x, y, split, name))
                .collect::<Result<Vec<f64>>>()?
        } else {
            splits
                .iter()
                .map(|split| score_fold(model, x, y, split, name))
                .collect::<Result<Vec<f64>>>()?
        };

        Ok(CvResults::from_scores(scores))
    }

    #[allow(clippy::too_many_arguments)]
    fn run(
        &self,
        mut model: Box<dyn Regressor>,
        importance: ImportanceKind,
        x_train: &FeatureTable,
        x_test: &FeatureTable,
        y_train: &Array1<f64>,
        y_test: &Array1<f64>,
        name: &str,
    ) -> Result<ModelResult> {
        let cv = self.cross_val_score(model.as_ref(), x_train, y_train, name)?;

        let start = Instant::now();
        model
            .fit(x_train, y_train)
            .map_err(|e| ModelBenchError::fit_failure(name, &e))?;
        let fit_time_secs = start.elapsed().as_secs_f64();

        let metrics = model
            .predict(x_test)
            .and_then(|predictions| RegressionMetrics::compute(y_test, &predictions))
            .map_err(|e| ModelBenchError::fit_failure(name, &e))?;

        info!(
            model = %name,
            rmse = metrics.rmse,
            mae = metrics.mae,
            r2 = metrics.r2,
            cv_r2 = cv.mean_score,
            "model evaluated"
        );

        let importance = importance.extract(model.as_ref());
        Ok(ModelResult::new(
            name.to_string(),
            model,
            metrics,
            cv,
            importance,
            fit_time_secs,
        ))
    }
}

fn score_fold(
    model: &dyn Regressor,
    x: &FeatureTable,
    y: &Array1<f64>,
    split: &CvSplit,
    name: &str,
) -> Result<f64> {
    let mut fold_model = model.fresh();
    fold_model
        .fit(
            &x.select_rows(&split.train_indices),
            &y.select(Axis(0), &split.train_indices),
        )
        .map_err(|e| ModelBenchError::fit_failure(name, &e))?;

    let score = fold_model
        .predict(&x.select_rows(&split.test_indices))
        .and_then(|pred| r2(&y.select(Axis(0), &split.test_indices), &pred))
        .map_err(|e| ModelBenchError::fit_failure(name, &e))?;
    debug!(model = %name, fold = split.fold_idx, r2 = score, "fold scored");
    Ok(score)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::train_test_split;
    use crate::training::{DecisionTreeRegressor, LinearRegression, RidgeRegression};
    use ndarray::Array2;

    fn split() -> DatasetSplit {
        let x = Array2::from_shape_fn((60, 2), |(i, j)| if j == 0 { i as f64 } else { ((i * 7) % 5) as f64 });
        let y = x.column(0).mapv(|v| 0.5 * v) + &x.column(1) + 3.0;
        train_test_split(&FeatureTable::from_array(x), &y, 0.25, 1).unwrap()
    }

    #[test]
    fn test_evaluate_linear() {
        let split = split();
        let result = Evaluator::default()
            .evaluate_split(Box::new(LinearRegression::new()), &split, "ols")
            .unwrap();

        assert_eq!(result.name(), "ols");
        assert!(result.rmse() < 1e-8);
        assert!((result.r2() - 1.0).abs() < 1e-9);
        assert_eq!(result.cv().n_folds(), 5);
        assert!((result.cv_r2_mean() - 1.0).abs() < 1e-9);
        let importance = result.importance().unwrap();
        assert_eq!(importance.kind, ImportanceKind::LinearCoefficient);
        assert!(result.model().predict(&split.x_test).is_ok());
    }

    #[test]
    fn test_parallel_folds_match_sequential() {
        let split = split();
        let model = DecisionTreeRegressor::new().with_max_depth(3);
        let sequential = Evaluator::default()
            .cross_val_score(&model, &split.x_train, &split.y_train, "tree")
            .unwrap();
        let parallel = Evaluator::new(EvaluationConfig::default().with_parallel_folds(true))
            .unwrap()
            .cross_val_score(&model, &split.x_train, &split.y_train, "tree")
            .unwrap();
        assert_eq!(sequential.scores, parallel.scores);
    }

    #[test]
    fn test_evaluate_rejects_misaligned_input() {
        let split = split();
        let short = split.y_train.slice(ndarray::s![1..]).to_owned();
        let err = Evaluator::default()
            .evaluate(
                Box::new(RidgeRegression::default()),
                &split.x_train,
                &split.x_test,
                &short,
                &split.y_test,
                "ridge",
            )
            .unwrap_err();
        assert!(matches!(err, ModelBenchError::DimensionMismatch { .. }));
    }

    #[test]
    fn test_invalid_config() {
        let config = EvaluationConfig::default().with_cv_folds(1);
        assert!(matches!(
            Evaluator::new(config),
            Err(ModelBenchError::ConfigError(_))
        ));
    }
}
