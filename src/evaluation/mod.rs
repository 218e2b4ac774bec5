//! Model evaluation
//!
//! Provides:
//! - Regression metrics (MSE, RMSE, MAE, R²)
//! - The [`Evaluator`] harness: cross-validation, final fit, held-out scoring
//! - Batch evaluation over a [`ModelRegistry`](crate::training::ModelRegistry)
//! - The [`ComparisonTable`] report

mod comparison;
mod config;
mod harness;
pub mod metrics;
mod result;

pub use comparison::{ComparisonRow, ComparisonTable, MetricColumn};
pub use config::EvaluationConfig;
pub use harness::{BatchEvaluation, Evaluator};
pub use metrics::RegressionMetrics;
pub use result::{FailedModel, ModelResult};
