//! modelbench - Regression model evaluation and ensembling
//!
//! This crate evaluates a set of regressors on one train/test split and
//! reports them side by side:
//! - K-fold cross-validation on the training split, final fit, held-out scoring
//! - Weighted, voting and stacking ensembles usable like any other regressor
//! - A sortable comparison table exportable to polars and JSON
//!
//! # Modules
//!
//! - [`data`] - Named feature tables and train/test splits
//! - [`training`] - The [`Regressor`](training::Regressor) trait, built-in models, k-fold CV
//! - [`preprocessing`] - Scalers, polynomial features and pipelines
//! - [`ensemble`] - Weighted, voting and stacking ensembles
//! - [`evaluation`] - Metrics, the evaluation harness and comparison report
//!
//! The library logs through `tracing` and never installs a subscriber.

// Core error handling
pub mod error;

pub mod data;
pub mod ensemble;
pub mod evaluation;
pub mod preprocessing;
pub mod training;

pub use error::{ModelBenchError, Result};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::error::{ModelBenchError, Result};

    pub use crate::data::{train_test_split, DatasetSplit, FeatureTable};

    pub use crate::training::{
        DecisionTreeRegressor, FeatureImportance, GradientBoostingConfig,
        GradientBoostingRegressor, ImportanceKind, KFold, LassoRegression, LinearRegression,
        MaxFeatures, ModelRegistry, RandomForestRegressor, Regressor, RidgeRegression,
    };

    pub use crate::preprocessing::{
        MinMaxScaler, Pipeline, PolynomialFeatures, StandardScaler, Transformer,
    };

    pub use crate::ensemble::{
        AggregationMethod, StackingConfig, StackingRegressor, VotingRegressor,
        WeightedComponent, WeightedEnsemble,
    };

    pub use crate::evaluation::{
        BatchEvaluation, ComparisonTable, EvaluationConfig, Evaluator, MetricColumn, ModelResult,
    };
}
