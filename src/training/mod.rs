//! Regressors and the capability set they share
//!
//! Provides:
//! - The [`Regressor`] trait (`fit` / `predict` / `fresh`)
//! - Linear models (OLS, Ridge, Lasso)
//! - Decision tree, random forest and gradient boosting regressors
//! - K-fold cross-validation splits
//! - Importance reporting resolved per model type
//! - A registry of named models for batch evaluation

mod boosting;
pub mod cross_validation;
mod forest;
mod importance;
mod linear;
mod registry;
mod regressor;
mod tree;

pub use boosting::{GradientBoostingConfig, GradientBoostingRegressor};
pub use cross_validation::{CvResults, CvSplit, KFold};
pub use forest::{MaxFeatures, RandomForestRegressor};
pub use importance::{FeatureImportance, ImportanceKind};
pub use linear::{LassoRegression, LinearRegression, RidgeRegression};
pub use registry::{ModelRegistry, RegisteredModel};
pub use regressor::Regressor;
pub use tree::{DecisionTreeRegressor, TreeNode};

pub(crate) use regressor::{check_fit_input, check_predict_columns};
