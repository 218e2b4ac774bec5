//! Feature preprocessing
//!
//! Provides:
//! - The [`Transformer`] trait (`fit` / `transform` / `fresh`)
//! - Feature scaling (StandardScaler, MinMaxScaler)
//! - Polynomial feature expansion
//! - [`Pipeline`], a transformer chain ending in a regressor

mod pipeline;
mod polynomial;
mod scaler;

pub use pipeline::Pipeline;
pub use polynomial::{PolynomialConfig, PolynomialFeatures};
pub use scaler::{MinMaxScaler, StandardScaler};

use crate::data::FeatureTable;
use crate::error::Result;
use std::fmt::Debug;

/// A column-wise transformation learned from training data
pub trait Transformer: Send + Sync + Debug {
    fn fit(&mut self, x: &FeatureTable) -> Result<()>;

    fn transform(&self, x: &FeatureTable) -> Result<FeatureTable>;

    /// Unfitted copy with identical settings
    fn fresh(&self) -> Box<dyn Transformer>;

    fn fit_transform(&mut self, x: &FeatureTable) -> Result<FeatureTable> {
        self.fit(x)?;
        self.transform(x)
    }
}
