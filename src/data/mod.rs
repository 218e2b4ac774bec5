//! Tabular inputs for the evaluation harness
//!
//! - [`FeatureTable`] - named numeric columns
//! - [`DatasetSplit`] - aligned train/test features and targets

mod split;
mod table;

pub use split::{train_test_split, validate_alignment, DatasetSplit};
pub use table::FeatureTable;
