//! Train/test splits

use super::FeatureTable;
use crate::error::{ModelBenchError, Result};
use ndarray::Array1;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// Four aligned containers: train/test features and targets
#[derive(Debug, Clone)]
pub struct DatasetSplit {
    pub x_train: FeatureTable,
    pub y_train: Array1<f64>,
    pub x_test: FeatureTable,
    pub y_test: Array1<f64>,
}

impl DatasetSplit {
    /// Build a split, checking row alignment and schema equality
    pub fn new(
        x_train: FeatureTable,
        x_test: FeatureTable,
        y_train: Array1<f64>,
        y_test: Array1<f64>,
    ) -> Result<Self> {
        validate_alignment(&x_train, &x_test, &y_train, &y_test)?;
        Ok(Self {
            x_train,
            y_train,
            x_test,
            y_test,
        })
    }

    /// Training rows
    pub fn n_train(&self) -> usize {
        self.x_train.nrows()
    }

    /// Test rows
    pub fn n_test(&self) -> usize {
        self.x_test.nrows()
    }
}

/// Check the invariants every evaluation relies on
pub fn validate_alignment(
    x_train: &FeatureTable,
    x_test: &FeatureTable,
    y_train: &Array1<f64>,
    y_test: &Array1<f64>,
) -> Result<()> {
    if x_train.nrows() != y_train.len() {
        return Err(ModelBenchError::dimension_mismatch(
            format!("{} training targets", x_train.nrows()),
            format!("{} training targets", y_train.len()),
        ));
    }
    if x_test.nrows() != y_test.len() {
        return Err(ModelBenchError::dimension_mismatch(
            format!("{} test targets", x_test.nrows()),
            format!("{} test targets", y_test.len()),
        ));
    }
    x_train.ensure_same_schema(x_test)
}

/// Shuffled split holding out `test_ratio` of the rows
pub fn train_test_split(
    x: &FeatureTable,
    y: &Array1<f64>,
    test_ratio: f64,
    seed: u64,
) -> Result<DatasetSplit> {
    if !(test_ratio > 0.0 && test_ratio < 1.0) {
        return Err(ModelBenchError::ConfigError(format!(
            "test_ratio must be in (0, 1), got {}",
            test_ratio
        )));
    }
    if x.nrows() != y.len() {
        return Err(ModelBenchError::dimension_mismatch(
            format!("{} targets", x.nrows()),
            format!("{} targets", y.len()),
        ));
    }

    let n = x.nrows();
    let n_test = ((n as f64) * test_ratio).round() as usize;
    if n_test == 0 || n_test >= n {
        return Err(ModelBenchError::ValidationError(format!(
            "cannot hold out {} of {} rows",
            n_test, n
        )));
    }

    let mut indices: Vec<usize> = (0..n).collect();
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    indices.shuffle(&mut rng);

    let (test_idx, train_idx) = indices.split_at(n_test);

    DatasetSplit::new(
        x.select_rows(train_idx),
        x.select_rows(test_idx),
        train_idx.iter().map(|&i| y[i]).collect(),
        test_idx.iter().map(|&i| y[i]).collect(),
    )
}
