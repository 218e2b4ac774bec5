//! Feature scaling

use super::Transformer;
use crate::data::FeatureTable;
use crate::error::{ModelBenchError, Result};
use ndarray::{Array1, Axis};
use serde::{Deserialize, Serialize};

/// Per-column `(x - center) / scale`, fitted on training data
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ScalerParams {
    columns: Vec<String>,
    center: Array1<f64>,
    scale: Array1<f64>,
}

impl ScalerParams {
    fn apply(&self, x: &FeatureTable) -> Result<FeatureTable> {
        if self.columns != x.columns() {
            return Err(ModelBenchError::dimension_mismatch(
                format!("columns {:?}", self.columns),
                format!("columns {:?}", x.columns()),
            ));
        }
        let scaled = (x.values() - &self.center.view().insert_axis(Axis(0)))
            / &self.scale.view().insert_axis(Axis(0));
        x.with_values(scaled)
    }

    fn invert(&self, x: &FeatureTable) -> Result<FeatureTable> {
        let restored = x.values() * &self.scale.view().insert_axis(Axis(0))
            + &self.center.view().insert_axis(Axis(0));
        x.with_values(restored)
    }
}

/// Zero scale means a constant column; leave it centered but unscaled
fn guard_scale(scale: Array1<f64>) -> Array1<f64> {
    scale.mapv(|s| if s == 0.0 || !s.is_finite() { 1.0 } else { s })
}

/// Z-score normalization using the sample standard deviation
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StandardScaler {
    params: Option<ScalerParams>,
}

impl StandardScaler {
    /// Unfitted scaler
    pub fn new() -> Self {
        Self::default()
    }

    /// Map scaled values back to the original units
    pub fn inverse_transform(&self, x: &FeatureTable) -> Result<FeatureTable> {
        self.params.as_ref().ok_or(ModelBenchError::ModelNotFitted)?.invert(x)
    }
}

impl Transformer for StandardScaler {
    fn fit(&mut self, x: &FeatureTable) -> Result<()> {
        if x.nrows() == 0 {
            return Err(ModelBenchError::ValidationError(
                "cannot fit a scaler on an empty table".to_string(),
            ));
        }
        let ddof = if x.nrows() > 1 { 1.0 } else { 0.0 };
        let values = x.values();
        self.params = Some(ScalerParams {
            columns: x.columns().to_vec(),
            center: values.mean_axis(Axis(0)).unwrap_or_else(|| Array1::zeros(x.ncols())),
            scale: guard_scale(values.std_axis(Axis(0), ddof)),
        });
        Ok(())
    }

    fn transform(&self, x: &FeatureTable) -> Result<FeatureTable> {
        self.params.as_ref().ok_or(ModelBenchError::ModelNotFitted)?.apply(x)
    }

    fn fresh(&self) -> Box<dyn Transformer> {
        Box::new(Self::new())
    }
}

/// Rescale every column to `[0, 1]` over the training range
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MinMaxScaler {
    params: Option<ScalerParams>,
}

impl MinMaxScaler {
    /// Unfitted scaler
    pub fn new() -> Self {
        Self::default()
    }

    /// Map scaled values back to the original units
    pub fn inverse_transform(&self, x: &FeatureTable) -> Result<FeatureTable> {
        self.params.as_ref().ok_or(ModelBenchError::ModelNotFitted)?.invert(x)
    }
}

impl Transformer for MinMaxScaler {
    fn fit(&mut self, x: &FeatureTable) -> Result<()> {
        if x.nrows() == 0 {
            return Err(ModelBenchError::ValidationError(
                "cannot fit a scaler on an empty table".to_string(),
            ));
        }
        let values = x.values();
        let min = values.fold_axis(Axis(0), f64::INFINITY, |m, &v| m.min(v));
        let max = values.fold_axis(Axis(0), f64::NEG_INFINITY, |m, &v| m.max(v));
        let range = &max - &min;

        self.params = Some(ScalerParams {
            columns: x.columns().to_vec(),
            center: min,
            scale: guard_scale(range),
        });
        Ok(())
    }

    fn transform(&self, x: &FeatureTable) -> Result<FeatureTable> {
        self.params.as_ref().ok_or(ModelBenchError::ModelNotFitted)?.apply(x)
    }

    fn fresh(&self) -> Box<dyn Transformer> {
        Box::new(Self::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_standard_scaler() {
        let x = FeatureTable::from_array(array![[1.0, 10.0], [2.0, 10.0], [3.0, 10.0]]);
        let mut scaler = StandardScaler::new();
        let scaled = scaler.fit_transform(&x).unwrap();

        let col0 = scaled.values().column(0).to_owned();
        assert!((col0.mean().unwrap()).abs() < 1e-12);
        assert!((col0[2] - 1.0).abs() < 1e-12);
        // constant column is centered, not divided by zero
        assert_eq!(scaled.values().column(1).to_vec(), vec![0.0, 0.0, 0.0]);

        let restored = scaler.inverse_transform(&scaled).unwrap();
        assert_eq!(restored.values(), x.values());
    }

    #[test]
    fn test_minmax_scaler_uses_training_range() {
        let train = FeatureTable::from_array(array![[0.0], [5.0], [10.0]]);
        let test = FeatureTable::from_array(array![[20.0], [-5.0]]);
        let mut scaler = MinMaxScaler::new();
        scaler.fit(&train).unwrap();

        let out = scaler.transform(&test).unwrap();
        assert_eq!(out.values().column(0).to_vec(), vec![2.0, -0.5]);
    }

    #[test]
    fn test_transform_before_fit() {
        let x = FeatureTable::from_array(array![[1.0]]);
        assert!(matches!(
            StandardScaler::new().transform(&x),
            Err(ModelBenchError::ModelNotFitted)
        ));
    }
}
