//! Regression metrics

use crate::error::{ModelBenchError, Result};
use ndarray::Array1;
use serde::{Deserialize, Serialize};

fn check_pair(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> Result<()> {
    if y_true.len() != y_pred.len() {
        return Err(ModelBenchError::dimension_mismatch(
            format!("{} predictions", y_true.len()),
            format!("{} predictions", y_pred.len()),
        ));
    }
    if y_true.is_empty() {
        return Err(ModelBenchError::dimension_mismatch(
            "at least one target",
            "0 targets",
        ));
    }
    Ok(())
}

/// Mean squared error
pub fn mse(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> Result<f64> {
    check_pair(y_true, y_pred)?;
    let ss: f64 = y_true.iter().zip(y_pred).map(|(t, p)| (t - p).powi(2)).sum();
    Ok(ss / y_true.len() as f64)
}

/// Root mean squared error
pub fn rmse(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> Result<f64> {
    Ok(mse(y_true, y_pred)?.sqrt())
}

/// Mean absolute error
pub fn mae(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> Result<f64> {
    check_pair(y_true, y_pred)?;
    let total: f64 = y_true.iter().zip(y_pred).map(|(t, p)| (t - p).abs()).sum();
    Ok(total / y_true.len() as f64)
}

/// Coefficient of determination, `1 - SS_res / SS_tot`.
///
/// A constant target has `SS_tot == 0`; the score is then `1.0` for an
/// exact fit and `0.0` otherwise.
pub fn r2(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> Result<f64> {
    check_pair(y_true, y_pred)?;
    let mean = y_true.sum() / y_true.len() as f64;
    let ss_tot: f64 = y_true.iter().map(|t| (t - mean).powi(2)).sum();
    let ss_res: f64 = y_true.iter().zip(y_pred).map(|(t, p)| (t - p).powi(2)).sum();

    if ss_tot > 0.0 {
        Ok(1.0 - ss_res / ss_tot)
    } else if ss_res == 0.0 {
        Ok(1.0)
    } else {
        Ok(0.0)
    }
}

/// The held-out metrics reported for every model
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RegressionMetrics {
    pub mse: f64,
    pub rmse: f64,
    pub mae: f64,
    pub r2: f64,
    pub n_samples: usize,
}

impl RegressionMetrics {
    /// All metrics for one prediction vector
    pub fn compute(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> Result<Self> {
        let mse = mse(y_true, y_pred)?;
        Ok(Self {
            mse,
            rmse: mse.sqrt(),
            mae: mae(y_true, y_pred)?,
            r2: r2(y_true, y_pred)?,
            n_samples: y_true.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    #[test]
    fn test_regression_metrics() {
        let y_true = array![1.0, 2.0, 3.0, 4.0, 5.0];
        let y_pred = array![1.1, 2.1, 2.9, 4.2, 4.8];

        let m = RegressionMetrics::compute(&y_true, &y_pred).unwrap();
        assert_abs_diff_eq!(m.mse, 0.022, epsilon = 1e-12);
        assert_abs_diff_eq!(m.rmse, 0.022f64.sqrt(), epsilon = 1e-12);
        assert_abs_diff_eq!(m.mae, 0.14, epsilon = 1e-12);
        assert_abs_diff_eq!(m.r2, 1.0 - 0.11 / 10.0, epsilon = 1e-12);
        assert_eq!(m.n_samples, 5);
    }

    #[test]
    fn test_constant_target() {
        let y = array![2.0, 2.0, 2.0];
        assert_eq!(r2(&y, &y).unwrap(), 1.0);
        assert_eq!(r2(&y, &array![2.0, 2.0, 2.5]).unwrap(), 0.0);
    }

    #[test]
    fn test_r2_can_be_negative() {
        let y = array![1.0, 2.0, 3.0];
        assert!(r2(&y, &array![3.0, 2.0, 1.0]).unwrap() < 0.0);
    }

    #[test]
    fn test_mismatched_and_empty() {
        let empty = Array1::<f64>::zeros(0);
        assert!(matches!(
            mse(&array![1.0, 2.0], &array![1.0]),
            Err(ModelBenchError::DimensionMismatch { .. })
        ));
        assert!(matches!(
            r2(&empty, &empty),
            Err(ModelBenchError::DimensionMismatch { .. })
        ));
    }
}
