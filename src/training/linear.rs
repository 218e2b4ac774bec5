//! Linear regression models

use super::importance::ImportanceKind;
use super::regressor::{check_fit_input, check_predict_columns, Regressor};
use crate::data::FeatureTable;
use crate::error::{ModelBenchError, Result};
use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};

/// Solve `a · x = b` by Gaussian elimination with partial pivoting.
///
/// Returns `None` when a pivot falls below `1e-10` relative to the largest
/// diagonal entry, i.e. the system is singular for practical purposes.
fn solve_linear_system(a: &Array2<f64>, b: &Array1<f64>) -> Option<Array1<f64>> {
    let n = a.nrows();
    if n != a.ncols() || n != b.len() {
        return None;
    }
    if n == 0 {
        return Some(Array1::zeros(0));
    }

    let scale = a.diag().iter().fold(0.0f64, |m, v| m.max(v.abs())).max(f64::MIN_POSITIVE);
    let tol = 1e-10 * scale;

    let mut m = a.clone();
    let mut rhs = b.clone();

    for col in 0..n {
        let pivot_row = (col..n)
            .max_by(|&i, &j| {
                m[[i, col]]
                    .abs()
                    .partial_cmp(&m[[j, col]].abs())
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
            .unwrap_or(col);

        if m[[pivot_row, col]].abs() < tol {
            return None;
        }

        if pivot_row != col {
            for j in 0..n {
                m.swap([col, j], [pivot_row, j]);
            }
            rhs.swap(col, pivot_row);
        }

        for row in col + 1..n {
            let factor = m[[row, col]] / m[[col, col]];
            if factor == 0.0 {
                continue;
            }
            for j in col..n {
                m[[row, j]] -= factor * m[[col, j]];
            }
            rhs[row] -= factor * rhs[col];
        }
    }

    let mut x = Array1::zeros(n);
    for i in (0..n).rev() {
        let tail: f64 = (i + 1..n).map(|j| m[[i, j]] * x[j]).sum();
        x[i] = (rhs[i] - tail) / m[[i, i]];
    }
    Some(x)
}

/// Column means and centered copies, used by every intercept-fitting model
fn center(x: &Array2<f64>, y: &Array1<f64>) -> (Array2<f64>, Array1<f64>, Array1<f64>, f64) {
    let x_mean = x
        .mean_axis(Axis(0))
        .unwrap_or_else(|| Array1::zeros(x.ncols()));
    let y_mean = y.mean().unwrap_or(0.0);
    let x_centered = x - &x_mean.view().insert_axis(Axis(0));
    let y_centered = y - y_mean;
    (x_centered, y_centered, x_mean, y_mean)
}

/// Fitted parameters of a linear model
#[derive(Debug, Clone, Serialize, Deserialize)]
struct LinearFit {
    coefficients: Array1<f64>,
    intercept: f64,
    columns: Vec<String>,
}

impl LinearFit {
    fn predict(&self, x: &FeatureTable) -> Result<Array1<f64>> {
        check_predict_columns(&self.columns, x)?;
        Ok(x.values().dot(&self.coefficients) + self.intercept)
    }
}

/// Normal-equation solve shared by OLS and ridge; `alpha == 0` is plain least squares
fn fit_normal_equations(
    x: &FeatureTable,
    y: &Array1<f64>,
    alpha: f64,
    fit_intercept: bool,
) -> Result<LinearFit> {
    check_fit_input(x, y)?;

    let (xs, ys, x_mean, y_mean) = if fit_intercept {
        center(x.values(), y)
    } else {
        (x.values().clone(), y.clone(), Array1::zeros(x.ncols()), 0.0)
    };

    let mut xtx = xs.t().dot(&xs);
    if alpha > 0.0 {
        for i in 0..xtx.nrows() {
            xtx[[i, i]] += alpha;
        }
    }
    let xty = xs.t().dot(&ys);

    let coefficients = solve_linear_system(&xtx, &xty).ok_or_else(|| {
        ModelBenchError::ComputationError(
            "normal equations are singular (collinear or constant features)".to_string(),
        )
    })?;

    let intercept = if fit_intercept {
        y_mean - coefficients.dot(&x_mean)
    } else {
        0.0
    };

    Ok(LinearFit {
        coefficients,
        intercept,
        columns: x.columns().to_vec(),
    })
}

/// Ordinary least squares
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinearRegression {
    pub fit_intercept: bool,
    fitted: Option<LinearFit>,
}

impl Default for LinearRegression {
    fn default() -> Self {
        Self::new()
    }
}

impl LinearRegression {
    /// Ordinary least squares with an intercept
    pub fn new() -> Self {
        Self {
            fit_intercept: true,
            fitted: None,
        }
    }

    /// Fit an unpenalized intercept (default true)
    pub fn with_fit_intercept(mut self, fit_intercept: bool) -> Self {
        self.fit_intercept = fit_intercept;
        self
    }

    /// Fitted intercept, 0 when `fit_intercept` is off
    pub fn intercept(&self) -> Option<f64> {
        self.fitted.as_ref().map(|f| f.intercept)
    }
}

impl Regressor for LinearRegression {
    fn fit(&mut self, x: &FeatureTable, y: &Array1<f64>) -> Result<()> {
        self.fitted = None;
        let fit = fit_normal_equations(x, y, 0.0, self.fit_intercept)?;
        self.fitted = Some(fit);
        Ok(())
    }

    fn predict(&self, x: &FeatureTable) -> Result<Array1<f64>> {
        self.fitted.as_ref().ok_or(ModelBenchError::ModelNotFitted)?.predict(x)
    }

    fn fresh(&self) -> Box<dyn Regressor> {
        Box::new(Self::new().with_fit_intercept(self.fit_intercept))
    }

    fn importance_kind(&self) -> ImportanceKind {
        ImportanceKind::LinearCoefficient
    }

    fn coefficients(&self) -> Option<Array1<f64>> {
        self.fitted.as_ref().map(|f| f.coefficients.clone())
    }

    fn feature_names(&self) -> Option<&[String]> {
        self.fitted.as_ref().map(|f| f.columns.as_slice())
    }
}

/// L2-regularized least squares; the intercept is not penalized
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RidgeRegression {
    pub alpha: f64,
    pub fit_intercept: bool,
    fitted: Option<LinearFit>,
}

impl RidgeRegression {
    /// Ridge with penalty `alpha`; a negative `alpha` fails at fit time
    pub fn new(alpha: f64) -> Self {
        Self {
            alpha,
            fit_intercept: true,
            fitted: None,
        }
    }

    /// Fitted intercept, 0 when `fit_intercept` is off
    pub fn intercept(&self) -> Option<f64> {
        self.fitted.as_ref().map(|f| f.intercept)
    }
}

impl Default for RidgeRegression {
    fn default() -> Self {
        Self::new(1.0)
    }
}

impl Regressor for RidgeRegression {
    fn fit(&mut self, x: &FeatureTable, y: &Array1<f64>) -> Result<()> {
        self.fitted = None;
        if !(self.alpha >= 0.0) {
            return Err(ModelBenchError::ConfigError(format!(
                "ridge alpha must be non-negative, got {}",
                self.alpha
            )));
        }
        let fit = fit_normal_equations(x, y, self.alpha, self.fit_intercept)?;
        self.fitted = Some(fit);
        Ok(())
    }

    fn predict(&self, x: &FeatureTable) -> Result<Array1<f64>> {
        self.fitted.as_ref().ok_or(ModelBenchError::ModelNotFitted)?.predict(x)
    }

    fn fresh(&self) -> Box<dyn Regressor> {
        Box::new(Self {
            alpha: self.alpha,
            fit_intercept: self.fit_intercept,
            fitted: None,
        })
    }

    fn importance_kind(&self) -> ImportanceKind {
        ImportanceKind::LinearCoefficient
    }

    fn coefficients(&self) -> Option<Array1<f64>> {
        self.fitted.as_ref().map(|f| f.coefficients.clone())
    }

    fn feature_names(&self) -> Option<&[String]> {
        self.fitted.as_ref().map(|f| f.columns.as_slice())
    }
}

/// L1-regularized least squares fitted by cyclic coordinate descent.
///
/// Minimizes `(1 / 2n) * ||y - Xw - b||^2 + alpha * ||w||_1`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LassoRegression {
    pub alpha: f64,
    pub max_iter: usize,
    pub tol: f64,
    fitted: Option<LinearFit>,
    n_iter: usize,
}

impl LassoRegression {
    /// Lasso with penalty `alpha`, 1000 sweeps, tolerance 1e-4
    pub fn new(alpha: f64) -> Self {
        Self {
            alpha,
            max_iter: 1000,
            tol: 1e-4,
            fitted: None,
            n_iter: 0,
        }
    }

    /// Cap on coordinate-descent sweeps
    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    /// Stop once the largest update, relative to the largest coefficient, is below `tol`
    pub fn with_tol(mut self, tol: f64) -> Self {
        self.tol = tol;
        self
    }

    /// Coordinate-descent sweeps used by the last fit
    pub fn n_iter(&self) -> usize {
        self.n_iter
    }

    fn soft_threshold(value: f64, threshold: f64) -> f64 {
        if value > threshold {
            value - threshold
        } else if value < -threshold {
            value + threshold
        } else {
            0.0
        }
    }
}

impl Default for LassoRegression {
    fn default() -> Self {
        Self::new(1.0)
    }
}

impl Regressor for LassoRegression {
    fn fit(&mut self, x: &FeatureTable, y: &Array1<f64>) -> Result<()> {
        self.fitted = None;
        check_fit_input(x, y)?;
        if !(self.alpha >= 0.0) {
            return Err(ModelBenchError::ConfigError(format!(
                "lasso alpha must be non-negative, got {}",
                self.alpha
            )));
        }

        let (xs, ys, x_mean, y_mean) = center(x.values(), y);
        let n = xs.nrows() as f64;
        let n_features = xs.ncols();

        let col_sq: Vec<f64> = (0..n_features)
            .map(|j| xs.column(j).mapv(|v| v * v).sum() / n)
            .collect();

        let mut w = Array1::<f64>::zeros(n_features);
        let mut residual = ys.clone();
        let mut converged = false;
        self.n_iter = 0;

        for _ in 0..self.max_iter {
            self.n_iter += 1;
            let mut max_delta = 0.0f64;
            let mut max_w = 0.0f64;

            for j in 0..n_features {
                if col_sq[j] == 0.0 {
                    continue;
                }
                let xj = xs.column(j);
                let old = w[j];
                let rho = xj.dot(&residual) / n + col_sq[j] * old;
                let new = Self::soft_threshold(rho, self.alpha) / col_sq[j];

                if new != old {
                    residual.scaled_add(old - new, &xj);
                    w[j] = new;
                }
                max_delta = max_delta.max((new - old).abs());
                max_w = max_w.max(new.abs());
            }

            if max_w == 0.0 || max_delta / max_w < self.tol {
                converged = true;
                break;
            }
        }

        if !converged {
            tracing::warn!(
                alpha = self.alpha,
                max_iter = self.max_iter,
                "lasso coordinate descent did not converge"
            );
        }

        let intercept = y_mean - w.dot(&x_mean);
        self.fitted = Some(LinearFit {
            coefficients: w,
            intercept,
            columns: x.columns().to_vec(),
        });
        Ok(())
    }

    fn predict(&self, x: &FeatureTable) -> Result<Array1<f64>> {
        self.fitted.as_ref().ok_or(ModelBenchError::ModelNotFitted)?.predict(x)
    }

    fn fresh(&self) -> Box<dyn Regressor> {
        Box::new(
            Self::new(self.alpha)
                .with_max_iter(self.max_iter)
                .with_tol(self.tol),
        )
    }

    fn importance_kind(&self) -> ImportanceKind {
        ImportanceKind::LinearCoefficient
    }

    fn coefficients(&self) -> Option<Array1<f64>> {
        self.fitted.as_ref().map(|f| f.coefficients.clone())
    }

    fn feature_names(&self) -> Option<&[String]> {
        self.fitted.as_ref().map(|f| f.columns.as_slice())
    }
}
