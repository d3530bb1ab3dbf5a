//! Robust regression via Huber loss

use crate::error::{Result, TabfitError};
use crate::models::params::{ParamMap, ParamValue};
use crate::models::solve::solve_normal_equations;
use crate::models::Estimator;
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

/// Consistency factor turning the median absolute deviation into a normal
/// scale estimate.
const MAD_SCALE: f64 = 1.4826;

/// Huber regressor: squared loss for small residuals, absolute loss beyond
/// `epsilon` scale units, solved by iteratively reweighted least squares
/// with an L2 penalty `alpha` on the coefficients.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HuberRegression {
    epsilon: f64,
    alpha: f64,
    max_iter: usize,
    tol: f64,
    fit_intercept: bool,
    coefficients: Option<Array1<f64>>,
    intercept: f64,
}

impl Default for HuberRegression {
    fn default() -> Self {
        Self::new(1.35, 1e-4)
    }
}

impl HuberRegression {
    pub fn new(epsilon: f64, alpha: f64) -> Self {
        Self {
            epsilon,
            alpha,
            max_iter: 100,
            tol: 1e-6,
            fit_intercept: true,
            coefficients: None,
            intercept: 0.0,
        }
    }

    pub fn with_epsilon(mut self, epsilon: f64) -> Self {
        self.epsilon = epsilon;
        self
    }

    pub fn with_alpha(mut self, alpha: f64) -> Self {
        self.alpha = alpha;
        self
    }

    pub fn coefficients(&self) -> Option<&Array1<f64>> {
        self.coefficients.as_ref()
    }

    pub fn intercept(&self) -> f64 {
        self.intercept
    }

    /// One weighted ridge solve. Weights apply per row; when an intercept
    /// is fitted the data is centered around the weighted means.
    fn weighted_solve(
        &self,
        x: &Array2<f64>,
        y: &Array1<f64>,
        weights: &Array1<f64>,
    ) -> Result<(Array1<f64>, f64)> {
        let weight_sum: f64 = weights.sum();
        if weight_sum <= 0.0 {
            return Err(TabfitError::Computation(
                "degenerate weights in robust solve".to_string(),
            ));
        }

        let (x_c, y_c, x_mean, y_mean) = if self.fit_intercept {
            let mut x_mean = Array1::zeros(x.ncols());
            for j in 0..x.ncols() {
                x_mean[j] = x.column(j).dot(weights) / weight_sum;
            }
            let y_mean = y.dot(weights) / weight_sum;
            let x_c = Array2::from_shape_fn(x.dim(), |(i, j)| x[[i, j]] - x_mean[j]);
            let y_c = y.mapv(|v| v - y_mean);
            (x_c, y_c, Some(x_mean), Some(y_mean))
        } else {
            (x.clone(), y.clone(), None, None)
        };

        // Normal equations of the weighted problem: (X^T W X + alpha I).
        let wx = Array2::from_shape_fn(x_c.dim(), |(i, j)| x_c[[i, j]] * weights[i]);
        let mut xtwx = x_c.t().dot(&wx);
        for i in 0..xtwx.nrows() {
            xtwx[[i, i]] += self.alpha;
        }
        let xtwy = wx.t().dot(&y_c);
        let coefficients = solve_normal_equations(&xtwx, &xtwy)?;

        let intercept = match (x_mean, y_mean) {
            (Some(xm), Some(ym)) => ym - coefficients.dot(&xm),
            _ => 0.0,
        };
        Ok((coefficients, intercept))
    }
}

impl Estimator for HuberRegression {
    fn name(&self) -> &'static str {
        "huber"
    }

    fn set_param(&mut self, name: &str, value: &ParamValue) -> Result<()> {
        let expect_number = |v: &ParamValue| {
            v.as_f64().ok_or_else(|| {
                TabfitError::InvalidConfiguration(format!(
                    "hyperparameter '{name}' for huber expects a number"
                ))
            })
        };
        match name {
            "epsilon" => self.epsilon = expect_number(value)?,
            "alpha" => self.alpha = expect_number(value)?,
            "tol" => self.tol = expect_number(value)?,
            "max_iter" => {
                self.max_iter = value.as_usize().ok_or_else(|| {
                    TabfitError::InvalidConfiguration(
                        "hyperparameter 'max_iter' for huber expects a non-negative integer"
                            .to_string(),
                    )
                })?
            }
            "fit_intercept" => {
                self.fit_intercept = value.as_bool().ok_or_else(|| {
                    TabfitError::InvalidConfiguration(
                        "hyperparameter 'fit_intercept' for huber expects a bool".to_string(),
                    )
                })?
            }
            _ => {
                return Err(TabfitError::InvalidConfiguration(format!(
                    "unknown hyperparameter '{name}' for huber"
                )))
            }
        }
        Ok(())
    }

    fn params(&self) -> ParamMap {
        ParamMap::from([
            ("epsilon".to_string(), ParamValue::Float(self.epsilon)),
            ("alpha".to_string(), ParamValue::Float(self.alpha)),
            ("max_iter".to_string(), ParamValue::Int(self.max_iter as i64)),
            ("tol".to_string(), ParamValue::Float(self.tol)),
            (
                "fit_intercept".to_string(),
                ParamValue::Bool(self.fit_intercept),
            ),
        ])
    }

    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        if x.nrows() == 0 {
            return Err(TabfitError::Validation(
                "cannot fit on an empty matrix".to_string(),
            ));
        }
        if x.nrows() != y.len() {
            return Err(TabfitError::ShapeMismatch {
                expected: format!("{} targets", x.nrows()),
                actual: format!("{} targets", y.len()),
            });
        }

        // Start from the unweighted ridge solution.
        let uniform = Array1::ones(x.nrows());
        let (mut coefficients, mut intercept) = self.weighted_solve(x, y, &uniform)?;

        for _iter in 0..self.max_iter {
            let residuals = y - &(x.dot(&coefficients) + intercept);
            let sigma = robust_scale(&residuals);
            if sigma < 1e-12 {
                break; // residuals already (near) zero
            }

            let cutoff = self.epsilon * sigma;
            let weights = residuals.mapv(|r| {
                let abs_r = r.abs();
                if abs_r <= cutoff {
                    1.0
                } else {
                    cutoff / abs_r
                }
            });

            let (next_coefficients, next_intercept) = self.weighted_solve(x, y, &weights)?;
            let change = (&next_coefficients - &coefficients).mapv(f64::abs).sum()
                + (next_intercept - intercept).abs();
            coefficients = next_coefficients;
            intercept = next_intercept;
            if change < self.tol {
                break;
            }
        }

        self.coefficients = Some(coefficients);
        self.intercept = intercept;
        Ok(())
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let coefficients = self.coefficients.as_ref().ok_or(TabfitError::NotFitted)?;
        if x.ncols() != coefficients.len() {
            return Err(TabfitError::ShapeMismatch {
                expected: format!("{} columns", coefficients.len()),
                actual: format!("{} columns", x.ncols()),
            });
        }
        Ok(x.dot(coefficients) + self.intercept)
    }

    fn clone_box(&self) -> Box<dyn Estimator> {
        Box::new(self.clone())
    }
}

/// Median-absolute-deviation scale estimate of the residuals.
fn robust_scale(residuals: &Array1<f64>) -> f64 {
    let med = median(residuals.iter().copied());
    let deviations: Vec<f64> = residuals.iter().map(|r| (r - med).abs()).collect();
    median(deviations.into_iter()) * MAD_SCALE
}

fn median(values: impl Iterator<Item = f64>) -> f64 {
    let mut v: Vec<f64> = values.collect();
    if v.is_empty() {
        return 0.0;
    }
    v.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let mid = v.len() / 2;
    if v.len() % 2 == 0 {
        (v[mid - 1] + v[mid]) / 2.0
    } else {
        v[mid]
    }
}
