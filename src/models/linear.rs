//! Linear estimator families: OLS, Ridge, Lasso, ElasticNet

use crate::error::{Result, TabfitError};
use crate::models::params::{ParamMap, ParamValue};
use crate::models::solve::solve_normal_equations;
use crate::models::Estimator;
use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};

/// Validate X/y row agreement and non-emptiness.
fn check_fit_input(x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
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
    Ok(())
}

/// Center X and y around their column/overall means when an intercept is
/// fitted; the means come back for intercept recovery.
fn center(
    x: &Array2<f64>,
    y: &Array1<f64>,
    fit_intercept: bool,
) -> Result<(Array2<f64>, Array1<f64>, Option<Array1<f64>>, Option<f64>)> {
    if !fit_intercept {
        return Ok((x.clone(), y.clone(), None, None));
    }
    let x_mean = x
        .mean_axis(Axis(0))
        .ok_or_else(|| TabfitError::Validation("cannot center an empty matrix".to_string()))?;
    let y_mean = y.sum() / y.len() as f64;
    let x_centered = x - &x_mean.clone().insert_axis(Axis(0));
    let y_centered = y.mapv(|v| v - y_mean);
    Ok((x_centered, y_centered, Some(x_mean), Some(y_mean)))
}

fn recover_intercept(
    coefficients: &Array1<f64>,
    x_mean: Option<Array1<f64>>,
    y_mean: Option<f64>,
) -> f64 {
    match (x_mean, y_mean) {
        (Some(xm), Some(ym)) => ym - coefficients.dot(&xm),
        _ => 0.0,
    }
}

/// Soft-threshold operator for L1 proximal steps.
fn soft_threshold(value: f64, threshold: f64) -> f64 {
    if value > threshold {
        value - threshold
    } else if value < -threshold {
        value + threshold
    } else {
        0.0
    }
}

/// Cyclic coordinate descent for L1/L2-penalized least squares on centered
/// data. `l1` and `l2` are the absolute penalty terms (already scaled by the
/// sample count).
fn coordinate_descent(
    x: &Array2<f64>,
    y: &Array1<f64>,
    l1: f64,
    l2: f64,
    max_iter: usize,
    tol: f64,
) -> Array1<f64> {
    let n_features = x.ncols();
    let col_norms: Vec<f64> = (0..n_features)
        .map(|j| x.column(j).mapv(|v| v * v).sum())
        .collect();

    let mut w: Array1<f64> = Array1::zeros(n_features);
    for _iter in 0..max_iter {
        let w_old = w.clone();
        let mut residual = y - &x.dot(&w);

        for j in 0..n_features {
            let denom = col_norms[j] + l2;
            if denom < 1e-15 {
                w[j] = 0.0;
                continue;
            }
            let rho = x.column(j).dot(&residual) + col_norms[j] * w[j];
            let old_wj = w[j];
            w[j] = soft_threshold(rho, l1) / denom;
            let delta = old_wj - w[j];
            if delta != 0.0 {
                residual.scaled_add(delta, &x.column(j));
            }
        }

        let change = (&w - &w_old).mapv(f64::abs).sum();
        if change < tol {
            break;
        }
    }

    w
}

fn predict_linear(
    coefficients: Option<&Array1<f64>>,
    intercept: f64,
    x: &Array2<f64>,
) -> Result<Array1<f64>> {
    let coefficients = coefficients.ok_or(TabfitError::NotFitted)?;
    if x.ncols() != coefficients.len() {
        return Err(TabfitError::ShapeMismatch {
            expected: format!("{} columns", coefficients.len()),
            actual: format!("{} columns", x.ncols()),
        });
    }
    Ok(x.dot(coefficients) + intercept)
}

fn unknown_param(model: &str, name: &str) -> TabfitError {
    TabfitError::InvalidConfiguration(format!("unknown hyperparameter '{name}' for {model}"))
}

fn float_param(model: &str, name: &str, value: &ParamValue) -> Result<f64> {
    value.as_f64().ok_or_else(|| {
        TabfitError::InvalidConfiguration(format!(
            "hyperparameter '{name}' for {model} expects a number"
        ))
    })
}

fn bool_param(model: &str, name: &str, value: &ParamValue) -> Result<bool> {
    value.as_bool().ok_or_else(|| {
        TabfitError::InvalidConfiguration(format!(
            "hyperparameter '{name}' for {model} expects a bool"
        ))
    })
}

fn usize_param(model: &str, name: &str, value: &ParamValue) -> Result<usize> {
    value.as_usize().ok_or_else(|| {
        TabfitError::InvalidConfiguration(format!(
            "hyperparameter '{name}' for {model} expects a non-negative integer"
        ))
    })
}

/// Ordinary least squares regression solved via normal equations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinearRegression {
    fit_intercept: bool,
    coefficients: Option<Array1<f64>>,
    intercept: f64,
}

impl Default for LinearRegression {
    fn default() -> Self {
        Self::new()
    }
}

impl LinearRegression {
    pub fn new() -> Self {
        Self {
            fit_intercept: true,
            coefficients: None,
            intercept: 0.0,
        }
    }

    pub fn with_fit_intercept(mut self, fit_intercept: bool) -> Self {
        self.fit_intercept = fit_intercept;
        self
    }

    /// Fitted coefficients, once fitted.
    pub fn coefficients(&self) -> Option<&Array1<f64>> {
        self.coefficients.as_ref()
    }

    pub fn intercept(&self) -> f64 {
        self.intercept
    }
}

impl Estimator for LinearRegression {
    fn name(&self) -> &'static str {
        "ols"
    }

    fn set_param(&mut self, name: &str, value: &ParamValue) -> Result<()> {
        match name {
            "fit_intercept" => self.fit_intercept = bool_param(self.name(), name, value)?,
            _ => return Err(unknown_param(self.name(), name)),
        }
        Ok(())
    }

    fn params(&self) -> ParamMap {
        ParamMap::from([(
            "fit_intercept".to_string(),
            ParamValue::Bool(self.fit_intercept),
        )])
    }

    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        check_fit_input(x, y)?;
        let (x_c, y_c, x_mean, y_mean) = center(x, y, self.fit_intercept)?;

        let xtx = x_c.t().dot(&x_c);
        let xty = x_c.t().dot(&y_c);
        let coefficients = solve_normal_equations(&xtx, &xty)?;

        self.intercept = recover_intercept(&coefficients, x_mean, y_mean);
        self.coefficients = Some(coefficients);
        Ok(())
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        predict_linear(self.coefficients.as_ref(), self.intercept, x)
    }

    fn clone_box(&self) -> Box<dyn Estimator> {
        Box::new(self.clone())
    }
}

/// L2-regularized least squares solved in closed form.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RidgeRegression {
    alpha: f64,
    fit_intercept: bool,
    coefficients: Option<Array1<f64>>,
    intercept: f64,
}

impl Default for RidgeRegression {
    fn default() -> Self {
        Self::new(1.0)
    }
}

impl RidgeRegression {
    pub fn new(alpha: f64) -> Self {
        Self {
            alpha,
            fit_intercept: true,
            coefficients: None,
            intercept: 0.0,
        }
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
}

impl Estimator for RidgeRegression {
    fn name(&self) -> &'static str {
        "ridge"
    }

    fn set_param(&mut self, name: &str, value: &ParamValue) -> Result<()> {
        match name {
            "alpha" => self.alpha = float_param(self.name(), name, value)?,
            "fit_intercept" => self.fit_intercept = bool_param(self.name(), name, value)?,
            _ => return Err(unknown_param(self.name(), name)),
        }
        Ok(())
    }

    fn params(&self) -> ParamMap {
        ParamMap::from([
            ("alpha".to_string(), ParamValue::Float(self.alpha)),
            (
                "fit_intercept".to_string(),
                ParamValue::Bool(self.fit_intercept),
            ),
        ])
    }

    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        check_fit_input(x, y)?;
        let (x_c, y_c, x_mean, y_mean) = center(x, y, self.fit_intercept)?;

        let mut xtx = x_c.t().dot(&x_c);
        for i in 0..xtx.nrows() {
            xtx[[i, i]] += self.alpha;
        }
        let xty = x_c.t().dot(&y_c);
        let coefficients = solve_normal_equations(&xtx, &xty)?;

        self.intercept = recover_intercept(&coefficients, x_mean, y_mean);
        self.coefficients = Some(coefficients);
        Ok(())
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        predict_linear(self.coefficients.as_ref(), self.intercept, x)
    }

    fn clone_box(&self) -> Box<dyn Estimator> {
        Box::new(self.clone())
    }
}

/// L1-regularized least squares via cyclic coordinate descent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LassoRegression {
    alpha: f64,
    max_iter: usize,
    tol: f64,
    fit_intercept: bool,
    coefficients: Option<Array1<f64>>,
    intercept: f64,
}

impl Default for LassoRegression {
    fn default() -> Self {
        Self::new(1.0)
    }
}

impl LassoRegression {
    pub fn new(alpha: f64) -> Self {
        Self {
            alpha,
            max_iter: 2000,
            tol: 1e-6,
            fit_intercept: true,
            coefficients: None,
            intercept: 0.0,
        }
    }

    pub fn with_alpha(mut self, alpha: f64) -> Self {
        self.alpha = alpha;
        self
    }

    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    pub fn coefficients(&self) -> Option<&Array1<f64>> {
        self.coefficients.as_ref()
    }

    pub fn intercept(&self) -> f64 {
        self.intercept
    }
}

impl Estimator for LassoRegression {
    fn name(&self) -> &'static str {
        "lasso"
    }

    fn set_param(&mut self, name: &str, value: &ParamValue) -> Result<()> {
        match name {
            "alpha" => self.alpha = float_param(self.name(), name, value)?,
            "max_iter" => self.max_iter = usize_param(self.name(), name, value)?,
            "tol" => self.tol = float_param(self.name(), name, value)?,
            "fit_intercept" => self.fit_intercept = bool_param(self.name(), name, value)?,
            _ => return Err(unknown_param(self.name(), name)),
        }
        Ok(())
    }

    fn params(&self) -> ParamMap {
        ParamMap::from([
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
        check_fit_input(x, y)?;
        let (x_c, y_c, x_mean, y_mean) = center(x, y, self.fit_intercept)?;

        let l1 = self.alpha * x.nrows() as f64;
        let coefficients = coordinate_descent(&x_c, &y_c, l1, 0.0, self.max_iter, self.tol);

        self.intercept = recover_intercept(&coefficients, x_mean, y_mean);
        self.coefficients = Some(coefficients);
        Ok(())
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        predict_linear(self.coefficients.as_ref(), self.intercept, x)
    }

    fn clone_box(&self) -> Box<dyn Estimator> {
        Box::new(self.clone())
    }
}

/// Mixed L1/L2-regularized least squares via cyclic coordinate descent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ElasticNetRegression {
    alpha: f64,
    l1_ratio: f64,
    max_iter: usize,
    tol: f64,
    fit_intercept: bool,
    coefficients: Option<Array1<f64>>,
    intercept: f64,
}

impl Default for ElasticNetRegression {
    fn default() -> Self {
        Self::new(1.0, 0.5)
    }
}

impl ElasticNetRegression {
    pub fn new(alpha: f64, l1_ratio: f64) -> Self {
        Self {
            alpha,
            l1_ratio: l1_ratio.clamp(0.0, 1.0),
            max_iter: 2000,
            tol: 1e-6,
            fit_intercept: true,
            coefficients: None,
            intercept: 0.0,
        }
    }

    pub fn with_alpha(mut self, alpha: f64) -> Self {
        self.alpha = alpha;
        self
    }

    pub fn with_l1_ratio(mut self, l1_ratio: f64) -> Self {
        self.l1_ratio = l1_ratio.clamp(0.0, 1.0);
        self
    }

    pub fn coefficients(&self) -> Option<&Array1<f64>> {
        self.coefficients.as_ref()
    }

    pub fn intercept(&self) -> f64 {
        self.intercept
    }
}

impl Estimator for ElasticNetRegression {
    fn name(&self) -> &'static str {
        "elasticnet"
    }

    fn set_param(&mut self, name: &str, value: &ParamValue) -> Result<()> {
        match name {
            "alpha" => self.alpha = float_param(self.name(), name, value)?,
            "l1_ratio" => {
                self.l1_ratio = float_param(self.name(), name, value)?.clamp(0.0, 1.0)
            }
            "max_iter" => self.max_iter = usize_param(self.name(), name, value)?,
            "tol" => self.tol = float_param(self.name(), name, value)?,
            "fit_intercept" => self.fit_intercept = bool_param(self.name(), name, value)?,
            _ => return Err(unknown_param(self.name(), name)),
        }
        Ok(())
    }

    fn params(&self) -> ParamMap {
        ParamMap::from([
            ("alpha".to_string(), ParamValue::Float(self.alpha)),
            ("l1_ratio".to_string(), ParamValue::Float(self.l1_ratio)),
            ("max_iter".to_string(), ParamValue::Int(self.max_iter as i64)),
            ("tol".to_string(), ParamValue::Float(self.tol)),
            (
                "fit_intercept".to_string(),
                ParamValue::Bool(self.fit_intercept),
            ),
        ])
    }

    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        check_fit_input(x, y)?;
        let (x_c, y_c, x_mean, y_mean) = center(x, y, self.fit_intercept)?;

        let n = x.nrows() as f64;
        let l1 = self.alpha * self.l1_ratio * n;
        let l2 = self.alpha * (1.0 - self.l1_ratio) * n;
        let coefficients = coordinate_descent(&x_c, &y_c, l1, l2, self.max_iter, self.tol);

        self.intercept = recover_intercept(&coefficients, x_mean, y_mean);
        self.coefficients = Some(coefficients);
        Ok(())
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        predict_linear(self.coefficients.as_ref(), self.intercept, x)
    }

    fn clone_box(&self) -> Box<dyn Estimator> {
        Box::new(self.clone())
    }
}
