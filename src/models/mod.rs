//! Estimators
//!
//! The [`Estimator`] trait is the capability the search and orchestration
//! layers program against: fit, predict, and hyperparameter configuration.
//! The concrete families here are linear regressors solved in closed form
//! or by coordinate descent, plus a robust Huber regressor.

mod families;
mod linear;
mod params;
mod robust;
mod solve;

pub use families::ModelFamily;
pub use linear::{ElasticNetRegression, LassoRegression, LinearRegression, RidgeRegression};
pub use params::{float_values, linspace, logspace, ParamGrid, ParamMap, ParamValue};
pub use robust::HuberRegression;

use crate::error::Result;
use ndarray::{Array1, Array2};

/// A fittable, predictable, hyperparameter-configurable model.
///
/// Implementations must be cheap to clone unfitted so a search can spawn
/// one candidate per hyperparameter configuration.
pub trait Estimator: Send + Sync {
    /// Short family name for logs and labels.
    fn name(&self) -> &'static str;

    /// Set one hyperparameter. Unknown names or mistyped values fail with
    /// `InvalidConfiguration`.
    fn set_param(&mut self, name: &str, value: &ParamValue) -> Result<()>;

    /// Set several hyperparameters, in map order.
    fn set_params(&mut self, params: &ParamMap) -> Result<()> {
        for (name, value) in params {
            self.set_param(name, value)?;
        }
        Ok(())
    }

    /// Current hyperparameter values.
    fn params(&self) -> ParamMap;

    /// Fit the model to training data.
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()>;

    /// Predict targets; `NotFitted` before any successful `fit`.
    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>>;

    /// Clone into a boxed trait object (fitted state included).
    fn clone_box(&self) -> Box<dyn Estimator>;
}

impl Clone for Box<dyn Estimator> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}
