//! Model family tags and default hyperparameter search spaces

use crate::error::{Result, TabfitError};
use crate::models::linear::{
    ElasticNetRegression, LassoRegression, LinearRegression, RidgeRegression,
};
use crate::models::params::{float_values, linspace, logspace, ParamGrid, ParamValue};
use crate::models::robust::HuberRegression;
use crate::models::Estimator;
use crate::search::SearchMethod;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A supported estimator family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModelFamily {
    Ols,
    Ridge,
    Lasso,
    ElasticNet,
    Huber,
}

impl ModelFamily {
    /// Parse a family from its tag. Accepts the regularization aliases
    /// `"l1"` and `"l2"`.
    pub fn from_tag(tag: &str) -> Result<Self> {
        match tag {
            "ols" => Ok(ModelFamily::Ols),
            "ridge" | "l2" => Ok(ModelFamily::Ridge),
            "lasso" | "l1" => Ok(ModelFamily::Lasso),
            "elasticnet" => Ok(ModelFamily::ElasticNet),
            "huber" => Ok(ModelFamily::Huber),
            _ => Err(TabfitError::InvalidConfiguration(format!(
                "unknown model family tag: {tag}"
            ))),
        }
    }

    /// Canonical tag for this family.
    pub fn tag(&self) -> &'static str {
        match self {
            ModelFamily::Ols => "ols",
            ModelFamily::Ridge => "ridge",
            ModelFamily::Lasso => "lasso",
            ModelFamily::ElasticNet => "elasticnet",
            ModelFamily::Huber => "huber",
        }
    }

    /// Build a fresh unfitted estimator of this family.
    pub fn estimator(&self) -> Box<dyn Estimator> {
        match self {
            ModelFamily::Ols => Box::new(LinearRegression::new()),
            ModelFamily::Ridge => Box::new(RidgeRegression::default()),
            ModelFamily::Lasso => Box::new(LassoRegression::default()),
            ModelFamily::ElasticNet => Box::new(ElasticNetRegression::default()),
            ModelFamily::Huber => Box::new(HuberRegression::default()),
        }
    }

    /// The default search space for this family, as one `(method, grid)`
    /// lookup: a caller overrides it only by supplying both pieces
    /// together.
    pub fn default_search(&self) -> (SearchMethod, ParamGrid) {
        let grid = match self {
            ModelFamily::Ols => {
                ParamGrid::from([("fit_intercept".to_string(), vec![ParamValue::Bool(true)])])
            }
            ModelFamily::Ridge | ModelFamily::Lasso => ParamGrid::from([(
                "alpha".to_string(),
                float_values(logspace(-5.0, 2.0, 100)),
            )]),
            ModelFamily::ElasticNet => ParamGrid::from([
                (
                    "alpha".to_string(),
                    float_values(logspace(-5.0, 2.0, 100)),
                ),
                (
                    "l1_ratio".to_string(),
                    float_values(linspace(0.0, 1.0, 100)),
                ),
            ]),
            ModelFamily::Huber => ParamGrid::from([
                (
                    "epsilon".to_string(),
                    float_values([1.0, 1.2, 1.35, 1.5, 2.0]),
                ),
                (
                    "alpha".to_string(),
                    float_values(logspace(-6.0, -1.0, 10)),
                ),
            ]),
        };
        (SearchMethod::Grid, grid)
    }
}

impl fmt::Display for ModelFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}
