//! tabfit - Comparative model fitting and evaluation for tabular regression
//!
//! This crate automates the fit/evaluate cycle of regression models over a
//! train/test split, with optional ensemble feature selection, automatic
//! hyperparameter tuning, and k-fold cross-validated scoring:
//!
//! - Data views over preprocessed train/test arrays with target scaling
//! - Voting feature selection over an ensemble of selectors
//! - Grid and randomized hyperparameter search with inner cross-validation
//! - Train / cross-validation / test metric sets in original target units
//!
//! # Modules
//!
//! - [`data`] - Train/test data views, target scaling, fold generation
//! - [`metrics`] - Regression scoring and metric tables
//! - [`models`] - Estimator trait and linear estimator families
//! - [`search`] - Hyperparameter search (grid and randomized)
//! - [`selection`] - Feature selectors and voting selection reports
//! - [`orchestrator`] - The fit/evaluate protocol driver
//!
//! # Example
//!
//! ```no_run
//! use ndarray::{Array1, Array2};
//! use tabfit::data::DataView;
//! use tabfit::models::ModelFamily;
//! use tabfit::orchestrator::ModelOrchestrator;
//!
//! # fn main() -> tabfit::Result<()> {
//! # let (train_x, train_y): (Array2<f64>, Array1<f64>) = unimplemented!();
//! # let (test_x, test_y): (Array2<f64>, Array1<f64>) = unimplemented!();
//! let view = DataView::new(
//!     train_x,
//!     train_y,
//!     test_x,
//!     test_y,
//!     vec!["x1".to_string(), "x2".to_string()],
//! )?;
//!
//! let mut model = ModelOrchestrator::new(ModelFamily::Lasso);
//! model.specify_data(view, None);
//! model.fit()?;
//!
//! println!("{}", model.test_metrics()?);
//! # Ok(())
//! # }
//! ```

// Core error handling
pub mod error;

// Data access
pub mod data;

// Scoring
pub mod metrics;

// Estimators
pub mod models;

// Hyperparameter search
pub mod search;

// Feature selection
pub mod selection;

// Fit/evaluate protocol
pub mod orchestrator;

pub use error::{Result, TabfitError};

pub use data::{k_fold_views, DataView, ScalerKind, TargetScaler};
pub use metrics::{FoldTable, MetricSet, RegressionScorer, Statistic};
pub use models::{
    ElasticNetRegression, Estimator, HuberRegression, LassoRegression, LinearRegression,
    ModelFamily, ParamGrid, ParamMap, ParamValue, RidgeRegression,
};
pub use orchestrator::{ModelOrchestrator, OrchestratorConfig};
pub use search::{HyperparameterSearcher, SearchMethod, SearcherConfig};
pub use selection::{FeatureSelector, SelectorVote, VotingSelectionReport};
