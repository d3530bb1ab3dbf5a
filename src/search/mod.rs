//! Hyperparameter search
//!
//! A [`HyperparameterSearcher`] wraps one estimator and a parameter space,
//! selects the best configuration by inner cross-validation, and keeps the
//! winning estimator refit on the full data it was given.

mod config;
mod searcher;

pub use config::{SearchMethod, SearcherConfig};
pub use searcher::HyperparameterSearcher;
