//! The fit/evaluate protocol driver
//!
//! A [`ModelOrchestrator`] owns one estimator family, its hyperparameter
//! searcher, and an optional feature-selection ensemble, and drives the
//! full protocol: select features, tune, fit on train data, optionally
//! repeat per cross-validation fold, refit on all training data, and score
//! against the held-out test split. The result is three metric sets
//! (train, cross-validation, test) in original target units.

mod config;
mod engine;

pub use config::OrchestratorConfig;
pub use engine::ModelOrchestrator;
