//! Orchestrator configuration

use crate::search::SearcherConfig;
use serde::{Deserialize, Serialize};

/// Per-instance configuration for a [`ModelOrchestrator`].
///
/// There is no process-wide default state: every knob lives on the
/// orchestrator that uses it.
///
/// [`ModelOrchestrator`]: crate::orchestrator::ModelOrchestrator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestratorConfig {
    /// Label used in metric tables; defaults to the model family tag
    pub name: Option<String>,
    /// Inner cross-validation fold count for hyperparameter search
    pub inner_folds: usize,
    /// Seed for inner fold shuffling and random-search draws
    pub inner_seed: u64,
    /// Parallel workers for candidate evaluation
    pub n_jobs: usize,
    /// Whether to log fit progress
    pub verbose: bool,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            name: None,
            inner_folds: 5,
            inner_seed: 42,
            n_jobs: 1,
            verbose: false,
        }
    }
}

impl OrchestratorConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_inner_folds(mut self, inner_folds: usize) -> Self {
        self.inner_folds = inner_folds;
        self
    }

    pub fn with_inner_seed(mut self, inner_seed: u64) -> Self {
        self.inner_seed = inner_seed;
        self
    }

    pub fn with_n_jobs(mut self, n_jobs: usize) -> Self {
        self.n_jobs = n_jobs;
        self
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub(crate) fn searcher_config(&self) -> SearcherConfig {
        SearcherConfig::new()
            .with_inner_folds(self.inner_folds)
            .with_inner_seed(self.inner_seed)
            .with_n_jobs(self.n_jobs)
            .with_verbose(self.verbose)
    }
}
