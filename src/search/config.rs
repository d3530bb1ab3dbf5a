//! Search method tags and tuning knobs

use crate::error::{Result, TabfitError};
use serde::{Deserialize, Serialize};

/// How the parameter space is explored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SearchMethod {
    /// Exhaustive cartesian product of the grid.
    Grid,
    /// `n_iter` seeded uniform draws from the grid.
    Random { n_iter: usize },
}

impl SearchMethod {
    /// Parse a method from its tag (`"grid"` or `"random"`). Random search
    /// defaults to 10 iterations.
    pub fn from_tag(tag: &str) -> Result<Self> {
        match tag {
            "grid" => Ok(SearchMethod::Grid),
            "random" => Ok(SearchMethod::Random { n_iter: 10 }),
            _ => Err(TabfitError::InvalidConfiguration(format!(
                "unknown search method tag: {tag}"
            ))),
        }
    }
}

/// Tuning knobs for one searcher.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearcherConfig {
    /// Inner cross-validation fold count
    pub inner_folds: usize,
    /// Seed for inner fold shuffling and random-search draws
    pub inner_seed: u64,
    /// Number of parallel workers for candidate evaluation
    pub n_jobs: usize,
    /// Whether to log per-candidate progress
    pub verbose: bool,
}

impl Default for SearcherConfig {
    fn default() -> Self {
        Self {
            inner_folds: 5,
            inner_seed: 42,
            n_jobs: 1,
            verbose: false,
        }
    }
}

impl SearcherConfig {
    pub fn new() -> Self {
        Self::default()
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
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_tags() {
        assert_eq!(SearchMethod::from_tag("grid").unwrap(), SearchMethod::Grid);
        assert_eq!(
            SearchMethod::from_tag("random").unwrap(),
            SearchMethod::Random { n_iter: 10 }
        );
        assert!(SearchMethod::from_tag("bayesian").is_err());
    }

    #[test]
    fn test_config_builder() {
        let config = SearcherConfig::new()
            .with_inner_folds(3)
            .with_inner_seed(7)
            .with_n_jobs(4);
        assert_eq!(config.inner_folds, 3);
        assert_eq!(config.inner_seed, 7);
        assert_eq!(config.n_jobs, 4);
        assert!(!config.verbose);
    }
}
