//! Feature selection
//!
//! Individual [`FeatureSelector`]s each nominate a subset of predictor
//! columns from training data; a [`VotingSelectionReport`] runs an ensemble
//! of them and aggregates their votes into one ranked feature subset.

mod selectors;
mod voting;

pub use selectors::{KBestScore, KBestSelector, LassoSelector};
pub use voting::VotingSelectionReport;

use crate::error::Result;
use ndarray::{Array1, Array2};

/// One selector's verdict over all candidate columns.
#[derive(Debug, Clone)]
pub struct SelectorVote {
    /// Per-column flag: did this selector pick the column?
    pub support: Vec<bool>,
    /// Per-column native score (higher is better); used to break ties
    /// between columns with equal vote totals.
    pub scores: Vec<f64>,
}

/// A procedure that ranks or selects predictor columns from training data.
pub trait FeatureSelector: Send + Sync {
    /// Short name for logs and reports.
    fn name(&self) -> &str;

    /// Score all columns of `x` against `y` and pick at most `n_target`.
    fn select(&self, x: &Array2<f64>, y: &Array1<f64>, n_target: usize) -> Result<SelectorVote>;
}
