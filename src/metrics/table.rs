//! Metric tables

use serde::{Deserialize, Serialize};
use std::fmt;

/// A regression fit statistic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Statistic {
    /// Root mean squared error
    Rmse,
    /// Mean absolute deviation
    Mad,
    /// Pearson correlation between predicted and true values
    PearsonR,
    /// Spearman rank correlation between predicted and true values
    SpearmanR,
    /// Coefficient of determination
    R2,
    /// Adjusted R², NaN when the predictor count is unknown or too large
    AdjR2,
    /// Sample count
    N,
}

impl Statistic {
    /// All statistics in reporting order.
    pub const ALL: [Statistic; 7] = [
        Statistic::Rmse,
        Statistic::Mad,
        Statistic::PearsonR,
        Statistic::SpearmanR,
        Statistic::R2,
        Statistic::AdjR2,
        Statistic::N,
    ];

    /// Stable string key for this statistic.
    pub fn as_str(&self) -> &'static str {
        match self {
            Statistic::Rmse => "rmse",
            Statistic::Mad => "mad",
            Statistic::PearsonR => "pearsonr",
            Statistic::SpearmanR => "spearmanr",
            Statistic::R2 => "r2",
            Statistic::AdjR2 => "adjr2",
            Statistic::N => "n",
        }
    }

    /// Parse a statistic from its string key.
    pub fn from_name(name: &str) -> Option<Statistic> {
        Statistic::ALL.iter().copied().find(|s| s.as_str() == name)
    }
}

impl fmt::Display for Statistic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A named table of fit statistics, queryable by [`Statistic`] or by its
/// string key. Values may be NaN when a statistic is not available.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricSet {
    name: String,
    values: Vec<(Statistic, f64)>,
}

impl MetricSet {
    pub(crate) fn new(name: String, values: Vec<(Statistic, f64)>) -> Self {
        Self { name, values }
    }

    /// The model name labelling this table.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Look up a statistic value. NaN values are returned as-is; only a
    /// statistic missing from the table yields `None`.
    pub fn get(&self, statistic: Statistic) -> Option<f64> {
        self.values
            .iter()
            .find(|(s, _)| *s == statistic)
            .map(|(_, v)| *v)
    }

    /// Look up a statistic by its string key (`"rmse"`, `"r2"`, ...).
    pub fn get_named(&self, name: &str) -> Option<f64> {
        Statistic::from_name(name).and_then(|s| self.get(s))
    }

    /// All `(statistic, value)` entries in reporting order.
    pub fn entries(&self) -> &[(Statistic, f64)] {
        &self.values
    }
}

impl fmt::Display for MetricSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.name)?;
        for (stat, value) in &self.values {
            writeln!(f, "  {:<10} {:.6}", stat.as_str(), value)?;
        }
        Ok(())
    }
}

/// One row of a per-fold statistic table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FoldRow {
    pub fold: usize,
    pub statistic: Statistic,
    pub value: f64,
}

/// Per-fold statistics, keyed by `(statistic, fold index)`. Fold order is
/// the order folds were scored in; rows are never reordered or dropped.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FoldTable {
    name: String,
    rows: Vec<FoldRow>,
    n_folds: usize,
}

impl FoldTable {
    pub(crate) fn new(name: String, rows: Vec<FoldRow>, n_folds: usize) -> Self {
        Self { name, rows, n_folds }
    }

    /// The model name labelling this table.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of folds in the table.
    pub fn n_folds(&self) -> usize {
        self.n_folds
    }

    /// All rows, fold-major in scoring order.
    pub fn rows(&self) -> &[FoldRow] {
        &self.rows
    }

    /// Look up one statistic value for one fold.
    pub fn get(&self, statistic: Statistic, fold: usize) -> Option<f64> {
        self.rows
            .iter()
            .find(|r| r.statistic == statistic && r.fold == fold)
            .map(|r| r.value)
    }
}
