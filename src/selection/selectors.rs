//! Concrete feature selectors

use crate::error::Result;
use crate::models::{Estimator, LassoRegression};
use crate::selection::{FeatureSelector, SelectorVote};
use ndarray::{Array1, Array2, ArrayView1};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Scoring rule for [`KBestSelector`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum KBestScore {
    /// Absolute Pearson correlation with the target
    AbsCorrelation,
    /// Mutual information with the target (equal-width binning)
    MutualInfo,
}

/// Selects the k highest-scoring columns under a univariate scoring rule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KBestSelector {
    score: KBestScore,
}

impl KBestSelector {
    pub fn new(score: KBestScore) -> Self {
        Self { score }
    }

    pub fn abs_correlation() -> Self {
        Self::new(KBestScore::AbsCorrelation)
    }

    pub fn mutual_info() -> Self {
        Self::new(KBestScore::MutualInfo)
    }
}

impl FeatureSelector for KBestSelector {
    fn name(&self) -> &str {
        match self.score {
            KBestScore::AbsCorrelation => "kbest_abs_corr",
            KBestScore::MutualInfo => "kbest_mutual_info",
        }
    }

    fn select(&self, x: &Array2<f64>, y: &Array1<f64>, n_target: usize) -> Result<SelectorVote> {
        let scores: Vec<f64> = (0..x.ncols())
            .map(|j| match self.score {
                KBestScore::AbsCorrelation => abs_correlation(x.column(j), y.view()),
                KBestScore::MutualInfo => mutual_information(x.column(j), y.view()),
            })
            .collect();

        Ok(vote_top_k(scores, n_target))
    }
}

/// Selects columns with the largest nonzero Lasso coefficients.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LassoSelector {
    alpha: f64,
    max_iter: usize,
}

impl LassoSelector {
    pub fn new(alpha: f64) -> Self {
        Self {
            alpha,
            max_iter: 2000,
        }
    }

    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }
}

impl FeatureSelector for LassoSelector {
    fn name(&self) -> &str {
        "lasso"
    }

    fn select(&self, x: &Array2<f64>, y: &Array1<f64>, n_target: usize) -> Result<SelectorVote> {
        let mut model = LassoRegression::new(self.alpha).with_max_iter(self.max_iter);
        model.fit(x, y)?;
        let coefficients = model.coefficients().ok_or(crate::TabfitError::NotFitted)?;

        let scores: Vec<f64> = coefficients.iter().map(|c| c.abs()).collect();
        let mut vote = vote_top_k(scores, n_target);

        // Zero coefficients never count as selected, even when fewer than
        // n_target columns survive the penalty.
        for (flag, score) in vote.support.iter_mut().zip(vote.scores.iter()) {
            if *score < 1e-12 {
                *flag = false;
            }
        }
        Ok(vote)
    }
}

/// Mark the `n_target` highest-scoring columns as selected, earlier columns
/// winning score ties.
fn vote_top_k(scores: Vec<f64>, n_target: usize) -> SelectorVote {
    let k = n_target.min(scores.len());
    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|&a, &b| {
        scores[b]
            .partial_cmp(&scores[a])
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.cmp(&b))
    });

    let mut support = vec![false; scores.len()];
    for &idx in order.iter().take(k) {
        support[idx] = true;
    }
    SelectorVote { support, scores }
}

/// Absolute Pearson correlation; 0.0 for constant columns.
fn abs_correlation(x: ArrayView1<f64>, y: ArrayView1<f64>) -> f64 {
    let n = x.len() as f64;
    if n < 2.0 {
        return 0.0;
    }
    let x_mean = x.sum() / n;
    let y_mean = y.sum() / n;

    let mut cov = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;
    for (a, b) in x.iter().zip(y.iter()) {
        let dx = a - x_mean;
        let dy = b - y_mean;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }

    let denom = (var_x * var_y).sqrt();
    if denom == 0.0 {
        0.0
    } else {
        (cov / denom).abs()
    }
}

/// Mutual information between a column and the target, both discretized
/// into equal-width bins.
fn mutual_information(x: ArrayView1<f64>, y: ArrayView1<f64>) -> f64 {
    let n = x.len() as f64;
    if n < 2.0 {
        return 0.0;
    }
    let n_bins = (n.sqrt() as usize).clamp(2, 20);

    let x_bins = discretize(x, n_bins);
    let y_bins = discretize(y, n_bins);

    let mut joint: HashMap<(usize, usize), usize> = HashMap::new();
    let mut x_counts: HashMap<usize, usize> = HashMap::new();
    let mut y_counts: HashMap<usize, usize> = HashMap::new();
    for (&xb, &yb) in x_bins.iter().zip(y_bins.iter()) {
        *joint.entry((xb, yb)).or_insert(0) += 1;
        *x_counts.entry(xb).or_insert(0) += 1;
        *y_counts.entry(yb).or_insert(0) += 1;
    }

    let mut mi = 0.0;
    for (&(xb, yb), &count) in &joint {
        let p_xy = count as f64 / n;
        let p_x = x_counts[&xb] as f64 / n;
        let p_y = y_counts[&yb] as f64 / n;
        if p_xy > 0.0 {
            mi += p_xy * (p_xy / (p_x * p_y)).ln();
        }
    }
    mi.max(0.0)
}

/// Equal-width binning of a continuous column.
fn discretize(x: ArrayView1<f64>, n_bins: usize) -> Vec<usize> {
    let min = x.iter().cloned().fold(f64::INFINITY, f64::min);
    let max = x.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let range = max - min;
    if range <= 0.0 {
        return vec![0; x.len()];
    }
    let width = range / n_bins as f64;
    x.iter()
        .map(|&v| (((v - min) / width) as usize).min(n_bins - 1))
        .collect()
}
