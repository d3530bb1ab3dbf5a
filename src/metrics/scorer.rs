//! Regression scorer

use crate::error::{Result, TabfitError};
use crate::metrics::table::{FoldRow, FoldTable, MetricSet, Statistic};
use ndarray::Array1;
use serde::{Deserialize, Serialize};

/// Scores regression fits from predicted and true values.
///
/// Constructed either from one prediction/truth pair (single-run mode) or
/// from one pair per cross-validation fold (multi-fold mode). In multi-fold
/// mode the scorer keeps the per-fold table and reports the across-fold
/// mean of each statistic as its [`MetricSet`].
///
/// An optional predictor count enables adjusted R²; without it, adjusted R²
/// is reported as NaN rather than omitted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegressionScorer {
    stats: MetricSet,
    fold_table: Option<FoldTable>,
}

impl RegressionScorer {
    /// Score one prediction/truth pair.
    pub fn single(
        y_pred: &Array1<f64>,
        y_true: &Array1<f64>,
        n_predictors: Option<usize>,
        name: impl Into<String>,
    ) -> Result<Self> {
        let name = name.into();
        check_pair(y_pred, y_true)?;
        let values = compute_statistics(y_pred, y_true, n_predictors);
        Ok(Self {
            stats: MetricSet::new(name, values),
            fold_table: None,
        })
    }

    /// Score one prediction/truth pair per fold.
    ///
    /// The two lists must have equal length and pairwise-equal element
    /// lengths; folds are scored in the given order. The aggregated metric
    /// set holds the arithmetic mean of each statistic across folds,
    /// skipping NaN entries (NaN only when every fold is NaN).
    pub fn from_folds(
        y_preds: &[Array1<f64>],
        y_trues: &[Array1<f64>],
        n_predictors: Option<usize>,
        name: impl Into<String>,
    ) -> Result<Self> {
        let name = name.into();
        if y_preds.len() != y_trues.len() {
            return Err(TabfitError::ShapeMismatch {
                expected: format!("{} fold predictions", y_trues.len()),
                actual: format!("{} fold predictions", y_preds.len()),
            });
        }
        if y_preds.is_empty() {
            return Err(TabfitError::Validation(
                "at least one fold is required".to_string(),
            ));
        }

        let mut rows = Vec::with_capacity(y_preds.len() * Statistic::ALL.len());
        for (fold, (y_pred, y_true)) in y_preds.iter().zip(y_trues.iter()).enumerate() {
            check_pair(y_pred, y_true)?;
            for (statistic, value) in compute_statistics(y_pred, y_true, n_predictors) {
                rows.push(FoldRow { fold, statistic, value });
            }
        }

        let aggregated = Statistic::ALL
            .iter()
            .map(|&statistic| {
                let fold_values: Vec<f64> = rows
                    .iter()
                    .filter(|r| r.statistic == statistic)
                    .map(|r| r.value)
                    .collect();
                (statistic, nan_mean(&fold_values))
            })
            .collect();

        Ok(Self {
            stats: MetricSet::new(name.clone(), aggregated),
            fold_table: Some(FoldTable::new(name, rows, y_preds.len())),
        })
    }

    /// The metric set: per-run statistics in single-run mode, fold-averaged
    /// statistics in multi-fold mode.
    pub fn stats(&self) -> &MetricSet {
        &self.stats
    }

    /// The per-fold table; `None` in single-run mode.
    pub fn fold_table(&self) -> Option<&FoldTable> {
        self.fold_table.as_ref()
    }

    /// Shortcut for `stats().get(statistic)`.
    pub fn get(&self, statistic: Statistic) -> Option<f64> {
        self.stats.get(statistic)
    }
}

fn check_pair(y_pred: &Array1<f64>, y_true: &Array1<f64>) -> Result<()> {
    if y_pred.len() != y_true.len() {
        return Err(TabfitError::ShapeMismatch {
            expected: format!("{} predictions", y_true.len()),
            actual: format!("{} predictions", y_pred.len()),
        });
    }
    if y_pred.is_empty() {
        return Err(TabfitError::Validation(
            "cannot score an empty prediction vector".to_string(),
        ));
    }
    Ok(())
}

fn compute_statistics(
    y_pred: &Array1<f64>,
    y_true: &Array1<f64>,
    n_predictors: Option<usize>,
) -> Vec<(Statistic, f64)> {
    let n = y_true.len() as f64;

    let mse = y_true
        .iter()
        .zip(y_pred.iter())
        .map(|(t, p)| (t - p).powi(2))
        .sum::<f64>()
        / n;
    let mad = y_true
        .iter()
        .zip(y_pred.iter())
        .map(|(t, p)| (t - p).abs())
        .sum::<f64>()
        / n;

    let r2 = r2_score(y_true, y_pred);
    let adjr2 = match n_predictors {
        Some(p) if (p as f64) < n - 1.0 => 1.0 - (1.0 - r2) * (n - 1.0) / (n - p as f64 - 1.0),
        _ => f64::NAN,
    };

    vec![
        (Statistic::Rmse, mse.sqrt()),
        (Statistic::Mad, mad),
        (Statistic::PearsonR, pearson(y_true, y_pred)),
        (Statistic::SpearmanR, spearman(y_true, y_pred)),
        (Statistic::R2, r2),
        (Statistic::AdjR2, adjr2),
        (Statistic::N, n),
    ]
}

/// Coefficient of determination. With zero total variance the score is 1.0
/// for a perfect fit and 0.0 otherwise.
pub(crate) fn r2_score(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> f64 {
    let n = y_true.len() as f64;
    let mean = y_true.sum() / n;
    let ss_tot: f64 = y_true.iter().map(|v| (v - mean).powi(2)).sum();
    let ss_res: f64 = y_true
        .iter()
        .zip(y_pred.iter())
        .map(|(t, p)| (t - p).powi(2))
        .sum();

    if ss_tot == 0.0 {
        if ss_res == 0.0 {
            1.0
        } else {
            0.0
        }
    } else {
        1.0 - ss_res / ss_tot
    }
}

/// Pearson correlation; NaN when either sequence is constant.
fn pearson(a: &Array1<f64>, b: &Array1<f64>) -> f64 {
    let n = a.len() as f64;
    let mean_a = a.sum() / n;
    let mean_b = b.sum() / n;

    let mut cov = 0.0;
    let mut var_a = 0.0;
    let mut var_b = 0.0;
    for (x, y) in a.iter().zip(b.iter()) {
        let da = x - mean_a;
        let db = y - mean_b;
        cov += da * db;
        var_a += da * da;
        var_b += db * db;
    }

    let denom = (var_a * var_b).sqrt();
    if denom == 0.0 {
        f64::NAN
    } else {
        cov / denom
    }
}

/// Spearman rank correlation: Pearson correlation of average ranks.
fn spearman(a: &Array1<f64>, b: &Array1<f64>) -> f64 {
    pearson(&ranks(a), &ranks(b))
}

/// Ranks with ties assigned the average of their positions (1-based).
fn ranks(v: &Array1<f64>) -> Array1<f64> {
    let mut order: Vec<usize> = (0..v.len()).collect();
    order.sort_by(|&a, &b| {
        v[a].partial_cmp(&v[b])
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut out = vec![0.0; v.len()];
    let mut i = 0;
    while i < order.len() {
        let mut j = i;
        while j + 1 < order.len() && v[order[j + 1]] == v[order[i]] {
            j += 1;
        }
        let avg_rank = (i + j) as f64 / 2.0 + 1.0;
        for &idx in &order[i..=j] {
            out[idx] = avg_rank;
        }
        i = j + 1;
    }

    Array1::from_vec(out)
}

/// Mean skipping NaN entries; NaN when every entry is NaN.
fn nan_mean(values: &[f64]) -> f64 {
    let finite: Vec<f64> = values.iter().copied().filter(|v| !v.is_nan()).collect();
    if finite.is_empty() {
        f64::NAN
    } else {
        finite.iter().sum::<f64>() / finite.len() as f64
    }
}
