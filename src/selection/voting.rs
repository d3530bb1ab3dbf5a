//! Ensemble voting over feature selectors

use crate::data::DataView;
use crate::error::{Result, TabfitError};
use crate::selection::FeatureSelector;
use ndarray::Array2;

/// Aggregated votes of a selector ensemble over one data view.
///
/// Every selector runs once against the view's train arrays; each column a
/// selector picks receives one vote. Columns are ranked by vote total, then
/// by the sum of the selectors' native scores, then by original column
/// order, so the ranking is fully deterministic. The report keeps a
/// restriction of the *same* view to the winning columns; transformations
/// fitted by the view are never refit here.
pub struct VotingSelectionReport {
    columns: Vec<String>,
    votes: Vec<u32>,
    score_sums: Vec<f64>,
    top: Vec<String>,
    restricted: DataView,
}

impl VotingSelectionReport {
    /// Run `selectors` against the train portion of `view` and rank the
    /// columns. `n_target` caps the winning subset at
    /// `min(n_target, column count)`.
    pub fn new(
        selectors: &[Box<dyn FeatureSelector>],
        view: &DataView,
        n_target: usize,
    ) -> Result<Self> {
        let columns = view.columns_owned();
        let n_columns = columns.len();
        let (x_train, y_train) = view.emit_train_xy();

        let mut votes = vec![0u32; n_columns];
        let mut score_sums = vec![0.0; n_columns];

        for selector in selectors {
            let vote = selector.select(&x_train, &y_train, n_target)?;
            if vote.support.len() != n_columns || vote.scores.len() != n_columns {
                return Err(TabfitError::ShapeMismatch {
                    expected: format!("{n_columns} column votes from {}", selector.name()),
                    actual: format!(
                        "{} support / {} score entries",
                        vote.support.len(),
                        vote.scores.len()
                    ),
                });
            }
            for (idx, picked) in vote.support.iter().enumerate() {
                if *picked {
                    votes[idx] += 1;
                }
                score_sums[idx] += vote.scores[idx];
            }
        }

        if votes.iter().all(|&v| v == 0) {
            return Err(TabfitError::EmptyVote);
        }

        let mut ranking: Vec<usize> = (0..n_columns).collect();
        ranking.sort_by(|&a, &b| {
            votes[b]
                .cmp(&votes[a])
                .then(
                    score_sums[b]
                        .partial_cmp(&score_sums[a])
                        .unwrap_or(std::cmp::Ordering::Equal),
                )
                .then(a.cmp(&b))
        });

        let top: Vec<String> = ranking
            .iter()
            .take(n_target.min(n_columns))
            .map(|&idx| columns[idx].clone())
            .collect();

        let restricted = view.restrict(&top)?;

        Ok(Self {
            columns,
            votes,
            score_sums,
            top,
            restricted,
        })
    }

    /// The winning columns, best first.
    pub fn top_features(&self) -> &[String] {
        &self.top
    }

    /// Vote totals per column, in original column order.
    pub fn votes(&self) -> impl Iterator<Item = (&str, u32)> {
        self.columns
            .iter()
            .map(|c| c.as_str())
            .zip(self.votes.iter().copied())
    }

    /// Summed native selector scores per column, in original column order.
    pub fn scores(&self) -> impl Iterator<Item = (&str, f64)> {
        self.columns
            .iter()
            .map(|c| c.as_str())
            .zip(self.score_sums.iter().copied())
    }

    /// The source view restricted to the winning columns.
    pub fn restricted_view(&self) -> &DataView {
        &self.restricted
    }

    /// Train predictors sliced to the winning columns.
    pub fn emit_train_x(&self) -> Array2<f64> {
        self.restricted.emit_train_x()
    }

    /// Test predictors sliced to the winning columns.
    pub fn emit_test_x(&self) -> Array2<f64> {
        self.restricted.emit_test_x()
    }
}
