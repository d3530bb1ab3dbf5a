//! Inner-CV hyperparameter search

use crate::data::k_fold_indices;
use crate::error::{Result, TabfitError};
use crate::metrics::r2_score;
use crate::models::{Estimator, ParamGrid, ParamMap};
use crate::search::config::{SearchMethod, SearcherConfig};
use ndarray::{Array1, Array2, Axis};
use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use tracing::debug;

/// Hyperparameter search over one estimator.
///
/// Every `fit` call fully re-runs the search on the data it is given: the
/// candidate configurations are scored by mean validation R² over a seeded
/// inner k-fold split, the best configuration (ties broken by enumeration
/// order) is refit on the full data, and the result replaces whatever a
/// prior call produced. No state carries over between calls.
pub struct HyperparameterSearcher {
    base: Box<dyn Estimator>,
    method: SearchMethod,
    grid: ParamGrid,
    config: SearcherConfig,
    best_estimator: Option<Box<dyn Estimator>>,
    best_params: Option<ParamMap>,
    best_score: Option<f64>,
}

impl HyperparameterSearcher {
    /// Create a searcher over `estimator` with an explicit method and
    /// parameter space.
    pub fn new(
        estimator: Box<dyn Estimator>,
        method: SearchMethod,
        grid: ParamGrid,
        config: SearcherConfig,
    ) -> Self {
        Self {
            base: estimator,
            method,
            grid,
            config,
            best_estimator: None,
            best_params: None,
            best_score: None,
        }
    }

    /// Replace the search method and parameter space together. Discards any
    /// previous search result.
    pub fn set_search(&mut self, method: SearchMethod, grid: ParamGrid) {
        self.method = method;
        self.grid = grid;
        self.reset();
    }

    /// Replace the tuning knobs. Discards any previous search result.
    pub fn set_config(&mut self, config: SearcherConfig) {
        self.config = config;
        self.reset();
    }

    /// The estimator family name being searched.
    pub fn estimator_name(&self) -> &'static str {
        self.base.name()
    }

    /// The parameter space being searched.
    pub fn grid(&self) -> &ParamGrid {
        &self.grid
    }

    /// The search method in use.
    pub fn method(&self) -> SearchMethod {
        self.method
    }

    /// Run the search and refit the winner on the full `(x, y)`.
    pub fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        self.reset();

        if x.nrows() != y.len() {
            return Err(TabfitError::ShapeMismatch {
                expected: format!("{} targets", x.nrows()),
                actual: format!("{} targets", y.len()),
            });
        }
        for (name, values) in &self.grid {
            if values.is_empty() {
                return Err(TabfitError::InvalidConfiguration(format!(
                    "no candidate values for hyperparameter '{name}'"
                )));
            }
        }

        let candidates = self.candidates();
        let folds = k_fold_indices(x.nrows(), self.config.inner_folds, self.config.inner_seed)?;

        if self.config.verbose {
            debug!(
                estimator = self.base.name(),
                candidates = candidates.len(),
                inner_folds = folds.len(),
                "starting hyperparameter search"
            );
        }

        let scores: Vec<f64> = if self.config.n_jobs > 1 {
            candidates
                .par_iter()
                .map(|params| self.evaluate(params, x, y, &folds))
                .collect::<Result<Vec<_>>>()?
        } else {
            candidates
                .iter()
                .map(|params| self.evaluate(params, x, y, &folds))
                .collect::<Result<Vec<_>>>()?
        };

        // Maximize; NaN candidates never win, ties go to the earliest.
        let mut best_idx: Option<usize> = None;
        for (idx, score) in scores.iter().enumerate() {
            if score.is_nan() {
                continue;
            }
            match best_idx {
                None => best_idx = Some(idx),
                Some(current) if *score > scores[current] => best_idx = Some(idx),
                _ => {}
            }
        }
        let best_idx = best_idx.ok_or_else(|| {
            TabfitError::Computation(
                "no hyperparameter candidate produced a finite validation score".to_string(),
            )
        })?;

        let mut winner = self.base.clone_box();
        winner.set_params(&candidates[best_idx])?;
        winner.fit(x, y)?;

        if self.config.verbose {
            debug!(
                estimator = self.base.name(),
                score = scores[best_idx],
                "search complete"
            );
        }

        self.best_score = Some(scores[best_idx]);
        self.best_params = Some(candidates[best_idx].clone());
        self.best_estimator = Some(winner);
        Ok(())
    }

    /// The winning estimator, refit on the full data of the last `fit`.
    pub fn best_estimator(&self) -> Result<&dyn Estimator> {
        self.best_estimator
            .as_deref()
            .ok_or(TabfitError::NotFitted)
    }

    /// The hyperparameter values that produced the winner.
    pub fn best_params(&self) -> Result<&ParamMap> {
        self.best_params.as_ref().ok_or(TabfitError::NotFitted)
    }

    /// Mean validation R² of the winning configuration.
    pub fn best_score(&self) -> Result<f64> {
        self.best_score.ok_or(TabfitError::NotFitted)
    }

    fn reset(&mut self) {
        self.best_estimator = None;
        self.best_params = None;
        self.best_score = None;
    }

    /// Candidate configurations in deterministic enumeration order.
    fn candidates(&self) -> Vec<ParamMap> {
        match self.method {
            SearchMethod::Grid => cartesian_product(&self.grid),
            SearchMethod::Random { n_iter } => {
                let mut rng = ChaCha8Rng::seed_from_u64(self.config.inner_seed);
                (0..n_iter)
                    .map(|_| {
                        self.grid
                            .iter()
                            .map(|(name, values)| {
                                let pick = rng.gen_range(0..values.len());
                                (name.clone(), values[pick].clone())
                            })
                            .collect()
                    })
                    .collect()
            }
        }
    }

    /// Mean validation R² of one configuration over the inner folds.
    ///
    /// Configuration errors (unknown names, mistyped values) propagate;
    /// numeric failures during a fold fit demote the candidate to NaN so
    /// it loses to every finite competitor.
    fn evaluate(
        &self,
        params: &ParamMap,
        x: &Array2<f64>,
        y: &Array1<f64>,
        folds: &[(Vec<usize>, Vec<usize>)],
    ) -> Result<f64> {
        let mut fold_scores = Vec::with_capacity(folds.len());
        for (train_idx, val_idx) in folds {
            let x_train = x.select(Axis(0), train_idx);
            let y_train = y.select(Axis(0), train_idx);
            let x_val = x.select(Axis(0), val_idx);
            let y_val = y.select(Axis(0), val_idx);

            let mut candidate = self.base.clone_box();
            candidate.set_params(params)?;
            if candidate.fit(&x_train, &y_train).is_err() {
                return Ok(f64::NAN);
            }
            match candidate.predict(&x_val) {
                Ok(y_pred) => fold_scores.push(r2_score(&y_val, &y_pred)),
                Err(_) => return Ok(f64::NAN),
            }
        }
        Ok(fold_scores.iter().sum::<f64>() / fold_scores.len() as f64)
    }
}

/// Cartesian product of a grid, keys in map order, values in declared
/// order. An empty grid yields one empty configuration.
fn cartesian_product(grid: &ParamGrid) -> Vec<ParamMap> {
    let mut out = vec![ParamMap::new()];
    for (name, values) in grid {
        let mut next = Vec::with_capacity(out.len() * values.len());
        for base in &out {
            for value in values {
                let mut candidate = base.clone();
                candidate.insert(name.clone(), value.clone());
                next.push(candidate);
            }
        }
        out = next;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{float_values, ParamValue, RidgeRegression};
    use ndarray::{Array1, Array2};

    fn linear_data(n: usize) -> (Array2<f64>, Array1<f64>) {
        let x = Array2::from_shape_fn((n, 2), |(i, j)| {
            if j == 0 {
                i as f64
            } else {
                ((i * i) % 13) as f64
            }
        });
        let y = Array1::from_shape_fn(n, |i| {
            let r = x.row(i);
            1.5 * r[0] - 0.5 * r[1] + 2.0
        });
        (x, y)
    }

    fn ridge_searcher(grid: ParamGrid, method: SearchMethod) -> HyperparameterSearcher {
        HyperparameterSearcher::new(
            Box::new(RidgeRegression::default()),
            method,
            grid,
            SearcherConfig::default().with_inner_folds(3),
        )
    }

    #[test]
    fn test_accessors_before_fit_fail() {
        let grid = ParamGrid::from([("alpha".to_string(), float_values([0.1, 1.0]))]);
        let searcher = ridge_searcher(grid, SearchMethod::Grid);

        assert!(matches!(
            searcher.best_estimator(),
            Err(TabfitError::NotFitted)
        ));
        assert!(matches!(searcher.best_params(), Err(TabfitError::NotFitted)));
        assert!(matches!(searcher.best_score(), Err(TabfitError::NotFitted)));
    }

    #[test]
    fn test_grid_search_prefers_weak_regularization_on_clean_data() {
        let (x, y) = linear_data(30);
        let grid = ParamGrid::from([(
            "alpha".to_string(),
            float_values([1e-6, 1e3]),
        )]);
        let mut searcher = ridge_searcher(grid, SearchMethod::Grid);
        searcher.fit(&x, &y).unwrap();

        let best = searcher.best_params().unwrap();
        assert_eq!(best.get("alpha"), Some(&ParamValue::Float(1e-6)));
        assert!(searcher.best_score().unwrap() > 0.99);
    }

    #[test]
    fn test_refit_on_new_data_replaces_result() {
        let (x1, y1) = linear_data(24);
        let grid = ParamGrid::from([("alpha".to_string(), float_values([1e-6, 1.0]))]);
        let mut searcher = ridge_searcher(grid, SearchMethod::Grid);

        searcher.fit(&x1, &y1).unwrap();
        let first_pred = searcher.best_estimator().unwrap().predict(&x1).unwrap();

        // Different target relationship: the refit result must reflect the
        // new data only.
        let y2 = y1.mapv(|v| -2.0 * v + 7.0);
        searcher.fit(&x1, &y2).unwrap();
        let second_pred = searcher.best_estimator().unwrap().predict(&x1).unwrap();

        let moved = first_pred
            .iter()
            .zip(second_pred.iter())
            .any(|(a, b)| (a - b).abs() > 1.0);
        assert!(moved);
    }

    #[test]
    fn test_random_search_is_seeded() {
        let (x, y) = linear_data(24);
        let grid = ParamGrid::from([(
            "alpha".to_string(),
            float_values(crate::models::logspace(-6.0, 2.0, 50)),
        )]);

        let mut a = ridge_searcher(grid.clone(), SearchMethod::Random { n_iter: 5 });
        let mut b = ridge_searcher(grid, SearchMethod::Random { n_iter: 5 });
        a.fit(&x, &y).unwrap();
        b.fit(&x, &y).unwrap();

        assert_eq!(a.best_params().unwrap(), b.best_params().unwrap());
        assert_eq!(a.best_score().unwrap(), b.best_score().unwrap());
    }

    #[test]
    fn test_parallel_matches_serial() {
        let (x, y) = linear_data(24);
        let grid = ParamGrid::from([(
            "alpha".to_string(),
            float_values([1e-6, 1e-3, 1.0, 10.0]),
        )]);

        let mut serial = ridge_searcher(grid.clone(), SearchMethod::Grid);
        serial.fit(&x, &y).unwrap();

        let mut parallel = HyperparameterSearcher::new(
            Box::new(RidgeRegression::default()),
            SearchMethod::Grid,
            grid,
            SearcherConfig::default().with_inner_folds(3).with_n_jobs(4),
        );
        parallel.fit(&x, &y).unwrap();

        assert_eq!(
            serial.best_params().unwrap(),
            parallel.best_params().unwrap()
        );
        assert_eq!(serial.best_score().unwrap(), parallel.best_score().unwrap());
    }

    #[test]
    fn test_unknown_grid_name_propagates() {
        let (x, y) = linear_data(24);
        let grid = ParamGrid::from([("gamma".to_string(), float_values([0.1]))]);
        let mut searcher = ridge_searcher(grid, SearchMethod::Grid);

        assert!(matches!(
            searcher.fit(&x, &y),
            Err(TabfitError::InvalidConfiguration(_))
        ));
        // The failed search leaves no stale winner behind.
        assert!(matches!(
            searcher.best_estimator(),
            Err(TabfitError::NotFitted)
        ));
    }

    #[test]
    fn test_cartesian_product_order() {
        let grid = ParamGrid::from([
            ("a".to_string(), float_values([1.0, 2.0])),
            ("b".to_string(), float_values([10.0])),
        ]);
        let candidates = cartesian_product(&grid);
        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[0].get("a"), Some(&ParamValue::Float(1.0)));
        assert_eq!(candidates[1].get("a"), Some(&ParamValue::Float(2.0)));
        assert!(candidates.iter().all(|c| c.get("b").is_some()));

        let empty = cartesian_product(&ParamGrid::new());
        assert_eq!(empty.len(), 1);
        assert!(empty[0].is_empty());
    }
}
