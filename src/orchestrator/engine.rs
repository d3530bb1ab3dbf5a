//! Model orchestrator: the fit/evaluate state machine

use crate::data::DataView;
use crate::error::{Result, TabfitError};
use crate::metrics::{FoldTable, MetricSet, RegressionScorer};
use crate::models::{Estimator, ModelFamily, ParamGrid};
use crate::orchestrator::config::OrchestratorConfig;
use crate::search::{HyperparameterSearcher, SearchMethod};
use crate::selection::{FeatureSelector, VotingSelectionReport};
use ndarray::Array1;
use std::fmt;
use tracing::{debug, warn};

/// Drives the full fit/evaluate protocol for one model.
///
/// The orchestrator moves through three states: unconfigured, data
/// specified, fitted. [`specify_data`] supplies the train/test view (and
/// optionally per-fold views for cross-validated metrics); [`fit`] runs the
/// whole protocol and may be called again to re-run it from scratch.
///
/// Fitting never leaks test information into training: feature selection
/// and hyperparameter search see only train arrays, and in cross-validated
/// mode both are re-run from scratch inside every fold.
///
/// The orchestrator is synchronous and exclusively owned; concurrent `fit`
/// calls on one instance must be serialized by the caller. Parallelism, if
/// enabled, stays inside the hyperparameter search.
///
/// [`specify_data`]: ModelOrchestrator::specify_data
/// [`fit`]: ModelOrchestrator::fit
pub struct ModelOrchestrator {
    name: String,
    family: ModelFamily,
    searcher: HyperparameterSearcher,
    selectors: Vec<Box<dyn FeatureSelector>>,
    max_n_features: usize,
    view: Option<DataView>,
    fold_views: Option<Vec<DataView>>,
    estimator: Option<Box<dyn Estimator>>,
    predictors: Option<Vec<String>>,
    report: Option<VotingSelectionReport>,
    train_scorer: Option<RegressionScorer>,
    cv_scorer: Option<RegressionScorer>,
    test_scorer: Option<RegressionScorer>,
    fitted: bool,
}

impl ModelOrchestrator {
    /// Create an orchestrator for one model family with its default
    /// hyperparameter search space.
    pub fn new(family: ModelFamily) -> Self {
        let config = OrchestratorConfig::default();
        let (method, grid) = family.default_search();
        let searcher = HyperparameterSearcher::new(
            family.estimator(),
            method,
            grid,
            config.searcher_config(),
        );

        Self {
            name: family.tag().to_string(),
            family,
            searcher,
            selectors: Vec::new(),
            max_n_features: 0,
            view: None,
            fold_views: None,
            estimator: None,
            predictors: None,
            report: None,
            train_scorer: None,
            cv_scorer: None,
            test_scorer: None,
            fitted: false,
        }
    }

    /// Create an orchestrator from a family tag (`"ols"`, `"l1"`, ...).
    pub fn from_tag(tag: &str) -> Result<Self> {
        Ok(Self::new(ModelFamily::from_tag(tag)?))
    }

    /// Apply a configuration (label, inner CV, seed, parallelism).
    pub fn with_config(mut self, config: OrchestratorConfig) -> Self {
        if let Some(name) = &config.name {
            self.name = name.clone();
        }
        self.searcher.set_config(config.searcher_config());
        self
    }

    /// Replace the default search space. The method and grid are supplied
    /// together: an explicit pair fully replaces the family default, and
    /// there is no partial merge.
    pub fn with_search(mut self, method: SearchMethod, grid: ParamGrid) -> Self {
        self.searcher.set_search(method, grid);
        self
    }

    /// Configure ensemble feature selection. Each `fit` builds a fresh
    /// voting report (per fold, in cross-validated mode) targeting at most
    /// `max_n_features` columns.
    pub fn with_selectors(
        mut self,
        selectors: Vec<Box<dyn FeatureSelector>>,
        max_n_features: usize,
    ) -> Self {
        self.selectors = selectors;
        self.max_n_features = max_n_features;
        self
    }

    /// Specify the data to fit on. `fold_views`, when given, enables
    /// cross-validated metrics. Calling again replaces the stored views.
    pub fn specify_data(&mut self, view: DataView, fold_views: Option<Vec<DataView>>) {
        self.view = Some(view);
        self.fold_views = fold_views;
    }

    /// Run the full fit/evaluate protocol.
    ///
    /// Re-running overwrites all prior results. On any failure the
    /// orchestrator keeps no partial metrics and drops back to the
    /// data-specified state.
    pub fn fit(&mut self) -> Result<()> {
        let view = self.view.clone().ok_or_else(|| {
            TabfitError::Precondition("fit() called before specify_data()".to_string())
        })?;
        let fold_views = self.fold_views.clone();

        // A re-fit starts clean: stale results never survive into the new
        // protocol run, even if it fails partway.
        self.estimator = None;
        self.predictors = None;
        self.report = None;
        self.train_scorer = None;
        self.cv_scorer = None;
        self.test_scorer = None;
        self.fitted = false;

        let cv_scorer = match &fold_views {
            Some(folds) => Some(self.cross_validate(folds)?),
            None => None,
        };

        // Fit on the full training data. In cross-validated mode this is
        // the refit that produces the single final estimator.
        let fitted = self.fit_on_view(&view)?;

        // Held-out test evaluation with the final estimator.
        let (x_test, y_test) = match &fitted.report {
            Some(report) => {
                let (_, y) = view.emit_test_xy();
                (report.emit_test_x(), y)
            }
            None => view.emit_test_xy(),
        };
        let y_pred = fitted.estimator.predict(&x_test)?;
        let (y_pred, y_true) = unscale(view.y_scaler(), y_pred, y_test);
        let test_scorer =
            RegressionScorer::single(&y_pred, &y_true, Some(x_test.ncols()), self.name.clone())?;

        self.report = fitted.report;
        self.predictors = Some(fitted.predictors);
        self.estimator = Some(fitted.estimator);
        self.train_scorer = Some(fitted.train_scorer);
        self.cv_scorer = cv_scorer;
        self.test_scorer = Some(test_scorer);
        self.fitted = true;
        Ok(())
    }

    /// Per-fold loop: fresh feature selection and hyperparameter search on
    /// each fold's train split, scored on that fold's held-out split.
    fn cross_validate(&mut self, folds: &[DataView]) -> Result<RegressionScorer> {
        if folds.is_empty() {
            return Err(TabfitError::Validation(
                "cross-validation requires at least one fold view".to_string(),
            ));
        }

        let mut y_preds = Vec::with_capacity(folds.len());
        let mut y_trues = Vec::with_capacity(folds.len());
        let mut n_predictors_used = 0;

        for (fold_idx, fold) in folds.iter().enumerate() {
            let (x_train, y_train, x_test, y_test) = if self.selectors.is_empty() {
                fold.emit_train_test_xy()
            } else {
                let fold_report =
                    VotingSelectionReport::new(&self.selectors, fold, self.max_n_features)?;
                let (_, y_train) = fold.emit_train_xy();
                let (_, y_test) = fold.emit_test_xy();
                (
                    fold_report.emit_train_x(),
                    y_train,
                    fold_report.emit_test_x(),
                    y_test,
                )
            };
            n_predictors_used = x_train.ncols();

            self.searcher.fit(&x_train, &y_train)?;
            let fold_estimator = self.searcher.best_estimator()?;
            let y_pred = fold_estimator.predict(&x_test)?;

            let (y_pred, y_true) = unscale(fold.y_scaler(), y_pred, y_test);
            debug!(model = %self.name, fold = fold_idx, "fold evaluated");
            y_preds.push(y_pred);
            y_trues.push(y_true);
        }

        RegressionScorer::from_folds(
            &y_preds,
            &y_trues,
            Some(n_predictors_used),
            self.name.clone(),
        )
    }

    /// Shared fit path: feature selection, hyperparameter search, fit, and
    /// train scoring on one view. Runs both the plain (no-fold) mode and
    /// the refit after cross-validation.
    fn fit_on_view(&mut self, view: &DataView) -> Result<FittedOnView> {
        let (report, x_train, y_train, predictors) = if self.selectors.is_empty() {
            let (x, y) = view.emit_train_xy();
            (None, x, y, view.columns_owned())
        } else {
            let report = VotingSelectionReport::new(&self.selectors, view, self.max_n_features)?;
            let (_, y) = view.emit_train_xy();
            let x = report.emit_train_x();
            let predictors = report.top_features().to_vec();
            (Some(report), x, y, predictors)
        };

        self.searcher.fit(&x_train, &y_train)?;
        let estimator = self.searcher.best_estimator()?.clone_box();

        let y_pred = estimator.predict(&x_train)?;
        let (y_pred, y_true) = unscale(view.y_scaler(), y_pred, y_train);
        let train_scorer =
            RegressionScorer::single(&y_pred, &y_true, Some(x_train.ncols()), self.name.clone())?;

        Ok(FittedOnView {
            report,
            predictors,
            estimator,
            train_scorer,
        })
    }

    /// The model label.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The model family.
    pub fn family(&self) -> ModelFamily {
        self.family
    }

    /// True when fold views were supplied, i.e. cross-validated metrics
    /// will exist after fitting.
    pub fn is_cross_validated(&self) -> bool {
        self.fold_views.is_some()
    }

    /// The final estimator, refit on the full training data.
    pub fn estimator(&self) -> Result<&dyn Estimator> {
        self.require_fitted()?;
        self.estimator.as_deref().ok_or(TabfitError::NotFitted)
    }

    /// The hyperparameter searcher. Its own accessors fail with
    /// `NotFitted` until a search has run.
    pub fn searcher(&self) -> &HyperparameterSearcher {
        &self.searcher
    }

    /// Train-set metrics of the final estimator.
    pub fn train_metrics(&self) -> Result<&MetricSet> {
        self.require_fitted()?;
        self.train_scorer
            .as_ref()
            .map(RegressionScorer::stats)
            .ok_or(TabfitError::NotFitted)
    }

    /// Fold-aggregated cross-validation metrics; `None` when no fold views
    /// were supplied.
    pub fn cv_metrics(&self) -> Result<Option<&MetricSet>> {
        self.require_fitted()?;
        Ok(self.cv_scorer.as_ref().map(RegressionScorer::stats))
    }

    /// Per-fold cross-validation table; `None` when no fold views were
    /// supplied.
    pub fn cv_fold_table(&self) -> Result<Option<&FoldTable>> {
        self.require_fitted()?;
        Ok(self.cv_scorer.as_ref().and_then(RegressionScorer::fold_table))
    }

    /// Held-out test metrics of the final estimator.
    pub fn test_metrics(&self) -> Result<&MetricSet> {
        self.require_fitted()?;
        self.test_scorer
            .as_ref()
            .map(RegressionScorer::stats)
            .ok_or(TabfitError::NotFitted)
    }

    /// Predictor columns used by the final estimator. Advisory: before
    /// fitting this warns and returns `None` instead of failing.
    pub fn predictors(&self) -> Option<&[String]> {
        let predictors = self.predictors.as_deref();
        if predictors.is_none() {
            warn!(model = %self.name, "no predictors available; the model has not been fitted");
        }
        predictors
    }

    /// The feature-selection report of the final fit. Advisory: when no
    /// selectors were configured (or the model is unfitted) this warns and
    /// returns `None` instead of failing.
    pub fn selection_report(&self) -> Option<&VotingSelectionReport> {
        if self.report.is_none() {
            warn!(model = %self.name, "no feature selection report available");
        }
        self.report.as_ref()
    }

    fn require_fitted(&self) -> Result<()> {
        if self.fitted {
            Ok(())
        } else {
            Err(TabfitError::Precondition(
                "results requested before fit()".to_string(),
            ))
        }
    }
}

impl fmt::Display for ModelOrchestrator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Result bundle of one shared fit pass.
struct FittedOnView {
    report: Option<VotingSelectionReport>,
    predictors: Vec<String>,
    estimator: Box<dyn Estimator>,
    train_scorer: RegressionScorer,
}

/// Map predictions and truths back to original target units when the view
/// scales its target.
fn unscale(
    scaler: Option<&crate::data::TargetScaler>,
    y_pred: Array1<f64>,
    y_true: Array1<f64>,
) -> (Array1<f64>, Array1<f64>) {
    match scaler {
        Some(s) => (s.inverse_transform(&y_pred), s.inverse_transform(&y_true)),
        None => (y_pred, y_true),
    }
}
