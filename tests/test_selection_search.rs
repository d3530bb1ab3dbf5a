//! Integration test: feature selection ensembles and hyperparameter search

use ndarray::{Array1, Array2};
use tabfit::data::DataView;
use tabfit::models::{float_values, logspace, Estimator, ModelFamily, ParamGrid, ParamValue};
use tabfit::orchestrator::{ModelOrchestrator, OrchestratorConfig};
use tabfit::search::{HyperparameterSearcher, SearchMethod, SearcherConfig};
use tabfit::selection::{FeatureSelector, KBestSelector, LassoSelector, VotingSelectionReport};
use tabfit::{RidgeRegression, TabfitError};

fn wide_view() -> DataView {
    let n = 30;
    let n_cols = 6;
    let feature = |i: usize, j: usize| match j {
        0 => i as f64,
        1 => ((i * i) % 19) as f64,
        2 => ((i * 13) % 7) as f64 * 0.01,
        3 => ((i * 5) % 11) as f64 * 0.01,
        4 => ((i * 3) % 13) as f64 * 0.01,
        _ => ((i * 11) % 17) as f64 * 0.01,
    };
    let target = |i: usize| 4.0 * feature(i, 0) + 3.0 * feature(i, 1) - 5.0;

    let train_x = Array2::from_shape_fn((n, n_cols), |(i, j)| feature(i, j));
    let train_y = Array1::from_shape_fn(n, target);
    let test_x = Array2::from_shape_fn((6, n_cols), |(i, j)| feature(n + i, j));
    let test_y = Array1::from_shape_fn(6, |i| target(n + i));

    DataView::new(
        train_x,
        train_y,
        test_x,
        test_y,
        (0..n_cols).map(|j| format!("f{j}")).collect(),
    )
    .unwrap()
}

#[test]
fn test_voting_report_over_real_selectors() {
    let view = wide_view();
    let selectors: Vec<Box<dyn FeatureSelector>> = vec![
        Box::new(KBestSelector::abs_correlation()),
        Box::new(KBestSelector::mutual_info()),
        Box::new(LassoSelector::new(0.1)),
    ];

    let report = VotingSelectionReport::new(&selectors, &view, 2).unwrap();
    let top = report.top_features().to_vec();
    assert_eq!(top.len(), 2);
    assert!(top.contains(&"f0".to_string()));

    // The informative columns out-vote the noise columns.
    let votes: std::collections::BTreeMap<&str, u32> = report.votes().collect();
    assert!(votes["f0"] > votes["f2"]);
}

#[test]
fn test_empty_vote_propagates_through_fit() {
    // A lasso penalty harsh enough to zero every coefficient: the selector
    // supports nothing, so the ensemble tally is empty.
    let selectors: Vec<Box<dyn FeatureSelector>> = vec![Box::new(LassoSelector::new(1e9))];
    let mut model = ModelOrchestrator::new(ModelFamily::Ridge)
        .with_search(
            SearchMethod::Grid,
            ParamGrid::from([("alpha".to_string(), float_values([1.0]))]),
        )
        .with_config(OrchestratorConfig::new().with_inner_folds(3))
        .with_selectors(selectors, 2);

    model.specify_data(wide_view(), None);
    assert!(matches!(model.fit(), Err(TabfitError::EmptyVote)));
}

#[test]
fn test_default_search_spaces_by_tag() {
    let lasso = ModelOrchestrator::from_tag("l1").unwrap();
    assert_eq!(lasso.family(), ModelFamily::Lasso);
    assert_eq!(lasso.searcher().method(), SearchMethod::Grid);
    assert_eq!(
        lasso.searcher().grid().get("alpha").map(|v| v.len()),
        Some(100)
    );

    let huber = ModelOrchestrator::from_tag("huber").unwrap();
    assert_eq!(
        huber.searcher().grid().get("epsilon").map(|v| v.len()),
        Some(5)
    );

    assert!(matches!(
        ModelOrchestrator::from_tag("xgboost"),
        Err(TabfitError::InvalidConfiguration(_))
    ));
}

#[test]
fn test_explicit_search_replaces_default_entirely() {
    let model = ModelOrchestrator::new(ModelFamily::Lasso).with_search(
        SearchMethod::Random { n_iter: 4 },
        ParamGrid::from([("alpha".to_string(), float_values([0.1, 0.5]))]),
    );

    assert_eq!(model.searcher().method(), SearchMethod::Random { n_iter: 4 });
    let grid = model.searcher().grid();
    assert_eq!(grid.len(), 1);
    assert_eq!(grid.get("alpha").map(|v| v.len()), Some(2));
}

#[test]
fn test_searcher_full_cycle_on_lasso_family() {
    let view = wide_view();
    let (x, y) = view.emit_train_xy();

    let mut searcher = HyperparameterSearcher::new(
        ModelFamily::Lasso.estimator(),
        SearchMethod::Grid,
        ParamGrid::from([("alpha".to_string(), float_values(logspace(-4.0, 1.0, 6)))]),
        SearcherConfig::new().with_inner_folds(3),
    );
    searcher.fit(&x, &y).unwrap();

    let best = searcher.best_estimator().unwrap();
    let pred = best.predict(&x).unwrap();
    let residual: f64 = pred
        .iter()
        .zip(y.iter())
        .map(|(p, t)| (p - t).powi(2))
        .sum::<f64>()
        / y.len() as f64;
    assert!(residual.sqrt() < 1.0);

    // The winning alpha is one of the supplied candidates.
    let alpha = searcher.best_params().unwrap()["alpha"].as_f64().unwrap();
    assert!(logspace(-4.0, 1.0, 6).iter().any(|a| (a - alpha).abs() < 1e-15));
}

#[test]
fn test_search_isolated_between_estimator_instances() {
    // Two orchestrators sharing nothing: fitting one never affects the
    // other's searcher state.
    let grid = ParamGrid::from([("alpha".to_string(), float_values([1e-6, 1.0]))]);
    let mut fitted = ModelOrchestrator::new(ModelFamily::Ridge)
        .with_search(SearchMethod::Grid, grid.clone())
        .with_config(OrchestratorConfig::new().with_inner_folds(3));
    let untouched = ModelOrchestrator::new(ModelFamily::Ridge)
        .with_search(SearchMethod::Grid, grid)
        .with_config(OrchestratorConfig::new().with_inner_folds(3));

    fitted.specify_data(wide_view(), None);
    fitted.fit().unwrap();

    assert!(fitted.searcher().best_params().is_ok());
    assert!(matches!(
        untouched.searcher().best_params(),
        Err(TabfitError::NotFitted)
    ));
}

#[test]
fn test_custom_estimator_search_with_parallel_evaluation() {
    let view = wide_view();
    let (x, y) = view.emit_train_xy();

    let mut searcher = HyperparameterSearcher::new(
        Box::new(RidgeRegression::default()),
        SearchMethod::Grid,
        ParamGrid::from([(
            "alpha".to_string(),
            float_values(logspace(-6.0, 2.0, 16)),
        )]),
        SearcherConfig::new().with_inner_folds(3).with_n_jobs(4),
    );
    searcher.fit(&x, &y).unwrap();

    let best_alpha = searcher.best_params().unwrap()["alpha"].clone();
    assert!(matches!(best_alpha, ParamValue::Float(_)));
    assert!(searcher.best_score().unwrap() > 0.99);
}
