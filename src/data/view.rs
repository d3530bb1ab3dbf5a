//! Immutable train/test data views

use crate::data::scaler::{ScalerKind, TargetScaler};
use crate::error::{Result, TabfitError};
use ndarray::{Array1, Array2, Axis};
use std::sync::Arc;

/// Underlying arrays of one train/test split, shared between all views
/// derived from the same source.
#[derive(Debug)]
struct ViewData {
    train_x: Array2<f64>,
    /// Train targets in original units; scaling is applied at emit time.
    train_y: Array1<f64>,
    test_x: Array2<f64>,
    test_y: Array1<f64>,
    columns: Vec<String>,
    y_scaler: Option<TargetScaler>,
}

/// Immutable handle to one preprocessed train/test split (or one CV fold).
///
/// A view hands out numeric arrays for fitting and evaluation. Restricting
/// a view to a column subset produces a new view over the *same* underlying
/// arrays; nothing is re-fitted or copied until an emit call materializes
/// the restricted matrices.
///
/// The optional target scaler is fitted on the train targets at
/// construction and replayed, never refit, on the test targets.
#[derive(Debug, Clone)]
pub struct DataView {
    data: Arc<ViewData>,
    /// Indices into `data.columns` that are active in this view.
    active: Vec<usize>,
}

impl DataView {
    /// Create a view over a train/test split with no target scaling.
    pub fn new(
        train_x: Array2<f64>,
        train_y: Array1<f64>,
        test_x: Array2<f64>,
        test_y: Array1<f64>,
        columns: Vec<String>,
    ) -> Result<Self> {
        Self::build(train_x, train_y, test_x, test_y, columns, None)
    }

    /// Create a view whose target is scaled.
    ///
    /// The scaler is fitted on `train_y` only; `test_y` is transformed with
    /// the train-fitted parameters when emitted.
    pub fn with_scaled_target(
        train_x: Array2<f64>,
        train_y: Array1<f64>,
        test_x: Array2<f64>,
        test_y: Array1<f64>,
        columns: Vec<String>,
        kind: ScalerKind,
    ) -> Result<Self> {
        let scaler = TargetScaler::fit(kind, &train_y)?;
        Self::build(train_x, train_y, test_x, test_y, columns, Some(scaler))
    }

    fn build(
        train_x: Array2<f64>,
        train_y: Array1<f64>,
        test_x: Array2<f64>,
        test_y: Array1<f64>,
        columns: Vec<String>,
        y_scaler: Option<TargetScaler>,
    ) -> Result<Self> {
        if train_x.nrows() == 0 {
            return Err(TabfitError::Validation(
                "train matrix must have at least one row".to_string(),
            ));
        }
        if train_x.nrows() != train_y.len() {
            return Err(TabfitError::ShapeMismatch {
                expected: format!("{} train targets", train_x.nrows()),
                actual: format!("{} train targets", train_y.len()),
            });
        }
        if test_x.nrows() != test_y.len() {
            return Err(TabfitError::ShapeMismatch {
                expected: format!("{} test targets", test_x.nrows()),
                actual: format!("{} test targets", test_y.len()),
            });
        }
        if train_x.ncols() != columns.len() || test_x.ncols() != columns.len() {
            return Err(TabfitError::ShapeMismatch {
                expected: format!("{} columns", columns.len()),
                actual: format!(
                    "{} train / {} test columns",
                    train_x.ncols(),
                    test_x.ncols()
                ),
            });
        }

        let active = (0..columns.len()).collect();
        Ok(Self {
            data: Arc::new(ViewData {
                train_x,
                train_y,
                test_x,
                test_y,
                columns,
                y_scaler,
            }),
            active,
        })
    }

    /// Names of the active predictor columns, in view order.
    pub fn columns(&self) -> Vec<&str> {
        self.active
            .iter()
            .map(|&i| self.data.columns[i].as_str())
            .collect()
    }

    /// Owned copies of the active predictor column names.
    pub fn columns_owned(&self) -> Vec<String> {
        self.active
            .iter()
            .map(|&i| self.data.columns[i].clone())
            .collect()
    }

    /// Number of active predictor columns.
    pub fn n_predictors(&self) -> usize {
        self.active.len()
    }

    /// Number of training rows.
    pub fn n_train(&self) -> usize {
        self.data.train_x.nrows()
    }

    /// Number of test rows.
    pub fn n_test(&self) -> usize {
        self.data.test_x.nrows()
    }

    /// The target scaler fitted on this view's train targets, if any.
    pub fn y_scaler(&self) -> Option<&TargetScaler> {
        self.data.y_scaler.as_ref()
    }

    /// True when `other` is backed by the same underlying arrays.
    pub fn shares_data(&self, other: &DataView) -> bool {
        Arc::ptr_eq(&self.data, &other.data)
    }

    /// Train predictors, restricted to the active columns.
    pub fn emit_train_x(&self) -> Array2<f64> {
        self.restrict_columns(&self.data.train_x)
    }

    /// Test predictors, restricted to the active columns.
    pub fn emit_test_x(&self) -> Array2<f64> {
        self.restrict_columns(&self.data.test_x)
    }

    /// Train predictors and (scaled, if configured) train targets.
    pub fn emit_train_xy(&self) -> (Array2<f64>, Array1<f64>) {
        (self.emit_train_x(), self.scaled(&self.data.train_y))
    }

    /// Test predictors and (scaled, if configured) test targets.
    pub fn emit_test_xy(&self) -> (Array2<f64>, Array1<f64>) {
        (self.emit_test_x(), self.scaled(&self.data.test_y))
    }

    /// Both splits at once: `(train_x, train_y, test_x, test_y)`.
    pub fn emit_train_test_xy(&self) -> (Array2<f64>, Array1<f64>, Array2<f64>, Array1<f64>) {
        let (train_x, train_y) = self.emit_train_xy();
        let (test_x, test_y) = self.emit_test_xy();
        (train_x, train_y, test_x, test_y)
    }

    /// Restrict this view to a subset of its active columns.
    ///
    /// The returned view shares the underlying arrays; column order follows
    /// `names`. Unknown or inactive names fail with a validation error.
    pub fn restrict(&self, names: &[String]) -> Result<DataView> {
        let mut indices = Vec::with_capacity(names.len());
        for name in names {
            let idx = self
                .data
                .columns
                .iter()
                .position(|c| c == name)
                .filter(|idx| self.active.contains(idx))
                .ok_or_else(|| {
                    TabfitError::Validation(format!("unknown or inactive column: {name}"))
                })?;
            indices.push(idx);
        }

        Ok(DataView {
            data: Arc::clone(&self.data),
            active: indices,
        })
    }

    /// Rows of the train split by index: active-column predictors plus raw
    /// (unscaled) targets. Used by fold generation, which refits any target
    /// scaler on the fold's own train rows.
    pub(crate) fn train_rows_raw(&self, rows: &[usize]) -> (Array2<f64>, Array1<f64>) {
        let x = self
            .data
            .train_x
            .select(Axis(0), rows)
            .select(Axis(1), &self.active);
        let y = self.data.train_y.select(Axis(0), rows);
        (x, y)
    }

    /// Kind of the target scaler, if one was configured.
    pub(crate) fn scaler_kind(&self) -> Option<ScalerKind> {
        self.data.y_scaler.as_ref().map(|s| s.kind())
    }

    fn restrict_columns(&self, x: &Array2<f64>) -> Array2<f64> {
        if self.active.len() == x.ncols() && self.active.iter().enumerate().all(|(i, &c)| i == c) {
            x.clone()
        } else {
            x.select(Axis(1), &self.active)
        }
    }

    fn scaled(&self, y: &Array1<f64>) -> Array1<f64> {
        match &self.data.y_scaler {
            Some(scaler) => scaler.transform(y),
            None => y.clone(),
        }
    }
}
