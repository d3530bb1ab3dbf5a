//! Data access for the fit/evaluate protocol
//!
//! A [`DataView`] is an immutable handle to one preprocessed train/test
//! split. Views can be restricted to a column subset without copying the
//! underlying arrays, and split into per-fold views for cross-validation.

mod folds;
mod scaler;
mod view;

pub use folds::k_fold_views;
pub use scaler::{ScalerKind, TargetScaler};
pub use view::DataView;

pub(crate) use folds::k_fold_indices;
