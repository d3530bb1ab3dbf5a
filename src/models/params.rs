//! Hyperparameter values, maps, and grids

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A single hyperparameter value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ParamValue {
    Float(f64),
    Int(i64),
    Bool(bool),
}

impl ParamValue {
    /// Numeric view; integers widen to floats.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ParamValue::Float(v) => Some(*v),
            ParamValue::Int(v) => Some(*v as f64),
            ParamValue::Bool(_) => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ParamValue::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_usize(&self) -> Option<usize> {
        match self {
            ParamValue::Int(v) if *v >= 0 => Some(*v as usize),
            _ => None,
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Float(v) => write!(f, "{v}"),
            ParamValue::Int(v) => write!(f, "{v}"),
            ParamValue::Bool(v) => write!(f, "{v}"),
        }
    }
}

/// One hyperparameter configuration: name → value.
///
/// BTreeMap-backed so iteration order is deterministic.
pub type ParamMap = BTreeMap<String, ParamValue>;

/// A parameter space: name → candidate values.
pub type ParamGrid = BTreeMap<String, Vec<ParamValue>>;

/// Wrap floats as grid values.
pub fn float_values(values: impl IntoIterator<Item = f64>) -> Vec<ParamValue> {
    values.into_iter().map(ParamValue::Float).collect()
}

/// `num` evenly spaced values from `start` to `end` inclusive.
pub fn linspace(start: f64, end: f64, num: usize) -> Vec<f64> {
    match num {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (end - start) / (num - 1) as f64;
            (0..num).map(|i| start + step * i as f64).collect()
        }
    }
}

/// `num` log-spaced values from `10^start_exp` to `10^end_exp` inclusive.
pub fn logspace(start_exp: f64, end_exp: f64, num: usize) -> Vec<f64> {
    linspace(start_exp, end_exp, num)
        .into_iter()
        .map(|e| 10f64.powf(e))
        .collect()
}
