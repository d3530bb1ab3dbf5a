//! Target-variable scaling

use crate::error::{Result, TabfitError};
use ndarray::Array1;
use serde::{Deserialize, Serialize};

/// Type of target scaler
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScalerKind {
    /// Standard scaling (z-score normalization): (y - mean) / std
    Standard,
    /// Min-Max scaling: (y - min) / (max - min)
    MinMax,
}

/// A scaler fitted on training targets and replayed on any other targets.
///
/// The center/scale pair is fixed at fit time. Predictions made in scaled
/// units are mapped back to original units with [`inverse_transform`].
///
/// [`inverse_transform`]: TargetScaler::inverse_transform
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetScaler {
    kind: ScalerKind,
    center: f64,
    scale: f64,
}

impl TargetScaler {
    /// Fit a scaler to a target vector.
    pub fn fit(kind: ScalerKind, y: &Array1<f64>) -> Result<Self> {
        if y.is_empty() {
            return Err(TabfitError::Validation(
                "cannot fit a target scaler on an empty vector".to_string(),
            ));
        }

        let (center, scale) = match kind {
            ScalerKind::Standard => {
                let n = y.len() as f64;
                let mean = y.sum() / n;
                let var = if y.len() > 1 {
                    y.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0)
                } else {
                    0.0
                };
                (mean, var.sqrt())
            }
            ScalerKind::MinMax => {
                let min = y.iter().cloned().fold(f64::INFINITY, f64::min);
                let max = y.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
                (min, max - min)
            }
        };

        Ok(Self {
            kind,
            center,
            scale: if scale == 0.0 { 1.0 } else { scale },
        })
    }

    /// Map targets into scaled units.
    pub fn transform(&self, y: &Array1<f64>) -> Array1<f64> {
        y.mapv(|v| (v - self.center) / self.scale)
    }

    /// Map scaled values back to original target units.
    pub fn inverse_transform(&self, y: &Array1<f64>) -> Array1<f64> {
        y.mapv(|v| v * self.scale + self.center)
    }

    /// The scaler kind.
    pub fn kind(&self) -> ScalerKind {
        self.kind
    }

    /// The fitted center parameter (mean or min).
    pub fn center(&self) -> f64 {
        self.center
    }

    /// The fitted scale parameter (std or range).
    pub fn scale(&self) -> f64 {
        self.scale
    }
}
