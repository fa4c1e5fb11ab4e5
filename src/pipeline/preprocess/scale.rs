//! Numeric transforms and standard scaling

use serde::{Deserialize, Serialize};

/// Clip at zero then take ln(1 + x).
#[inline]
pub fn log1p_clipped(x: f64) -> f64 {
    x.max(0.0).ln_1p()
}

/// Z-score scaler with population standard deviation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    pub mean: f64,
    pub scale: f64,
}

impl StandardScaler {
    /// Scaler that leaves values unchanged
    pub fn identity() -> Self {
        Self {
            mean: 0.0,
            scale: 1.0,
        }
    }

    /// Fit on complete (already imputed) values.
    ///
    /// A zero-variance or empty input scales by 1 so that transforming never
    /// divides by zero.
    pub fn fit(values: &[f64]) -> Self {
        if values.is_empty() {
            return Self::identity();
        }
        let n = values.len() as f64;
        let mean = values.iter().sum::<f64>() / n;
        let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
        let std = variance.sqrt();
        Self {
            mean,
            scale: if std > 0.0 { std } else { 1.0 },
        }
    }

    #[inline]
    pub fn transform(&self, value: f64) -> f64 {
        (value - self.mean) / self.scale
    }
}
