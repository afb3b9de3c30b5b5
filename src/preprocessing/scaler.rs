//! Standard scaling: (x - mean) / std

use super::is_missing;
use crate::error::{Result, TabprepError};
use ndarray::Array2;
use serde::{Deserialize, Serialize};

/// Parameters for a fitted column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct ScalerParams {
    center: f64,
    scale: f64,
}

/// Zero mean / unit variance scaler.
///
/// Uses the population standard deviation; a constant column gets scale 1.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    params: Vec<ScalerParams>,
}

impl StandardScaler {
    pub fn fit(x: &Array2<f64>) -> Result<Self> {
        if x.nrows() == 0 {
            return Err(TabprepError::InvalidInput("cannot fit scaler on zero rows".into()));
        }
        let params = x
            .columns()
            .into_iter()
            .map(|col| {
                let values: Vec<f64> = col.iter().copied().filter(|v| !is_missing(*v)).collect();
                if values.is_empty() {
                    return ScalerParams { center: 0.0, scale: 1.0 };
                }
                let n = values.len() as f64;
                let mean = values.iter().sum::<f64>() / n;
                let std = (values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n).sqrt();
                ScalerParams {
                    center: mean,
                    scale: if std == 0.0 { 1.0 } else { std },
                }
            })
            .collect();
        Ok(Self { params })
    }

    pub fn transform(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        if x.ncols() != self.params.len() {
            return Err(TabprepError::ShapeError {
                expected: format!("{} columns", self.params.len()),
                actual: format!("{} columns", x.ncols()),
            });
        }
        let mut out = x.clone();
        for (mut col, p) in out.columns_mut().into_iter().zip(&self.params) {
            col.mapv_inplace(|v| (v - p.center) / p.scale);
        }
        Ok(out)
    }

    /// Undo the scaling
    pub fn inverse_transform(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        if x.ncols() != self.params.len() {
            return Err(TabprepError::ShapeError {
                expected: format!("{} columns", self.params.len()),
                actual: format!("{} columns", x.ncols()),
            });
        }
        let mut out = x.clone();
        for (mut col, p) in out.columns_mut().into_iter().zip(&self.params) {
            col.mapv_inplace(|v| v * p.scale + p.center);
        }
        Ok(out)
    }

    pub fn means(&self) -> Vec<f64> {
        self.params.iter().map(|p| p.center).collect()
    }
}
