//! Yeo-Johnson power transform
//!
//! Works on positive, zero and negative values alike. One λ is estimated per
//! column by maximising the Yeo-Johnson log-likelihood; the transformed
//! column is then standardised.

use super::is_missing;
use crate::error::{Result, TabprepError};
use ndarray::Array2;
use serde::{Deserialize, Serialize};

const LAMBDA_MIN: f64 = -2.0;
const LAMBDA_MAX: f64 = 2.0;
const GRID_STEP: f64 = 0.1;
const GOLDEN_ITERATIONS: usize = 60;

/// Per-column fitted parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct ColumnParams {
    lambda: f64,
    mean: f64,
    std: f64,
}

/// Fitted Yeo-Johnson transformer with output standardisation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PowerTransformer {
    params: Vec<ColumnParams>,
}

impl PowerTransformer {
    pub fn fit(x: &Array2<f64>) -> Result<Self> {
        if x.nrows() == 0 {
            return Err(TabprepError::InvalidInput("cannot fit power transform on zero rows".into()));
        }
        let params = x
            .columns()
            .into_iter()
            .map(|col| {
                let values: Vec<f64> = col.iter().copied().filter(|v| !is_missing(*v)).collect();
                let lambda = estimate_lambda(&values);
                let transformed: Vec<f64> = values.iter().map(|&v| yeo_johnson(v, lambda)).collect();
                let (mean, std) = mean_std(&transformed);
                ColumnParams {
                    lambda,
                    mean,
                    std: if std == 0.0 { 1.0 } else { std },
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
            col.mapv_inplace(|v| (yeo_johnson(v, p.lambda) - p.mean) / p.std);
        }
        Ok(out)
    }

    /// Estimated λ per column
    pub fn lambdas(&self) -> Vec<f64> {
        self.params.iter().map(|p| p.lambda).collect()
    }
}

/// Yeo-Johnson transform for a single value
pub(crate) fn yeo_johnson(x: f64, lambda: f64) -> f64 {
    if x >= 0.0 {
        if lambda.abs() < 1e-10 {
            x.ln_1p()
        } else {
            ((x + 1.0).powf(lambda) - 1.0) / lambda
        }
    } else if (lambda - 2.0).abs() < 1e-10 {
        -(-x).ln_1p()
    } else {
        -((1.0 - x).powf(2.0 - lambda) - 1.0) / (2.0 - lambda)
    }
}

fn mean_std(values: &[f64]) -> (f64, f64) {
    if values.is_empty() {
        return (0.0, 1.0);
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    (mean, var.sqrt())
}

fn log_likelihood(values: &[f64], lambda: f64) -> f64 {
    let n = values.len() as f64;
    let transformed: Vec<f64> = values.iter().map(|&x| yeo_johnson(x, lambda)).collect();
    let (_, std) = mean_std(&transformed);
    let variance = std * std;
    if !(variance > 0.0) || !variance.is_finite() {
        return f64::NEG_INFINITY;
    }
    let log_jacobian: f64 = values.iter().map(|&x| x.abs().ln_1p().copysign(x)).sum();
    -n / 2.0 * variance.ln() + (lambda - 1.0) * log_jacobian
}

/// Coarse grid over [-2, 2], then golden-section search around the best point
fn estimate_lambda(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 1.0;
    }

    let mut best_lambda = 1.0;
    let mut best_ll = f64::NEG_INFINITY;
    let steps = ((LAMBDA_MAX - LAMBDA_MIN) / GRID_STEP).round() as i32;
    for i in 0..=steps {
        let lambda = LAMBDA_MIN + i as f64 * GRID_STEP;
        let ll = log_likelihood(values, lambda);
        if ll > best_ll {
            best_ll = ll;
            best_lambda = lambda;
        }
    }
    if !best_ll.is_finite() {
        return 1.0;
    }

    let phi = (5f64.sqrt() - 1.0) / 2.0;
    let mut lo = (best_lambda - GRID_STEP).max(LAMBDA_MIN);
    let mut hi = (best_lambda + GRID_STEP).min(LAMBDA_MAX);
    let mut c = hi - phi * (hi - lo);
    let mut d = lo + phi * (hi - lo);
    let mut fc = log_likelihood(values, c);
    let mut fd = log_likelihood(values, d);
    for _ in 0..GOLDEN_ITERATIONS {
        if fc > fd {
            hi = d;
            d = c;
            fd = fc;
            c = hi - phi * (hi - lo);
            fc = log_likelihood(values, c);
        } else {
            lo = c;
            c = d;
            fc = fd;
            d = lo + phi * (hi - lo);
            fd = log_likelihood(values, d);
        }
    }
    let refined = (lo + hi) / 2.0;
    if log_likelihood(values, refined) >= best_ll {
        refined
    } else {
        best_lambda
    }
}
