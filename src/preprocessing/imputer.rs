//! Simple missing value imputation strategies

use super::is_missing;
use crate::error::{Result, TabprepError};
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Replaces missing numeric cells with the fitted column mean.
///
/// A column with no observed values at fit time is filled with 0.0 so the
/// number of output columns never depends on the data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeanImputer {
    means: Vec<f64>,
}

impl MeanImputer {
    pub fn fit(x: &Array2<f64>) -> Result<Self> {
        if x.nrows() == 0 {
            return Err(TabprepError::InvalidInput("cannot fit mean imputer on zero rows".into()));
        }
        let means = x
            .columns()
            .into_iter()
            .map(|col| {
                let (sum, count) = col
                    .iter()
                    .filter(|v| !is_missing(**v))
                    .fold((0.0, 0usize), |(s, c), &v| (s + v, c + 1));
                if count == 0 { 0.0 } else { sum / count as f64 }
            })
            .collect();
        Ok(Self { means })
    }

    pub fn transform(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        if x.ncols() != self.means.len() {
            return Err(TabprepError::ShapeError {
                expected: format!("{} columns", self.means.len()),
                actual: format!("{} columns", x.ncols()),
            });
        }
        let mut out = x.clone();
        for (mut col, &mean) in out.columns_mut().into_iter().zip(&self.means) {
            col.mapv_inplace(|v| if is_missing(v) { mean } else { v });
        }
        Ok(out)
    }

    pub fn means(&self) -> &[f64] {
        &self.means
    }
}

/// Replaces missing categorical cells with the fitted column mode.
///
/// Ties resolve to the lexicographically smallest value. A column with no
/// observed values is filled with the empty string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MostFrequentImputer {
    fill_values: Vec<String>,
}

impl MostFrequentImputer {
    pub fn fit(columns: &[Vec<Option<String>>]) -> Result<Self> {
        let fill_values = columns.iter().map(|col| Self::mode(col)).collect();
        Ok(Self { fill_values })
    }

    fn mode(values: &[Option<String>]) -> String {
        let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
        for v in values.iter().flatten() {
            *counts.entry(v.as_str()).or_insert(0) += 1;
        }
        // BTreeMap iterates in key order, so the first maximum is the smallest key
        let mut best: Option<(&str, usize)> = None;
        for (value, count) in counts {
            if best.map_or(true, |(_, c)| count > c) {
                best = Some((value, count));
            }
        }
        best.map(|(v, _)| v.to_string()).unwrap_or_default()
    }

    pub fn transform(&self, columns: &[Vec<Option<String>>]) -> Result<Vec<Vec<String>>> {
        if columns.len() != self.fill_values.len() {
            return Err(TabprepError::ShapeError {
                expected: format!("{} columns", self.fill_values.len()),
                actual: format!("{} columns", columns.len()),
            });
        }
        Ok(columns
            .iter()
            .zip(&self.fill_values)
            .map(|(col, fill)| {
                col.iter()
                    .map(|v| v.clone().unwrap_or_else(|| fill.clone()))
                    .collect()
            })
            .collect())
    }

    pub fn fill_values(&self) -> &[String] {
        &self.fill_values
    }
}
