//! Column profiling: decides which treatment each feature column receives

use super::{column_to_f64, is_missing, is_numeric_dtype, ColumnRole};
use crate::constants::SKEW_THRESHOLD;
use crate::error::{Result, TabprepError};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Profiling outcome for a single column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnSummary {
    pub name: String,
    pub role: ColumnRole,
    /// Sample skewness, `None` for categorical columns or too few values
    pub skewness: Option<f64>,
    pub null_count: usize,
}

/// Partition of the feature columns into the three treatment groups.
///
/// Every input column appears exactly once, in frame order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnProfile {
    columns: Vec<ColumnSummary>,
}

impl ColumnProfile {
    pub fn columns(&self) -> &[ColumnSummary] {
        &self.columns
    }

    fn names_with(&self, role: ColumnRole) -> Vec<String> {
        self.columns
            .iter()
            .filter(|c| c.role == role)
            .map(|c| c.name.clone())
            .collect()
    }

    pub fn skewed(&self) -> Vec<String> {
        self.names_with(ColumnRole::NumericSkewed)
    }

    pub fn regular(&self) -> Vec<String> {
        self.names_with(ColumnRole::NumericRegular)
    }

    pub fn categorical(&self) -> Vec<String> {
        self.names_with(ColumnRole::Categorical)
    }

    pub fn role_of(&self, name: &str) -> Option<ColumnRole> {
        self.columns.iter().find(|c| c.name == name).map(|c| c.role)
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

/// Classifies feature columns as categorical, regular numeric or skewed numeric
#[derive(Debug, Clone)]
pub struct ColumnProfiler {
    skew_threshold: f64,
}

impl Default for ColumnProfiler {
    fn default() -> Self {
        Self::new(SKEW_THRESHOLD)
    }
}

impl ColumnProfiler {
    pub fn new(skew_threshold: f64) -> Self {
        Self { skew_threshold }
    }

    /// Profile every column of a feature frame (label already removed).
    ///
    /// Only ever call this with training data.
    pub fn profile(&self, features: &DataFrame) -> Result<ColumnProfile> {
        if features.width() == 0 {
            return Err(TabprepError::NoFeatureColumns);
        }

        let mut columns = Vec::with_capacity(features.width());
        for column in features.get_columns() {
            let name = column.name().to_string();
            let null_count = column.null_count();

            let summary = if is_numeric_dtype(column.dtype()) {
                let values = column_to_f64(features, &name)?;
                let skewness = sample_skewness(&values);
                let role = match skewness {
                    Some(s) if s.abs() > self.skew_threshold => ColumnRole::NumericSkewed,
                    _ => ColumnRole::NumericRegular,
                };
                ColumnSummary { name, role, skewness, null_count }
            } else {
                ColumnSummary {
                    name,
                    role: ColumnRole::Categorical,
                    skewness: None,
                    null_count,
                }
            };
            debug!(column = %summary.name, role = %summary.role, skewness = ?summary.skewness, "Profiled column");
            columns.push(summary);
        }

        Ok(ColumnProfile { columns })
    }
}

/// Bias-adjusted Fisher-Pearson skewness (G1) over non-missing values.
///
/// `None` with fewer than three values; zero for a constant column.
pub(crate) fn sample_skewness(values: &[f64]) -> Option<f64> {
    let observed: Vec<f64> = values.iter().copied().filter(|v| !is_missing(*v)).collect();
    let n = observed.len();
    if n < 3 {
        return None;
    }
    let nf = n as f64;
    let mean = observed.iter().sum::<f64>() / nf;
    let m2 = observed.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / nf;
    let m3 = observed.iter().map(|v| (v - mean).powi(3)).sum::<f64>() / nf;
    // floating residue of a constant column
    if m2 < 1e-14 {
        return Some(0.0);
    }
    let g1 = m3 / m2.powf(1.5);
    let adjusted = (nf * (nf - 1.0)).sqrt() / (nf - 2.0) * g1;
    adjusted.is_finite().then_some(adjusted)
}
