//! Data preprocessing module
//!
//! Provides the pieces of the composite feature transformation:
//! - Column profiling (categorical / regular numeric / skewed numeric)
//! - Missing value imputation (mean, most frequent, KNN)
//! - Yeo-Johnson power transform and standard scaling
//! - One-hot encoding that ignores unseen categories
//! - Pipeline planning and the column-wise composite transformer
//! - Target (label) normalisation

mod builder;
mod column_transformer;
mod encoder;
mod imputer;
mod knn;
mod matrix;
mod power;
mod profiler;
mod scaler;
mod target;

pub use builder::{GroupPlan, PipelineBuilder, StepSpec};
pub use column_transformer::{ColumnTransformer, FittedColumnTransformer, FittedGroup, FittedStep};
pub use encoder::OneHotEncoder;
pub use imputer::{MeanImputer, MostFrequentImputer};
pub use knn::{KNNImputer, KnnImputerParams, KnnWeights};
pub use matrix::{SparseMatrix, TransformOutput};
pub use power::PowerTransformer;
pub use profiler::{ColumnProfile, ColumnProfiler, ColumnSummary};
pub use scaler::StandardScaler;
pub use target::{LabelEncoder, NormalizedTarget, TargetKind, TargetNormalizer};

use crate::error::{Result, TabprepError};
use ndarray::Array2;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Treatment assigned to a feature column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ColumnRole {
    /// Non-numeric domain: most-frequent imputation then one-hot encoding
    Categorical,
    /// Numeric with |skewness| within the threshold: KNN imputation then scaling
    NumericRegular,
    /// Numeric with |skewness| above the threshold: mean imputation, power transform, scaling
    NumericSkewed,
}

impl ColumnRole {
    /// Group name used in plans, logs and output feature names
    pub fn group_name(&self) -> &'static str {
        match self {
            ColumnRole::NumericSkewed => "num_skewed",
            ColumnRole::NumericRegular => "num_regular",
            ColumnRole::Categorical => "cat",
        }
    }

    pub fn is_numeric(&self) -> bool {
        !matches!(self, ColumnRole::Categorical)
    }
}

impl fmt::Display for ColumnRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.group_name())
    }
}

/// Whether a polars dtype holds numbers (booleans count as 0/1)
pub fn is_numeric_dtype(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
            | DataType::Float32
            | DataType::Float64
            | DataType::Boolean
    )
}

/// Check if value is missing (NaN)
#[inline]
pub fn is_missing(v: f64) -> bool {
    v.is_nan()
}

/// Values of a numeric column as `f64`, nulls mapped to NaN
pub(crate) fn column_to_f64(df: &DataFrame, name: &str) -> Result<Vec<f64>> {
    let column = df
        .column(name)
        .map_err(|_| TabprepError::DataError(format!("column '{name}' not found")))?;
    let series = column.as_materialized_series().cast(&DataType::Float64)?;
    let ca = series.f64()?;
    Ok(ca.into_iter().map(|v| v.unwrap_or(f64::NAN)).collect())
}

/// Values of any column rendered as strings, nulls kept as `None`
pub(crate) fn column_to_strings(df: &DataFrame, name: &str) -> Result<Vec<Option<String>>> {
    let column = df
        .column(name)
        .map_err(|_| TabprepError::DataError(format!("column '{name}' not found")))?;
    let series = column.as_materialized_series().cast(&DataType::String)?;
    let ca = series.str()?;
    Ok(ca.into_iter().map(|v| v.map(str::to_string)).collect())
}

/// Gather numeric columns into a row-major matrix with NaN for missing cells
pub(crate) fn numeric_matrix(df: &DataFrame, columns: &[String]) -> Result<Array2<f64>> {
    let mut matrix = Array2::from_elem((df.height(), columns.len()), f64::NAN);
    for (j, name) in columns.iter().enumerate() {
        for (i, v) in column_to_f64(df, name)?.into_iter().enumerate() {
            matrix[[i, j]] = v;
        }
    }
    Ok(matrix)
}

/// Gather categorical columns, one vector per column
pub(crate) fn categorical_columns(
    df: &DataFrame,
    columns: &[String],
) -> Result<Vec<Vec<Option<String>>>> {
    columns.iter().map(|name| column_to_strings(df, name)).collect()
}
