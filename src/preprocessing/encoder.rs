//! One-hot encoding that ignores unseen categories

use super::matrix::SparseMatrix;
use crate::error::{Result, TabprepError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// One-hot encoder over already-imputed string columns.
///
/// Categories of each column are the sorted distinct training values. A value
/// not seen at fit time encodes to an all-zero block for that column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OneHotEncoder {
    categories: Vec<Vec<String>>,
}

impl OneHotEncoder {
    pub fn fit(columns: &[Vec<String>]) -> Result<Self> {
        let categories = columns
            .iter()
            .map(|col| {
                col.iter()
                    .cloned()
                    .collect::<BTreeSet<String>>()
                    .into_iter()
                    .collect()
            })
            .collect();
        Ok(Self { categories })
    }

    pub fn categories(&self) -> &[Vec<String>] {
        &self.categories
    }

    /// Total number of indicator columns produced
    pub fn n_features_out(&self) -> usize {
        self.categories.iter().map(Vec::len).sum()
    }

    /// `cat__<column>_<category>` for every indicator column
    pub fn feature_names(&self, prefix: &str, columns: &[String]) -> Vec<String> {
        columns
            .iter()
            .zip(&self.categories)
            .flat_map(|(col, cats)| {
                cats.iter()
                    .map(move |cat| format!("{prefix}__{col}_{cat}"))
            })
            .collect()
    }

    pub fn transform(&self, columns: &[Vec<String>]) -> Result<SparseMatrix> {
        if columns.len() != self.categories.len() {
            return Err(TabprepError::ShapeError {
                expected: format!("{} columns", self.categories.len()),
                actual: format!("{} columns", columns.len()),
            });
        }
        let n_rows = columns.first().map_or(0, Vec::len);
        if let Some(bad) = columns.iter().find(|c| c.len() != n_rows) {
            return Err(TabprepError::ShapeError {
                expected: format!("{n_rows} rows in every column"),
                actual: format!("{} rows", bad.len()),
            });
        }

        let mut indptr = Vec::with_capacity(n_rows + 1);
        let mut indices = Vec::new();
        indptr.push(0);
        for i in 0..n_rows {
            let mut offset = 0;
            for (col, cats) in columns.iter().zip(&self.categories) {
                // categories are sorted, so binary search finds the slot
                if let Ok(pos) = cats.binary_search(&col[i]) {
                    indices.push(offset + pos);
                }
                offset += cats.len();
            }
            indptr.push(indices.len());
        }
        let data = vec![1.0; indices.len()];
        SparseMatrix::from_csr(n_rows, self.n_features_out(), indptr, indices, data)
    }
}
