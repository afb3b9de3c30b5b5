//! Transformation output: dense or sparse, with an explicit densify step
//!
//! Consumers never probe the representation; they call
//! [`TransformOutput::into_dense`] before concatenating anything.

use crate::error::{Result, TabprepError};
use ndarray::{s, Array2};

/// Compressed sparse row matrix of `f64`
#[derive(Debug, Clone, PartialEq)]
pub struct SparseMatrix {
    n_rows: usize,
    n_cols: usize,
    indptr: Vec<usize>,
    indices: Vec<usize>,
    data: Vec<f64>,
}

impl SparseMatrix {
    /// Build from CSR parts, validating their consistency
    pub fn from_csr(
        n_rows: usize,
        n_cols: usize,
        indptr: Vec<usize>,
        indices: Vec<usize>,
        data: Vec<f64>,
    ) -> Result<Self> {
        if indptr.len() != n_rows + 1 {
            return Err(TabprepError::ShapeError {
                expected: format!("indptr of length {}", n_rows + 1),
                actual: indptr.len().to_string(),
            });
        }
        if indices.len() != data.len() || indptr.last().copied() != Some(data.len()) {
            return Err(TabprepError::ShapeError {
                expected: format!("{} stored values", indptr.last().copied().unwrap_or(0)),
                actual: format!("{} indices, {} values", indices.len(), data.len()),
            });
        }
        if indptr.windows(2).any(|w| w[0] > w[1]) {
            return Err(TabprepError::InvalidInput("indptr must be non-decreasing".into()));
        }
        if let Some(&bad) = indices.iter().find(|&&c| c >= n_cols) {
            return Err(TabprepError::InvalidInput(format!(
                "column index {bad} out of bounds for {n_cols} columns"
            )));
        }
        Ok(Self { n_rows, n_cols, indptr, indices, data })
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.n_rows, self.n_cols)
    }

    /// Number of stored entries
    pub fn nnz(&self) -> usize {
        self.data.len()
    }

    /// Stored `(column, value)` pairs of one row
    pub fn row(&self, i: usize) -> impl Iterator<Item = (usize, f64)> + '_ {
        let range = self.indptr[i]..self.indptr[i + 1];
        self.indices[range.clone()].iter().copied().zip(self.data[range].iter().copied())
    }

    pub fn to_dense(&self) -> Array2<f64> {
        let mut dense = Array2::zeros((self.n_rows, self.n_cols));
        for i in 0..self.n_rows {
            for (j, v) in self.row(i) {
                dense[[i, j]] += v;
            }
        }
        dense
    }

    fn from_dense(dense: &Array2<f64>) -> Self {
        let (n_rows, n_cols) = dense.dim();
        let mut indptr = Vec::with_capacity(n_rows + 1);
        let mut indices = Vec::new();
        let mut data = Vec::new();
        indptr.push(0);
        for row in dense.rows() {
            for (j, &v) in row.iter().enumerate() {
                if v != 0.0 {
                    indices.push(j);
                    data.push(v);
                }
            }
            indptr.push(data.len());
        }
        Self { n_rows, n_cols, indptr, indices, data }
    }
}

/// Capability-tagged result of a transformation
#[derive(Debug, Clone, PartialEq)]
pub enum TransformOutput {
    Dense(Array2<f64>),
    Sparse(SparseMatrix),
}

impl TransformOutput {
    pub fn shape(&self) -> (usize, usize) {
        match self {
            TransformOutput::Dense(a) => a.dim(),
            TransformOutput::Sparse(m) => m.shape(),
        }
    }

    pub fn is_sparse(&self) -> bool {
        matches!(self, TransformOutput::Sparse(_))
    }

    /// Entries counted towards density: every cell of a dense block, stored
    /// entries of a sparse one
    pub fn stored_len(&self) -> usize {
        match self {
            TransformOutput::Dense(a) => a.len(),
            TransformOutput::Sparse(m) => m.nnz(),
        }
    }

    /// Materialize as a dense array
    pub fn into_dense(self) -> Array2<f64> {
        match self {
            TransformOutput::Dense(a) => a,
            TransformOutput::Sparse(m) => m.to_dense(),
        }
    }

    /// Column-wise concatenation of sub-pipeline outputs.
    ///
    /// The result is sparse when at least one block is sparse and the overall
    /// density is below `sparse_threshold`; dense otherwise.
    pub fn hstack(blocks: Vec<TransformOutput>, sparse_threshold: f64) -> Result<TransformOutput> {
        let n_rows = match blocks.first() {
            Some(b) => b.shape().0,
            None => return Err(TabprepError::InvalidInput("nothing to concatenate".into())),
        };
        if let Some(bad) = blocks.iter().find(|b| b.shape().0 != n_rows) {
            return Err(TabprepError::ShapeError {
                expected: format!("{n_rows} rows in every block"),
                actual: format!("{} rows", bad.shape().0),
            });
        }

        let n_cols: usize = blocks.iter().map(|b| b.shape().1).sum();
        let total = n_rows * n_cols;
        let stored: usize = blocks.iter().map(TransformOutput::stored_len).sum();
        let any_sparse = blocks.iter().any(TransformOutput::is_sparse);
        let density = if total == 0 { 1.0 } else { stored as f64 / total as f64 };

        if any_sparse && density < sparse_threshold {
            Ok(TransformOutput::Sparse(hstack_sparse(&blocks, n_rows, n_cols)))
        } else {
            let mut dense = Array2::zeros((n_rows, n_cols));
            let mut offset = 0;
            for block in blocks {
                let width = block.shape().1;
                dense
                    .slice_mut(s![.., offset..offset + width])
                    .assign(&block.into_dense());
                offset += width;
            }
            Ok(TransformOutput::Dense(dense))
        }
    }
}

fn hstack_sparse(blocks: &[TransformOutput], n_rows: usize, n_cols: usize) -> SparseMatrix {
    let converted: Vec<SparseMatrix> = blocks
        .iter()
        .map(|b| match b {
            TransformOutput::Dense(a) => SparseMatrix::from_dense(a),
            TransformOutput::Sparse(m) => m.clone(),
        })
        .collect();

    let mut indptr = Vec::with_capacity(n_rows + 1);
    let mut indices = Vec::new();
    let mut data = Vec::new();
    indptr.push(0);
    for i in 0..n_rows {
        let mut offset = 0;
        for m in &converted {
            for (j, v) in m.row(i) {
                indices.push(offset + j);
                data.push(v);
            }
            offset += m.n_cols;
        }
        indptr.push(data.len());
    }
    SparseMatrix { n_rows, n_cols, indptr, indices, data }
}
