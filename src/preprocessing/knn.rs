//! KNN-based imputation

use super::is_missing;
use crate::constants::KNN_IMPUTER_N_NEIGHBORS;
use crate::error::{Result, TabprepError};
use ndarray::{Array1, Array2, ArrayView1, Axis};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Weighting of the neighbour values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KnnWeights {
    /// Plain average of the neighbours
    Uniform,
    /// Inverse-distance weighted average
    Distance,
}

/// Parameters of the KNN imputer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KnnImputerParams {
    pub n_neighbors: usize,
    pub weights: KnnWeights,
}

impl Default for KnnImputerParams {
    fn default() -> Self {
        Self {
            n_neighbors: KNN_IMPUTER_N_NEIGHBORS,
            weights: KnnWeights::Uniform,
        }
    }
}

/// Fitted KNN imputer.
///
/// Keeps the training matrix (missing cells included). A missing cell is
/// filled from the nearest fitted rows that observe that column, using the
/// NaN-aware euclidean distance over the coordinates both rows observe.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KNNImputer {
    params: KnnImputerParams,
    fit_data: Array2<f64>,
    /// Fallback when no donor has a defined distance
    feature_means: Array1<f64>,
}

impl KNNImputer {
    pub fn fit(x: &Array2<f64>, params: &KnnImputerParams) -> Result<Self> {
        if params.n_neighbors == 0 {
            return Err(TabprepError::InvalidInput("n_neighbors must be at least 1".into()));
        }
        if x.nrows() == 0 {
            return Err(TabprepError::InvalidInput("cannot fit KNN imputer on zero rows".into()));
        }

        let feature_means = x.map_axis(Axis(0), |col| {
            let (sum, count) = col
                .iter()
                .filter(|v| !is_missing(**v))
                .fold((0.0, 0usize), |(s, c), &v| (s + v, c + 1));
            if count == 0 { 0.0 } else { sum / count as f64 }
        });

        Ok(Self {
            params: params.clone(),
            fit_data: x.clone(),
            feature_means,
        })
    }

    pub fn params(&self) -> &KnnImputerParams {
        &self.params
    }

    /// NaN-euclidean distance: squared differences over shared observed
    /// coordinates, rescaled by `n_features / n_shared`. `None` when the two
    /// rows share no observed coordinate.
    fn distance(a: ArrayView1<f64>, b: ArrayView1<f64>) -> Option<f64> {
        let mut shared = 0usize;
        let mut accum = 0.0f64;
        for (&ai, &bi) in a.iter().zip(b.iter()) {
            if is_missing(ai) || is_missing(bi) {
                continue;
            }
            shared += 1;
            let d = ai - bi;
            accum += d * d;
        }
        if shared == 0 {
            return None;
        }
        Some((accum * a.len() as f64 / shared as f64).sqrt())
    }

    fn impute_value(&self, donors: &[(usize, f64)], feature_idx: usize) -> f64 {
        if donors.is_empty() {
            return self.feature_means[feature_idx];
        }

        let value = |idx: usize| self.fit_data[[idx, feature_idx]];
        match self.params.weights {
            KnnWeights::Uniform => {
                donors.iter().map(|&(idx, _)| value(idx)).sum::<f64>() / donors.len() as f64
            }
            KnnWeights::Distance => {
                // Exact matches take all the weight
                let exact: Vec<usize> = donors
                    .iter()
                    .filter(|(_, d)| *d == 0.0)
                    .map(|&(idx, _)| idx)
                    .collect();
                if !exact.is_empty() {
                    return exact.iter().map(|&idx| value(idx)).sum::<f64>() / exact.len() as f64;
                }
                let (weighted_sum, weight_sum) = donors
                    .iter()
                    .fold((0.0, 0.0), |(ws, w), &(idx, d)| (ws + value(idx) / d, w + 1.0 / d));
                weighted_sum / weight_sum
            }
        }
    }

    /// Impute every missing cell of one row
    fn impute_row(&self, row: ArrayView1<f64>) -> Vec<(usize, f64)> {
        let distances: Vec<Option<f64>> = self
            .fit_data
            .rows()
            .into_iter()
            .map(|fit_row| Self::distance(row, fit_row))
            .collect();

        row.iter()
            .enumerate()
            .filter(|(_, v)| is_missing(**v))
            .map(|(j, _)| {
                let mut donors: Vec<(usize, f64)> = distances
                    .iter()
                    .enumerate()
                    .filter_map(|(i, d)| d.map(|d| (i, d)))
                    .filter(|&(i, _)| !is_missing(self.fit_data[[i, j]]))
                    .collect();
                // Stable sort keeps the lower row index first among equal distances
                donors.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(Ordering::Equal));
                donors.truncate(self.params.n_neighbors);
                (j, self.impute_value(&donors, j))
            })
            .collect()
    }

    pub fn transform(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        if x.ncols() != self.fit_data.ncols() {
            return Err(TabprepError::ShapeError {
                expected: format!("{} columns", self.fit_data.ncols()),
                actual: format!("{} columns", x.ncols()),
            });
        }

        let receivers: Vec<usize> = x
            .rows()
            .into_iter()
            .enumerate()
            .filter(|(_, row)| row.iter().any(|&v| is_missing(v)))
            .map(|(i, _)| i)
            .collect();

        let imputed: Vec<(usize, Vec<(usize, f64)>)> = receivers
            .into_par_iter()
            .map(|i| (i, self.impute_row(x.row(i))))
            .collect();

        let mut result = x.clone();
        for (i, cells) in imputed {
            for (j, v) in cells {
                result[[i, j]] = v;
            }
        }
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn params(n: usize, weights: KnnWeights) -> KnnImputerParams {
        KnnImputerParams { n_neighbors: n, weights }
    }

    #[test]
    fn test_knn_imputer_basic() {
        let data = array![
            [1.0, 10.0],
            [2.0, 20.0],
            [3.0, 30.0],
            [4.0, 40.0],
            [f64::NAN, 25.0],
            [2.5, f64::NAN],
        ];

        let imputer = KNNImputer::fit(&data, &params(3, KnnWeights::Uniform)).unwrap();
        let result = imputer.transform(&data).unwrap();

        assert!(!result.iter().any(|v| v.is_nan()));
        // nearest rows to 25.0 on the second feature are 20, 30 and 40 (or 10)
        assert!(result[[4, 0]] >= 1.0 && result[[4, 0]] <= 4.0);
        assert!(result[[5, 1]] >= 10.0 && result[[5, 1]] <= 40.0);
    }

    #[test]
    fn test_uniform_average_of_two_nearest() {
        let data = array![[0.0, 0.0], [1.0, 10.0], [2.0, 20.0], [10.0, 100.0]];
        let imputer = KNNImputer::fit(&data, &params(2, KnnWeights::Uniform)).unwrap();

        let query = array![[1.4, f64::NAN]];
        let out = imputer.transform(&query).unwrap();
        // nearest on the first feature: 1.0 (d=0.4) and 2.0 (d=0.6)
        assert!((out[[0, 1]] - 15.0).abs() < 1e-12);
    }

    #[test]
    fn test_distance_weights_favour_close_rows() {
        let data = array![[0.0, 0.0], [1.0, 1.0], [2.0, 2.0], [3.0, 3.0]];
        let imputer = KNNImputer::fit(&data, &params(3, KnnWeights::Distance)).unwrap();

        let out = imputer.transform(&array![[0.1, f64::NAN]]).unwrap();
        assert!(out[[0, 1]] < 1.0);
    }

    #[test]
    fn test_exact_match_takes_all_weight() {
        let data = array![[0.0, 5.0], [1.0, 7.0], [2.0, 9.0]];
        let imputer = KNNImputer::fit(&data, &params(3, KnnWeights::Distance)).unwrap();

        let out = imputer.transform(&array![[1.0, f64::NAN]]).unwrap();
        assert_eq!(out[[0, 1]], 7.0);
    }

    #[test]
    fn test_no_shared_coordinates_falls_back_to_mean() {
        let data = array![[1.0, 2.0], [3.0, 4.0]];
        let imputer = KNNImputer::fit(&data, &params(1, KnnWeights::Uniform)).unwrap();

        let out = imputer.transform(&array![[f64::NAN, f64::NAN]]).unwrap();
        assert_eq!(out[[0, 0]], 2.0);
        assert_eq!(out[[0, 1]], 3.0);
    }

    #[test]
    fn test_donors_must_observe_the_column() {
        // the closest row is missing the target column and must be skipped
        let data = array![[0.0, f64::NAN], [5.0, 50.0], [9.0, 90.0]];
        let imputer = KNNImputer::fit(&data, &params(1, KnnWeights::Uniform)).unwrap();

        let out = imputer.transform(&array![[0.1, f64::NAN]]).unwrap();
        assert_eq!(out[[0, 1]], 50.0);
    }

    #[test]
    fn test_nan_euclidean_rescaling() {
        let a = array![1.0, f64::NAN, 3.0];
        let b = array![1.0, 2.0, 5.0];
        // one shared diff of 2 over 2 shared coords out of 3 → sqrt(3/2 * 4)
        let d = KNNImputer::distance(a.view(), b.view()).unwrap();
        assert!((d - 6.0f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn test_params_serde_lowercase() {
        let json = serde_json::to_string(&params(5, KnnWeights::Distance)).unwrap();
        assert!(json.contains("\"distance\""));
    }
}
