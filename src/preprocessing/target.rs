//! Target (label) normalisation

use super::{column_to_f64, column_to_strings, is_missing, is_numeric_dtype};
use crate::constants::{LABEL_SENTINEL, TARGET_COLUMN};
use crate::error::{Result, ResultExt, TabprepError};
use ndarray::Array1;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::info;

/// Maps label values to integer codes in lexicographic order of the values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelEncoder {
    classes: Vec<String>,
}

impl LabelEncoder {
    /// Fit on training labels. Missing labels cannot be encoded.
    pub fn fit(labels: &[Option<String>]) -> Result<Self> {
        let mut classes = BTreeSet::new();
        for (i, label) in labels.iter().enumerate() {
            match label {
                Some(v) => {
                    classes.insert(v.clone());
                }
                None => {
                    return Err(TabprepError::InvalidInput(format!(
                        "missing label at row {i}"
                    )))
                }
            }
        }
        if classes.is_empty() {
            return Err(TabprepError::InvalidInput("no labels to fit the encoder on".into()));
        }
        Ok(Self {
            classes: classes.into_iter().collect(),
        })
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    /// Encode labels; a value outside the fitted classes is an `UnseenLabel`
    pub fn transform(&self, labels: &[Option<String>]) -> Result<Array1<f64>> {
        labels
            .iter()
            .map(|label| {
                let value = label.as_deref().ok_or_else(|| TabprepError::UnseenLabel {
                    label: "<null>".to_string(),
                })?;
                self.classes
                    .binary_search_by(|c| c.as_str().cmp(value))
                    .map(|code| code as f64)
                    .map_err(|_| TabprepError::UnseenLabel {
                        label: value.to_string(),
                    })
            })
            .collect::<Result<Vec<f64>>>()
            .map(Array1::from)
    }

    /// Decode integer codes back to the original labels
    pub fn inverse_transform(&self, codes: &[f64]) -> Result<Vec<String>> {
        codes
            .iter()
            .map(|&code| {
                let idx = code as usize;
                if code < 0.0 || code.fract() != 0.0 || idx >= self.classes.len() {
                    return Err(TabprepError::InvalidInput(format!(
                        "code {code} is not a fitted class index"
                    )));
                }
                Ok(self.classes[idx].clone())
            })
            .collect()
    }
}

/// Shape of the normalised label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TargetKind {
    /// Numeric label with more than two distinct training values
    Numeric,
    /// At most two distinct training values
    Binary,
    /// Encoded non-numeric label with more than two classes
    Multiclass,
}

/// Numeric label vectors for both frames
#[derive(Debug, Clone)]
pub struct NormalizedTarget {
    pub train: Array1<f64>,
    pub test: Array1<f64>,
    pub kind: TargetKind,
    /// Present when the label had to be encoded
    pub encoder: Option<LabelEncoder>,
}

/// Turns the raw label columns of train and test into numeric vectors
#[derive(Debug, Clone)]
pub struct TargetNormalizer {
    column: String,
    sentinel: f64,
}

impl Default for TargetNormalizer {
    fn default() -> Self {
        Self::new(TARGET_COLUMN, LABEL_SENTINEL)
    }
}

impl TargetNormalizer {
    pub fn new(column: impl Into<String>, sentinel: f64) -> Self {
        Self {
            column: column.into(),
            sentinel,
        }
    }

    pub fn column(&self) -> &str {
        &self.column
    }

    /// Fail with `MissingTargetColumn` unless both frames carry the label
    pub fn check_present(&self, train: &DataFrame, test: &DataFrame) -> Result<()> {
        for (df, frame) in [(train, "train"), (test, "test")] {
            if df.column(&self.column).is_err() {
                return Err(TabprepError::MissingTargetColumn {
                    column: self.column.clone(),
                    frame,
                });
            }
        }
        Ok(())
    }

    /// Numeric labels: sentinel replaced by 0
    fn numeric_labels(&self, df: &DataFrame) -> Result<Array1<f64>> {
        let values = column_to_f64(df, &self.column)?;
        if let Some(i) = values.iter().position(|v| is_missing(*v)) {
            return Err(TabprepError::InvalidInput(format!("missing label at row {i}")));
        }
        Ok(values
            .into_iter()
            .map(|v| if v == self.sentinel { 0.0 } else { v })
            .collect())
    }

    pub fn normalize(&self, train: &DataFrame, test: &DataFrame) -> Result<NormalizedTarget> {
        self.check_present(train, test)?;

        let dtype = train.column(&self.column)?.dtype().clone();
        let target = if is_numeric_dtype(&dtype) {
            let train_labels = self.numeric_labels(train).fit_context("target")?;
            let test_labels = self.numeric_labels(test).apply_context("target")?;
            let distinct: BTreeSet<u64> = train_labels.iter().map(|v| v.to_bits()).collect();
            let kind = if distinct.len() <= 2 {
                TargetKind::Binary
            } else {
                TargetKind::Numeric
            };
            NormalizedTarget {
                train: train_labels,
                test: test_labels,
                kind,
                encoder: None,
            }
        } else {
            let raw_train = column_to_strings(train, &self.column)?;
            let raw_test = column_to_strings(test, &self.column)?;
            let encoder = LabelEncoder::fit(&raw_train).fit_context("target/label_encoder")?;
            let train_labels = encoder.transform(&raw_train).fit_context("target/label_encoder")?;
            let test_labels = encoder.transform(&raw_test).apply_context("target/label_encoder")?;
            let kind = if encoder.classes().len() <= 2 {
                TargetKind::Binary
            } else {
                TargetKind::Multiclass
            };
            NormalizedTarget {
                train: train_labels,
                test: test_labels,
                kind,
                encoder: Some(encoder),
            }
        };

        info!(
            column = %self.column,
            dtype = %dtype,
            kind = ?target.kind,
            encoded = target.encoder.is_some(),
            "Normalised target"
        );
        Ok(target)
    }

    /// Normalise the label of one new frame, reusing a persisted encoder
    pub fn transform(&self, df: &DataFrame, encoder: Option<&LabelEncoder>) -> Result<Array1<f64>> {
        if df.column(&self.column).is_err() {
            return Err(TabprepError::MissingTargetColumn {
                column: self.column.clone(),
                frame: "input",
            });
        }
        match encoder {
            Some(encoder) => encoder
                .transform(&column_to_strings(df, &self.column)?)
                .apply_context("target/label_encoder"),
            None => self.numeric_labels(df).apply_context("target"),
        }
    }
}
