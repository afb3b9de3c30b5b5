//! Records exchanged with the neighbouring pipeline stages
//!
//! The scheduler passes small JSON dictionaries between stages; both artifacts
//! accept (and emit) those dictionary keys as aliases.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Output of the validation stage, consumed here
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataValidationArtifact {
    #[serde(default = "default_validation_status")]
    pub validation_status: bool,
    #[serde(alias = "valid_train_csv")]
    pub valid_train_file_path: PathBuf,
    #[serde(alias = "valid_test_csv")]
    pub valid_test_file_path: PathBuf,
    #[serde(default)]
    pub invalid_train_file_path: Option<PathBuf>,
    #[serde(default)]
    pub invalid_test_file_path: Option<PathBuf>,
    #[serde(default, alias = "drift_report")]
    pub drift_report_file_path: Option<PathBuf>,
}

fn default_validation_status() -> bool {
    true
}

impl DataValidationArtifact {
    /// Artifact for two already-validated files
    pub fn new(train: impl Into<PathBuf>, test: impl Into<PathBuf>) -> Self {
        Self {
            validation_status: true,
            valid_train_file_path: train.into(),
            valid_test_file_path: test.into(),
            invalid_train_file_path: None,
            invalid_test_file_path: None,
            drift_report_file_path: None,
        }
    }

    /// Load from a JSON file written by the validation stage or the scheduler
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }
}

/// Output of the transformation stage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataTransformationArtifact {
    #[serde(rename = "preprocessor_pkl", alias = "transformed_object_file_path")]
    pub transformed_object_file_path: PathBuf,
    #[serde(rename = "transformed_train", alias = "transformed_train_file_path")]
    pub transformed_train_file_path: PathBuf,
    #[serde(rename = "transformed_test", alias = "transformed_test_file_path")]
    pub transformed_test_file_path: PathBuf,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label_encoder_file_path: Option<PathBuf>,
}

impl DataTransformationArtifact {
    /// Scheduler result dictionary
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
