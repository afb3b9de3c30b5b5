//! Pipeline and transformation configuration
//!
//! Everything here is resolved by the caller before the transformation stage
//! runs; the stage itself never consults environment variables.

use crate::constants::*;
use crate::error::{Result, TabprepError};
use crate::preprocessing::KnnImputerParams;
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Run-level configuration: where this run's artifacts live
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingPipelineConfig {
    pub pipeline_name: String,
    pub artifact_name: PathBuf,
    pub artifact_dir: PathBuf,
    pub timestamp: String,
}

impl TrainingPipelineConfig {
    /// Create a run rooted at `artifact_root/<timestamp>`
    pub fn new(artifact_root: impl Into<PathBuf>, timestamp: DateTime<Local>) -> Self {
        let artifact_name = artifact_root.into();
        let timestamp = timestamp.format(TIMESTAMP_FORMAT).to_string();
        let artifact_dir = artifact_name.join(&timestamp);
        Self {
            pipeline_name: PIPELINE_NAME.to_string(),
            artifact_name,
            artifact_dir,
            timestamp,
        }
    }
}

impl Default for TrainingPipelineConfig {
    fn default() -> Self {
        Self::new(ARTIFACT_DIR, Local::now())
    }
}

/// Tunable parameters of the transformation stage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransformationParams {
    /// Label column name
    pub target_column: String,

    /// |skewness| above this sends a numeric column to the power-transform group
    pub skew_threshold: f64,

    /// Numeric label value remapped to 0
    pub label_sentinel: f64,

    /// Similarity-based imputer for regular numeric columns
    pub knn: KnnImputerParams,

    /// Combined output stays sparse while density is below this value
    pub sparse_threshold: f64,

    /// Directory receiving the serving copies of the fitted objects
    pub final_model_dir: PathBuf,
}

impl Default for TransformationParams {
    fn default() -> Self {
        Self {
            target_column: TARGET_COLUMN.to_string(),
            skew_threshold: SKEW_THRESHOLD,
            label_sentinel: LABEL_SENTINEL,
            knn: KnnImputerParams::default(),
            sparse_threshold: SPARSE_THRESHOLD,
            final_model_dir: PathBuf::from(FINAL_MODEL_DIR),
        }
    }
}

impl TransformationParams {
    /// Create parameters with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method to set the label column
    pub fn with_target_column(mut self, column: impl Into<String>) -> Self {
        self.target_column = column.into();
        self
    }

    /// Builder method to set the skew threshold
    pub fn with_skew_threshold(mut self, threshold: f64) -> Self {
        self.skew_threshold = threshold;
        self
    }

    /// Builder method to set the KNN imputer parameters
    pub fn with_knn(mut self, knn: KnnImputerParams) -> Self {
        self.knn = knn;
        self
    }

    /// Builder method to set the serving directory
    pub fn with_final_model_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.final_model_dir = dir.into();
        self
    }

    /// Reject values the stages cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.target_column.trim().is_empty() {
            return Err(TabprepError::ConfigError("target_column must not be empty".into()));
        }
        if !self.skew_threshold.is_finite() || self.skew_threshold < 0.0 {
            return Err(TabprepError::ConfigError(format!(
                "skew_threshold must be a non-negative number, got {}",
                self.skew_threshold
            )));
        }
        if self.knn.n_neighbors == 0 {
            return Err(TabprepError::ConfigError("knn.n_neighbors must be at least 1".into()));
        }
        if !(0.0..=1.0).contains(&self.sparse_threshold) {
            return Err(TabprepError::ConfigError(format!(
                "sparse_threshold must lie in [0, 1], got {}",
                self.sparse_threshold
            )));
        }
        Ok(())
    }

    /// Save the parameters to a JSON file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Load parameters from a JSON file; absent keys take their defaults
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        let params: Self = serde_json::from_str(&json)?;
        params.validate()?;
        Ok(params)
    }
}

/// Output locations of the transformation stage
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataTransformationConfig {
    pub data_transformation_dir: PathBuf,
    pub transformed_train_file_path: PathBuf,
    pub transformed_test_file_path: PathBuf,
    pub transformed_object_file_path: PathBuf,
    pub params: TransformationParams,
}

impl DataTransformationConfig {
    /// Resolve the output paths for one run
    pub fn new(pipeline: &TrainingPipelineConfig, params: TransformationParams) -> Self {
        let data_transformation_dir = pipeline.artifact_dir.join(DATA_TRANSFORMATION_DIR_NAME);
        let transformed_dir = data_transformation_dir.join(DATA_TRANSFORMATION_TRANSFORMED_DATA_DIR);
        let object_dir = data_transformation_dir.join(DATA_TRANSFORMATION_TRANSFORMED_OBJECT_DIR);
        Self {
            transformed_train_file_path: transformed_dir.join(TRANSFORMED_TRAIN_FILE_NAME),
            transformed_test_file_path: transformed_dir.join(TRANSFORMED_TEST_FILE_NAME),
            transformed_object_file_path: object_dir.join(PREPROCESSING_OBJECT_FILE_NAME),
            data_transformation_dir,
            params,
        }
    }

    /// Serving copy of the fitted composite transformation
    pub fn final_preprocessor_path(&self) -> PathBuf {
        self.params.final_model_dir.join(FINAL_PREPROCESSOR_FILE_NAME)
    }

    /// Serving copy of the fitted label encoder
    pub fn final_label_encoder_path(&self) -> PathBuf {
        self.params.final_model_dir.join(FINAL_LABEL_ENCODER_FILE_NAME)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn fixed_time() -> DateTime<Local> {
        Local.with_ymd_and_hms(2025, 3, 14, 9, 26, 53).unwrap()
    }

    #[test]
    fn test_default_params() {
        let params = TransformationParams::default();
        assert_eq!(params.target_column, "Result");
        assert_eq!(params.skew_threshold, 1.0);
        assert_eq!(params.knn.n_neighbors, 3);
        assert_eq!(params.sparse_threshold, 1.0);
        assert!(params.validate().is_ok());
    }

    #[test]
    fn test_builder_pattern() {
        let params = TransformationParams::new()
            .with_target_column("label")
            .with_skew_threshold(0.5)
            .with_final_model_dir("serving");
        assert_eq!(params.target_column, "label");
        assert_eq!(params.skew_threshold, 0.5);
        assert_eq!(params.final_model_dir, PathBuf::from("serving"));
    }

    #[test]
    fn test_validate_rejects_zero_neighbors() {
        let mut params = TransformationParams::default();
        params.knn.n_neighbors = 0;
        assert!(matches!(params.validate(), Err(TabprepError::ConfigError(_))));
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let params: TransformationParams =
            serde_json::from_str(r#"{"target_column": "label"}"#).unwrap();
        assert_eq!(params.target_column, "label");
        assert_eq!(params.knn, KnnImputerParams::default());
    }

    #[test]
    fn test_output_layout() {
        let pipeline = TrainingPipelineConfig::new("Artifacts", fixed_time());
        assert_eq!(pipeline.timestamp, "03_14_2025_09_26_53");

        let config = DataTransformationConfig::new(&pipeline, TransformationParams::default());
        assert_eq!(
            config.transformed_train_file_path,
            PathBuf::from("Artifacts/03_14_2025_09_26_53/data_transformation/transformed/train.bin")
        );
        assert_eq!(
            config.transformed_object_file_path,
            PathBuf::from(
                "Artifacts/03_14_2025_09_26_53/data_transformation/transformed_object/preprocessing.bin"
            )
        );
        assert_eq!(config.final_preprocessor_path(), PathBuf::from("final_model/preprocessor.bin"));
    }

    #[test]
    fn test_save_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("params.json");
        let params = TransformationParams::new().with_target_column("label");
        params.save(&path).unwrap();
        assert_eq!(TransformationParams::load(&path).unwrap(), params);
    }
}
