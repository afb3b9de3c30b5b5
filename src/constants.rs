//! Fixed names and defaults shared by the pipeline stages

/// Label column expected in the validated train/test files
pub const TARGET_COLUMN: &str = "Result";

/// Name used in logs and artifact metadata
pub const PIPELINE_NAME: &str = "NetworkSecurity";

/// Root under which every run creates its timestamped directory
pub const ARTIFACT_DIR: &str = "Artifacts";

/// Timestamp format of a run directory, e.g. `03_14_2025_09_26_53`
pub const TIMESTAMP_FORMAT: &str = "%m_%d_%Y_%H_%M_%S";

pub const DATA_TRANSFORMATION_DIR_NAME: &str = "data_transformation";
pub const DATA_TRANSFORMATION_TRANSFORMED_DATA_DIR: &str = "transformed";
pub const DATA_TRANSFORMATION_TRANSFORMED_OBJECT_DIR: &str = "transformed_object";

pub const TRANSFORMED_TRAIN_FILE_NAME: &str = "train.bin";
pub const TRANSFORMED_TEST_FILE_NAME: &str = "test.bin";
pub const PREPROCESSING_OBJECT_FILE_NAME: &str = "preprocessing.bin";

/// Well-known directory read by the serving process
pub const FINAL_MODEL_DIR: &str = "final_model";
pub const FINAL_PREPROCESSOR_FILE_NAME: &str = "preprocessor.bin";
pub const FINAL_LABEL_ENCODER_FILE_NAME: &str = "label_encoder.bin";

/// |skewness| above this marks a numeric column as skewed
pub const SKEW_THRESHOLD: f64 = 1.0;

/// Negative-class marker remapped to 0 in numeric labels
pub const LABEL_SENTINEL: f64 = -1.0;

pub const KNN_IMPUTER_N_NEIGHBORS: usize = 3;

/// Combined output stays sparse while its density is below this value
pub const SPARSE_THRESHOLD: f64 = 1.0;
