//! tabprep - feature and label transformation stage for tabular training pipelines
//!
//! Takes validated train/test tables, learns a composite feature
//! transformation on the training table only, applies it to both tables and
//! persists the resulting numeric matrices together with the fitted objects.
//!
//! # Modules
//!
//! - [`preprocessing`] - Column profiling, pipeline planning, the individual
//!   imputation/transform/encoding steps and target normalisation
//! - [`transformation`] - The fit/apply stage tying everything together
//! - [`persistence`] - Binary storage of fitted objects and arrays
//! - [`config`] / [`artifact`] - Run layout and the records exchanged with
//!   neighbouring stages
//! - [`cli`] - Command-line interface

// Core error handling
pub mod error;
pub mod constants;

// Pipeline stage
pub mod config;
pub mod artifact;
pub mod persistence;
pub mod preprocessing;
pub mod transformation;

// Utilities
pub mod utils;

// Services
pub mod cli;

pub use error::{Result, TabprepError};

/// Re-export commonly used types
pub mod prelude {
    // Error handling
    pub use crate::error::{Result, ResultExt, TabprepError};

    // Configuration and artifacts
    pub use crate::artifact::{DataTransformationArtifact, DataValidationArtifact};
    pub use crate::config::{DataTransformationConfig, TrainingPipelineConfig, TransformationParams};

    // Preprocessing
    pub use crate::preprocessing::{
        ColumnProfile, ColumnProfiler, ColumnRole, FittedColumnTransformer, LabelEncoder,
        PipelineBuilder, TargetNormalizer, TransformOutput,
    };

    // Stage
    pub use crate::transformation::{DataTransformation, TransformedData};

    // Persistence
    pub use crate::persistence::{load_array, load_object, save_array, save_object};
}
