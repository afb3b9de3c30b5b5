//! Error types for the tabprep transformation stage

use std::panic::Location;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Boxed cause carried by the wrapping variants
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Result type alias for tabprep operations
pub type Result<T> = std::result::Result<T, TabprepError>;

/// Main error type for the transformation stage
#[derive(Error, Debug)]
pub enum TabprepError {
    #[error("No valid feature columns found for transformation")]
    NoFeatureColumns,

    #[error("Missing target column '{column}' in {frame} data")]
    MissingTargetColumn { column: String, frame: &'static str },

    #[error("Label '{label}' was not seen when the label encoder was fitted")]
    UnseenLabel { label: String },

    #[error("Transform fit error in {context} at {location}: {source}")]
    TransformFit {
        context: String,
        location: &'static Location<'static>,
        #[source]
        source: BoxError,
    },

    #[error("Transform apply error in {context} at {location}: {source}")]
    TransformApply {
        context: String,
        location: &'static Location<'static>,
        #[source]
        source: BoxError,
    },

    #[error("Persistence error for {} at {location}: {source}", .path.display())]
    Persistence {
        path: PathBuf,
        location: &'static Location<'static>,
        #[source]
        source: BoxError,
    },

    #[error("Data error: {0}")]
    DataError(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid shape: expected {expected}, got {actual}")]
    ShapeError { expected: String, actual: String },

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl TabprepError {
    /// Errors that carry their own meaning and must not be re-wrapped
    pub fn is_taxonomy(&self) -> bool {
        matches!(
            self,
            TabprepError::NoFeatureColumns
                | TabprepError::MissingTargetColumn { .. }
                | TabprepError::UnseenLabel { .. }
                | TabprepError::TransformFit { .. }
                | TabprepError::TransformApply { .. }
                | TabprepError::Persistence { .. }
        )
    }
}

/// Context helpers that fold arbitrary failures into the taxonomy.
///
/// Failures that already belong to the taxonomy pass through untouched so that
/// e.g. an `UnseenLabel` raised deep inside the target normaliser reaches the
/// caller as-is.
pub trait ResultExt<T> {
    #[track_caller]
    fn fit_context(self, context: &str) -> Result<T>;

    #[track_caller]
    fn apply_context(self, context: &str) -> Result<T>;

    #[track_caller]
    fn persist_context(self, path: &Path) -> Result<T>;
}

impl<T, E: Into<TabprepError>> ResultExt<T> for std::result::Result<T, E> {
    #[track_caller]
    fn fit_context(self, context: &str) -> Result<T> {
        let location = Location::caller();
        self.map_err(|e| {
            let e = e.into();
            if e.is_taxonomy() {
                e
            } else {
                TabprepError::TransformFit {
                    context: context.to_string(),
                    location,
                    source: Box::new(e),
                }
            }
        })
    }

    #[track_caller]
    fn apply_context(self, context: &str) -> Result<T> {
        let location = Location::caller();
        self.map_err(|e| {
            let e = e.into();
            if e.is_taxonomy() {
                e
            } else {
                TabprepError::TransformApply {
                    context: context.to_string(),
                    location,
                    source: Box::new(e),
                }
            }
        })
    }

    #[track_caller]
    fn persist_context(self, path: &Path) -> Result<T> {
        let location = Location::caller();
        self.map_err(|e| match e.into() {
            e @ TabprepError::Persistence { .. } => e,
            other => TabprepError::Persistence {
                path: path.to_path_buf(),
                location,
                source: Box::new(other),
            },
        })
    }
}

impl From<polars::error::PolarsError> for TabprepError {
    fn from(err: polars::error::PolarsError) -> Self {
        TabprepError::DataError(err.to_string())
    }
}

impl From<serde_json::Error> for TabprepError {
    fn from(err: serde_json::Error) -> Self {
        TabprepError::SerializationError(err.to_string())
    }
}

impl From<bincode::Error> for TabprepError {
    fn from(err: bincode::Error) -> Self {
        TabprepError::SerializationError(err.to_string())
    }
}

impl From<ndarray::ShapeError> for TabprepError {
    fn from(err: ndarray::ShapeError) -> Self {
        TabprepError::ShapeError {
            expected: "valid shape".to_string(),
            actual: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = TabprepError::DataError("test error".to_string());
        assert_eq!(err.to_string(), "Data error: test error");
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: TabprepError = io_err.into();
        assert!(matches!(err, TabprepError::IoError(_)));
    }

    #[test]
    fn test_fit_context_wraps_and_records_location() {
        let failing: Result<()> = Err(TabprepError::InvalidInput("empty column".into()));
        let err = failing.fit_context("num_regular/knn_imputer").unwrap_err();
        match err {
            TabprepError::TransformFit { context, location, source } => {
                assert_eq!(context, "num_regular/knn_imputer");
                assert!(location.file().ends_with("error.rs"));
                assert!(source.to_string().contains("empty column"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_taxonomy_errors_pass_through() {
        let failing: Result<()> = Err(TabprepError::UnseenLabel { label: "c".into() });
        let err = failing.apply_context("target").unwrap_err();
        assert!(matches!(err, TabprepError::UnseenLabel { .. }));
    }

    #[test]
    fn test_persist_context() {
        let failing: Result<()> = Err(TabprepError::SerializationError("bad".into()));
        let err = failing.persist_context(Path::new("out/train.bin")).unwrap_err();
        assert!(matches!(err, TabprepError::Persistence { .. }));
        assert!(err.to_string().contains("out/train.bin"));
    }
}
