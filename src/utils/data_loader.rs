//! Data loading utilities

use crate::error::{Result, TabprepError};
use polars::prelude::*;
use std::fs::File;
use std::path::Path;
use std::time::Instant;
use tracing::debug;

/// Tokens read as missing besides empty fields
const NULL_TOKENS: [&str; 2] = ["na", "NA"];

/// CSV loader for the validated train/test files
pub struct DataLoader {
    /// Rows used for schema inference, `None` scans the whole file
    infer_schema_length: Option<usize>,
    delimiter: u8,
}

impl Default for DataLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl DataLoader {
    /// Create a new data loader
    pub fn new() -> Self {
        Self {
            infer_schema_length: Some(1000),
            delimiter: b',',
        }
    }

    /// Set the number of rows used to infer column types
    pub fn with_infer_schema_length(mut self, rows: Option<usize>) -> Self {
        self.infer_schema_length = rows;
        self
    }

    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Load a CSV file with a header row
    pub fn load_csv(&self, path: impl AsRef<Path>) -> Result<DataFrame> {
        let path = path.as_ref();
        let start = Instant::now();
        let file = File::open(path)
            .map_err(|e| TabprepError::DataError(format!("{}: {e}", path.display())))?;

        let null_values = NullValues::AllColumns(NULL_TOKENS.iter().map(|s| (*s).into()).collect());
        let parse_opts = CsvParseOptions::default()
            .with_separator(self.delimiter)
            .with_null_values(Some(null_values));

        let df = CsvReadOptions::default()
            .with_has_header(true)
            .with_infer_schema_length(self.infer_schema_length)
            .with_parse_options(parse_opts)
            .into_reader_with_file_handle(file)
            .finish()
            .map_err(|e| TabprepError::DataError(format!("{}: {e}", path.display())))?;

        debug!(
            path = %path.display(),
            rows = df.height(),
            columns = df.width(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Loaded CSV"
        );
        Ok(df)
    }
}
