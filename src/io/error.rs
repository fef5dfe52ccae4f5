use polars::error::PolarsError;
use polars::prelude::DataType;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("Failed to read CSV file '{0}'")]
    CsvRead(PathBuf, #[source] PolarsError),

    #[error("I/O error writing parquet file '{0}'")]
    ParquetWriteIo(PathBuf, #[source] std::io::Error),

    #[error("Encoding error writing parquet file '{0}'")]
    ParquetWritePolars(PathBuf, #[source] PolarsError),

    #[error("Timestamp column '{column}' not found in table for year {year}; available columns: {available:?}")]
    MissingTimestampColumn {
        year: i32,
        column: String,
        available: Vec<String>,
    },

    // Rows are never dropped silently, so an unreadable timestamp fails the load.
    #[error("Could not parse timestamp '{value}' in row {row} of year {year}")]
    TimestampParse { year: i32, row: usize, value: String },

    #[error("Timestamp column of year {year} has unsupported type {dtype}")]
    UnsupportedTimestampType { year: i32, dtype: DataType },

    #[error("Failed processing DataFrame: {0}")]
    Polars(#[from] PolarsError),
}
