use crate::config::ConfigError;
use crate::io::error::LoadError;
use crate::metadata::error::MetadataError;
use polars::error::PolarsError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HarmonizeError {
    #[error(transparent)]
    Metadata(#[from] MetadataError),

    #[error(transparent)]
    Load(#[from] LoadError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A table handed to the merger does not carry the same stations as the
    /// first table. Upstream reduction guarantees this never happens, so it is
    /// reported instead of repaired.
    #[error("Columns of year {year} differ from the first table: missing {missing:?}, unexpected {unexpected:?}")]
    ColumnMismatch {
        year: i32,
        expected: Vec<String>,
        missing: Vec<String>,
        unexpected: Vec<String>,
    },

    /// An old and a current code of the same station both appear in one year
    /// and report different values for the same rows.
    #[error("Year {year} has several columns resolving to '{code}' that disagree in {conflicting_cells} cells")]
    DuplicateStation {
        year: i32,
        code: String,
        conflicting_cells: usize,
    },

    #[error("Station code resolution for year {year} did not reach a fixed point after {passes} passes")]
    ResolutionDidNotConverge { year: i32, passes: usize },

    #[error("Column '{column}' has {found} cells but the index has {expected} rows")]
    RaggedColumn {
        column: String,
        expected: usize,
        found: usize,
    },

    #[error("Failed processing DataFrame: {0}")]
    Polars(#[from] PolarsError),
}
