use polars::error::PolarsError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MetadataError {
    /// A field the schema requires is not present in the metadata table.
    #[error("Metadata field '{field}' not found; available fields: {available:?}")]
    MissingField {
        field: String,
        available: Vec<String>,
    },

    #[error("Metadata row {row} has no current station code")]
    InvalidCode { row: usize },

    #[error("Station rename history contains a cycle: {}", chain.join(" -> "))]
    RenameCycle { chain: Vec<String> },

    #[error("Failed reading metadata frame: {0}")]
    Polars(#[from] PolarsError),
}
