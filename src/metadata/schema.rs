//! Station metadata: the validated, read-only source of truth for code
//! resolution and city attachment.

use crate::metadata::error::MetadataError;
use crate::types::station::StationMetadataEntry;
use log::{debug, info, warn};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Names of the metadata fields the pipeline depends on.
///
/// Defaults follow the GIOŚ station metadata workbook, where the historical
/// code header contains a line break.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetadataSchema {
    pub current_field: String,
    pub historical_field: String,
    pub city_field: String,
    /// Separator between several historical codes in one field.
    pub list_delimiter: char,
}

impl Default for MetadataSchema {
    fn default() -> Self {
        Self {
            current_field: "Kod stacji".to_string(),
            historical_field: "Stary Kod stacji \n(o ile inny od aktualnego)".to_string(),
            city_field: "Miejscowość".to_string(),
            list_delimiter: ',',
        }
    }
}

/// Validated station metadata, indexed by current station code.
#[derive(Debug, Clone)]
pub struct StationMetadata {
    entries: Vec<StationMetadataEntry>,
    by_code: HashMap<String, usize>,
    list_delimiter: char,
}

impl Default for StationMetadata {
    fn default() -> Self {
        Self::from_entries(Vec::new(), MetadataSchema::default().list_delimiter)
    }
}

impl StationMetadata {
    /// Builds metadata from already-typed entries.
    ///
    /// If a code appears twice, lookups resolve to the later entry, matching
    /// how a keyed metadata sheet is read.
    pub fn from_entries(entries: Vec<StationMetadataEntry>, list_delimiter: char) -> Self {
        let by_code = entries
            .iter()
            .enumerate()
            .map(|(i, e)| (e.code.clone(), i))
            .collect();
        Self {
            entries,
            by_code,
            list_delimiter,
        }
    }

    /// Reads metadata from a polars `DataFrame`, enforcing `schema`.
    ///
    /// The current-code and historical-code fields must be present as columns;
    /// historical values may be null. The city field is optional: without it
    /// every station gets the unknown-city sentinel downstream. Non-string
    /// columns are rendered to text.
    ///
    /// # Errors
    ///
    /// * [`MetadataError::MissingField`] naming the first absent field together
    ///   with the fields that are available. Nothing can be resolved without
    ///   them, so this aborts a run before any table is touched.
    /// * [`MetadataError::InvalidCode`] if a row has a null or blank current code.
    pub fn from_frame(df: &DataFrame, schema: &MetadataSchema) -> Result<Self, MetadataError> {
        let available: Vec<String> = df
            .get_column_names()
            .into_iter()
            .map(|n| n.to_string())
            .collect();
        for field in [&schema.current_field, &schema.historical_field] {
            if !available.iter().any(|a| a == field) {
                return Err(MetadataError::MissingField {
                    field: field.clone(),
                    available,
                });
            }
        }

        let codes = string_values(df.column(&schema.current_field)?)?;
        let historical = string_values(df.column(&schema.historical_field)?)?;
        let cities = if available.iter().any(|a| a == &schema.city_field) {
            string_values(df.column(&schema.city_field)?)?
        } else {
            warn!(
                "Metadata has no '{}' field; no station will have a city",
                schema.city_field
            );
            vec![None; df.height()]
        };

        let mut entries = Vec::with_capacity(df.height());
        for (row, ((code, old), city)) in codes
            .into_iter()
            .zip(historical)
            .zip(cities)
            .enumerate()
        {
            let code = match code {
                Some(c) if !c.trim().is_empty() => c.trim().to_string(),
                _ => return Err(MetadataError::InvalidCode { row }),
            };
            let city = city
                .map(|c| c.trim().to_string())
                .filter(|c| !c.is_empty());
            entries.push(StationMetadataEntry {
                code,
                city,
                historical_codes: old.into_iter().collect(),
            });
        }

        info!(
            "Loaded metadata for {} stations ({} with historical codes)",
            entries.len(),
            entries
                .iter()
                .filter(|e| !e.historical_codes.is_empty())
                .count()
        );
        Ok(Self::from_entries(entries, schema.list_delimiter))
    }

    pub fn entries(&self) -> &[StationMetadataEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn list_delimiter(&self) -> char {
        self.list_delimiter
    }

    pub fn get(&self, code: &str) -> Option<&StationMetadataEntry> {
        self.by_code.get(code).map(|&i| &self.entries[i])
    }

    /// The city recorded for a current station code, if any.
    pub fn city_of(&self, code: &str) -> Option<&str> {
        self.get(code).and_then(|e| e.city.as_deref())
    }
}

/// Renders every value of a column as an optional string.
fn string_values(column: &Column) -> PolarsResult<Vec<Option<String>>> {
    if column.dtype() == &DataType::String {
        return Ok(column
            .str()?
            .into_iter()
            .map(|v| v.map(str::to_string))
            .collect());
    }
    debug!(
        "Casting metadata column '{}' of type {} to text",
        column.name(),
        column.dtype()
    );
    let cast = column.cast(&DataType::String)?;
    Ok(cast
        .str()?
        .into_iter()
        .map(|v| v.map(str::to_string))
        .collect())
}
