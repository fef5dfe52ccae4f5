//! Run configuration for the harmonization pipeline.

use crate::metadata::schema::MetadataSchema;
use crate::types::station::UNKNOWN_CITY;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{0}'")]
    Read(PathBuf, #[source] std::io::Error),

    #[error("Failed to parse config")]
    Parse(#[from] serde_json::Error),
}

/// Settings shared by every stage of a run.
///
/// All fields have defaults matching the GIOŚ PM2.5 archive exports, so an
/// empty JSON object (`{}`) is a valid configuration.
///
/// # Examples
///
/// ```
/// use airseries::HarmonizeConfig;
///
/// let config = HarmonizeConfig::from_json_str(r#"{ "unknown_city": "Nieznane" }"#).unwrap();
/// assert_eq!(config.unknown_city, "Nieznane");
/// assert_eq!(config.decimal_separator, ',');
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HarmonizeConfig {
    /// Decimal separator used by the source locale; replaced with '.' before parsing.
    pub decimal_separator: char,
    /// City recorded for stations without a metadata match.
    pub unknown_city: String,
    /// Field names expected in the station metadata table.
    pub metadata: MetadataSchema,
    /// Run per-year stages on the rayon thread pool.
    pub parallel: bool,
    /// Upper bound on code resolution passes per year. `None` derives the
    /// bound from the longest rename chain in the metadata.
    pub max_resolution_passes: Option<usize>,
    /// Row positions to remove from a year's table before normalization
    /// (header remnants, unit rows and the like).
    pub rows_to_drop: BTreeMap<i32, Vec<usize>>,
}

impl Default for HarmonizeConfig {
    fn default() -> Self {
        Self {
            decimal_separator: ',',
            unknown_city: UNKNOWN_CITY.to_string(),
            metadata: MetadataSchema::default(),
            parallel: true,
            max_resolution_passes: None,
            rows_to_drop: BTreeMap::new(),
        }
    }
}

impl HarmonizeConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Read(path.to_path_buf(), e))?;
        Self::from_json_str(&raw)
    }
}
