//! Station identity: metadata entries describing a monitoring station and the
//! composite `(code, city)` key used as column label once tables are annotated.

use serde::{Deserialize, Serialize};
use std::fmt;

/// City recorded for stations that have no metadata match.
pub const UNKNOWN_CITY: &str = "unknown";

/// One row of station metadata, keyed by the station's current code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StationMetadataEntry {
    /// The code the agency uses for this station today (e.g. "MzWarAlNiepo").
    pub code: String,
    /// The locality the station reports for, if known.
    pub city: Option<String>,
    /// Codes this station was published under before. Each field may itself be
    /// a delimited list (e.g. "MzWarszNiepodKom, MzWarNiepodKom").
    #[serde(default)]
    pub historical_codes: Vec<String>,
}

impl StationMetadataEntry {
    pub fn new(code: impl Into<String>, city: Option<&str>) -> Self {
        Self {
            code: code.into(),
            city: city.map(str::to_string),
            historical_codes: Vec::new(),
        }
    }

    /// Adds a historical code field, which may hold several delimited codes.
    pub fn with_historical(mut self, codes: impl Into<String>) -> Self {
        self.historical_codes.push(codes.into());
        self
    }

    /// Splits every historical field on `delimiter` and trims each token.
    /// Empty tokens are skipped.
    pub fn historical_tokens(&self, delimiter: char) -> impl Iterator<Item = &str> + '_ {
        self.historical_codes
            .iter()
            .flat_map(move |field| field.split(delimiter))
            .map(str::trim)
            .filter(|token| !token.is_empty())
    }
}

/// Column key after city annotation.
///
/// The code is always a current (post-resolution) station code; the city is
/// never absent and falls back to [`UNKNOWN_CITY`] (or the configured
/// sentinel). Ordering is by code first, so annotated tables keep the
/// lexicographic column order established by the reducer.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CompositeStationKey {
    pub code: String,
    pub city: String,
}

impl CompositeStationKey {
    pub fn new(code: impl Into<String>, city: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            city: city.into(),
        }
    }
}

/// Formats as `"{code} ({city})"`, which is also the exported column name.
impl fmt::Display for CompositeStationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.code, self.city)
    }
}
