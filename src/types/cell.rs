//! The raw scalar stored in every table cell.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A single cell of a station table.
///
/// Source exports mix numbers, locale-formatted numeric text (`"12,5"`),
/// free text flags and blanks in the same column, so cells keep whichever of
/// these they arrived as until the numeric normalizer converts what it can.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub enum CellValue {
    #[default]
    Missing,
    Number(f64),
    Text(String),
}

impl CellValue {
    pub fn is_missing(&self) -> bool {
        matches!(self, CellValue::Missing)
    }

    /// The numeric value, if this cell holds one.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Number(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            CellValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

/// The "stringified" form of a cell.
///
/// `Missing` renders as `NaN`. Numbers use the shortest representation that
/// round-trips and always carry a fractional part, so `Number(12.0)` renders
/// as `12.0`: both `Text("12")` and `Text("12,5")` render differently from
/// their parsed numbers, while `Text("12.5")` does not.
impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Missing => write!(f, "NaN"),
            CellValue::Number(v) => write!(f, "{:?}", v),
            CellValue::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        CellValue::Number(value)
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        CellValue::Text(value.to_string())
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        CellValue::Text(value)
    }
}

impl<T: Into<CellValue>> From<Option<T>> for CellValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(CellValue::Missing)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_matches_numeric_text() {
        assert_eq!(CellValue::Number(12.0).to_string(), "12.0");
        assert_eq!(CellValue::Number(12.5).to_string(), "12.5");
        assert_eq!(CellValue::Number(-0.75).to_string(), "-0.75");
        assert_eq!(CellValue::from("12").to_string(), "12");
        assert_eq!(CellValue::Missing.to_string(), "NaN");
    }

    #[test]
    fn test_from_option() {
        assert_eq!(CellValue::from(None::<f64>), CellValue::Missing);
        assert_eq!(CellValue::from(Some(3.5)), CellValue::Number(3.5));
        assert_eq!(CellValue::from(Some("x")), CellValue::Text("x".into()));
    }
}
