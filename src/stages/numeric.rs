//! Numeric normalization of locale-formatted cells.

use crate::report::NormalizationReport;
use crate::types::cell::CellValue;
use crate::types::table::{StationTable, YearlyTable};
use log::debug;

/// Interprets `raw` as a number after swapping the locale decimal separator
/// for '.'. Non-finite results are rejected so flags such as "NaN" stay text.
pub fn parse_locale_number(raw: &str, decimal_separator: char) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    let candidate = if decimal_separator == '.' {
        trimmed.to_string()
    } else {
        trimmed.replace(decimal_separator, ".")
    };
    candidate.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Converts one cell. Numbers and missing cells pass through; text that
/// parses becomes a number, anything else keeps its original text.
pub fn normalize_cell(cell: &CellValue, decimal_separator: char) -> CellValue {
    match cell {
        CellValue::Text(raw) => match parse_locale_number(raw, decimal_separator) {
            Some(v) => CellValue::Number(v),
            None => cell.clone(),
        },
        other => other.clone(),
    }
}

/// Returns a normalized copy of `table` and the number of cells whose
/// stringified value changed.
///
/// The input is left untouched so callers can diff before and after. A cell
/// counts as changed only when its rendered form differs. Numbers render with
/// a fractional part, so `"12"` becoming `12.0` and `"12,5"` becoming `12.5`
/// are changes while `"12.5"` becoming `12.5` is not.
pub fn normalize_table<I: Clone, K: Clone>(
    table: &StationTable<I, K>,
    decimal_separator: char,
) -> (StationTable<I, K>, usize) {
    let mut changed = 0usize;
    let normalized = table.map_cells(|cell| {
        let out = normalize_cell(cell, decimal_separator);
        if matches!(cell, CellValue::Text(_)) && out.to_string() != cell.to_string() {
            changed += 1;
        }
        out
    });
    (normalized, changed)
}

pub fn normalize_year<K: Clone>(
    yearly: &YearlyTable<K>,
    decimal_separator: char,
) -> (YearlyTable<K>, NormalizationReport) {
    let (table, cells_changed) = normalize_table(&yearly.table, decimal_separator);
    debug!(
        "Year {}: normalized {} cells to numbers",
        yearly.year, cells_changed
    );
    (
        YearlyTable::new(yearly.year, table),
        NormalizationReport {
            year: yearly.year,
            cells_changed,
        },
    )
}
