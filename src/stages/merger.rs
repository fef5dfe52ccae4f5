//! Chronological concatenation of the annotated yearly tables.

use crate::error::HarmonizeError;
use crate::report::MergeReport;
use crate::types::table::{StationColumn, StationTable, YearlyTable};
use chrono::NaiveDateTime;
use log::info;
use std::collections::HashSet;
use std::fmt::Display;
use std::hash::Hash;

/// Concatenates `tables` row-wise in ascending year order, whatever order they
/// arrive in, then sorts the combined rows by timestamp.
///
/// Every table must carry the same set of column keys as the (earliest)
/// first table. The merger never unions or reindexes: a differing table means
/// an upstream stage was skipped. Tables with the same keys in a different
/// order are aligned to the first table's order. An empty input yields an
/// empty table.
///
/// # Errors
///
/// Returns [`HarmonizeError::ColumnMismatch`] for the first table whose keys
/// differ, listing what is missing and what is unexpected.
pub fn merge_years<K>(
    mut tables: Vec<YearlyTable<K>>,
) -> Result<(StationTable<NaiveDateTime, K>, MergeReport), HarmonizeError>
where
    K: Clone + Eq + Hash + Display,
{
    if tables.is_empty() {
        info!("No yearly tables to merge");
        return Ok((StationTable::empty(), MergeReport::default()));
    }
    tables.sort_by_key(|t| t.year);

    let expected: Vec<K> = tables[0].table.keys().cloned().collect();
    let expected_set: HashSet<&K> = expected.iter().collect();

    let mut index: Vec<NaiveDateTime> = Vec::new();
    let mut columns: Vec<StationColumn<K>> = expected
        .iter()
        .map(|k| StationColumn::new(k.clone(), Vec::new()))
        .collect();
    let mut years = Vec::with_capacity(tables.len());

    for yearly in &tables {
        let keys: HashSet<&K> = yearly.table.keys().collect();
        if keys != expected_set {
            let mut missing: Vec<String> = expected_set
                .difference(&keys)
                .map(|k| k.to_string())
                .collect();
            let mut unexpected: Vec<String> = keys
                .difference(&expected_set)
                .map(|k| k.to_string())
                .collect();
            missing.sort();
            unexpected.sort();
            return Err(HarmonizeError::ColumnMismatch {
                year: yearly.year,
                expected: expected.iter().map(|k| k.to_string()).collect(),
                missing,
                unexpected,
            });
        }

        let aligned = yearly.table.select(&expected);
        index.extend_from_slice(aligned.index());
        for (target, source) in columns.iter_mut().zip(aligned.columns()) {
            target.values.extend_from_slice(&source.values);
        }
        years.push(yearly.year);
    }

    let combined = StationTable::from_parts(index, columns);
    let mut order: Vec<usize> = (0..combined.height()).collect();
    order.sort_by_key(|&i| combined.index()[i]);
    let merged = combined.take_rows(&order);

    info!(
        "Merged {} years into a table of {} rows and {} stations",
        years.len(),
        merged.height(),
        merged.width()
    );
    let report = MergeReport {
        years,
        rows: merged.height(),
        columns: merged.width(),
    };
    Ok((merged, report))
}
