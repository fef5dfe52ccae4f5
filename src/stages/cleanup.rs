//! Explicit row removal for rows that are not readings (header remnants,
//! unit rows, averaging-period rows left over from spreadsheet exports).

use crate::report::RowCleanupReport;
use crate::types::table::{StationTable, YearlyTable};
use log::{info, warn};
use std::collections::BTreeSet;

/// Removes the rows at `positions` from a copy of `table`.
///
/// Positions past the end of the table are not an error: they are returned as
/// missing so the caller can report them. Duplicate positions count once.
pub fn drop_rows<I: Clone, K: Clone>(
    table: &StationTable<I, K>,
    positions: &[usize],
) -> (StationTable<I, K>, usize, Vec<usize>) {
    let requested: BTreeSet<usize> = positions.iter().copied().collect();
    let (present, missing): (Vec<usize>, Vec<usize>) =
        requested.iter().partition(|&&p| p < table.height());

    let keep: Vec<usize> = (0..table.height())
        .filter(|p| !requested.contains(p))
        .collect();
    (table.take_rows(&keep), present.len(), missing)
}

/// Applies [`drop_rows`] to one year and logs the outcome.
pub fn clean_year<K: Clone>(
    yearly: &YearlyTable<K>,
    positions: &[usize],
) -> (YearlyTable<K>, RowCleanupReport) {
    let (table, removed, missing) = drop_rows(&yearly.table, positions);
    if removed > 0 {
        info!("Year {}: removed {} rows", yearly.year, removed);
    }
    if !missing.is_empty() {
        warn!(
            "Year {}: rows {:?} do not exist, skipping removal",
            yearly.year, missing
        );
    }
    (
        YearlyTable::new(yearly.year, table),
        RowCleanupReport {
            year: yearly.year,
            removed,
            missing,
        },
    )
}
