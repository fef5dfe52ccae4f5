//! Restricts every year to the stations reported in all years.
//!
//! Later statistics compare the same physical stations across years, so a
//! station missing from any year is dropped everywhere rather than padded.

use crate::report::{ReductionReport, YearReduction};
use crate::types::table::YearlyTable;
use log::info;
use std::collections::BTreeSet;

/// The set intersection of column keys across `tables`, in ascending order.
pub fn common_stations<K: Ord + Clone>(tables: &[YearlyTable<K>]) -> Vec<K> {
    let mut iter = tables.iter();
    let Some(first) = iter.next() else {
        return Vec::new();
    };
    let mut common: BTreeSet<K> = first.table.keys().cloned().collect();
    for yearly in iter {
        let keys: BTreeSet<&K> = yearly.table.keys().collect();
        common.retain(|k| keys.contains(k));
    }
    common.into_iter().collect()
}

/// Keeps exactly the common stations in every table, sorted by key so all
/// tables share one column order.
///
/// An empty collection is returned unchanged.
pub fn reduce_to_common_stations<K: Ord + Clone>(
    tables: &[YearlyTable<K>],
) -> (Vec<YearlyTable<K>>, ReductionReport) {
    if tables.is_empty() {
        info!("No yearly tables to reduce");
        return (Vec::new(), ReductionReport::default());
    }

    let common = common_stations(tables);
    info!(
        "Found {} stations common to all {} years",
        common.len(),
        tables.len()
    );

    let mut report = ReductionReport {
        common_stations: common.len(),
        years: Vec::with_capacity(tables.len()),
    };
    let reduced = tables
        .iter()
        .map(|yearly| {
            let table = yearly.table.select(&common);
            let dropped = yearly.table.width() - table.width();
            info!(
                "Year {}: dropped {} stations ({} kept)",
                yearly.year,
                dropped,
                table.width()
            );
            report.years.push(YearReduction {
                year: yearly.year,
                dropped,
                kept: table.width(),
            });
            YearlyTable::new(yearly.year, table)
        })
        .collect();
    (reduced, report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::table::StationTable;
    use chrono::NaiveDate;

    fn year(year: i32, codes: &[&str]) -> YearlyTable {
        let ts = NaiveDate::from_ymd_opt(year, 1, 1)
            .unwrap()
            .and_hms_opt(1, 0, 0)
            .unwrap();
        let table = StationTable::from_columns(
            vec![ts],
            codes.iter().map(|c| (c.to_string(), vec![1.0])),
        )
        .unwrap();
        YearlyTable::new(year, table)
    }

    #[test]
    fn test_every_table_gets_sorted_intersection() {
        let tables = vec![
            year(2014, &["C", "A", "B", "D"]),
            year(2015, &["B", "C", "A"]),
            year(2016, &["A", "E", "C", "B"]),
        ];
        let (reduced, report) = reduce_to_common_stations(&tables);

        let expected = vec!["A".to_string(), "B".to_string(), "C".to_string()];
        for yearly in &reduced {
            let keys: Vec<_> = yearly.table.keys().cloned().collect();
            assert_eq!(keys, expected);
        }
        assert_eq!(report.common_stations, 3);
        assert_eq!(report.dropped_for(2014), Some(1));
        assert_eq!(report.dropped_for(2015), Some(0));
        assert_eq!(report.dropped_for(2016), Some(1));
    }

    #[test]
    fn test_empty_input_is_noop() {
        let (reduced, report) = reduce_to_common_stations::<String>(&[]);
        assert!(reduced.is_empty());
        assert_eq!(report, ReductionReport::default());
    }

    #[test]
    fn test_disjoint_years_keep_no_stations() {
        let tables = vec![year(2014, &["A"]), year(2015, &["B"])];
        let (reduced, report) = reduce_to_common_stations(&tables);
        assert!(reduced.iter().all(|y| y.table.width() == 0));
        // Rows are kept even when no station survives.
        assert!(reduced.iter().all(|y| y.table.height() == 1));
        assert_eq!(report.common_stations, 0);
    }
}
