//! Normalization of the "hour 24:00" reporting convention.
//!
//! Agencies report a day's last hourly reading as 24:00 of that day, which
//! timestamp parsers encode as 00:00 of the following day. Left alone, every
//! day's final reading lands on the next day. A reading stamped exactly
//! midnight is therefore moved back one second (23:59:59 of the previous
//! day) before the time of day is dropped.

use crate::report::MidnightReport;
use crate::types::table::StationTable;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime, TimeDelta};
use log::info;

/// A row index value that can be collapsed to a calendar date.
pub trait CalendarStamp {
    /// The calendar date the reading belongs to, and whether the hour-24
    /// convention moved it.
    fn calendar_date(&self) -> (NaiveDate, bool);
}

impl CalendarStamp for NaiveDateTime {
    fn calendar_date(&self) -> (NaiveDate, bool) {
        if self.time() != NaiveTime::MIN {
            return (self.date(), false);
        }
        match self.checked_sub_signed(TimeDelta::seconds(1)) {
            Some(shifted) => (shifted.date(), true),
            None => (self.date(), false),
        }
    }
}

/// Dates carry no time of day, so there is nothing left to shift.
impl CalendarStamp for NaiveDate {
    fn calendar_date(&self) -> (NaiveDate, bool) {
        (*self, false)
    }
}

/// Rewrites the row index of `table` to calendar dates, applying the hour-24
/// correction. Cells and columns are untouched and no row is removed.
///
/// Idempotent: the output is date-indexed, and normalizing a date-indexed
/// table returns it unchanged.
pub fn normalize_midnight<I, K>(table: &StationTable<I, K>) -> (StationTable<NaiveDate, K>, MidnightReport)
where
    I: CalendarStamp,
    K: Clone,
{
    let mut shifted = 0usize;
    let dates: Vec<NaiveDate> = table
        .index()
        .iter()
        .map(|stamp| {
            let (date, moved) = stamp.calendar_date();
            if moved {
                shifted += 1;
            }
            date
        })
        .collect();

    info!(
        "Moved {} midnight readings to the previous day ({} rows)",
        shifted,
        dates.len()
    );
    let report = MidnightReport {
        rows: dates.len(),
        shifted,
    };
    (
        StationTable::from_parts(dates, table.columns().to_vec()),
        report,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::cell::CellValue;

    fn ts(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S").unwrap()
    }

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_midnight_moves_to_previous_day() {
        let table = StationTable::from_columns(
            vec![ts("2024-01-01T12:00:00"), ts("2024-01-02T00:00:00")],
            vec![("A".to_string(), vec![3.0, 42.0])],
        )
        .unwrap();
        let (fixed, report) = normalize_midnight(&table);

        assert_eq!(fixed.index(), &[date("2024-01-01"), date("2024-01-01")]);
        assert_eq!(
            fixed.columns()[0].values,
            vec![CellValue::Number(3.0), CellValue::Number(42.0)]
        );
        assert_eq!(report, MidnightReport { rows: 2, shifted: 1 });
    }

    #[test]
    fn test_only_exact_midnight_is_shifted() {
        let table = StationTable::from_columns(
            vec![ts("2024-03-01T00:00:01"), ts("2024-03-01T00:30:00")],
            vec![("A".to_string(), vec![1.0, 2.0])],
        )
        .unwrap();
        let (fixed, report) = normalize_midnight(&table);
        assert_eq!(fixed.index(), &[date("2024-03-01"), date("2024-03-01")]);
        assert_eq!(report.shifted, 0);
    }

    #[test]
    fn test_year_boundary() {
        let (date, moved) = ts("2015-01-01T00:00:00").calendar_date();
        assert_eq!(date, NaiveDate::from_ymd_opt(2014, 12, 31).unwrap());
        assert!(moved);
    }

    #[test]
    fn test_second_application_is_noop() {
        let table = StationTable::from_columns(
            vec![ts("2024-01-01T23:00:00"), ts("2024-01-02T00:00:00")],
            vec![("A".to_string(), vec![5.0, 6.0])],
        )
        .unwrap();
        let (once, _) = normalize_midnight(&table);
        let (twice, report) = normalize_midnight(&once);
        assert_eq!(once, twice);
        assert_eq!(report.shifted, 0);
    }
}
