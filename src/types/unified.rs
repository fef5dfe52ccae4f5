//! The pipeline's output: one daily-indexed table covering every year.

use crate::types::cell::CellValue;
use crate::types::station::CompositeStationKey;
use crate::types::table::{StationColumn, StationTable};
use chrono::NaiveDate;
use log::{debug, warn};
use polars::prelude::*;

/// Name of the date column in exported frames.
pub const DATE_COLUMN: &str = "date";

/// Readings for the common station set across all years.
///
/// Rows are calendar dates in non-decreasing order (hourly readings keep one
/// row each, so a date usually repeats); columns are [`CompositeStationKey`]s,
/// identical for the whole series.
#[derive(Debug, Clone, PartialEq)]
pub struct UnifiedTimeSeries {
    table: StationTable<NaiveDate, CompositeStationKey>,
}

impl UnifiedTimeSeries {
    pub fn new(table: StationTable<NaiveDate, CompositeStationKey>) -> Self {
        Self { table }
    }

    pub fn table(&self) -> &StationTable<NaiveDate, CompositeStationKey> {
        &self.table
    }

    pub fn into_table(self) -> StationTable<NaiveDate, CompositeStationKey> {
        self.table
    }

    pub fn dates(&self) -> &[NaiveDate] {
        self.table.index()
    }

    pub fn keys(&self) -> impl Iterator<Item = &CompositeStationKey> + '_ {
        self.table.keys()
    }

    pub fn height(&self) -> usize {
        self.table.height()
    }

    pub fn width(&self) -> usize {
        self.table.width()
    }

    pub fn column(&self, key: &CompositeStationKey) -> Option<&StationColumn<CompositeStationKey>> {
        self.table.column(key)
    }

    /// Looks a column up by station code alone.
    pub fn column_by_code(&self, code: &str) -> Option<&StationColumn<CompositeStationKey>> {
        self.table.columns().iter().find(|c| c.key.code == code)
    }

    /// All columns whose station reports for `city`.
    pub fn columns_for_city<'a>(
        &'a self,
        city: &'a str,
    ) -> impl Iterator<Item = &'a StationColumn<CompositeStationKey>> + 'a {
        self.table.columns().iter().filter(move |c| c.key.city == city)
    }

    /// The cells recorded on `date`, one per row carrying that date.
    pub fn values_on(&self, date: NaiveDate, key: &CompositeStationKey) -> Vec<&CellValue> {
        let Some(column) = self.column(key) else {
            return Vec::new();
        };
        self.dates()
            .iter()
            .zip(column.values.iter())
            .filter(|(d, _)| **d == date)
            .map(|(_, v)| v)
            .collect()
    }

    /// Exports the series as a polars `DataFrame`.
    ///
    /// The frame has a `date` column of type `Date` followed by one `Float64`
    /// column per station, named `"{code} ({city})"`. Cells that never became
    /// numeric (free-text flags) are exported as nulls; their count is logged.
    pub fn to_frame(&self) -> PolarsResult<DataFrame> {
        let mut columns: Vec<Column> = Vec::with_capacity(self.width() + 1);
        columns.push(Column::new(DATE_COLUMN.into(), self.dates().to_vec()));

        let mut text_cells = 0usize;
        for station in self.table.columns() {
            let values: Vec<Option<f64>> = station
                .values
                .iter()
                .map(|cell| match cell {
                    CellValue::Number(v) => Some(*v),
                    CellValue::Text(_) => {
                        text_cells += 1;
                        None
                    }
                    CellValue::Missing => None,
                })
                .collect();
            columns.push(Column::new(station.key.to_string().into(), values));
        }

        if text_cells > 0 {
            warn!(
                "{} non-numeric cells exported as nulls in unified frame",
                text_cells
            );
        }
        let df = DataFrame::new(columns)?;
        debug!("Exported unified series with shape {:?}", df.shape());
        Ok(df)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn sample() -> UnifiedTimeSeries {
        let table = StationTable::from_columns(
            vec![date(2015, 1, 1), date(2015, 1, 1), date(2015, 1, 2)],
            vec![
                (
                    CompositeStationKey::new("A", "Katowice"),
                    vec![CellValue::Number(10.0), CellValue::Number(12.0), CellValue::Missing],
                ),
                (
                    CompositeStationKey::new("B", "Warszawa"),
                    vec![CellValue::Number(1.5), CellValue::from("b.d."), CellValue::Number(3.0)],
                ),
            ],
        )
        .unwrap();
        UnifiedTimeSeries::new(table)
    }

    #[test]
    fn test_lookup_by_city_and_code() {
        let series = sample();
        let katowice: Vec<_> = series.columns_for_city("Katowice").collect();
        assert_eq!(katowice.len(), 1);
        assert_eq!(katowice[0].key.code, "A");
        assert!(series.column_by_code("B").is_some());
        assert!(series.column_by_code("C").is_none());
    }

    #[test]
    fn test_values_on_date() {
        let series = sample();
        let key = CompositeStationKey::new("A", "Katowice");
        let values = series.values_on(date(2015, 1, 1), &key);
        assert_eq!(values, vec![&CellValue::Number(10.0), &CellValue::Number(12.0)]);
    }

    #[test]
    fn test_to_frame_schema() -> Result<(), Box<dyn std::error::Error>> {
        let df = sample().to_frame()?;
        assert_eq!(df.shape(), (3, 3));
        assert_eq!(df.column(DATE_COLUMN)?.dtype(), &DataType::Date);

        let b = df.column("B (Warszawa)")?.f64()?;
        assert_eq!(b.get(0), Some(1.5));
        assert_eq!(b.get(1), None);
        assert_eq!(b.get(2), Some(3.0));
        Ok(())
    }
}
