//! Adapters between polars frames/files and the pipeline's tables.
//!
//! Acquisition itself (archive downloads, picking the right sheet out of a
//! zip) happens elsewhere; these helpers only accept what that produced: a
//! `DataFrame` or a CSV/parquet file on disk.

use crate::io::error::LoadError;
use crate::metadata::error::MetadataError;
use crate::metadata::schema::{MetadataSchema, StationMetadata};
use crate::types::cell::CellValue;
use crate::types::table::{StationColumn, StationTable, YearlyTable};
use bon::builder;
use chrono::{DateTime, NaiveDateTime};
use log::{debug, info};
use polars::prelude::*;
use std::fs::File;
use std::path::Path;

const TIMESTAMP_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M:%S",
    "%d.%m.%Y %H:%M",
];

/// Parses a raw export timestamp in any of the known formats.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
}

impl YearlyTable<String> {
    /// Converts a yearly export frame into a raw [`YearlyTable`].
    ///
    /// `timestamp_column` becomes the row index; it may be `Datetime` or
    /// `String` typed. Every other column is a station: string values are
    /// kept as raw text for the numeric normalizer, numeric values become
    /// numbers and nulls become missing cells.
    ///
    /// # Errors
    ///
    /// * [`LoadError::MissingTimestampColumn`] if the column is absent.
    /// * [`LoadError::TimestampParse`] for a null or unparseable timestamp. Rows
    ///   are never dropped to get past a bad timestamp.
    /// * [`LoadError::UnsupportedTimestampType`] for other column types,
    ///   including `Date`: readings without a time of day cannot be told apart
    ///   from hour-24 readings.
    pub fn from_frame(
        year: i32,
        df: &DataFrame,
        timestamp_column: &str,
    ) -> Result<Self, LoadError> {
        let ts_column = df
            .column(timestamp_column)
            .map_err(|_| LoadError::MissingTimestampColumn {
                year,
                column: timestamp_column.to_string(),
                available: df
                    .get_column_names()
                    .into_iter()
                    .map(|n| n.to_string())
                    .collect(),
            })?;
        let index = timestamps(year, ts_column)?;

        let mut columns = Vec::with_capacity(df.width().saturating_sub(1));
        for column in df.get_columns() {
            if column.name().as_str() == timestamp_column {
                continue;
            }
            columns.push(StationColumn::new(
                column.name().to_string(),
                raw_cells(column)?,
            ));
        }

        debug!(
            "Year {}: read {} rows for {} stations from frame",
            year,
            index.len(),
            columns.len()
        );
        Ok(YearlyTable::new(year, StationTable::from_parts(index, columns)))
    }
}

fn timestamps(year: i32, column: &Column) -> Result<Vec<NaiveDateTime>, LoadError> {
    match column.dtype() {
        DataType::String => column
            .str()?
            .into_iter()
            .enumerate()
            .map(|(row, raw)| {
                raw.and_then(parse_timestamp)
                    .ok_or_else(|| LoadError::TimestampParse {
                        year,
                        row,
                        value: raw.unwrap_or("null").to_string(),
                    })
            })
            .collect(),
        DataType::Datetime(_, _) => {
            let millis = column
                .cast(&DataType::Datetime(TimeUnit::Milliseconds, None))?
                .cast(&DataType::Int64)?;
            millis
                .i64()?
                .into_iter()
                .enumerate()
                .map(|(row, ms)| {
                    ms.and_then(DateTime::from_timestamp_millis)
                        .map(|dt| dt.naive_utc())
                        .ok_or_else(|| LoadError::TimestampParse {
                            year,
                            row,
                            value: ms.map_or_else(|| "null".to_string(), |v| v.to_string()),
                        })
                })
                .collect()
        }
        // A bare date reads as 00:00, which the hour-24 correction would move
        // to the previous day.
        other => Err(LoadError::UnsupportedTimestampType {
            year,
            dtype: other.clone(),
        }),
    }
}

fn raw_cells(column: &Column) -> PolarsResult<Vec<CellValue>> {
    if column.dtype() == &DataType::String {
        return Ok(column
            .str()?
            .into_iter()
            .map(|v| v.map_or(CellValue::Missing, |s| CellValue::Text(s.to_string())))
            .collect());
    }
    let numeric = column.cast(&DataType::Float64)?;
    Ok(numeric
        .f64()?
        .into_iter()
        .map(|v| v.map_or(CellValue::Missing, CellValue::Number))
        .collect())
}

/// Reads a CSV file with every column as text, so locale formatting survives
/// until the numeric normalizer sees it.
pub fn read_csv_frame(path: &Path, separator: u8) -> Result<DataFrame, LoadError> {
    let df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(0))
        .map_parse_options(|opts| opts.with_separator(separator))
        .try_into_reader_with_file_path(Some(path.to_path_buf()))
        .map_err(|e| LoadError::CsvRead(path.to_path_buf(), e))?
        .finish()
        .map_err(|e| LoadError::CsvRead(path.to_path_buf(), e))?;
    info!("Read {:?} with shape {:?}", path, df.shape());
    Ok(df)
}

/// Reads one year's export from CSV.
///
/// The timestamp column defaults to the first column and the separator to
/// `;` (the usual choice when ',' is the decimal separator).
///
/// # Examples
///
/// ```no_run
/// # use airseries::read_yearly_csv;
/// # use std::path::Path;
/// let table = read_yearly_csv()
///     .path(Path::new("data/2015.csv"))
///     .year(2015)
///     .call()?;
/// println!("{} stations", table.table.width());
/// # Ok::<(), airseries::LoadError>(())
/// ```
#[builder]
pub fn read_yearly_csv(
    path: &Path,
    year: i32,
    timestamp_column: Option<&str>,
    separator: Option<u8>,
) -> Result<YearlyTable<String>, LoadError> {
    let df = read_csv_frame(path, separator.unwrap_or(b';'))?;
    let first = df
        .get_column_names()
        .first()
        .map(|n| n.to_string())
        .unwrap_or_default();
    let timestamp_column = timestamp_column.unwrap_or(&first);
    YearlyTable::from_frame(year, &df, timestamp_column)
}

/// Reads station metadata from CSV, enforcing `schema`.
pub fn read_metadata_csv(
    path: &Path,
    schema: &MetadataSchema,
    separator: u8,
) -> Result<StationMetadata, MetadataError> {
    let df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(0))
        .map_parse_options(|opts| opts.with_separator(separator))
        .try_into_reader_with_file_path(Some(path.to_path_buf()))?
        .finish()?;
    StationMetadata::from_frame(&df, schema)
}

/// Writes a frame as Snappy-compressed parquet.
pub fn write_parquet(df: &mut DataFrame, path: &Path) -> Result<(), LoadError> {
    let file =
        File::create(path).map_err(|e| LoadError::ParquetWriteIo(path.to_path_buf(), e))?;
    ParquetWriter::new(file)
        .with_compression(ParquetCompression::Snappy)
        .finish(df)
        .map_err(|e| LoadError::ParquetWritePolars(path.to_path_buf(), e))?;
    info!("Wrote {} rows to {:?}", df.height(), path);
    Ok(())
}
