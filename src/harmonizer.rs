//! The end-to-end pipeline: raw yearly exports in, one unified series out.

use crate::config::HarmonizeConfig;
use crate::error::HarmonizeError;
use crate::metadata::schema::StationMetadata;
use crate::report::{NormalizationReport, PipelineReport, ResolutionReport, RowCleanupReport};
use crate::stages::annotator::annotate_cities;
use crate::stages::cleanup::clean_year;
use crate::stages::merger::merge_years;
use crate::stages::midnight::normalize_midnight;
use crate::stages::numeric::normalize_year;
use crate::stages::reducer::reduce_to_common_stations;
use crate::stages::resolver::{resolve_year, CodeResolutionMap};
use crate::types::table::YearlyTable;
use crate::types::unified::UnifiedTimeSeries;
use bon::bon;
use log::{debug, info};
use rayon::prelude::*;

/// Output of a successful [`Harmonizer::run`].
#[derive(Debug, Clone)]
pub struct Harmonized {
    pub series: UnifiedTimeSeries,
    pub report: PipelineReport,
}

type PreparedYear = (
    YearlyTable<String>,
    RowCleanupReport,
    NormalizationReport,
    ResolutionReport,
);

/// Runs the harmonization stages in order over a set of yearly tables.
///
/// Row cleanup, numeric normalization and code resolution are independent per
/// year and run on the rayon pool when [`HarmonizeConfig::parallel`] is set.
/// Reduction, annotation, merging and the midnight fix need every year at once
/// and run after.
///
/// # Examples
///
/// ```
/// use airseries::{Harmonizer, StationMetadata, StationMetadataEntry, StationTable, YearlyTable};
/// use chrono::NaiveDate;
///
/// let metadata = StationMetadata::from_entries(
///     vec![StationMetadataEntry::new("MzWarAlNiepo", Some("Warszawa")).with_historical("MzWarNiepodKom")],
///     ',',
/// );
/// let noon = |y| NaiveDate::from_ymd_opt(y, 1, 1).unwrap().and_hms_opt(12, 0, 0).unwrap();
/// let tables = vec![
///     YearlyTable::new(2015, StationTable::from_columns(vec![noon(2015)], [("MzWarNiepodKom".to_string(), vec!["21,5"])])?),
///     YearlyTable::new(2016, StationTable::from_columns(vec![noon(2016)], [("MzWarAlNiepo".to_string(), vec!["18"])])?),
/// ];
///
/// let harmonized = Harmonizer::builder().metadata(metadata).build().run(tables)?;
/// assert_eq!(harmonized.series.width(), 1);
/// assert_eq!(harmonized.series.height(), 2);
/// # Ok::<(), airseries::HarmonizeError>(())
/// ```
#[derive(Debug, Clone)]
pub struct Harmonizer {
    metadata: StationMetadata,
    config: HarmonizeConfig,
}

#[bon]
impl Harmonizer {
    #[builder]
    pub fn new(metadata: StationMetadata, config: Option<HarmonizeConfig>) -> Self {
        Self {
            metadata,
            config: config.unwrap_or_default(),
        }
    }

    pub fn metadata(&self) -> &StationMetadata {
        &self.metadata
    }

    pub fn config(&self) -> &HarmonizeConfig {
        &self.config
    }

    /// Harmonizes `tables` into a single date-indexed series.
    ///
    /// # Errors
    ///
    /// * [`HarmonizeError::Metadata`] if the rename graph contains a cycle.
    ///   This is checked before any table is touched.
    /// * [`HarmonizeError::ResolutionDidNotConverge`] if a year needs more
    ///   resolution passes than allowed.
    /// * [`HarmonizeError::DuplicateStation`] if an old and a current code of
    ///   one station report different values in the same year.
    /// * [`HarmonizeError::ColumnMismatch`] if the merger receives tables with
    ///   differing stations.
    pub fn run(&self, mut tables: Vec<YearlyTable<String>>) -> Result<Harmonized, HarmonizeError> {
        let map = CodeResolutionMap::build(&self.metadata)?;
        let max_passes = self
            .config
            .max_resolution_passes
            .unwrap_or(map.longest_chain() + 1);
        info!(
            "Harmonizing {} yearly tables with {} renames (at most {} passes per year)",
            tables.len(),
            map.len(),
            max_passes
        );

        tables.sort_by_key(|t| t.year);
        let prepared: Vec<PreparedYear> = if self.config.parallel {
            tables
                .par_iter()
                .map(|yearly| self.prepare_year(yearly, &map, max_passes))
                .collect::<Result<_, _>>()?
        } else {
            tables
                .iter()
                .map(|yearly| self.prepare_year(yearly, &map, max_passes))
                .collect::<Result<_, _>>()?
        };

        let mut report = PipelineReport::default();
        let mut resolved = Vec::with_capacity(prepared.len());
        for (yearly, cleanup, normalization, resolution) in prepared {
            resolved.push(yearly);
            report.cleanup.push(cleanup);
            report.normalization.push(normalization);
            report.resolution.push(resolution);
        }

        let (reduced, reduction) = reduce_to_common_stations(&resolved);
        report.reduction = reduction;

        let (annotated, annotation) =
            annotate_cities(reduced, &self.metadata, &self.config.unknown_city);
        report.annotation = annotation;

        let (merged, merge) = merge_years(annotated)?;
        report.merge = merge;

        let (dated, midnight) = normalize_midnight(&merged);
        report.midnight = midnight;

        let series = UnifiedTimeSeries::new(dated);
        info!(
            "Unified series has {} rows and {} stations",
            series.height(),
            series.width()
        );
        Ok(Harmonized { series, report })
    }

    fn prepare_year(
        &self,
        yearly: &YearlyTable<String>,
        map: &CodeResolutionMap,
        max_passes: usize,
    ) -> Result<PreparedYear, HarmonizeError> {
        let positions = self
            .config
            .rows_to_drop
            .get(&yearly.year)
            .map(Vec::as_slice)
            .unwrap_or_default();
        let (cleaned, cleanup) = clean_year(yearly, positions);
        let (normalized, normalization) = normalize_year(&cleaned, self.config.decimal_separator);
        let (resolved, resolution) = resolve_year(&normalized, map, max_passes)?;
        debug!(
            "Year {}: prepared {} rows for {} stations",
            resolved.year,
            resolved.table.height(),
            resolved.table.width()
        );
        Ok((resolved, cleanup, normalization, resolution))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::error::MetadataError;
    use crate::types::cell::CellValue;
    use crate::types::station::{CompositeStationKey, StationMetadataEntry, UNKNOWN_CITY};
    use crate::types::table::StationTable;
    use chrono::{NaiveDate, NaiveDateTime};
    use std::collections::BTreeMap;

    fn ts(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M").unwrap()
    }

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn metadata() -> StationMetadata {
        StationMetadata::from_entries(
            vec![
                StationMetadataEntry::new("DsWrocWybCon", Some("Wrocław")).with_historical("DsWrocWyb"),
                StationMetadataEntry::new("MzWarAlNiepo", Some("Warszawa")),
            ],
            ',',
        )
    }

    fn tables() -> Vec<YearlyTable> {
        let y2015 = StationTable::from_columns(
            vec![
                ts("2015-06-01 12:00"),
                ts("2015-06-02 00:00"),
                ts("2015-06-03 01:00"),
            ],
            vec![
                ("DsWrocWyb".to_string(), vec!["12,5", "13", "ug/m3"]),
                ("MzWarAlNiepo".to_string(), vec!["20", "b.d.", "ug/m3"]),
                ("Extra".to_string(), vec!["1", "2", "ug/m3"]),
            ],
        )
        .unwrap();
        let y2016 = StationTable::from_columns(
            vec![ts("2016-06-01 12:00")],
            vec![
                ("MzWarAlNiepo".to_string(), vec![CellValue::Number(30.0)]),
                ("DsWrocWybCon".to_string(), vec![CellValue::from("9,75")]),
            ],
        )
        .unwrap();
        // Out of order on purpose.
        vec![YearlyTable::new(2016, y2016), YearlyTable::new(2015, y2015)]
    }

    fn config(parallel: bool) -> HarmonizeConfig {
        HarmonizeConfig {
            parallel,
            rows_to_drop: BTreeMap::from([(2015, vec![2])]),
            ..Default::default()
        }
    }

    #[test]
    fn test_end_to_end() -> Result<(), HarmonizeError> {
        let harmonized = Harmonizer::builder()
            .metadata(metadata())
            .config(config(false))
            .build()
            .run(tables())?;
        let series = &harmonized.series;

        let keys: Vec<_> = series.keys().cloned().collect();
        assert_eq!(
            keys,
            vec![
                CompositeStationKey::new("DsWrocWybCon", "Wrocław"),
                CompositeStationKey::new("MzWarAlNiepo", "Warszawa"),
            ]
        );
        assert_eq!(
            series.dates(),
            &[date("2015-06-01"), date("2015-06-01"), date("2016-06-01")]
        );
        let wroclaw = series.column_by_code("DsWrocWybCon").unwrap();
        assert_eq!(
            wroclaw.values,
            vec![
                CellValue::Number(12.5),
                CellValue::Number(13.0),
                CellValue::Number(9.75)
            ]
        );
        let warsaw = series.column_by_code("MzWarAlNiepo").unwrap();
        assert_eq!(warsaw.values[1], CellValue::from("b.d."));

        let report = &harmonized.report;
        assert_eq!(report.cleanup[0].removed, 1);
        // "12,5" plus the whole numbers "13", "20", "1" and "2".
        assert_eq!(report.normalization[0].cells_changed, 5);
        assert_eq!(report.normalization[1].cells_changed, 1);
        assert_eq!(report.resolution[0].total_changed(), 1);
        assert_eq!(report.resolution[1].total_changed(), 0);
        assert_eq!(report.reduction.dropped_for(2015), Some(1));
        assert_eq!(report.reduction.dropped_for(2016), Some(0));
        assert_eq!(report.merge.years, vec![2015, 2016]);
        assert_eq!(report.midnight.shifted, 1);
        Ok(())
    }

    #[test]
    fn test_parallel_matches_sequential() -> Result<(), HarmonizeError> {
        let sequential = Harmonizer::builder()
            .metadata(metadata())
            .config(config(false))
            .build()
            .run(tables())?;
        let parallel = Harmonizer::builder()
            .metadata(metadata())
            .config(config(true))
            .build()
            .run(tables())?;
        assert_eq!(sequential.series, parallel.series);
        assert_eq!(sequential.report, parallel.report);
        Ok(())
    }

    #[test]
    fn test_station_without_metadata_gets_sentinel() -> Result<(), HarmonizeError> {
        let a = |y| {
            YearlyTable::new(
                y,
                StationTable::from_columns(
                    vec![ts(&format!("{y}-01-01 05:00"))],
                    vec![("A".to_string(), vec![1.0])],
                )
                .unwrap(),
            )
        };
        let harmonized = Harmonizer::builder()
            .metadata(StationMetadata::default())
            .build()
            .run(vec![a(2015), a(2016)])?;
        let keys: Vec<_> = harmonized.series.keys().cloned().collect();
        assert_eq!(keys, vec![CompositeStationKey::new("A", UNKNOWN_CITY)]);
        assert_eq!(harmonized.report.annotation[0].match_ratio(), Some(0.0));
        Ok(())
    }

    #[test]
    fn test_renamed_station_and_partial_coverage() -> Result<(), HarmonizeError> {
        let year = |y: i32, codes: [&str; 2]| {
            let table = StationTable::from_columns(
                vec![ts(&format!("{y}-03-01 10:00")), ts(&format!("{y}-03-02 00:00"))],
                codes.iter().map(|c| (c.to_string(), vec![1.0, 2.0])),
            )
            .unwrap();
            YearlyTable::new(y, table)
        };
        let metadata = StationMetadata::from_entries(
            vec![StationMetadataEntry::new("A_new", Some("Kraków")).with_historical("B")],
            ',',
        );
        let harmonized = Harmonizer::builder()
            .metadata(metadata)
            .build()
            .run(vec![year(2015, ["A", "B"]), year(2016, ["A", "C"])])?;

        let keys: Vec<_> = harmonized.series.keys().cloned().collect();
        assert_eq!(keys, vec![CompositeStationKey::new("A", UNKNOWN_CITY)]);
        assert_eq!(
            harmonized.series.dates(),
            &[
                date("2015-03-01"),
                date("2015-03-01"),
                date("2016-03-01"),
                date("2016-03-01")
            ]
        );
        assert_eq!(harmonized.report.resolution[0].total_changed(), 1);
        assert_eq!(harmonized.report.reduction.dropped_for(2015), Some(1));
        assert_eq!(harmonized.report.reduction.dropped_for(2016), Some(1));
        Ok(())
    }

    #[test]
    fn test_rename_cycle_aborts_before_processing() {
        let metadata = StationMetadata::from_entries(
            vec![
                StationMetadataEntry::new("A", None).with_historical("B"),
                StationMetadataEntry::new("B", None).with_historical("A"),
            ],
            ',',
        );
        let err = Harmonizer::builder()
            .metadata(metadata)
            .build()
            .run(tables())
            .unwrap_err();
        assert!(matches!(
            err,
            HarmonizeError::Metadata(MetadataError::RenameCycle { .. })
        ));
    }

    #[test]
    fn test_no_tables_gives_empty_series() -> Result<(), HarmonizeError> {
        let harmonized = Harmonizer::builder()
            .metadata(metadata())
            .build()
            .run(Vec::new())?;
        assert_eq!(harmonized.series.height(), 0);
        assert_eq!(harmonized.series.width(), 0);
        Ok(())
    }
}
