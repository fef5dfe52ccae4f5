//! Attaches the reporting city to every station column.

use crate::metadata::schema::StationMetadata;
use crate::report::AnnotationReport;
use crate::types::station::CompositeStationKey;
use crate::types::table::YearlyTable;
use log::{info, warn};

/// Relabels each column of one year with a [`CompositeStationKey`].
///
/// Codes without a metadata city get `unknown_city`; incomplete metadata
/// coverage is common and never aborts a run.
pub fn annotate_year(
    yearly: YearlyTable<String>,
    metadata: &StationMetadata,
    unknown_city: &str,
) -> (YearlyTable<CompositeStationKey>, AnnotationReport) {
    let year = yearly.year;
    let total = yearly.table.width();
    let mut matched = 0usize;
    let mut unmatched: Vec<String> = Vec::new();

    let annotated = yearly.map_table(|table| {
        table.map_keys(|code| match metadata.city_of(&code) {
            Some(city) => {
                matched += 1;
                CompositeStationKey::new(code, city)
            }
            None => {
                unmatched.push(code.clone());
                CompositeStationKey::new(code, unknown_city)
            }
        })
    });

    info!(
        "Year {}: assigned a city to {}/{} stations",
        year, matched, total
    );
    if !unmatched.is_empty() {
        warn!("Year {}: no city found for {:?}", year, unmatched);
    }
    (annotated, AnnotationReport { year, matched, total })
}

pub fn annotate_cities(
    tables: Vec<YearlyTable<String>>,
    metadata: &StationMetadata,
    unknown_city: &str,
) -> (Vec<YearlyTable<CompositeStationKey>>, Vec<AnnotationReport>) {
    tables
        .into_iter()
        .map(|yearly| annotate_year(yearly, metadata, unknown_city))
        .unzip()
}
