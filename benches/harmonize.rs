use airseries::{
    normalize_table, HarmonizeConfig, Harmonizer, StationMetadata, StationMetadataEntry,
    StationTable, YearlyTable,
};
use chrono::{NaiveDate, TimeDelta};
use criterion::{black_box, criterion_group, criterion_main, Criterion};

const STATIONS: usize = 40;
const HOURS: i64 = 24 * 90;

fn synthetic_year(year: i32) -> YearlyTable {
    let start = NaiveDate::from_ymd_opt(year, 1, 1)
        .unwrap()
        .and_hms_opt(1, 0, 0)
        .unwrap();
    let index: Vec<_> = (0..HOURS).map(|h| start + TimeDelta::hours(h)).collect();
    // Even years still report under the old codes.
    let prefix = if year % 2 == 0 { "Old" } else { "St" };
    let columns = (0..STATIONS).map(|s| {
        let values: Vec<String> = (0..HOURS)
            .map(|h| format!("{},{}", (h as usize + s) % 90, h % 10))
            .collect();
        (format!("{prefix}{s:03}"), values)
    });
    YearlyTable::new(year, StationTable::from_columns(index, columns).unwrap())
}

fn metadata() -> StationMetadata {
    StationMetadata::from_entries(
        (0..STATIONS)
            .map(|s| {
                StationMetadataEntry::new(format!("St{s:03}"), Some("Kraków"))
                    .with_historical(format!("Old{s:03}"))
            })
            .collect(),
        ',',
    )
}

fn bench_harmonize(c: &mut Criterion) {
    let tables: Vec<_> = (2014..2020).map(synthetic_year).collect();
    let metadata = metadata();

    c.bench_function("normalize_table", |b| {
        b.iter(|| normalize_table(black_box(&tables[0].table), ','))
    });

    for parallel in [false, true] {
        let harmonizer = Harmonizer::builder()
            .metadata(metadata.clone())
            .config(HarmonizeConfig {
                parallel,
                ..Default::default()
            })
            .build();
        let name = if parallel { "harmonize_parallel" } else { "harmonize_sequential" };
        c.bench_function(name, |b| {
            b.iter(|| harmonizer.run(black_box(tables.clone())).unwrap())
        });
    }
}

criterion_group!(benches, bench_harmonize);
criterion_main!(benches);
