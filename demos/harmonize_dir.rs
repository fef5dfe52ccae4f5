//! Harmonizes a directory of yearly exports.
//!
//! Expects `<dir>/metadata.csv` plus one `<dir>/<year>.csv` per year, all
//! `;`-separated. An optional second argument points at a JSON config file.
//!
//! ```text
//! RUST_LOG=info cargo run --example harmonize_dir -- data/pm25 config.json
//! ```

use airseries::{read_metadata_csv, read_yearly_csv, write_parquet, HarmonizeConfig, Harmonizer};
use std::env;
use std::error::Error;
use std::path::PathBuf;

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();
    configure_polars_display();

    let mut args = env::args().skip(1);
    let dir = PathBuf::from(args.next().ok_or("usage: harmonize_dir <dir> [config.json]")?);
    let config = match args.next() {
        Some(path) => HarmonizeConfig::from_path(&PathBuf::from(path))?,
        None => HarmonizeConfig::default(),
    };

    let metadata = read_metadata_csv(&dir.join("metadata.csv"), &config.metadata, b';')?;

    let mut tables = Vec::new();
    for entry in std::fs::read_dir(&dir)? {
        let path = entry?.path();
        if path.extension().and_then(|ext| ext.to_str()) != Some("csv") {
            continue;
        }
        let Some(year) = path
            .file_stem()
            .and_then(|s| s.to_str())
            .and_then(|s| s.parse::<i32>().ok())
        else {
            continue;
        };
        tables.push(read_yearly_csv().path(&path).year(year).call()?);
    }

    let harmonized = Harmonizer::builder()
        .metadata(metadata)
        .config(config)
        .build()
        .run(tables)?;
    println!("{}", harmonized.report.to_json()?);

    let mut frame = harmonized.series.to_frame()?;
    println!("{:#?}", frame);
    write_parquet(&mut frame, &dir.join("unified.parquet"))?;

    Ok(())
}

fn configure_polars_display() {
    // show 20 rows
    env::set_var("POLARS_FMT_MAX_ROWS", "20");
}
