mod config;
mod error;
mod harmonizer;
mod io;
mod metadata;
mod report;
mod stages;
mod types;

pub use config::{ConfigError, HarmonizeConfig};
pub use error::HarmonizeError;
pub use harmonizer::{Harmonized, Harmonizer};

pub use io::error::LoadError;
pub use io::frames::{parse_timestamp, read_csv_frame, read_metadata_csv, read_yearly_csv, write_parquet};

pub use metadata::error::MetadataError;
pub use metadata::schema::{MetadataSchema, StationMetadata};

pub use report::*;

pub use stages::annotator::{annotate_cities, annotate_year};
pub use stages::cleanup::{clean_year, drop_rows};
pub use stages::merger::merge_years;
pub use stages::midnight::{normalize_midnight, CalendarStamp};
pub use stages::numeric::{normalize_cell, normalize_table, normalize_year, parse_locale_number};
pub use stages::reducer::{common_stations, reduce_to_common_stations};
pub use stages::resolver::{resolve_year, CodeResolutionMap, RenameConflict};

pub use types::cell::CellValue;
pub use types::station::*;
pub use types::table::{StationColumn, StationTable, YearlyTable};
pub use types::unified::{UnifiedTimeSeries, DATE_COLUMN};
