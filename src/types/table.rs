//! Column-major station tables shared by every pipeline stage.
//!
//! A [`StationTable`] is generic over its row index `I` (raw timestamps while
//! the per-year tables are being harmonized, calendar dates once the midnight
//! convention has been normalized) and over its column key `K` (bare station
//! codes until the city annotator runs, [`crate::CompositeStationKey`] after).

use crate::error::HarmonizeError;
use crate::types::cell::CellValue;
use chrono::NaiveDateTime;
use std::fmt::Display;

/// One station's readings, aligned with the owning table's row index.
#[derive(Debug, Clone, PartialEq)]
pub struct StationColumn<K> {
    pub key: K,
    pub values: Vec<CellValue>,
}

impl<K> StationColumn<K> {
    pub fn new(key: K, values: Vec<CellValue>) -> Self {
        Self { key, values }
    }
}

/// A table of readings: rows are index entries, columns are stations.
#[derive(Debug, Clone, PartialEq)]
pub struct StationTable<I, K> {
    index: Vec<I>,
    columns: Vec<StationColumn<K>>,
}

impl<I, K> StationTable<I, K> {
    /// Builds a table, checking that every column holds exactly one cell per row.
    ///
    /// # Errors
    ///
    /// Returns [`HarmonizeError::RaggedColumn`] naming the first column whose
    /// length differs from the index length.
    pub fn new(index: Vec<I>, columns: Vec<StationColumn<K>>) -> Result<Self, HarmonizeError>
    where
        K: Display,
    {
        if let Some(bad) = columns.iter().find(|c| c.values.len() != index.len()) {
            return Err(HarmonizeError::RaggedColumn {
                column: bad.key.to_string(),
                expected: index.len(),
                found: bad.values.len(),
            });
        }
        Ok(Self { index, columns })
    }

    /// Convenience constructor from `(key, cells)` pairs.
    pub fn from_columns<C>(
        index: Vec<I>,
        columns: impl IntoIterator<Item = (K, Vec<C>)>,
    ) -> Result<Self, HarmonizeError>
    where
        K: Display,
        C: Into<CellValue>,
    {
        let columns = columns
            .into_iter()
            .map(|(key, values)| {
                StationColumn::new(key, values.into_iter().map(Into::into).collect())
            })
            .collect();
        Self::new(index, columns)
    }

    pub fn empty() -> Self {
        Self {
            index: Vec::new(),
            columns: Vec::new(),
        }
    }

    // Callers guarantee the shape invariant.
    pub(crate) fn from_parts(index: Vec<I>, columns: Vec<StationColumn<K>>) -> Self {
        debug_assert!(columns.iter().all(|c| c.values.len() == index.len()));
        Self { index, columns }
    }

    pub fn index(&self) -> &[I] {
        &self.index
    }

    pub fn columns(&self) -> &[StationColumn<K>] {
        &self.columns
    }

    pub fn keys(&self) -> impl Iterator<Item = &K> + '_ {
        self.columns.iter().map(|c| &c.key)
    }

    pub fn height(&self) -> usize {
        self.index.len()
    }

    pub fn width(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty() && self.columns.is_empty()
    }

    pub fn column(&self, key: &K) -> Option<&StationColumn<K>>
    where
        K: PartialEq,
    {
        self.columns.iter().find(|c| &c.key == key)
    }

    pub fn into_parts(self) -> (Vec<I>, Vec<StationColumn<K>>) {
        (self.index, self.columns)
    }

    /// Relabels every column, keeping cells and order.
    pub fn map_keys<K2>(self, mut f: impl FnMut(K) -> K2) -> StationTable<I, K2> {
        StationTable {
            index: self.index,
            columns: self
                .columns
                .into_iter()
                .map(|c| StationColumn::new(f(c.key), c.values))
                .collect(),
        }
    }

    /// Replaces every cell with `f(cell)`, keeping index and keys.
    pub fn map_cells(&self, mut f: impl FnMut(&CellValue) -> CellValue) -> Self
    where
        I: Clone,
        K: Clone,
    {
        Self {
            index: self.index.clone(),
            columns: self
                .columns
                .iter()
                .map(|c| StationColumn::new(c.key.clone(), c.values.iter().map(&mut f).collect()))
                .collect(),
        }
    }

    /// Keeps only the columns named in `keys`, in that order. Keys absent from
    /// the table are skipped.
    pub fn select(&self, keys: &[K]) -> Self
    where
        I: Clone,
        K: Clone + PartialEq,
    {
        Self {
            index: self.index.clone(),
            columns: keys
                .iter()
                .filter_map(|k| self.column(k).cloned())
                .collect(),
        }
    }

    /// Builds a table from the rows at `positions`, in that order.
    ///
    /// Every position must be smaller than [`Self::height`].
    pub(crate) fn take_rows(&self, positions: &[usize]) -> Self
    where
        I: Clone,
        K: Clone,
    {
        Self {
            index: positions.iter().map(|&p| self.index[p].clone()).collect(),
            columns: self
                .columns
                .iter()
                .map(|c| {
                    StationColumn::new(
                        c.key.clone(),
                        positions.iter().map(|&p| c.values[p].clone()).collect(),
                    )
                })
                .collect(),
        }
    }
}

/// The readings of one reporting year as exported by the monitoring agency.
///
/// Column keys start out as the raw station codes used in that year's export
/// (`K = String`) and become [`crate::CompositeStationKey`]s once annotated.
#[derive(Debug, Clone, PartialEq)]
pub struct YearlyTable<K = String> {
    pub year: i32,
    pub table: StationTable<NaiveDateTime, K>,
}

impl<K> YearlyTable<K> {
    pub fn new(year: i32, table: StationTable<NaiveDateTime, K>) -> Self {
        Self { year, table }
    }

    /// Applies `f` to the inner table, keeping the year tag.
    pub fn map_table<K2>(
        self,
        f: impl FnOnce(StationTable<NaiveDateTime, K>) -> StationTable<NaiveDateTime, K2>,
    ) -> YearlyTable<K2> {
        YearlyTable {
            year: self.year,
            table: f(self.table),
        }
    }
}
