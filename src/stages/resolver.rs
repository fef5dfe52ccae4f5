//! Station code resolution across the agency's renaming history.
//!
//! Codes are renamed over the years (a station moves, a naming scheme is
//! revised), so the same physical station appears under different column
//! labels in different yearly exports. The metadata lists, for every current
//! code, the codes it used to have. [`CodeResolutionMap`] flattens that into an
//! old-code to current-code lookup, and [`resolve_year`] rewrites a year's
//! column labels through it until nothing changes, which also follows
//! transitive chains (A renamed to B, B later renamed to C).

use crate::error::HarmonizeError;
use crate::metadata::error::MetadataError;
use crate::metadata::schema::StationMetadata;
use crate::report::ResolutionReport;
use crate::types::table::{StationColumn, StationTable, YearlyTable};
use log::{debug, info, warn};
use serde::Serialize;
use std::collections::HashMap;

/// A historical code claimed by more than one current station.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenameConflict {
    pub code: String,
    /// The current code the historical code now maps to.
    pub kept: String,
    /// The mapping that was overwritten.
    pub replaced: String,
}

/// Lookup from any historical station code to the code that replaced it.
///
/// The map is acyclic by construction, so following it from any key always
/// ends at a code that is not itself a key.
#[derive(Debug, Clone, Default)]
pub struct CodeResolutionMap {
    map: HashMap<String, String>,
    conflicts: Vec<RenameConflict>,
    longest_chain: usize,
}

impl CodeResolutionMap {
    /// Flattens the historical codes of every metadata entry.
    ///
    /// Each historical field is split on the metadata list delimiter and
    /// trimmed; every token maps to the entry's current code unless it already
    /// equals it. A token claimed by two entries maps to the later one.
    ///
    /// # Errors
    ///
    /// Returns [`MetadataError::RenameCycle`] if following the renames can
    /// loop (A to B and B back to A).
    pub fn build(metadata: &StationMetadata) -> Result<Self, MetadataError> {
        let delimiter = metadata.list_delimiter();
        let mut map: HashMap<String, String> = HashMap::new();
        let mut conflicts = Vec::new();

        for entry in metadata.entries() {
            for token in entry.historical_tokens(delimiter) {
                if token == entry.code {
                    continue;
                }
                if let Some(previous) = map.insert(token.to_string(), entry.code.clone()) {
                    if previous != entry.code {
                        warn!(
                            "Historical code '{}' is claimed by both '{}' and '{}'; using '{}'",
                            token, previous, entry.code, entry.code
                        );
                        conflicts.push(RenameConflict {
                            code: token.to_string(),
                            kept: entry.code.clone(),
                            replaced: previous,
                        });
                    }
                }
            }
        }

        let longest_chain = longest_chain(&map)?;
        info!(
            "Built code resolution map with {} historical codes (longest rename chain: {})",
            map.len(),
            longest_chain
        );
        Ok(Self {
            map,
            conflicts,
            longest_chain,
        })
    }

    /// One rename step for `code`, if it is a historical code.
    pub fn get(&self, code: &str) -> Option<&str> {
        self.map.get(code).map(String::as_str)
    }

    /// Follows renames from `code` to its current code.
    pub fn resolve<'a>(&'a self, code: &'a str) -> &'a str {
        let mut current = code;
        while let Some(next) = self.get(current) {
            current = next;
        }
        current
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn conflicts(&self) -> &[RenameConflict] {
        &self.conflicts
    }

    /// Number of renames on the longest chain in the map.
    pub fn longest_chain(&self) -> usize {
        self.longest_chain
    }
}

/// Walks every chain once, failing on a cycle.
fn longest_chain(map: &HashMap<String, String>) -> Result<usize, MetadataError> {
    let mut keys: Vec<&String> = map.keys().collect();
    keys.sort();

    let mut longest = 0;
    for start in keys {
        let mut chain: Vec<&str> = vec![start.as_str()];
        let mut current = start.as_str();
        while let Some(next) = map.get(current) {
            let next = next.as_str();
            let seen = chain.contains(&next);
            chain.push(next);
            if seen {
                return Err(MetadataError::RenameCycle {
                    chain: chain.into_iter().map(str::to_string).collect(),
                });
            }
            current = next;
        }
        longest = longest.max(chain.len() - 1);
    }
    Ok(longest)
}

/// Rewrites one year's column labels through `map` until a pass changes
/// nothing, then coalesces columns that ended up with the same label.
///
/// `max_passes` bounds the number of passes that change something.
///
/// # Errors
///
/// * [`HarmonizeError::ResolutionDidNotConverge`] if the bound is hit.
/// * [`HarmonizeError::DuplicateStation`] if columns that resolve to the same
///   code disagree on a row.
pub fn resolve_year(
    yearly: &YearlyTable<String>,
    map: &CodeResolutionMap,
    max_passes: usize,
) -> Result<(YearlyTable<String>, ResolutionReport), HarmonizeError> {
    let year = yearly.year;
    let mut labels: Vec<String> = yearly.table.keys().cloned().collect();
    let mut report = ResolutionReport {
        year,
        ..Default::default()
    };

    loop {
        let next: Vec<String> = labels
            .iter()
            .map(|label| map.get(label).unwrap_or(label).to_string())
            .collect();
        let changed = labels.iter().zip(&next).filter(|(a, b)| a != b).count();
        if changed == 0 {
            break;
        }
        if report.changed_per_pass.len() == max_passes {
            return Err(HarmonizeError::ResolutionDidNotConverge {
                year,
                passes: max_passes,
            });
        }
        info!(
            "[{}] Pass {}: updated {} station codes",
            year,
            report.changed_per_pass.len() + 1,
            changed
        );
        report.changed_per_pass.push(changed);
        labels = next;
    }

    let relabelled: Vec<StationColumn<String>> = yearly
        .table
        .columns()
        .iter()
        .zip(labels)
        .map(|(column, label)| StationColumn::new(label, column.values.clone()))
        .collect();
    let (columns, coalesced) = coalesce_duplicates(year, relabelled)?;
    if coalesced > 0 {
        warn!(
            "[{}] {} columns resolved to an existing station code and were coalesced",
            year, coalesced
        );
    }
    report.coalesced = coalesced;

    let table = StationTable::from_parts(yearly.table.index().to_vec(), columns);
    Ok((YearlyTable::new(year, table), report))
}

/// Folds columns sharing a label into the first one, filling its missing
/// cells from the later column.
///
/// Two columns may only be folded when they never disagree: a row where both
/// hold different non-missing values fails with
/// [`HarmonizeError::DuplicateStation`].
fn coalesce_duplicates(
    year: i32,
    columns: Vec<StationColumn<String>>,
) -> Result<(Vec<StationColumn<String>>, usize), HarmonizeError> {
    let mut position: HashMap<String, usize> = HashMap::new();
    let mut out: Vec<StationColumn<String>> = Vec::with_capacity(columns.len());
    let mut coalesced = 0;

    for column in columns {
        match position.get(&column.key) {
            Some(&i) => {
                let target = &mut out[i];
                let conflicting_cells = target
                    .values
                    .iter()
                    .zip(&column.values)
                    .filter(|(kept, incoming)| {
                        !kept.is_missing() && !incoming.is_missing() && kept != incoming
                    })
                    .count();
                if conflicting_cells > 0 {
                    return Err(HarmonizeError::DuplicateStation {
                        year,
                        code: column.key,
                        conflicting_cells,
                    });
                }
                for (kept, incoming) in target.values.iter_mut().zip(column.values) {
                    if kept.is_missing() {
                        *kept = incoming;
                    }
                }
                coalesced += 1;
                debug!("Coalesced duplicate column '{}'", target.key);
            }
            None => {
                position.insert(column.key.clone(), out.len());
                out.push(column);
            }
        }
    }
    Ok((out, coalesced))
}
