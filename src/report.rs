//! Structured diagnostics emitted by each pipeline stage.
//!
//! Every stage returns one of these records alongside its output so callers
//! can assert on what changed instead of scraping log text. All records
//! serialize with serde, so a whole [`PipelineReport`] can be written as JSON.

use serde::Serialize;

/// Rows removed from one year by the row cleanup stage.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RowCleanupReport {
    pub year: i32,
    pub removed: usize,
    /// Requested positions that did not exist in the table.
    pub missing: Vec<usize>,
}

/// Cells of one year that changed value during numeric normalization.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NormalizationReport {
    pub year: i32,
    pub cells_changed: usize,
}

/// Station code resolution for one year.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ResolutionReport {
    pub year: i32,
    /// Columns relabelled in each pass. The fixed point is the first pass
    /// with no change, which is not recorded.
    pub changed_per_pass: Vec<usize>,
    /// Columns folded into another column that resolved to the same code.
    pub coalesced: usize,
}

impl ResolutionReport {
    pub fn total_changed(&self) -> usize {
        self.changed_per_pass.iter().sum()
    }
}

/// Columns dropped from one year by the common station reducer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct YearReduction {
    pub year: i32,
    pub dropped: usize,
    pub kept: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReductionReport {
    /// Size of the common station set.
    pub common_stations: usize,
    pub years: Vec<YearReduction>,
}

impl ReductionReport {
    pub fn dropped_for(&self, year: i32) -> Option<usize> {
        self.years.iter().find(|y| y.year == year).map(|y| y.dropped)
    }
}

/// City matches for one year's columns.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AnnotationReport {
    pub year: i32,
    pub matched: usize,
    pub total: usize,
}

impl AnnotationReport {
    /// `matched / total`, or `None` for a table without columns.
    pub fn match_ratio(&self) -> Option<f64> {
        (self.total > 0).then(|| self.matched as f64 / self.total as f64)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MergeReport {
    /// Years in the order they were concatenated.
    pub years: Vec<i32>,
    pub rows: usize,
    pub columns: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MidnightReport {
    pub rows: usize,
    /// Rows whose timestamp was exactly midnight and moved to the previous day.
    pub shifted: usize,
}

/// Everything a pipeline run reports, stage by stage.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PipelineReport {
    pub cleanup: Vec<RowCleanupReport>,
    pub normalization: Vec<NormalizationReport>,
    pub resolution: Vec<ResolutionReport>,
    pub reduction: ReductionReport,
    pub annotation: Vec<AnnotationReport>,
    pub merge: MergeReport,
    pub midnight: MidnightReport,
}

impl PipelineReport {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_match_ratio() {
        let report = AnnotationReport {
            year: 2015,
            matched: 3,
            total: 4,
        };
        assert_eq!(report.match_ratio(), Some(0.75));
        assert_eq!(AnnotationReport::default().match_ratio(), None);
    }

    #[test]
    fn test_report_serializes() -> Result<(), Box<dyn std::error::Error>> {
        let mut report = PipelineReport::default();
        report.reduction.years.push(YearReduction {
            year: 2016,
            dropped: 1,
            kept: 1,
        });
        let json = report.to_json()?;
        let value: serde_json::Value = serde_json::from_str(&json)?;
        assert_eq!(value["reduction"]["years"][0]["dropped"], 1);
        assert_eq!(report.reduction.dropped_for(2016), Some(1));
        Ok(())
    }
}
