//! Data types used by the evaluation pipeline.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Category assigned to rows that carry no category column or cell.
pub const DEFAULT_CATEGORY: &str = "General";

/// A normalized spreadsheet row: one indicator of one owner in one period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorRecord {
    pub owner: String,
    pub indicator: String,
    pub category: String,
    pub period: String,
    pub target: f64,
    pub actual: f64,
    pub polarity_hint: Option<String>,
}

/// Direction of improvement for an indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Polarity {
    HigherIsBetter,
    LowerIsBetter,
}

/// Which resolution rule decided a [`Polarity`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PolarityBasis {
    Keyword,
    NumericHint,
    DirectionHint,
    /// Nothing matched; the indicator fell back to higher-is-better.
    Default,
}

/// A record together with its resolved polarity and goal outcome.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvaluationResult {
    pub record: IndicatorRecord,
    pub polarity: Polarity,
    pub basis: PolarityBasis,
    pub met: bool,
}

/// How finely records are grouped into the "same" indicator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum KeyGranularity {
    #[default]
    OwnerIndicator,
    CategoryOwnerIndicator,
}

/// Identity of an indicator across periods.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct IndicatorKey {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    pub owner: String,
    pub indicator: String,
}

impl IndicatorKey {
    pub fn of(record: &IndicatorRecord, granularity: KeyGranularity) -> Self {
        let category = match granularity {
            KeyGranularity::OwnerIndicator => None,
            KeyGranularity::CategoryOwnerIndicator => Some(record.category.clone()),
        };
        Self {
            category,
            owner: record.owner.clone(),
            indicator: record.indicator.clone(),
        }
    }
}

impl fmt::Display for IndicatorKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(category) = &self.category {
            write!(f, "{} / ", category)?;
        }
        write!(f, "{} - {}", self.owner, self.indicator)
    }
}

/// Goal status of an indicator at the reference period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Met,
    NotMet,
    /// The indicator has no record at the reference period.
    NoData,
}

/// Counters for rows the normalizer dropped or repaired.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct NormalizeStats {
    pub rows_in: usize,
    pub kept: usize,
    /// Rows without owner, indicator or period.
    pub dropped: usize,
    /// Numeric cells that were absent or blank and defaulted to 0.
    pub missing_numeric: usize,
    /// Numeric cells holding unparseable text, defaulted to 0.
    pub coerced_numeric: usize,
}

/// Output of one normalization pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Normalized {
    pub records: Vec<IndicatorRecord>,
    pub stats: NormalizeStats,
}

/// Goal counts for the reference period.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PeriodSummary {
    pub period: String,
    pub total: usize,
    pub met: usize,
    pub not_met: usize,
    pub attainment_pct: f64,
}

/// One bar of an indicator chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesPoint {
    pub period: String,
    pub actual: f64,
    pub target: f64,
    pub met: bool,
}

/// Every period of one indicator, in chronological order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndicatorSeries {
    pub key: IndicatorKey,
    pub polarity: Polarity,
    /// Target of the earliest point, drawn as the goal line.
    pub target: f64,
    pub points: Vec<SeriesPoint>,
    pub status: Status,
}

/// A line of the met / not-met listings.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Listing {
    pub key: IndicatorKey,
    pub actual: f64,
    pub target: f64,
}

/// Everything a dashboard needs for one reference period.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub generated_at: DateTime<Utc>,
    pub reference_period: Option<String>,
    pub summary: PeriodSummary,
    pub met: Vec<Listing>,
    pub not_met: Vec<Listing>,
    pub no_data: Vec<IndicatorKey>,
    /// Indicators whose polarity fell back to the default.
    pub ambiguous_polarity: Vec<IndicatorKey>,
    pub series: Vec<IndicatorSeries>,
    pub normalize: NormalizeStats,
}

impl Report {
    /// The report shown when the source could not be loaded.
    pub fn empty() -> Self {
        Self {
            generated_at: Utc::now(),
            reference_period: None,
            summary: PeriodSummary::default(),
            met: Vec::new(),
            not_met: Vec::new(),
            no_data: Vec::new(),
            ambiguous_polarity: Vec::new(),
            series: Vec::new(),
            normalize: NormalizeStats::default(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> IndicatorRecord {
        IndicatorRecord {
            owner: "Unit A".into(),
            indicator: "Processing Time".into(),
            category: "Efficiency".into(),
            period: "2024.1".into(),
            target: 10.0,
            actual: 8.0,
            polarity_hint: None,
        }
    }

    #[test]
    fn test_key_display_by_granularity() {
        let r = record();
        assert_eq!(
            IndicatorKey::of(&r, KeyGranularity::OwnerIndicator).to_string(),
            "Unit A - Processing Time"
        );
        assert_eq!(
            IndicatorKey::of(&r, KeyGranularity::CategoryOwnerIndicator).to_string(),
            "Efficiency / Unit A - Processing Time"
        );
    }

    #[test]
    fn test_empty_report() {
        let report = Report::empty();
        assert!(report.is_empty());
        assert_eq!(report.summary.total, 0);
    }
}
