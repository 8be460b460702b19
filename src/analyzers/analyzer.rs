use std::time::Duration;

use tracing::{info, warn};

use crate::analyzers::aggregate::{build_report, evaluate_all};
use crate::analyzers::filters::{FilterOptions, Selection};
use crate::analyzers::normalize::normalize;
use crate::analyzers::period::{latest_period, sorted_periods};
use crate::analyzers::polarity::PolarityResolver;
use crate::analyzers::types::{
    EvaluationResult, IndicatorRecord, KeyGranularity, NormalizeStats, Report,
};
use crate::errors::DataSourceError;
use crate::source::{RawTable, Source, load_table};

/// Filter and period choices for one report.
#[derive(Debug, Clone, Default)]
pub struct ReportOptions {
    /// Defaults to the latest period in the data.
    pub reference_period: Option<String>,
    /// `None` selects every reachable value of the dimension.
    pub categories: Option<Vec<String>>,
    pub owners: Option<Vec<String>>,
    pub indicators: Option<Vec<String>>,
    pub granularity: KeyGranularity,
}

/// Normalized records from one load. Rebuilt from scratch on every reload.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    pub records: Vec<IndicatorRecord>,
    pub stats: NormalizeStats,
}

impl Dataset {
    pub fn from_table(table: &RawTable) -> Self {
        let normalized = normalize(&table.rows);
        Self {
            records: normalized.records,
            stats: normalized.stats,
        }
    }

    /// Every period in the data, oldest first.
    pub fn periods(&self) -> Vec<String> {
        sorted_periods(self.records.iter().map(|r| r.period.as_str()))
    }

    pub fn latest_period(&self) -> Option<String> {
        latest_period(self.records.iter().map(|r| r.period.as_str()))
    }

    pub fn selection(&self, options: &ReportOptions) -> Selection {
        Selection::choose(
            &self.records,
            options.categories.as_deref(),
            options.owners.as_deref(),
            options.indicators.as_deref(),
        )
    }

    pub fn filter_options(&self, options: &ReportOptions) -> FilterOptions {
        FilterOptions::cascade(&self.records, &self.selection(options))
    }

    fn reference_period(&self, options: &ReportOptions) -> Option<String> {
        match &options.reference_period {
            Some(period) => {
                let period = period.trim().to_string();
                if !self.records.iter().any(|r| r.period == period) {
                    warn!(period = %period, "Reference period has no records");
                }
                Some(period)
            }
            None => self.latest_period(),
        }
    }

    /// Filtered records with their goal outcome, optionally limited to the reference period.
    pub fn evaluations<R: PolarityResolver + ?Sized>(
        &self,
        options: &ReportOptions,
        reference_only: bool,
        resolver: &R,
    ) -> Vec<EvaluationResult> {
        let mut records = self.selection(options).apply(&self.records);
        if reference_only {
            let reference = self.reference_period(options);
            records.retain(|r| Some(&r.period) == reference.as_ref());
        }
        evaluate_all(&records, resolver)
    }

    pub fn report<R: PolarityResolver + ?Sized>(
        &self,
        options: &ReportOptions,
        resolver: &R,
    ) -> Report {
        let filtered = self.selection(options).apply(&self.records);
        let reference = self.reference_period(options);

        let report = build_report(
            &filtered,
            reference.as_deref(),
            options.granularity,
            resolver,
            self.stats,
        );
        info!(
            reference = ?report.reference_period,
            records = filtered.len(),
            indicators = report.series.len(),
            met = report.met.len(),
            not_met = report.not_met.len(),
            no_data = report.no_data.len(),
            "Report built"
        );
        report
    }
}

/// Loads and normalizes the source. No retries: a failure is returned as-is.
#[tracing::instrument(skip(source), fields(source = %source))]
pub async fn load_dataset(source: &Source, timeout: Duration) -> Result<Dataset, DataSourceError> {
    let table = load_table(source, timeout).await?;
    Ok(Dataset::from_table(&table))
}
