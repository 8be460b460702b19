//! Output formatting and persistence for goal reports.
//!
//! Supports a plain-text listing, JSON serialization, and CSV append of
//! per-record evaluations.

use anyhow::Result;
use serde::Serialize;
use std::fs::OpenOptions;
use std::path::Path;
use tracing::debug;

use crate::analyzers::types::{EvaluationResult, Listing, Polarity, PolarityBasis, Report};
use csv::WriterBuilder;

/// Logs a report using Rust's debug pretty-print format.
pub fn print_pretty(report: &Report) {
    debug!("{:#?}", report);
}

/// Serializes a report as pretty-printed JSON.
pub fn to_json(report: &Report) -> Result<String> {
    Ok(serde_json::to_string_pretty(report)?)
}

/// Renders the met / not-met / no-data listings for the reference period.
pub fn render_text(report: &Report) -> String {
    let Some(period) = &report.reference_period else {
        return "No indicator data loaded.\n".to_string();
    };
    let s = &report.summary;
    let mut out = String::new();

    out.push_str(&format!(
        "Reference period {period}: {} indicator(s), {} met, {} not met ({:.1}% attained)\n",
        s.total, s.met, s.not_met, s.attainment_pct
    ));

    section(&mut out, "Goals met", report.met.iter().map(listing_line));
    section(&mut out, "Goals not met", report.not_met.iter().map(listing_line));
    section(
        &mut out,
        &format!("No data for {period}"),
        report.no_data.iter().map(|k| k.to_string()),
    );

    if !report.ambiguous_polarity.is_empty() {
        section(
            &mut out,
            "Assumed higher is better",
            report.ambiguous_polarity.iter().map(|k| k.to_string()),
        );
    }
    out
}

fn section(out: &mut String, title: &str, lines: impl Iterator<Item = String>) {
    out.push_str(&format!("\n{title}\n"));
    let mut empty = true;
    for line in lines {
        empty = false;
        out.push_str(&format!("  {line}\n"));
    }
    if empty {
        out.push_str("  (none)\n");
    }
}

fn listing_line(listing: &Listing) -> String {
    format!(
        "{} (actual: {} | target: {})",
        listing.key, listing.actual, listing.target
    )
}

/// Flat CSV shape of an [`EvaluationResult`].
#[derive(Debug, Serialize)]
struct EvaluationRow<'a> {
    category: &'a str,
    owner: &'a str,
    indicator: &'a str,
    period: &'a str,
    target: f64,
    actual: f64,
    polarity: Polarity,
    polarity_basis: PolarityBasis,
    met: bool,
}

impl<'a> From<&'a EvaluationResult> for EvaluationRow<'a> {
    fn from(e: &'a EvaluationResult) -> Self {
        Self {
            category: &e.record.category,
            owner: &e.record.owner,
            indicator: &e.record.indicator,
            period: &e.record.period,
            target: e.record.target,
            actual: e.record.actual,
            polarity: e.polarity,
            polarity_basis: e.basis,
            met: e.met,
        }
    }
}

/// Appends evaluations as rows to a CSV file.
///
/// Creates the file with headers if it does not already exist.
pub fn append_records(path: &str, evaluations: &[EvaluationResult]) -> Result<()> {
    let file_exists = Path::new(path).exists();
    debug!(path, file_exists, rows = evaluations.len(), "Appending CSV records");

    let file = OpenOptions::new().append(true).create(true).open(path)?;

    let mut writer = WriterBuilder::new()
        .has_headers(!file_exists) // IMPORTANT when appending
        .from_writer(file);

    for evaluation in evaluations {
        writer.serialize(EvaluationRow::from(evaluation))?;
    }
    writer.flush()?;

    Ok(())
}
