use chrono::Utc;
use std::collections::{BTreeMap, BTreeSet};

use crate::analyzers::evaluate::evaluate_record;
use crate::analyzers::period::compare_periods;
use crate::analyzers::polarity::PolarityResolver;
use crate::analyzers::types::{
    EvaluationResult, IndicatorKey, IndicatorRecord, IndicatorSeries, KeyGranularity, Listing,
    NormalizeStats, PeriodSummary, PolarityBasis, Report, SeriesPoint, Status,
};
use crate::analyzers::utility::pct;

/// Evaluates every record with `resolver`, preserving input order.
pub fn evaluate_all<R: PolarityResolver + ?Sized>(
    records: &[IndicatorRecord],
    resolver: &R,
) -> Vec<EvaluationResult> {
    records.iter().map(|r| evaluate_record(r, resolver)).collect()
}

/// Counts goals met and not met among evaluations at `period`.
pub fn period_summary(evaluations: &[EvaluationResult], period: &str) -> PeriodSummary {
    let at_period = evaluations.iter().filter(|e| e.record.period == period);
    let (total, met) = at_period.fold((0, 0), |(total, met), e| (total + 1, met + e.met as usize));

    PeriodSummary {
        period: period.to_string(),
        total,
        met,
        not_met: total - met,
        attainment_pct: pct(met, total),
    }
}

/// Groups evaluations by indicator, each group in chronological order.
///
/// Records sharing a period keep their input order.
pub fn group_by_key(
    evaluations: &[EvaluationResult],
    granularity: KeyGranularity,
) -> BTreeMap<IndicatorKey, Vec<&EvaluationResult>> {
    let mut groups: BTreeMap<IndicatorKey, Vec<&EvaluationResult>> = BTreeMap::new();
    for evaluation in evaluations {
        groups
            .entry(IndicatorKey::of(&evaluation.record, granularity))
            .or_default()
            .push(evaluation);
    }
    for group in groups.values_mut() {
        group.sort_by(|a, b| compare_periods(&a.record.period, &b.record.period));
    }
    groups
}

/// Status of one indicator's history at `reference`.
///
/// When several records share the reference period, the first one decides.
pub fn classify(group: &[&EvaluationResult], reference: &str) -> Status {
    match group.iter().find(|e| e.record.period == reference) {
        Some(e) if e.met => Status::Met,
        Some(_) => Status::NotMet,
        None => Status::NoData,
    }
}

fn series_of(key: &IndicatorKey, group: &[&EvaluationResult], reference: &str) -> IndicatorSeries {
    let points: Vec<SeriesPoint> = group
        .iter()
        .map(|e| SeriesPoint {
            period: e.record.period.clone(),
            actual: e.record.actual,
            target: e.record.target,
            met: e.met,
        })
        .collect();

    IndicatorSeries {
        key: key.clone(),
        polarity: group[0].polarity,
        target: points.first().map_or(0.0, |p| p.target),
        points,
        status: classify(group, reference),
    }
}

/// Builds the report for `reference` over already-filtered `records`.
pub fn build_report<R: PolarityResolver + ?Sized>(
    records: &[IndicatorRecord],
    reference: Option<&str>,
    granularity: KeyGranularity,
    resolver: &R,
    normalize: NormalizeStats,
) -> Report {
    let mut report = Report::empty();
    report.normalize = normalize;

    let Some(reference) = reference else {
        return report;
    };
    report.reference_period = Some(reference.to_string());

    let evaluations = evaluate_all(records, resolver);
    report.summary = period_summary(&evaluations, reference);

    let mut ambiguous = BTreeSet::new();
    for (key, group) in group_by_key(&evaluations, granularity) {
        if group.iter().any(|e| e.basis == PolarityBasis::Default) {
            ambiguous.insert(key.clone());
        }

        let series = series_of(&key, &group, reference);
        let current = group.iter().find(|e| e.record.period == reference);
        match (series.status, current) {
            (Status::Met, Some(e)) => report.met.push(listing(&key, e)),
            (Status::NotMet, Some(e)) => report.not_met.push(listing(&key, e)),
            _ => report.no_data.push(key.clone()),
        }
        report.series.push(series);
    }

    report.ambiguous_polarity = ambiguous.into_iter().collect();
    report.generated_at = Utc::now();
    report
}

fn listing(key: &IndicatorKey, evaluation: &EvaluationResult) -> Listing {
    Listing {
        key: key.clone(),
        actual: evaluation.record.actual,
        target: evaluation.record.target,
    }
}
