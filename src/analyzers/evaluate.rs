use crate::analyzers::polarity::PolarityResolver;
use crate::analyzers::types::{EvaluationResult, IndicatorRecord, Polarity};

/// Whether `actual` meets `target` under `polarity`.
///
/// | Polarity       | Met when          |
/// |----------------|-------------------|
/// | HigherIsBetter | actual >= target  |
/// | LowerIsBetter  | actual <= target  |
///
/// Equality counts as met. A NaN on either side is never met.
pub fn goal_met(actual: f64, target: f64, polarity: Polarity) -> bool {
    if actual.is_nan() || target.is_nan() {
        return false;
    }
    match polarity {
        Polarity::HigherIsBetter => actual >= target,
        Polarity::LowerIsBetter => actual <= target,
    }
}

pub fn evaluate(record: &IndicatorRecord, polarity: Polarity) -> bool {
    goal_met(record.actual, record.target, polarity)
}

/// Resolves the record's polarity with `resolver` and evaluates it.
pub fn evaluate_record<R: PolarityResolver + ?Sized>(
    record: &IndicatorRecord,
    resolver: &R,
) -> EvaluationResult {
    let (polarity, basis) =
        resolver.resolve_with_basis(&record.indicator, record.polarity_hint.as_deref());
    EvaluationResult {
        record: record.clone(),
        polarity,
        basis,
        met: evaluate(record, polarity),
    }
}
