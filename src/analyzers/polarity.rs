//! Polarity resolution: whether an indicator improves upward or downward.
//!
//! The default resolver is a name heuristic. It lives behind
//! [`PolarityResolver`] so an explicit metadata column can replace it without
//! touching goal evaluation.

use tracing::debug;

use crate::analyzers::normalize::parse_number;
use crate::analyzers::types::{Polarity, PolarityBasis};

/// Name fragments of indicators where a smaller value is the better one.
pub static LOWER_IS_BETTER_KEYWORDS: &[&str] = &[
    "tempo",
    "time",
    "duração",
    "duration",
    "prazo médio",
    "congestionamento",
    "congestion",
    "custo",
    "cost",
    "despesa",
    "expense",
    "gasto",
    "absenteísmo",
    "absenteeism",
    "acervo",
    "backlog",
    "pendente",
    "pending",
];

static MEET_OR_EXCEED_MARKERS: &[&str] = &["superar", "exceed", "surpass", ">=", "≥", "maior"];
static MAINTAIN_OR_BELOW_MARKERS: &[&str] = &["manter", "maintain", "keep", "<=", "≤", "menor"];

pub trait PolarityResolver {
    /// Resolves the polarity and reports which rule decided it.
    fn resolve_with_basis(&self, indicator: &str, hint: Option<&str>) -> (Polarity, PolarityBasis);

    fn resolve(&self, indicator: &str, hint: Option<&str>) -> Polarity {
        self.resolve_with_basis(indicator, hint).0
    }
}

/// Keyword match on the indicator name first, then the hint, then higher-is-better.
#[derive(Debug, Clone)]
pub struct KeywordPolarity {
    lower_keywords: Vec<String>,
}

impl Default for KeywordPolarity {
    fn default() -> Self {
        Self::with_keywords(LOWER_IS_BETTER_KEYWORDS.iter().copied())
    }
}

impl KeywordPolarity {
    pub fn with_keywords<'a>(keywords: impl IntoIterator<Item = &'a str>) -> Self {
        Self {
            lower_keywords: keywords.into_iter().map(str::to_lowercase).collect(),
        }
    }

    fn keyword(&self, indicator: &str) -> Option<Polarity> {
        let name = indicator.to_lowercase();
        self.lower_keywords
            .iter()
            .any(|k| name.contains(k.as_str()))
            .then_some(Polarity::LowerIsBetter)
    }
}

impl PolarityResolver for KeywordPolarity {
    fn resolve_with_basis(&self, indicator: &str, hint: Option<&str>) -> (Polarity, PolarityBasis) {
        if let Some(polarity) = self.keyword(indicator) {
            return (polarity, PolarityBasis::Keyword);
        }
        if let Some(resolved) = hint.and_then(from_hint) {
            return resolved;
        }
        debug!(indicator, "No polarity keyword or hint, assuming higher is better");
        (Polarity::HigherIsBetter, PolarityBasis::Default)
    }
}

/// Lets an explicit hint override the name heuristic.
#[derive(Debug, Clone, Default)]
pub struct HintFirstPolarity(pub KeywordPolarity);

impl PolarityResolver for HintFirstPolarity {
    fn resolve_with_basis(&self, indicator: &str, hint: Option<&str>) -> (Polarity, PolarityBasis) {
        match hint.and_then(from_hint) {
            Some(resolved) => resolved,
            None => self.0.resolve_with_basis(indicator, None),
        }
    }
}

/// Reads a numeric (`1` / `-1`) or textual direction hint.
fn from_hint(hint: &str) -> Option<(Polarity, PolarityBasis)> {
    match parse_number(hint) {
        Some(v) if v == 1.0 => return Some((Polarity::HigherIsBetter, PolarityBasis::NumericHint)),
        Some(v) if v == -1.0 => return Some((Polarity::LowerIsBetter, PolarityBasis::NumericHint)),
        _ => {}
    }

    let text = hint.to_lowercase();
    if MEET_OR_EXCEED_MARKERS.iter().any(|m| text.contains(m)) {
        Some((Polarity::HigherIsBetter, PolarityBasis::DirectionHint))
    } else if MAINTAIN_OR_BELOW_MARKERS.iter().any(|m| text.contains(m)) {
        Some((Polarity::LowerIsBetter, PolarityBasis::DirectionHint))
    } else {
        None
    }
}
