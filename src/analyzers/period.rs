//! Chronological ordering of period labels such as `"2024.1"`.

use std::cmp::Ordering;

/// A period label parsed for ordering.
///
/// Parsed labels order by `(year, subperiod)`; labels that do not look like a
/// period sort after every parsed one, lexically among themselves.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum PeriodKey {
    Parsed { year: u32, subperiod: u32 },
    Unparsed(String),
}

impl PeriodKey {
    /// Accepts `YYYY`, `YYYY.N`, `YYYY/N`, `YYYY-N` and `N/YYYY` (also with
    /// `º`/`°` or a `Q`/`S` prefix on the subperiod, e.g. `"2024-Q2"`).
    pub fn parse(label: &str) -> Self {
        let trimmed = label.trim();
        let parts: Vec<&str> = trimmed
            .split(|c: char| matches!(c, '.' | '/' | '-' | ' ' | '_'))
            .filter(|p| !p.is_empty())
            .collect();

        let parsed = match parts.as_slice() {
            [year] => year_of(year).map(|year| (year, 0)),
            [a, b] => match (year_of(a), subperiod_of(b)) {
                (Some(year), Some(sub)) => Some((year, sub)),
                _ => match (subperiod_of(a), year_of(b)) {
                    (Some(sub), Some(year)) => Some((year, sub)),
                    _ => None,
                },
            },
            _ => None,
        };

        match parsed {
            Some((year, subperiod)) => PeriodKey::Parsed { year, subperiod },
            None => PeriodKey::Unparsed(trimmed.to_string()),
        }
    }
}

fn year_of(part: &str) -> Option<u32> {
    (part.len() == 4 && part.chars().all(|c| c.is_ascii_digit()))
        .then(|| part.parse().ok())
        .flatten()
}

fn subperiod_of(part: &str) -> Option<u32> {
    let digits = part
        .trim_start_matches(|c: char| matches!(c, 'Q' | 'q' | 'S' | 's' | 'T' | 't'))
        .trim_end_matches(|c: char| matches!(c, 'º' | '°' | 'o' | 'ª'));
    if digits.is_empty() || digits.len() > 2 || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

/// Compares two period labels chronologically.
pub fn compare_periods(a: &str, b: &str) -> Ordering {
    PeriodKey::parse(a)
        .cmp(&PeriodKey::parse(b))
        .then_with(|| a.cmp(b))
}

/// Distinct periods, oldest first.
pub fn sorted_periods<'a>(periods: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    let mut out: Vec<String> = periods.into_iter().map(str::to_string).collect();
    out.sort_by(|a, b| compare_periods(a, b));
    out.dedup();
    out
}

/// The most recent period, the default reference period.
pub fn latest_period<'a>(periods: impl IntoIterator<Item = &'a str>) -> Option<String> {
    periods
        .into_iter()
        .max_by(|a, b| compare_periods(a, b))
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_common_shapes() {
        let expected = PeriodKey::Parsed {
            year: 2024,
            subperiod: 2,
        };
        assert_eq!(PeriodKey::parse("2024.2"), expected);
        assert_eq!(PeriodKey::parse("2024/2"), expected);
        assert_eq!(PeriodKey::parse("2024-Q2"), expected);
        assert_eq!(PeriodKey::parse("2º/2024"), expected);
        assert_eq!(PeriodKey::parse(" 2024 2 "), expected);
        assert_eq!(
            PeriodKey::parse("2024"),
            PeriodKey::Parsed {
                year: 2024,
                subperiod: 0
            }
        );
    }

    #[test]
    fn test_unparseable_labels() {
        assert_eq!(
            PeriodKey::parse("first half"),
            PeriodKey::Unparsed("first half".into())
        );
        assert_eq!(PeriodKey::parse("24.1"), PeriodKey::Unparsed("24.1".into()));
    }

    #[test]
    fn test_numeric_subperiod_not_lexical() {
        assert_eq!(compare_periods("2024.2", "2024.10"), Ordering::Less);
        assert_eq!(compare_periods("2023.3", "2024.1"), Ordering::Less);
        assert_eq!(compare_periods("2024.1", "2024.1"), Ordering::Equal);
    }

    #[test]
    fn test_unparsed_sort_last() {
        assert_eq!(compare_periods("2030.1", "annual"), Ordering::Less);
    }

    #[test]
    fn test_sorted_and_latest() {
        let periods = ["2024.10", "2024.2", "2023.1", "2024.2"];
        assert_eq!(
            sorted_periods(periods.iter().copied()),
            vec!["2023.1", "2024.2", "2024.10"]
        );
        assert_eq!(latest_period(periods.iter().copied()), Some("2024.10".to_string()));
        assert_eq!(latest_period(std::iter::empty()), None);
    }
}
