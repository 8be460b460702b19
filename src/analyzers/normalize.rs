//! Row normalization: heterogeneous spreadsheet rows into [`IndicatorRecord`]s.

use tracing::{debug, info, warn};

use crate::analyzers::types::{DEFAULT_CATEGORY, IndicatorRecord, NormalizeStats, Normalized};
use crate::source::RawRow;

/// Semantic columns of the indicator spreadsheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Owner,
    Indicator,
    Category,
    Period,
    Target,
    Actual,
    PolarityHint,
}

impl Field {
    /// Fields without which a row is unusable.
    pub const REQUIRED: [Field; 3] = [Field::Owner, Field::Indicator, Field::Period];

    /// Column name written by [`IndicatorRecord::to_raw_row`].
    pub fn canonical(self) -> &'static str {
        self.aliases()[0]
    }

    /// Accepted header names, highest priority first.
    fn aliases(self) -> &'static [&'static str] {
        match self {
            Field::Owner => &["owner", "Gestor", "Unidade", "Unit", "Manager"],
            Field::Indicator => &["indicator", "Indicador", "Indicator Name"],
            Field::Category => &["category", "Macro", "Macrodesafio", "Theme"],
            Field::Period => &[
                "period",
                "Quad",
                "Quadrimestre",
                "Semestre",
                "Semester",
                "Periodo",
                "Período",
            ],
            Field::Target => &["target", "Meta", "Goal"],
            Field::Actual => &["actual", "Valor", "Realizado", "Value"],
            Field::PolarityHint => &["polarity", "Sentido", "Polaridade", "Direction"],
        }
    }

    fn matches(self, column: &str) -> bool {
        let column = column.trim().to_lowercase();
        self.aliases().iter().any(|a| a.to_lowercase() == column)
    }

    /// Cell of this field in `row`, following alias priority.
    ///
    /// Among case variants of one alias the first key in `row` wins. The CSV
    /// reader keeps only the left-most of such columns.
    fn cell(self, row: &RawRow) -> Option<&str> {
        self.aliases().iter().find_map(|alias| {
            let alias = alias.to_lowercase();
            row.iter()
                .find(|(column, _)| column.trim().to_lowercase() == alias)
                .map(|(_, cell)| cell.as_str())
        })
    }
}

/// Canonical names of required fields that no header in `headers` provides.
pub fn missing_required_columns(headers: &[String]) -> Vec<&'static str> {
    Field::REQUIRED
        .iter()
        .filter(|field| !headers.iter().any(|h| field.matches(h)))
        .map(|field| field.canonical())
        .collect()
}

/// Outcome of reading a numeric cell.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Numeric {
    Value(f64),
    Missing,
    Invalid,
}

/// Parses a number written with either `.` or `,` as decimal separator.
///
/// `"12,5"` is 12.5; `"1.234,5"` and `"1,234.5"` are both 1234.5. A separator
/// repeated on its own (`"1.234.567"`, `"1,234,567"`) is grouping. A trailing
/// `%` is ignored. Non-finite values are rejected.
pub fn parse_number(raw: &str) -> Option<f64> {
    let cleaned: String = raw
        .trim()
        .trim_end_matches('%')
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect();
    if cleaned.is_empty() {
        return None;
    }

    let normalized = match (cleaned.rfind('.'), cleaned.rfind(',')) {
        (Some(dot), Some(comma)) if comma > dot => cleaned.replace('.', "").replace(',', "."),
        (Some(_), Some(_)) => cleaned.replace(',', ""),
        (None, Some(_)) if cleaned.matches(',').count() > 1 => cleaned.replace(',', ""),
        (None, Some(_)) => cleaned.replace(',', "."),
        (Some(_), None) if cleaned.matches('.').count() > 1 => cleaned.replace('.', ""),
        _ => cleaned,
    };

    normalized.parse::<f64>().ok().filter(|v| v.is_finite())
}

fn read_numeric(row: &RawRow, field: Field) -> Numeric {
    match field.cell(row).map(str::trim) {
        None | Some("") => Numeric::Missing,
        Some(text) => parse_number(text).map_or(Numeric::Invalid, Numeric::Value),
    }
}

fn read_text(row: &RawRow, field: Field) -> Option<String> {
    field
        .cell(row)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Normalizes `rows`, dropping rows without identity fields and coercing
/// unparseable numbers to 0.
pub fn normalize(rows: &[RawRow]) -> Normalized {
    let mut stats = NormalizeStats {
        rows_in: rows.len(),
        ..Default::default()
    };
    let mut records = Vec::with_capacity(rows.len());

    for (index, row) in rows.iter().enumerate() {
        // Spreadsheet row number, counting the header line.
        let line = index + 2;

        let (Some(owner), Some(indicator), Some(period)) = (
            read_text(row, Field::Owner),
            read_text(row, Field::Indicator),
            read_text(row, Field::Period),
        ) else {
            debug!(line, "Row without owner, indicator or period dropped");
            stats.dropped += 1;
            continue;
        };

        let mut number = |field: Field| match read_numeric(row, field) {
            Numeric::Value(v) => v,
            Numeric::Missing => {
                debug!(line, column = field.canonical(), "Missing numeric cell defaulted to 0");
                stats.missing_numeric += 1;
                0.0
            }
            Numeric::Invalid => {
                warn!(
                    line,
                    column = field.canonical(),
                    value = field.cell(row).unwrap_or_default(),
                    "Unparseable numeric cell coerced to 0"
                );
                stats.coerced_numeric += 1;
                0.0
            }
        };
        let target = number(Field::Target);
        let actual = number(Field::Actual);

        records.push(IndicatorRecord {
            owner,
            indicator,
            category: read_text(row, Field::Category)
                .unwrap_or_else(|| DEFAULT_CATEGORY.to_string()),
            period,
            target,
            actual,
            polarity_hint: read_text(row, Field::PolarityHint),
        });
    }

    stats.kept = records.len();
    info!(
        rows_in = stats.rows_in,
        kept = stats.kept,
        dropped = stats.dropped,
        missing_numeric = stats.missing_numeric,
        coerced_numeric = stats.coerced_numeric,
        "Rows normalized"
    );

    Normalized { records, stats }
}

impl IndicatorRecord {
    /// Canonical raw form; normalizing it yields the record back.
    pub fn to_raw_row(&self) -> RawRow {
        let mut row = RawRow::new();
        row.insert(Field::Owner.canonical().into(), self.owner.clone());
        row.insert(Field::Indicator.canonical().into(), self.indicator.clone());
        row.insert(Field::Category.canonical().into(), self.category.clone());
        row.insert(Field::Period.canonical().into(), self.period.clone());
        row.insert(Field::Target.canonical().into(), self.target.to_string());
        row.insert(Field::Actual.canonical().into(), self.actual.to_string());
        if let Some(hint) = &self.polarity_hint {
            row.insert(Field::PolarityHint.canonical().into(), hint.clone());
        }
        row
    }
}
