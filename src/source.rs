//! Raw tabular input: spreadsheet CSV exports and local CSV/JSON files.

use std::collections::BTreeMap;
use std::fmt;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::Duration;

use csv::{ReaderBuilder, Trim};
use serde_json::Value;
use tracing::{debug, info};

use crate::analyzers::normalize::missing_required_columns;
use crate::errors::DataSourceError;
use crate::fetch::{BasicClient, fetch_bytes};

/// One spreadsheet row: column name to cell text.
pub type RawRow = BTreeMap<String, String>;

/// Headers and rows exactly as the source delivered them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<RawRow>,
}

impl RawTable {
    /// Builds a table from rows, collecting headers in order of first appearance.
    pub fn from_rows(rows: Vec<RawRow>) -> Self {
        let mut headers: Vec<String> = Vec::new();
        for row in &rows {
            for column in row.keys() {
                if !headers.contains(column) {
                    headers.push(column.clone());
                }
            }
        }
        Self { headers, rows }
    }

    /// Reads a headed CSV. Cells are trimmed and short rows are accepted.
    pub fn from_csv_reader<R: Read>(reader: R) -> Result<Self, DataSourceError> {
        let mut rdr = ReaderBuilder::new()
            .trim(Trim::All)
            .flexible(true)
            .from_reader(reader);

        let headers: Vec<String> = rdr.headers()?.iter().map(clean_header).collect();
        // Duplicate headers, compared case-insensitively: the left-most column wins.
        let folded: Vec<String> = headers.iter().map(|h| h.to_lowercase()).collect();
        let kept: Vec<bool> = folded
            .iter()
            .enumerate()
            .map(|(i, h)| !folded[..i].contains(h))
            .collect();
        let mut rows = Vec::new();

        for result in rdr.records() {
            let record = result?;
            let row: RawRow = headers
                .iter()
                .zip(record.iter())
                .zip(&kept)
                .filter(|(_, keep)| **keep)
                .map(|((column, cell), _)| (column.clone(), cell.to_string()))
                .collect();
            rows.push(row);
        }

        Ok(Self { headers, rows })
    }

    pub fn from_csv_bytes(bytes: &[u8]) -> Result<Self, DataSourceError> {
        Self::from_csv_reader(bytes)
    }

    /// Reads a JSON array of flat objects.
    pub fn from_json_bytes(bytes: &[u8]) -> Result<Self, DataSourceError> {
        let objects: Vec<serde_json::Map<String, Value>> = serde_json::from_slice(bytes)?;
        let rows = objects
            .into_iter()
            .map(|object| {
                object
                    .into_iter()
                    .map(|(column, value)| (clean_header(&column), cell_text(value)))
                    .collect()
            })
            .collect();
        Ok(Self::from_rows(rows))
    }

    /// Fails when no row could ever survive normalization.
    pub fn validate(&self) -> Result<(), DataSourceError> {
        let missing = missing_required_columns(&self.headers);
        if missing.is_empty() {
            Ok(())
        } else {
            Err(DataSourceError::MissingColumns(missing))
        }
    }
}

fn clean_header(raw: &str) -> String {
    raw.trim_start_matches('\u{feff}').trim().to_string()
}

fn cell_text(value: Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s,
        other => other.to_string(),
    }
}

/// Where the indicator spreadsheet lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    Url(String),
    File(PathBuf),
}

impl Source {
    /// `http(s)://` strings are URLs, anything else is a local path.
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        if raw.starts_with("http://") || raw.starts_with("https://") {
            Source::Url(raw.to_string())
        } else {
            Source::File(PathBuf::from(raw))
        }
    }

    /// CSV export of the first sheet of a Google Sheets document.
    pub fn google_sheet(sheet_id: &str) -> Self {
        Source::Url(format!(
            "https://docs.google.com/spreadsheets/d/{}/export?format=csv",
            sheet_id.trim()
        ))
    }

    fn is_json(&self) -> bool {
        let path = match self {
            Source::Url(url) => Path::new(url.split('?').next().unwrap_or(url)),
            Source::File(path) => path.as_path(),
        };
        path.extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("json"))
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Source::Url(url) => f.write_str(url),
            Source::File(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Loads and validates the raw table, downloading with a `timeout`-bounded client.
#[tracing::instrument(skip(source), fields(source = %source))]
pub async fn load_table(source: &Source, timeout: Duration) -> Result<RawTable, DataSourceError> {
    let bytes = match source {
        Source::Url(url) => {
            let client = BasicClient::new(timeout).map_err(|e| DataSourceError::Unreachable {
                url: url.clone(),
                reason: e.to_string(),
            })?;
            fetch_bytes(&client, url).await?
        }
        Source::File(path) => std::fs::read(path)?,
    };
    parse_table(source, &bytes)
}

/// Parses downloaded bytes as CSV, or JSON when the source ends in `.json`.
pub fn parse_table(source: &Source, bytes: &[u8]) -> Result<RawTable, DataSourceError> {
    debug!(bytes = bytes.len(), json = source.is_json(), "Parsing source table");

    let table = if source.is_json() {
        RawTable::from_json_bytes(bytes)?
    } else {
        RawTable::from_csv_bytes(bytes)?
    };
    table.validate()?;

    info!(
        columns = table.headers.len(),
        rows = table.rows.len(),
        "Source table loaded"
    );
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzers::normalize::normalize;
    use std::env;
    use std::fs;

    fn temp_path(name: &str) -> PathBuf {
        env::temp_dir().join(name)
    }

    #[test]
    fn test_parse_source_kinds() {
        assert_eq!(
            Source::parse("https://example.org/data.csv"),
            Source::Url("https://example.org/data.csv".into())
        );
        assert_eq!(
            Source::parse(" data/indicators.csv "),
            Source::File(PathBuf::from("data/indicators.csv"))
        );
    }

    #[test]
    fn test_google_sheet_export_url() {
        assert_eq!(
            Source::google_sheet("abc123").to_string(),
            "https://docs.google.com/spreadsheets/d/abc123/export?format=csv"
        );
    }

    #[test]
    fn test_csv_headers_are_cleaned_and_cells_trimmed() {
        let csv = "\u{feff} Gestor ,Indicador,Quad\n Unit A , Time ,2024.1\n";
        let table = RawTable::from_csv_bytes(csv.as_bytes()).unwrap();

        assert_eq!(table.headers, vec!["Gestor", "Indicador", "Quad"]);
        assert_eq!(table.rows.len(), 1);
        assert_eq!(table.rows[0]["Gestor"], "Unit A");
        assert_eq!(table.rows[0]["Indicador"], "Time");
    }

    #[test]
    fn test_duplicate_headers_keep_left_most_column() {
        let csv = "Gestor,Indicador,Quad,Meta,META,Meta\nUnit A,Cost,2024.1,10,99,77\n";
        let table = RawTable::from_csv_bytes(csv.as_bytes()).unwrap();

        let row = &table.rows[0];
        assert_eq!(row["Meta"], "10");
        assert!(!row.contains_key("META"));

        let records = normalize(&table.rows).records;
        assert_eq!(records[0].target, 10.0);
    }

    #[test]
    fn test_csv_short_rows_are_kept() {
        let csv = "Gestor,Indicador,Quad,Meta\nUnit A,Cost,2024.1\n";
        let table = RawTable::from_csv_bytes(csv.as_bytes()).unwrap();

        assert_eq!(table.rows.len(), 1);
        assert!(!table.rows[0].contains_key("Meta"));
    }

    #[test]
    fn test_json_cells_become_text() {
        let json = r#"[{"owner": "Unit A", "indicator": "Cost", "period": 2024.1, "target": 10, "polarity": null}]"#;
        let table = RawTable::from_json_bytes(json.as_bytes()).unwrap();

        let row = &table.rows[0];
        assert_eq!(row["period"], "2024.1");
        assert_eq!(row["target"], "10");
        assert_eq!(row["polarity"], "");
        assert!(table.validate().is_ok());
    }

    #[test]
    fn test_parse_table_uses_json_for_json_paths() {
        let source = Source::parse("exports/indicators.json");
        let json = br#"[{"Gestor": "Unit A", "Indicador": "Cost", "Quad": "2024.1"}]"#;
        let table = parse_table(&source, json).unwrap();
        assert_eq!(table.rows.len(), 1);
    }

    #[test]
    fn test_validate_reports_missing_identity_columns() {
        let table = RawTable::from_csv_bytes(b"Meta,Valor\n1,2\n").unwrap();
        match table.validate() {
            Err(DataSourceError::MissingColumns(missing)) => {
                assert_eq!(missing, vec!["owner", "indicator", "period"]);
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_load_table_from_file() {
        let path = temp_path("goal_monitor_test_source.csv");
        fs::write(&path, "Gestor,Indicador,Semestre,Meta,Valor\nUnit A,Cost,2024.1,10,8\n").unwrap();

        let table = load_table(&Source::File(path.clone()), Duration::from_secs(1))
            .await
            .unwrap();
        assert_eq!(table.rows.len(), 1);

        fs::remove_file(&path).unwrap();
    }

    #[tokio::test]
    async fn test_load_table_missing_file_is_io_error() {
        let path = temp_path("goal_monitor_test_does_not_exist.csv");
        let err = load_table(&Source::File(path), Duration::from_secs(1))
            .await
            .unwrap_err();
        assert!(matches!(err, DataSourceError::Io(_)));
        assert!(!err.is_temporary());
    }
}
