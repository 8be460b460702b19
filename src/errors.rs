use std::io;

use thiserror::Error;

/// Failure to obtain a usable table from the indicator data source.
///
/// Row-level problems (missing identity fields, unparseable numbers) are not
/// errors; they are counted in [`NormalizeStats`](crate::analyzers::types::NormalizeStats).
#[derive(Debug, Error)]
pub enum DataSourceError {
    #[error("request to '{url}' timed out")]
    Timeout { url: String },
    #[error("data source '{url}' is unreachable: {reason}")]
    Unreachable { url: String, reason: String },
    #[error("data source '{url}' answered with HTTP {status}")]
    Status { url: String, status: u16 },
    #[error("invalid source URL '{0}'")]
    InvalidUrl(String),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error("malformed CSV: {0}")]
    Csv(#[from] csv::Error),
    #[error("malformed JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("table has no column for required field(s): {}", .0.join(", "))]
    MissingColumns(Vec<&'static str>),
}

impl DataSourceError {
    /// Temporary failures may succeed on an explicit user-triggered reload.
    pub fn is_temporary(&self) -> bool {
        matches!(self, Self::Timeout { .. } | Self::Unreachable { .. })
    }

    pub(crate) fn from_reqwest(url: &str, err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout {
                url: url.to_string(),
            }
        } else if let Some(status) = err.status() {
            Self::Status {
                url: url.to_string(),
                status: status.as_u16(),
            }
        } else {
            Self::Unreachable {
                url: url.to_string(),
                reason: err.to_string(),
            }
        }
    }
}
