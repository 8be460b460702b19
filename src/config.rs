//! Runtime settings read from the environment (and `.env` via `dotenvy`).
//!
//! | Variable                    | Meaning                                  |
//! |-----------------------------|------------------------------------------|
//! | `GOAL_MONITOR_SOURCE`       | CSV/JSON path or URL of the spreadsheet  |
//! | `GOAL_MONITOR_SHEET_ID`     | Google Sheets id, used when no source    |
//! | `GOAL_MONITOR_TIMEOUT_SECS` | HTTP request timeout, default 30         |
//! | `LOG_FILE_PATH`             | JSON log file, default `logs/goal_monitor.log` |

use anyhow::{Context, Result, bail};
use std::time::Duration;

use crate::source::Source;

pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_LOG_FILE: &str = "logs/goal_monitor.log";

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub source: Option<Source>,
    pub timeout: Duration,
    pub log_file_path: String,
}

impl Settings {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds settings from any key lookup; blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let source = match (get("GOAL_MONITOR_SOURCE"), get("GOAL_MONITOR_SHEET_ID")) {
            (Some(source), _) => Some(Source::parse(&source)),
            (None, Some(sheet_id)) => Some(Source::google_sheet(&sheet_id)),
            (None, None) => None,
        };

        let timeout_secs = match get("GOAL_MONITOR_TIMEOUT_SECS") {
            Some(raw) => raw
                .trim()
                .parse::<u64>()
                .with_context(|| format!("GOAL_MONITOR_TIMEOUT_SECS is not a number: '{raw}'"))?,
            None => DEFAULT_TIMEOUT_SECS,
        };
        if timeout_secs == 0 {
            bail!("GOAL_MONITOR_TIMEOUT_SECS must be greater than zero");
        }

        Ok(Self {
            source,
            timeout: Duration::from_secs(timeout_secs),
            log_file_path: get("LOG_FILE_PATH").unwrap_or_else(|| DEFAULT_LOG_FILE.to_string()),
        })
    }

    /// The command-line source if given, else the configured one.
    pub fn resolve_source(&self, cli: Option<&str>) -> Result<Source> {
        match (cli, &self.source) {
            (Some(raw), _) => Ok(Source::parse(raw)),
            (None, Some(source)) => Ok(source.clone()),
            (None, None) => bail!(
                "no data source: pass SOURCE or set GOAL_MONITOR_SOURCE / GOAL_MONITOR_SHEET_ID"
            ),
        }
    }
}
