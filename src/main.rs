//! CLI entry point for the goal monitor.
//!
//! Loads the indicator spreadsheet, evaluates goals, and prints the summary
//! and listings for a reference period. Every invocation reloads the source.

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use goal_monitor::analyzers::analyzer::{Dataset, ReportOptions, load_dataset};
use goal_monitor::analyzers::polarity::{HintFirstPolarity, KeywordPolarity, PolarityResolver};
use goal_monitor::analyzers::types::KeyGranularity;
use goal_monitor::config::Settings;
use goal_monitor::output::{append_records, print_pretty, render_text, to_json};
use std::ffi::OsStr;
use std::path::Path;
use tracing::{error, info};
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "goal_monitor")]
#[command(about = "Evaluate goal attainment of indicators from a spreadsheet", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct SourceArgs {
    /// Path or URL of the indicator spreadsheet (CSV or JSON)
    #[arg(value_name = "FILE_OR_URL")]
    source: Option<String>,

    /// HTTP timeout in seconds (overrides GOAL_MONITOR_TIMEOUT_SECS)
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    timeout: Option<u64>,
}

#[derive(Args)]
struct FilterArgs {
    /// Reference period (defaults to the latest period in the data)
    #[arg(short = 'p', long)]
    reference_period: Option<String>,

    /// Category allow-list (repeatable; default: all)
    #[arg(short, long = "category")]
    categories: Vec<String>,

    /// Owner allow-list (repeatable; default: all under the chosen categories)
    #[arg(short, long = "owner")]
    owners: Vec<String>,

    /// Indicator allow-list (repeatable; default: all under the chosen owners)
    #[arg(short, long = "indicator")]
    indicators: Vec<String>,

    /// Treat the same owner/indicator in different categories as distinct
    #[arg(long, default_value_t = false)]
    by_category: bool,

    /// Let an explicit polarity hint override the indicator-name keywords
    #[arg(long, default_value_t = false)]
    hint_first: bool,
}

impl FilterArgs {
    fn options(&self) -> ReportOptions {
        let list = |values: &Vec<String>| (!values.is_empty()).then(|| values.clone());
        ReportOptions {
            reference_period: self.reference_period.clone(),
            categories: list(&self.categories),
            owners: list(&self.owners),
            indicators: list(&self.indicators),
            granularity: if self.by_category {
                KeyGranularity::CategoryOwnerIndicator
            } else {
                KeyGranularity::OwnerIndicator
            },
        }
    }

    fn resolver(&self) -> Box<dyn PolarityResolver> {
        if self.hint_first {
            Box::new(HintFirstPolarity::default())
        } else {
            Box::new(KeywordPolarity::default())
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Summarize goals met / not met at the reference period
    Report {
        #[command(flatten)]
        source: SourceArgs,

        #[command(flatten)]
        filters: FilterArgs,

        /// Print the full report as JSON instead of text
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// List the periods present in the data, oldest first
    Periods {
        #[command(flatten)]
        source: SourceArgs,
    },
    /// List the selectable categories, owners and indicators
    Options {
        #[command(flatten)]
        source: SourceArgs,

        #[command(flatten)]
        filters: FilterArgs,
    },
    /// Append per-record evaluations to a CSV file
    Export {
        #[command(flatten)]
        source: SourceArgs,

        #[command(flatten)]
        filters: FilterArgs,

        /// CSV file to append results to
        #[arg(short = 'O', long, default_value = "evaluations.csv")]
        output: String,

        /// Only export records of the reference period
        #[arg(long, default_value_t = false)]
        reference_only: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file
    let settings = Settings::from_env()?;

    // Logging setup: colored stderr + JSON rolling log file
    let log_dir = Path::new(&settings.log_file_path)
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&settings.log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("goal_monitor.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Report {
            source,
            filters,
            json,
        } => {
            let dataset = load(&settings, &source).await?;
            let report = dataset.report(&filters.options(), filters.resolver().as_ref());
            print_pretty(&report);

            if json {
                println!("{}", to_json(&report)?);
            } else {
                print!("{}", render_text(&report));
            }
        }
        Commands::Periods { source } => {
            let dataset = load(&settings, &source).await?;
            for period in dataset.periods() {
                println!("{period}");
            }
        }
        Commands::Options { source, filters } => {
            let dataset = load(&settings, &source).await?;
            let options = dataset.filter_options(&filters.options());

            println!("categories: {}", options.categories.join(", "));
            println!("owners:     {}", options.owners.join(", "));
            println!("indicators: {}", options.indicators.join(", "));
        }
        Commands::Export {
            source,
            filters,
            output,
            reference_only,
        } => {
            let dataset = load(&settings, &source).await?;
            let evaluations = dataset.evaluations(
                &filters.options(),
                reference_only,
                filters.resolver().as_ref(),
            );
            append_records(&output, &evaluations)?;
            info!(output = %output, rows = evaluations.len(), "Evaluations exported");
        }
    }

    Ok(())
}

/// Loads the dataset. A failed load is logged and yields an empty dataset,
/// so the caller renders an empty report instead of aborting.
async fn load(settings: &Settings, args: &SourceArgs) -> Result<Dataset> {
    let source = settings.resolve_source(args.source.as_deref())?;
    let timeout = args
        .timeout
        .map(std::time::Duration::from_secs)
        .unwrap_or(settings.timeout);

    match load_dataset(&source, timeout).await {
        Ok(dataset) => Ok(dataset),
        Err(e) => {
            error!(
                source = %source,
                error = %e,
                temporary = e.is_temporary(),
                "Failed to load indicator data; run again to reload"
            );
            Ok(Dataset::default())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_must_be_positive() {
        assert!(Cli::try_parse_from(["goal_monitor", "periods", "data.csv", "--timeout", "0"]).is_err());

        let cli = Cli::try_parse_from(["goal_monitor", "periods", "data.csv", "--timeout", "5"]).unwrap();
        match cli.command {
            Commands::Periods { source } => assert_eq!(source.timeout, Some(5)),
            _ => panic!("expected the periods command"),
        }
    }
}
