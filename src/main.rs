use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use config::ApiConfig;
use fetcher::SuburbFetcher;
use pipeline::{ReportOutcome, SuburbReport};
use processor::{JsonFlattener, ListingAnalyzer};
use std::path::PathBuf;
use storage::ReportWriter;
use tracing::{Level, debug, error, info, warn};
use tracing_subscriber::EnvFilter;

mod config;
mod fetcher;
mod models;
mod pipeline;
mod processor;
mod storage;

#[derive(Parser)]
#[command(name = "suburb-insights", about = "Suburb property listing statistics")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Fetch listings for a suburb from the API and report on them
    Fetch {
        suburb: String,

        /// Property type filter passed to the API (defaults to the config value)
        #[arg(long)]
        property_type: Option<String>,

        #[arg(long, default_value = "configs/suburb_api.toml")]
        config: String,

        /// Save the raw `results` array before analysis
        #[arg(long)]
        save_raw: Option<PathBuf>,

        #[command(flatten)]
        output: OutputArgs,
    },
    /// Report on a previously saved API response
    Analyze {
        input: PathBuf,

        #[arg(long, default_value = "saved response")]
        suburb: String,

        /// Property type filter the saved response was fetched with
        #[arg(long, default_value = config::DEFAULT_PROPERTY_TYPE)]
        property_type: String,

        #[command(flatten)]
        output: OutputArgs,
    },
}

#[derive(Args)]
struct OutputArgs {
    /// Write the six report sections as JSON
    #[arg(long)]
    summary_json: Option<PathBuf>,

    /// Write the analyzed listings as Parquet
    #[arg(long)]
    parquet: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    dotenv::dotenv().ok();

    let cli = Cli::parse();
    let flattener = JsonFlattener::new();
    let analyzer = ListingAnalyzer::new();
    let report = SuburbReport::new(&flattener, &analyzer);

    match cli.command {
        Command::Fetch {
            suburb,
            property_type,
            config,
            save_raw,
            output,
        } => {
            let api_config = ApiConfig::load_or_default(&config)
                .with_context(|| format!("Failed to load API config from {}", config))?;
            api_config.validate()?;

            let property_type =
                property_type.unwrap_or_else(|| api_config.query.default_property_type.clone());
            info!(
                "🚀 Fetching {} listings for {} ({})",
                api_config.api.name, suburb, property_type
            );

            let fetcher = SuburbFetcher::new(api_config).context("Failed to build HTTP client")?;
            let outcome = match report.build(&fetcher, &suburb, &property_type).await {
                Ok(outcome) => outcome,
                Err(e) => {
                    if let Some(code) = e.status_code() {
                        error!("❌ Upstream API answered with HTTP {}", code);
                    }
                    error!("❌ {}", e);
                    return Err(e.into());
                }
            };

            if let (ReportOutcome::Ready { raw, .. }, Some(path)) = (&outcome, &save_raw) {
                ReportWriter::store_raw_json(path, raw)?;
            }

            finish(&report, &suburb, &property_type, outcome, &output)
        }
        Command::Analyze {
            input,
            suburb,
            property_type,
            output,
        } => {
            info!("🚀 Analyzing saved listings from {}", input.display());
            let raw = ReportWriter::load_raw_results(&input)?;
            let outcome = report.from_results(raw);
            finish(&report, &suburb, &property_type, outcome, &output)
        }
    }
}

fn finish(
    report: &SuburbReport<'_>,
    suburb: &str,
    property_type: &str,
    outcome: ReportOutcome,
    output: &OutputArgs,
) -> Result<()> {
    let (raw, rows, analysis) = match outcome {
        ReportOutcome::NoResults => {
            warn!("⚠️ {}", pipeline::NO_RESULTS_MESSAGE);
            return Ok(());
        }
        ReportOutcome::Ready {
            raw,
            rows,
            analysis,
        } => (raw, rows, analysis),
    };

    if tracing::enabled!(Level::DEBUG) {
        let df = report.flattener().flatten_to_dataframe(&raw)?;
        debug!("Flattened listings:\n{}", df.head(Some(5)));
    }

    ReportWriter::log_report(suburb, property_type, &analysis);

    if let Some(path) = &output.summary_json {
        ReportWriter::store_summary_json(path, &analysis)?;
    }

    if let Some(path) = &output.parquet {
        let listings = report.analyzer().coerce_rows(&rows);
        ReportWriter::store_parquet(path, &listings)?;
    }

    info!("🎉 Report for {} completed", suburb);
    Ok(())
}
