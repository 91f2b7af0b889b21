//! marketfeed CLI: energy spot price and futures collection commands.
//!
//! Commands:
//! - `energy`: fetch day-ahead prices for every configured zone and save raw
//!   and monthly tables as CSV, JSON and Parquet
//! - `futures`: scrape the futures listing, then the detail pages of the
//!   first N instruments, and save both as CSV and Parquet

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use marketfeed_core::energy::EnergyChartsClient;
use marketfeed_core::http::HttpClient;
use marketfeed_core::pacing::FixedPacer;
use marketfeed_core::HarvestConfig;
use marketfeed_runner::{run_energy, run_futures};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(
    name = "marketfeed",
    about = "marketfeed: electricity spot price and futures market collector"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch spot prices for every configured market zone.
    Energy {
        /// Path to a TOML config file. Defaults are used when omitted.
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Scrape the futures listing and the first N detail pages.
    Futures {
        /// Path to a TOML config file. Defaults are used when omitted.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Number of instruments to fetch details for. Overrides
        /// `num_futures_to_fetch` from the config.
        #[arg(long)]
        count: Option<usize>,
    },
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::Energy { config } => run_energy_cmd(config),
        Commands::Futures { config, count } => run_futures_cmd(config, count),
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false))
        .init();
}

fn load_config(path: Option<PathBuf>) -> Result<HarvestConfig> {
    match path {
        Some(path) => HarvestConfig::from_file(&path)
            .with_context(|| format!("failed to load config {}", path.display())),
        None => Ok(HarvestConfig::default()),
    }
}

fn run_energy_cmd(config: Option<PathBuf>) -> Result<()> {
    let config = load_config(config)?.energy;

    let http = HttpClient::plain().context("failed to build HTTP client")?;
    let source = EnergyChartsClient::new(http, config.base_url.clone());

    let summary = run_energy(&config, &source, Utc::now())?;

    for zone in &summary.zones {
        if zone.is_saved() {
            println!(
                "{} ({}): {} samples, {} months, {} files",
                zone.zone.country,
                zone.zone.code,
                zone.samples,
                zone.months,
                zone.files.len()
            );
        } else {
            println!("{} ({}): no data, skipped", zone.zone.country, zone.zone.code);
        }
    }
    println!("Output directory: {}", config.output_dir.display());
    Ok(())
}

fn run_futures_cmd(config: Option<PathBuf>, count: Option<usize>) -> Result<()> {
    let config = load_config(config)?.futures;
    let count = count.unwrap_or(config.num_futures_to_fetch);

    let http = HttpClient::with_headers(&config.headers).context("failed to build HTTP client")?;
    let pacer = FixedPacer::new(config.request_delay(), config.retry_delay());

    info!(pages = config.total_pages, count, "starting futures run");
    let summary = run_futures(&config, &http, &pacer, count)?;

    println!("Listings:  {}", summary.listings);
    println!("Details:   {}", summary.details);
    println!("Files:     {}", summary.files.len());
    println!("List dir:  {}", config.list_output_dir.display());
    println!("Detail dir: {}", config.detail_output_dir.display());
    Ok(())
}
