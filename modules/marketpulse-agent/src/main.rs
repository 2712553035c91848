use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use gemini_client::GeminiClient;
use marketpulse_common::{build_queries, Config, MarketError, ShopRecord};

use marketpulse_agent::analyst::{analyze_market_data, AnalysisResult};
use marketpulse_agent::export;
use marketpulse_agent::providers::{build_provider, ProviderKind};
use marketpulse_agent::scan::{ScanBatch, Scanner};
use marketpulse_agent::store::ShopStore;

#[derive(Parser)]
#[command(name = "marketpulse", about = "Local market intelligence agent")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Full cycle: scrape, store, export CSV, analyze.
    Run(ScrapeArgs),
    /// Scrape and write the CSV sheet only.
    Scrape(ScrapeArgs),
    /// Generate an AI report from an existing CSV dataset.
    Report {
        /// CSV sheet of shop records to analyze.
        file: PathBuf,
    },
    /// Export the cloud table to a CSV sheet.
    Export,
}

#[derive(Args)]
struct ScrapeArgs {
    /// Target location, e.g. "Kochi".
    #[arg(long)]
    location: String,

    /// Single category to scan; empty scans the default set.
    #[arg(long, default_value = "")]
    category: String,

    /// Scraping strategy.
    #[arg(long, value_enum, default_value_t = ProviderKind::SerpApi)]
    provider: ProviderKind,

    /// Skip the quota confirmation prompt.
    #[arg(long)]
    yes: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("marketpulse=info".parse()?))
        .init();

    info!("MarketPulse agent starting...");

    let config = Config::from_env();
    config.log_redacted();

    let cli = Cli::parse();
    match cli.command {
        Command::Run(args) => run_cycle(&config, &args, true).await,
        Command::Scrape(args) => run_cycle(&config, &args, false).await,
        Command::Report { file } => report(&config, &file).await,
        Command::Export => export_cloud(&config).await,
    }
}

async fn run_cycle(config: &Config, args: &ScrapeArgs, full: bool) -> Result<()> {
    let queries = build_queries(&args.location, &args.category)?;

    if !args.yes && !confirm_quota(queries.len())? {
        info!("Aborted by user");
        return Ok(());
    }

    let provider = build_provider(args.provider, config)?;
    let batch = Scanner::new(provider).run(&queries).await;
    info!("Scan finished. {}", batch.stats);

    if batch.is_empty() {
        warn!("No records scraped; nothing to store or analyze");
        return Ok(());
    }

    if full {
        let store = ShopStore::from_config(config);
        let outcome = store.save(&batch.records, true).await;
        if outcome.success {
            info!(message = %outcome.message, "Cloud sync");
        } else {
            warn!(message = %outcome.message, "Cloud sync failed, continuing");
        }
    }

    let sheet = PathBuf::from(export::scan_csv_name(&args.location));
    export::write_records_csv(&sheet, &batch.records)?;

    if full {
        analyze_if_configured(config, &batch).await;
    }

    Ok(())
}

async fn analyze_if_configured(config: &Config, batch: &ScanBatch) {
    let Some(key) = &config.gemini_key else {
        info!("GEMINI_KEY not set, skipping AI analysis");
        return;
    };

    let backend = GeminiClient::new(key);
    print_analysis(analyze_market_data(&backend, &batch.records, Path::new(".")).await);
}

async fn report(config: &Config, file: &Path) -> Result<()> {
    let Some(key) = &config.gemini_key else {
        return Err(MarketError::Config(
            "GEMINI_KEY is required for report generation".to_string(),
        )
        .into());
    };

    let records = export::read_records_csv(file)?;
    info!(count = records.len(), "Dataset loaded");

    let backend = GeminiClient::new(key);
    print_analysis(analyze_market_data(&backend, &records, Path::new(".")).await);
    Ok(())
}

fn print_analysis(result: AnalysisResult) {
    match result {
        AnalysisResult::Complete {
            analysis,
            artifacts,
        } => {
            println!("\n{analysis}\n");
            info!(
                json = %artifacts.json.display(),
                document = %artifacts.document.display(),
                "Report artifacts written"
            );
        }
        AnalysisResult::Failed { message } => {
            // A failed report is a message, not a crash.
            warn!("{message}");
            println!("\n{message}\n");
        }
    }
}

async fn export_cloud(config: &Config) -> Result<()> {
    let store = ShopStore::from_config(config);
    let records: Vec<ShopRecord> = store.export_all().await?;
    if records.is_empty() {
        warn!("Cloud table is empty, nothing to export");
        return Ok(());
    }

    let sheet = PathBuf::from(export::cloud_export_name());
    export::write_records_csv(&sheet, &records)?;
    Ok(())
}

/// Show the estimated provider usage and ask before spending quota.
fn confirm_quota(searches: usize) -> Result<bool> {
    println!("This run will issue {searches} provider searches.");
    print!("Proceed? [y/N] ");
    std::io::stdout().flush()?;

    let mut answer = String::new();
    std::io::stdin().read_line(&mut answer)?;
    let answer = answer.trim().to_lowercase();
    Ok(answer == "y" || answer == "yes")
}
