use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{debug, error, info, warn};

use fpl_price_monitor::apis::create_source;
use fpl_price_monitor::config::Config;
use fpl_price_monitor::logging;
use fpl_price_monitor::notify::{DeliverySink, FeishuWebhook};
use fpl_price_monitor::observability;
use fpl_price_monitor::pipeline::filter::SourceFilter;
use fpl_price_monitor::pipeline::merge::{CanonicalPlayerRecord, MergeEngine};
use fpl_price_monitor::pipeline::{self, report};
use fpl_price_monitor::types::{FetchedBatch, Source};

#[derive(Parser)]
#[command(name = "fpl_price_monitor")]
#[command(about = "Multi-source FPL price change prediction monitor")]
#[command(version = "0.1.0")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch, merge and deliver tonight's price predictions
    Run {
        /// Specific sources to fetch (comma-separated). Available: ffhub, fix, livefpl
        #[arg(long)]
        sources: Option<String>,
        /// Directory to write the JSON analysis artifact into
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Render the report without delivering it
    Preview {
        /// Specific sources to fetch (comma-separated)
        #[arg(long)]
        sources: Option<String>,
        /// Directory to write the JSON analysis artifact into
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Fetch sources and show per-source counts, without merging
    Fetch {
        /// Specific sources to fetch (comma-separated)
        #[arg(long)]
        sources: Option<String>,
    },
}

fn parse_sources(arg: Option<String>) -> Vec<Source> {
    let Some(list) = arg else {
        return Source::ALL.to_vec();
    };

    let mut sources = Vec::new();
    for name in list.split(',') {
        match name.parse::<Source>() {
            Ok(source) => {
                if !sources.contains(&source) {
                    sources.push(source);
                }
            }
            Err(_) => {
                warn!("Unknown source requested: {}", name.trim());
                println!("⚠️  Unknown source: {}", name.trim());
            }
        }
    }
    sources
}

async fn collect_batches(sources: &[Source], config: &Config) -> anyhow::Result<Vec<FetchedBatch>> {
    let mut batches = Vec::new();
    for &source in sources {
        let api = create_source(source, &config.sources)?;
        match api.fetch().await {
            Ok(batch) => batches.push(batch),
            Err(e) => {
                error!("{} fetch failed: {}", source, e);
                println!("❌ {} fetch failed: {}", source, e);
            }
        }
    }

    if batches.is_empty() {
        anyhow::bail!("every requested source failed to fetch");
    }
    Ok(batches)
}

async fn run_pipeline(
    sources: &[Source],
    config: &Config,
) -> anyhow::Result<(Vec<CanonicalPlayerRecord>, String)> {
    let batches = collect_batches(sources, config).await?;
    let filter = SourceFilter::new(&config.filter);
    let engine = MergeEngine::new(&config.merge);
    let records = pipeline::process_batches(batches, &filter, &engine);
    let text = report::format_report(&records);
    Ok((records, text))
}

fn print_summary(records: &[CanonicalPlayerRecord]) {
    let (rising, falling) = report::partition(records);
    let multi_source = records.iter().filter(|r| r.sources.len() > 1).count();

    println!("\n📊 Merge summary:");
    println!("   Canonical players: {}", records.len());
    println!("   Rising: {}", rising.len());
    println!("   Falling: {}", falling.len());
    println!("   Corroborated by several sources: {}", multi_source);
}

/// One diagnostic line per fetched batch: counts plus both freshness
/// stamps, the upstream-reported update time and the local fetch time.
fn fetch_summary(batch: &FetchedBatch, eligible: usize) -> String {
    format!(
        "{}: {} fetched, {} eligible tonight (updated {}, fetched at {})",
        batch.source,
        batch.predictions.len(),
        eligible,
        batch.updated_time.as_deref().unwrap_or("unknown"),
        batch.fetched_at.format("%Y-%m-%d %H:%M:%S")
    )
}

async fn deliver(config: &Config, records: &[CanonicalPlayerRecord], text: &str) {
    if records.is_empty() {
        info!("Nothing to report, skipping delivery");
        println!("⏭️  Nothing to report, skipping delivery");
        return;
    }

    match config.webhook_url() {
        Some(url) => {
            let sink = match FeishuWebhook::new(url, config.notify.timeout_seconds) {
                Ok(sink) => sink,
                Err(e) => {
                    error!("Could not build webhook client: {}", e);
                    println!("❌ Could not build webhook client: {}", e);
                    return;
                }
            };
            match sink.send(text).await {
                Ok(()) => println!("✅ Notification delivered"),
                Err(e) => {
                    error!("Delivery failed: {}", e);
                    println!("❌ Delivery failed: {}", e);
                }
            }
        }
        None => {
            info!("No webhook configured, skipping delivery");
            println!("⚠️  No webhook configured, skipping delivery");
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    // Initialize logging
    logging::init_logging();
    if let Err(e) = observability::metrics::init() {
        warn!("Metrics init failed: {}", e);
    }

    let cli = Cli::parse();
    let config = Config::load_or_default();

    match cli.command {
        Commands::Run { sources, output } => {
            println!("🚀 Running price prediction monitor...");

            let sources = parse_sources(sources);
            if sources.is_empty() {
                anyhow::bail!("no valid sources selected");
            }

            let (records, text) = run_pipeline(&sources, &config).await?;
            println!("\n{}", text);
            print_summary(&records);

            if let Some(dir) = output {
                let path = report::write_analysis(&dir, &records)?;
                println!("   Analysis file: {}", path.display());
            }

            deliver(&config, &records, &text).await;
        }
        Commands::Preview { sources, output } => {
            println!("👀 Rendering report preview...");

            let sources = parse_sources(sources);
            if sources.is_empty() {
                anyhow::bail!("no valid sources selected");
            }

            let (records, text) = run_pipeline(&sources, &config).await?;
            println!("\n{}", text);
            print_summary(&records);

            if let Some(dir) = output {
                let path = report::write_analysis(&dir, &records)?;
                println!("   Analysis file: {}", path.display());
            }
        }
        Commands::Fetch { sources } => {
            println!("📥 Fetching sources...");

            let sources = parse_sources(sources);
            if sources.is_empty() {
                anyhow::bail!("no valid sources selected");
            }

            let filter = SourceFilter::new(&config.filter);
            let batches = collect_batches(&sources, &config).await?;

            println!("\n📊 Fetch results:");
            for batch in &batches {
                let eligible = batch
                    .predictions
                    .iter()
                    .filter(|p| filter.is_eligible(p))
                    .count();
                println!("   {}", fetch_summary(batch, eligible));
            }
        }
    }

    if let Some(snapshot) = observability::metrics::snapshot() {
        debug!("Final metrics:\n{}", snapshot);
    }
    Ok(())
}
