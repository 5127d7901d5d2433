//! CLI binary for adforge.

use std::path::PathBuf;
use std::sync::Arc;

use adforge::{AppConfig, HttpFetcher, Pipeline, ProductOutcome};
use adforge_search::{DedupRegistry, ProviderRegistry, SearchManager};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

/// adforge: source product images from several image search providers.
#[derive(Parser)]
#[command(name = "adforge", version, about)]
struct Cli {
    /// Path to TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Subcommand to run.
    #[command(subcommand)]
    command: Command,
}

/// Available commands.
#[derive(Subcommand)]
enum Command {
    /// Run one image search and print results as JSON lines.
    Search {
        /// Search query.
        query: String,

        /// Maximum number of results (defaults to the configured value).
        #[arg(long)]
        max: Option<usize>,
    },

    /// Source images for every product listed in a file.
    Run {
        /// Product list: one `name` or `id<TAB>name` per line.
        file: PathBuf,

        /// Worker threads (defaults to the configured value).
        #[arg(long)]
        workers: Option<usize>,
    },

    /// List the built-in provider identifiers.
    Providers,
}

fn main() -> anyhow::Result<()> {
    // Users can override with RUST_LOG=debug to see everything.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("adforge=info,adforge_search=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config = match cli.config {
        Some(ref path) => AppConfig::from_file(path)?,
        None => {
            let path = AppConfig::default_config_path();
            if path.exists() {
                AppConfig::from_file(&path)?
            } else {
                AppConfig::default()
            }
        }
    };

    match cli.command {
        Command::Search { query, max } => run_search(config, &query, max),
        Command::Run { file, workers } => run_batch(config, &file, workers),
        Command::Providers => {
            for id in ProviderRegistry::builtin().ids() {
                println!("{id}");
            }
            Ok(())
        }
    }
}

fn run_search(config: AppConfig, query: &str, max: Option<usize>) -> anyhow::Result<()> {
    config.validate()?;
    let manager = SearchManager::new(config.search, &ProviderRegistry::builtin())?;
    let max = max.unwrap_or(manager.config().max_results);

    let results = manager.search(query, max)?;
    for result in &results {
        println!("{}", serde_json::to_string(result)?);
    }
    Ok(())
}

fn run_batch(
    mut config: AppConfig,
    file: &std::path::Path,
    workers: Option<usize>,
) -> anyhow::Result<()> {
    if let Some(workers) = workers {
        config.pipeline.workers = workers;
    }
    config.validate()?;

    let products = adforge::pipeline::parse_products(&std::fs::read_to_string(file)?);
    let manager = Arc::new(SearchManager::new(config.search, &ProviderRegistry::builtin())?);
    let registry = Arc::new(DedupRegistry::new());
    let fetcher = Arc::new(HttpFetcher::new(&config.pipeline));
    let pipeline = Pipeline::new(manager.clone(), fetcher, registry, &config.pipeline);

    let summary = pipeline.run(products)?;
    for report in &summary.reports {
        match &report.outcome {
            ProductOutcome::Found { candidates, images } => {
                println!(
                    "{}\tfound\t{candidates} candidates\t{} kept",
                    report.product_id,
                    images.len()
                );
            }
            ProductOutcome::Placeholder { reason } => {
                println!("{}\tplaceholder\t{reason}", report.product_id);
            }
            ProductOutcome::Failed { reason } => {
                println!("{}\tfailed\t{reason}", report.product_id);
            }
        }
    }

    println!(
        "\n{} products: {} found, {} placeholders, {} failed, {} unique images",
        summary.processed,
        summary.found,
        summary.placeholders,
        summary.failed,
        summary.unique_images
    );
    for health in manager.health_report() {
        println!(
            "  {:<12} calls={:<5} failures={:<3} {}",
            health.name,
            health.calls,
            health.failure_count,
            if health.open { "OPEN" } else { "closed" }
        );
    }
    Ok(())
}
