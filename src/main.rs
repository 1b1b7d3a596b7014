//! Sitepace main entry point
//!
//! This is the command-line interface for the Sitepace crawler.

use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use sitepace::config::{load_config_with_hash, Config};
use sitepace::crawler::build_driver;
use sitepace::export::{export_config, export_pages, write_json};
use sitepace::storage::{open_store, PageStore};
use tracing_subscriber::EnvFilter;

/// Sitepace: a polite per-domain web crawler
///
/// Sitepace keeps one frontier per configured domain, fetches one page at a
/// time with a fixed delay per domain, and records when page content changes.
#[derive(Parser, Debug)]
#[command(name = "sitepace")]
#[command(version)]
#[command(about = "A polite per-domain web crawler", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Drain every domain once, then exit
    #[arg(long, conflicts_with = "continuous")]
    once: bool,

    /// Restart exhausted domains and crawl until interrupted
    #[arg(long, conflicts_with = "once")]
    continuous: bool,

    /// Print the stored domain list as JSON and exit
    #[arg(long, conflicts_with = "export")]
    print_config: bool,

    /// Print the stored pages of DOMAIN as JSON and exit
    #[arg(long, value_name = "DOMAIN", conflicts_with = "print_config")]
    export: Option<String>,

    /// Only export pages changed after this RFC3339 time
    #[arg(long, value_name = "RFC3339", requires = "export")]
    since: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (mut config, hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("Failed to load {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", hash);

    if cli.once {
        config.crawler.once = true;
    } else if cli.continuous {
        config.crawler.once = false;
    }

    if cli.print_config {
        handle_print_config(&config)
    } else if let Some(domain) = cli.export.as_deref() {
        handle_export(&config, domain, cli.since.as_deref().unwrap_or(""))
    } else {
        handle_crawl(&config).await
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("sitepace=info,warn"),
            1 => EnvFilter::new("sitepace=debug,info"),
            2 => EnvFilter::new("sitepace=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Opens the configured store with the config file's domains saved into it
fn open_configured_store(config: &Config) -> anyhow::Result<Arc<dyn PageStore>> {
    let store = open_store(&config.storage).context("Failed to open page store")?;
    if !config.domains.is_empty() {
        store.save_config(&config.domains)?;
    }
    Ok(store)
}

/// Handles --print-config: prints the domain list the crawler would use
fn handle_print_config(config: &Config) -> anyhow::Result<()> {
    let store = open_configured_store(config)?;
    let domains = export_config(store.as_ref())?;
    write_json(std::io::stdout().lock(), &domains)?;
    store.close()?;
    Ok(())
}

/// Handles --export: prints the pages of one domain changed since a checkpoint
fn handle_export(config: &Config, domain: &str, since: &str) -> anyhow::Result<()> {
    let store = open_store(&config.storage).context("Failed to open page store")?;
    let export = export_pages(store.as_ref(), domain, since)?;
    tracing::info!("Exporting {} page(s) of {}", export.pages.len(), domain);
    write_json(std::io::stdout().lock(), &export)?;
    store.close()?;
    Ok(())
}

/// Handles the main crawl operation
async fn handle_crawl(config: &Config) -> anyhow::Result<()> {
    tracing::info!(
        "Starting crawl ({} mode, {} configured domain(s))",
        if config.crawler.once { "once" } else { "continuous" },
        config.domains.len()
    );

    let mut driver = build_driver(config).context("Failed to start crawler")?;

    let shutdown = driver.scheduler().shutdown_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Interrupt received, stopping");
            shutdown.cancel();
        }
    });

    let result = driver.run().await;
    driver.store().close()?;

    match result {
        Ok(stats) => {
            tracing::info!(
                "Crawl completed successfully: {} page(s) fetched, {} discovered",
                stats.fetched,
                stats.discovered
            );
            Ok(())
        }
        Err(e) => {
            tracing::error!("Crawl failed: {}", e);
            Err(e.into())
        }
    }
}
