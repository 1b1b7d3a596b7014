//! Crawler module for dispatching, fetching and processing pages
//!
//! This module contains the core crawling logic, including:
//! - Per-domain dispatch timing and frontier management (the scheduler)
//! - The single-consumer crawl loop (the driver)
//! - HTTP fetching with a bounded timeout
//! - HTML parsing and same-host link extraction

mod driver;
mod fetcher;
mod parser;
mod scheduler;

pub use driver::{CrawlDriver, CrawlStats};
pub use fetcher::{build_http_client, FetchError, Fetcher, HttpFetcher};
pub use parser::{extract_same_host_links, extract_title, parse_page, ParsedPage};
pub use scheduler::{PageEvent, Scheduler};

use crate::config::Config;
use crate::frontier::open_frontier;
use crate::storage::open_store;
use crate::Result;

/// Wires the configured store, frontier backend and HTTP fetcher together
///
/// A non-empty `[[domain]]` list replaces the domain list held by the
/// store; the scheduler always reads its domains back from the store.
/// Must be called from within a Tokio runtime.
///
/// # Returns
///
/// * `Ok(CrawlDriver)` - Ready to run; notifiers are already started
/// * `Err(PaceError)` - Failed to open a backend or load the domains
pub fn build_driver(config: &Config) -> Result<CrawlDriver<HttpFetcher>> {
    let store = open_store(&config.storage)?;
    if !config.domains.is_empty() {
        store.save_config(&config.domains)?;
    }

    let root = open_frontier(&config.frontier)?;
    let mut scheduler = Scheduler::new(root.as_ref(), store.clone())?;
    scheduler.set_once(config.crawler.once);

    let fetcher = HttpFetcher::new(&config.crawler)?;
    Ok(CrawlDriver::new(scheduler, fetcher, store))
}

/// Runs a complete crawl operation
///
/// This is the main entry point for starting a crawl. It will:
/// 1. Open the page store and save the configured domains
/// 2. Spawn one frontier and one notifier per domain
/// 3. Fetch pages and follow same-host links until the run ends
/// 4. Close the store
pub async fn crawl(config: &Config) -> Result<CrawlStats> {
    let mut driver = build_driver(config)?;
    let result = driver.run().await;
    driver.store().close()?;
    result
}
