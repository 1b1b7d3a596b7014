//! Crawl driver - the single consumer of the scheduler
//!
//! Each iteration takes the dispatched URL, fetches it, records the result
//! and feeds newly discovered same-host links back through admission.

use crate::crawler::fetcher::Fetcher;
use crate::crawler::parser::parse_page;
use crate::crawler::scheduler::{PageEvent, Scheduler};
use crate::page::{FetchOutcome, Page};
use crate::storage::{PageStore, StorageError};
use crate::{PaceError, Result};
use chrono::Utc;
use std::sync::Arc;
use std::time::Instant;
use url::Url;

/// Counters for one crawl run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrawlStats {
    /// URLs handed out by the scheduler
    pub dispatched: usize,

    /// Successful fetches
    pub fetched: usize,

    pub modified: usize,
    pub not_modified: usize,

    /// Dispatches not fetched because of rules or the redownload interval
    pub skipped: usize,

    /// Fetch errors
    pub failed: usize,

    /// Links admitted and inserted as new pages
    pub discovered: usize,
}

/// Drives a [`Scheduler`] to completion
pub struct CrawlDriver<F: Fetcher> {
    scheduler: Scheduler,
    fetcher: F,
    store: Arc<dyn PageStore>,
}

impl<F: Fetcher> CrawlDriver<F> {
    /// Creates a driver
    ///
    /// `store` must be the store the scheduler was built with.
    pub fn new(scheduler: Scheduler, fetcher: F, store: Arc<dyn PageStore>) -> Self {
        Self {
            scheduler,
            fetcher,
            store,
        }
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    pub fn scheduler_mut(&mut self) -> &mut Scheduler {
        &mut self.scheduler
    }

    pub fn store(&self) -> &Arc<dyn PageStore> {
        &self.store
    }

    /// Runs until the scheduler has no more work
    ///
    /// Fetch failures only skip the page. Storage failures stop the run and
    /// are returned, as is any error the scheduler recorded.
    pub async fn run(&mut self) -> Result<CrawlStats> {
        let mut stats = CrawlStats::default();
        let start_time = Instant::now();

        tracing::info!(
            "Starting crawl of {} domain(s), once = {}",
            self.scheduler.domain_count(),
            self.scheduler.is_once()
        );

        while self.scheduler.next().await {
            stats.dispatched += 1;

            if let Err(e) = self.process_current(&mut stats).await {
                tracing::error!("Fatal error during crawl: {}", e);
                self.scheduler.fail(e);
            }
        }

        self.scheduler.shutdown().await;

        if let Some(e) = self.scheduler.take_err() {
            return Err(e);
        }

        tracing::info!(
            "Crawl finished: {} dispatched, {} fetched ({} changed, {} unchanged), {} skipped, {} failed, {} discovered in {:?}",
            stats.dispatched,
            stats.fetched,
            stats.modified,
            stats.not_modified,
            stats.skipped,
            stats.failed,
            stats.discovered,
            start_time.elapsed()
        );

        Ok(stats)
    }

    /// Processes the URL the scheduler just dispatched
    async fn process_current(&mut self, stats: &mut CrawlStats) -> Result<()> {
        let (domain, mut page) = self.scheduler.cur()?;

        if let Err(reason) = domain.can_download(&page, Utc::now()) {
            tracing::debug!("Skipping {}: {}", page.url, reason);
            stats.skipped += 1;
            return Ok(());
        }

        let body = match self.fetcher.fetch(&page.url).await {
            Ok(body) => body,
            Err(e) => {
                tracing::warn!("Failed to fetch {}: {}", page.url, e);
                stats.failed += 1;
                return Ok(());
            }
        };
        stats.fetched += 1;

        let page_url = Url::parse(&page.url).map_err(|e| {
            PaceError::Url(crate::UrlError::Parse(format!("{}: {}", page.url, e)))
        })?;
        let parsed = parse_page(&body, &page_url);

        match page.record_fetch(&body, Utc::now()) {
            FetchOutcome::Modified => {
                stats.modified += 1;
                match parsed.title {
                    Some(title) => page.title = title,
                    None => tracing::warn!("No title found on {}", page.url),
                }
            }
            FetchOutcome::NotModified => {
                stats.not_modified += 1;
                tracing::warn!("{} not modified", page.url);
            }
        }

        self.scheduler.update(&page, PageEvent::Update)?;

        for link in parsed.links {
            if let Err(reason) = domain.admits(&link) {
                tracing::trace!("Not following {}: {}", link, reason);
                continue;
            }

            match self.store.get_page(&link) {
                Ok(_) => continue,
                Err(StorageError::NotFound(_)) => {}
                Err(e) => return Err(e.into()),
            }

            match self.scheduler.add(&link) {
                Ok(()) => {}
                Err(PaceError::QueueNotFound { url }) => {
                    tracing::trace!("No frontier for {}", url);
                    continue;
                }
                Err(e) => return Err(e),
            }

            self.scheduler.update(&Page::new(link.as_str()), PageEvent::Insert)?;
            stats.discovered += 1;
            tracing::debug!("Discovered {}", link);
        }

        Ok(())
    }
}
