//! Scheduler for per-domain dispatch
//!
//! This module handles:
//! - One isolated frontier per registered domain
//! - One notifier task per domain that makes the domain eligible after its delay
//! - A single consumer (`next`) that turns notifications into URLs to crawl
//! - Restart of exhausted frontiers, once-mode termination and shutdown
//!
//! A notifier only re-arms its timer after the consumer has received its
//! previous notification. Two dispatches of the same domain are therefore at
//! least `delay` apart, and each domain has at most one notification buffered.

use crate::domain::{host_key_of, Domain, DomainRegistry};
use crate::frontier::{Frontier, FrontierError, FrontierResult};
use crate::page::Page;
use crate::storage::{PageStore, StorageError};
use crate::{PaceError, Result};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::{mpsc, Notify};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// How a page is persisted through [`Scheduler::update`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageEvent {
    /// A newly discovered page (create path)
    Insert,

    /// A re-crawled page (overwrite path)
    Update,
}

/// Everything the scheduler keeps for one domain
#[derive(Clone)]
struct Lane {
    domain: Arc<Domain>,
    frontier: Arc<dyn Frontier>,
    /// Signalled by the consumer each time it receives this domain's notification
    received: Arc<Notify>,
    /// Child of the scheduler's shutdown token
    token: CancellationToken,
}

/// Serializes per-domain timers into a stream of URLs to crawl
pub struct Scheduler {
    lanes: HashMap<String, Lane>,
    store: Arc<dyn PageStore>,
    events: mpsc::Receiver<String>,
    shutdown: CancellationToken,
    once: bool,
    retired: HashSet<String>,
    current: Option<(Arc<Domain>, String)>,
    err: Option<PaceError>,
    notifiers: Vec<JoinHandle<()>>,
}

impl Scheduler {
    /// Builds the scheduler from the domain list held by `store`
    ///
    /// Every domain is compiled and every frontier spawned and seeded before
    /// any task is started, so a bad configuration or a frontier that cannot
    /// be seeded leaves nothing running. Must be called from within a Tokio
    /// runtime.
    ///
    /// # Arguments
    ///
    /// * `root` - Frontier backend used to spawn one frontier per domain
    /// * `store` - Page store holding the configuration and page records
    pub fn new(root: &dyn Frontier, store: Arc<dyn PageStore>) -> Result<Self> {
        let entries = store.get_config()?;
        let registry = DomainRegistry::from_entries(&entries)?;
        if registry.is_empty() {
            warn!("No domains configured, nothing to crawl");
        }

        let mut lanes = HashMap::with_capacity(registry.len());
        for domain in registry.iter() {
            let frontier = root.spawn(domain.key())?;
            let seeded = restart(domain, frontier.as_ref())?;
            info!(
                "Domain {} ({}): {} seed(s), delay {:?}, redownload after {:?}, {} start point(s){}",
                domain.name(),
                domain.base_url(),
                seeded,
                domain.delay(),
                domain.redownload(),
                domain.start_points().len(),
                if domain.has_rules() { ", filtered" } else { "" }
            );
            lanes.insert(
                domain.key().to_string(),
                (Arc::clone(domain), frontier),
            );
        }

        // mpsc::channel rejects a zero capacity
        let (tx, events) = mpsc::channel(registry.len().max(1));
        let shutdown = CancellationToken::new();

        let mut notifiers = Vec::with_capacity(lanes.len());
        let lanes = lanes
            .into_iter()
            .map(|(key, (domain, frontier))| {
                let lane = Lane {
                    domain,
                    frontier,
                    received: Arc::new(Notify::new()),
                    token: shutdown.child_token(),
                };
                notifiers.push(tokio::spawn(run_notifier(lane.clone(), tx.clone())));
                (key, lane)
            })
            .collect();

        info!("Scheduler started with {} domain(s)", registry.len());

        Ok(Self {
            lanes,
            store,
            events,
            shutdown,
            once: false,
            retired: HashSet::new(),
            current: None,
            err: None,
            notifiers,
        })
    }

    /// In once-mode each domain is drained a single time and the run ends
    /// when every domain has been drained
    pub fn set_once(&mut self, once: bool) {
        self.once = once;
    }

    pub fn is_once(&self) -> bool {
        self.once
    }

    /// Number of registered domains
    pub fn domain_count(&self) -> usize {
        self.lanes.len()
    }

    /// Pending URLs in a domain's frontier (diagnostics only)
    pub fn frontier_len(&self, domain_key: &str) -> Option<usize> {
        self.lanes.get(domain_key).map(|lane| lane.frontier.len())
    }

    /// A token that stops the scheduler when cancelled
    ///
    /// Lets another task (a signal handler, say) stop a run while the
    /// consumer owns the scheduler.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Waits for the next URL to crawl
    ///
    /// Returns `true` when a URL is available through [`Scheduler::cur`], and
    /// `false` once the run is over: stopped, drained in once-mode, or failed
    /// (see [`Scheduler::err`]). After returning `false` it keeps returning
    /// `false`.
    pub async fn next(&mut self) -> bool {
        self.current = None;

        if self.lanes.is_empty() || self.err.is_some() || self.shutdown.is_cancelled() {
            return false;
        }

        loop {
            let key = tokio::select! {
                biased;
                _ = self.shutdown.cancelled() => return false,
                event = self.events.recv() => match event {
                    Some(key) => key,
                    None => return false,
                },
            };

            let Some(lane) = self.lanes.get(&key).cloned() else {
                continue;
            };
            lane.received.notify_one();

            if self.retired.contains(&key) {
                continue;
            }

            match self.dispatch(&lane) {
                Some(found) => return found,
                None => continue,
            }
        }
    }

    /// Dequeues from a notified domain
    ///
    /// `Some(true)` means a URL is current, `Some(false)` ends the run and
    /// `None` means wait for another notification.
    fn dispatch(&mut self, lane: &Lane) -> Option<bool> {
        let key = lane.domain.key();

        match lane.frontier.dequeue() {
            Ok(url) => {
                self.set_current(lane, url);
                Some(true)
            }
            Err(FrontierError::Empty) if self.once => {
                lane.token.cancel();
                self.retired.insert(key.to_string());
                info!("Frontier of {} drained", key);

                if self.retired.len() == self.lanes.len() {
                    info!("Every domain drained, stopping");
                    self.stop();
                    return Some(false);
                }
                None
            }
            Err(FrontierError::Empty) => {
                warn!("Frontier of {} empty, restarting", key);
                if let Err(e) = restart(&lane.domain, lane.frontier.as_ref()) {
                    self.fail(e.into());
                    return Some(false);
                }

                match lane.frontier.dequeue() {
                    Ok(url) => {
                        self.set_current(lane, url);
                        Some(true)
                    }
                    Err(FrontierError::Empty) => {
                        self.fail(PaceError::RestartExhausted {
                            domain: key.to_string(),
                        });
                        Some(false)
                    }
                    Err(e) => {
                        self.fail(e.into());
                        Some(false)
                    }
                }
            }
            Err(e) => {
                self.fail(e.into());
                Some(false)
            }
        }
    }

    fn set_current(&mut self, lane: &Lane, url: String) {
        debug!(
            "Dispatching {} ({} more pending for {})",
            url,
            self.frontier_len(lane.domain.key()).unwrap_or(0),
            lane.domain.key()
        );
        self.current = Some((Arc::clone(&lane.domain), url));
    }

    /// The current domain and the stored record for the current URL
    ///
    /// A URL the store has never seen yields a stub page carrying only the URL.
    pub fn cur(&self) -> Result<(Arc<Domain>, Page)> {
        let (domain, url) = self
            .current
            .as_ref()
            .ok_or(PaceError::Frontier(FrontierError::Empty))?;

        match self.store.get_page(url) {
            Ok(page) => Ok((Arc::clone(domain), page)),
            Err(StorageError::NotFound(_)) => Ok((Arc::clone(domain), Page::new(url.as_str()))),
            Err(e) => Err(e.into()),
        }
    }

    /// URL dispatched by the last successful `next`
    pub fn current_url(&self) -> Option<&str> {
        self.current.as_ref().map(|(_, url)| url.as_str())
    }

    /// Routes a URL into its domain's frontier
    ///
    /// Fails with `PaceError::QueueNotFound` unless the URL's host key belongs
    /// to a registered domain. A URL that is already pending counts as admitted.
    pub fn add(&self, url: &str) -> Result<()> {
        let lane = host_key_of(url)
            .ok()
            .and_then(|key| self.lanes.get(&key))
            .ok_or_else(|| PaceError::QueueNotFound {
                url: url.to_string(),
            })?;

        match lane.frontier.enqueue(url) {
            Ok(()) | Err(FrontierError::Duplicate(_)) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Persists a page through the store
    pub fn update(&self, page: &Page, event: PageEvent) -> Result<()> {
        match event {
            PageEvent::Insert => self.store.save_page(page)?,
            PageEvent::Update => self.store.update_page(page)?,
        }
        Ok(())
    }

    /// Stops every notifier and unblocks a pending `next`
    ///
    /// Idempotent. A stopped scheduler cannot be restarted.
    pub fn stop(&self) {
        if !self.shutdown.is_cancelled() {
            debug!("Stopping scheduler");
        }
        self.shutdown.cancel();
    }

    /// Records a terminal error and stops; the first error wins
    pub fn fail(&mut self, err: PaceError) {
        warn!("Scheduler failed: {}", err);
        if self.err.is_none() {
            self.err = Some(err);
        }
        self.stop();
    }

    /// The terminal error, if the run failed
    pub fn err(&self) -> Option<&PaceError> {
        self.err.as_ref()
    }

    pub fn take_err(&mut self) -> Option<PaceError> {
        self.err.take()
    }

    /// Stops the scheduler and waits for every notifier task to exit
    pub async fn shutdown(&mut self) {
        self.stop();
        for handle in self.notifiers.drain(..) {
            let _ = handle.await;
        }
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

/// Seeds a frontier with the domain's start points, or its base URL
///
/// URLs that are still pending are left where they are.
fn restart(domain: &Domain, frontier: &dyn Frontier) -> FrontierResult<usize> {
    let mut added = 0;
    for url in domain.seeds() {
        match frontier.enqueue(&url) {
            Ok(()) => added += 1,
            Err(FrontierError::Duplicate(_)) => {}
            Err(e) => return Err(e),
        }
    }
    Ok(added)
}

/// Timer loop for one domain; the frontier is already seeded
async fn run_notifier(lane: Lane, tx: mpsc::Sender<String>) {
    let key = lane.domain.key().to_string();
    let delay = lane.domain.delay();

    debug!("Notifier for {} started", key);

    loop {
        tokio::select! {
            _ = lane.token.cancelled() => break,
            _ = tokio::time::sleep(delay) => {}
        }

        tokio::select! {
            _ = lane.token.cancelled() => break,
            sent = tx.send(key.clone()) => {
                if sent.is_err() {
                    break;
                }
            }
        }

        tokio::select! {
            _ = lane.token.cancelled() => break,
            _ = lane.received.notified() => {}
        }
    }

    debug!("Notifier for {} stopped", key);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DomainEntry;
    use crate::frontier::MemoryFrontier;
    use crate::storage::{MemoryStore, StorageResult};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::{Duration, Instant};
    use tokio::time::timeout;

    fn entry(url: &str, delay: u64, start_points: &[&str]) -> DomainEntry {
        DomainEntry {
            url: url.to_string(),
            name: String::new(),
            delay,
            redownload: 0,
            start_points: start_points.iter().map(|s| s.to_string()).collect(),
            include: vec![],
            exclude: vec![],
        }
    }

    fn scheduler(entries: Vec<DomainEntry>) -> (Scheduler, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::with_config(entries));
        let root = MemoryFrontier::new("root", 16);
        let scheduler = Scheduler::new(&root, store.clone()).unwrap();
        (scheduler, store)
    }

    async fn next_url(scheduler: &mut Scheduler) -> Option<String> {
        let found = timeout(Duration::from_secs(5), scheduler.next())
            .await
            .expect("next timed out");
        found.then(|| scheduler.current_url().unwrap().to_string())
    }

    /// Root frontier that counts spawned children
    struct CountingFrontier {
        inner: MemoryFrontier,
        spawned: Arc<AtomicUsize>,
    }

    impl Frontier for CountingFrontier {
        fn spawn(&self, name: &str) -> FrontierResult<Arc<dyn Frontier>> {
            self.spawned.fetch_add(1, Ordering::SeqCst);
            self.inner.spawn(name)
        }

        fn enqueue(&self, url: &str) -> FrontierResult<()> {
            self.inner.enqueue(url)
        }

        fn dequeue(&self) -> FrontierResult<String> {
            self.inner.dequeue()
        }

        fn len(&self) -> usize {
            self.inner.len()
        }

        fn name(&self) -> &str {
            self.inner.name()
        }
    }

    /// Store whose configuration can never be read
    struct BrokenStore;

    impl PageStore for BrokenStore {
        fn get_config(&self) -> StorageResult<Vec<DomainEntry>> {
            Err(StorageError::Database("config table missing".to_string()))
        }
        fn save_config(&self, _: &[DomainEntry]) -> StorageResult<()> {
            Ok(())
        }
        fn get_page(&self, url: &str) -> StorageResult<Page> {
            Err(StorageError::NotFound(url.to_string()))
        }
        fn save_page(&self, _: &Page) -> StorageResult<()> {
            Ok(())
        }
        fn update_page(&self, _: &Page) -> StorageResult<()> {
            Ok(())
        }
        fn get_pages(&self, _: &str, _: &str) -> StorageResult<Vec<Page>> {
            Ok(vec![])
        }
        fn close(&self) -> StorageResult<()> {
            Ok(())
        }
    }

    #[derive(Debug, Clone, Copy)]
    enum Fault {
        /// Every enqueue fails
        Enqueue,
        /// Every dequeue fails with a backend error
        Dequeue,
        /// Enqueues succeed but nothing ever comes out
        Swallow,
    }

    /// Frontier backend that misbehaves in one fixed way, children included
    struct FaultyFrontier {
        name: String,
        fault: Fault,
    }

    impl FaultyFrontier {
        fn root(fault: Fault) -> Self {
            Self {
                name: "root".to_string(),
                fault,
            }
        }
    }

    impl Frontier for FaultyFrontier {
        fn spawn(&self, name: &str) -> FrontierResult<Arc<dyn Frontier>> {
            Ok(Arc::new(FaultyFrontier {
                name: name.to_string(),
                fault: self.fault,
            }))
        }

        fn enqueue(&self, _: &str) -> FrontierResult<()> {
            match self.fault {
                Fault::Enqueue => Err(FrontierError::Backend("disk full".to_string())),
                _ => Ok(()),
            }
        }

        fn dequeue(&self) -> FrontierResult<String> {
            match self.fault {
                Fault::Dequeue => Err(FrontierError::Backend("disk unreadable".to_string())),
                _ => Err(FrontierError::Empty),
            }
        }

        fn len(&self) -> usize {
            0
        }

        fn name(&self) -> &str {
            &self.name
        }
    }

    /// Memory store whose page lookups always fail
    struct UnreadablePages(MemoryStore);

    impl PageStore for UnreadablePages {
        fn get_config(&self) -> StorageResult<Vec<DomainEntry>> {
            self.0.get_config()
        }
        fn save_config(&self, domains: &[DomainEntry]) -> StorageResult<()> {
            self.0.save_config(domains)
        }
        fn get_page(&self, _: &str) -> StorageResult<Page> {
            Err(StorageError::Database("pages table locked".to_string()))
        }
        fn save_page(&self, page: &Page) -> StorageResult<()> {
            self.0.save_page(page)
        }
        fn update_page(&self, page: &Page) -> StorageResult<()> {
            self.0.update_page(page)
        }
        fn get_pages(&self, domain: &str, since: &str) -> StorageResult<Vec<Page>> {
            self.0.get_pages(domain, since)
        }
        fn close(&self) -> StorageResult<()> {
            self.0.close()
        }
    }

    #[tokio::test]
    async fn test_config_failure_starts_nothing() {
        let spawned = Arc::new(AtomicUsize::new(0));
        let root = CountingFrontier {
            inner: MemoryFrontier::new("root", 4),
            spawned: spawned.clone(),
        };

        let result = Scheduler::new(&root, Arc::new(BrokenStore));
        assert!(matches!(
            result,
            Err(PaceError::Storage(StorageError::Database(_)))
        ));
        assert_eq!(spawned.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_invalid_config_starts_nothing() {
        let spawned = Arc::new(AtomicUsize::new(0));
        let root = CountingFrontier {
            inner: MemoryFrontier::new("root", 4),
            spawned: spawned.clone(),
        };
        let store = Arc::new(MemoryStore::with_config(vec![
            entry("http://example.com/", 0, &[]),
            entry("http://www.example.com/", 0, &[]),
        ]));

        let result = Scheduler::new(&root, store);
        assert!(matches!(result, Err(PaceError::Config(_))));
        assert_eq!(spawned.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_seeding_failure_fails_construction() {
        let store = Arc::new(MemoryStore::with_config(vec![entry(
            "http://example.com/",
            0,
            &["/"],
        )]));

        let result = Scheduler::new(&FaultyFrontier::root(Fault::Enqueue), store);
        match result {
            Err(PaceError::Frontier(FrontierError::Backend(msg))) => assert_eq!(msg, "disk full"),
            Err(other) => panic!("unexpected error: {}", other),
            Ok(_) => panic!("scheduler built over a frontier that cannot be seeded"),
        }
    }

    #[tokio::test]
    async fn test_dequeue_failure_is_terminal() {
        let store = Arc::new(MemoryStore::with_config(vec![entry(
            "http://example.com/",
            0,
            &["/"],
        )]));
        let mut scheduler = Scheduler::new(&FaultyFrontier::root(Fault::Dequeue), store).unwrap();

        assert_eq!(next_url(&mut scheduler).await, None);
        assert!(matches!(
            scheduler.err(),
            Some(PaceError::Frontier(FrontierError::Backend(_)))
        ));
        assert!(scheduler.shutdown_token().is_cancelled());

        // Stays over once failed
        assert_eq!(next_url(&mut scheduler).await, None);
    }

    #[tokio::test]
    async fn test_restart_that_yields_nothing_is_terminal() {
        let store = Arc::new(MemoryStore::with_config(vec![entry(
            "http://example.com/",
            0,
            &["/"],
        )]));
        let mut scheduler = Scheduler::new(&FaultyFrontier::root(Fault::Swallow), store).unwrap();
        scheduler.set_once(false);

        assert_eq!(next_url(&mut scheduler).await, None);
        match scheduler.take_err() {
            Some(PaceError::RestartExhausted { domain }) => assert_eq!(domain, "example.com"),
            other => panic!("unexpected terminal error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_cur_surfaces_storage_errors() {
        let store = Arc::new(UnreadablePages(MemoryStore::with_config(vec![entry(
            "http://example.com/",
            0,
            &["/"],
        )])));
        let root = MemoryFrontier::new("root", 16);
        let mut scheduler = Scheduler::new(&root, store).unwrap();

        assert_eq!(
            next_url(&mut scheduler).await.as_deref(),
            Some("http://example.com/")
        );
        assert!(matches!(
            scheduler.cur(),
            Err(PaceError::Storage(StorageError::Database(_)))
        ));
    }

    #[tokio::test]
    async fn test_empty_registry_has_no_work() {
        let (mut scheduler, _) = scheduler(vec![]);
        assert!(!scheduler.next().await);
        assert!(scheduler.err().is_none());
    }

    #[tokio::test]
    async fn test_add_requires_registered_domain() {
        let (scheduler, _) = scheduler(vec![entry("http://example.com/", 0, &["/"])]);

        assert!(scheduler.add("http://www.example.com/c").is_ok());
        assert!(scheduler.add("http://EXAMPLE.com/d").is_ok());
        assert!(matches!(
            scheduler.add("http://other.com/b"),
            Err(PaceError::QueueNotFound { .. })
        ));
        assert!(matches!(
            scheduler.add("not a url"),
            Err(PaceError::QueueNotFound { .. })
        ));

        // Already pending still counts as admitted
        assert!(scheduler.add("http://example.com/c").is_ok());
    }

    #[tokio::test]
    async fn test_first_dispatch_is_start_point() {
        let (mut scheduler, _) = scheduler(vec![entry("http://example.com/", 0, &["/"])]);
        scheduler.set_once(true);

        assert_eq!(
            next_url(&mut scheduler).await.as_deref(),
            Some("http://example.com/")
        );

        let (domain, page) = scheduler.cur().unwrap();
        assert_eq!(domain.key(), "example.com");
        assert_eq!(page, Page::new("http://example.com/"));
    }

    #[tokio::test]
    async fn test_cur_reads_stored_page() {
        let (mut scheduler, store) = scheduler(vec![entry("http://example.com/", 0, &[])]);
        let mut stored = Page::new("http://example.com/");
        stored.title = "Home".to_string();
        store.update_page(&stored).unwrap();

        assert!(scheduler.next().await);
        let (_, page) = scheduler.cur().unwrap();
        assert_eq!(page.title, "Home");
    }

    #[tokio::test]
    async fn test_base_url_seeds_without_start_points() {
        let (mut scheduler, _) = scheduler(vec![entry("https://www.example.org/home", 0, &[])]);
        scheduler.set_once(true);

        assert_eq!(
            next_url(&mut scheduler).await.as_deref(),
            Some("https://www.example.org/home")
        );
        assert_eq!(next_url(&mut scheduler).await, None);
    }

    #[tokio::test]
    async fn test_continuous_mode_restarts_in_order() {
        let (mut scheduler, _) =
            scheduler(vec![entry("http://example.com/", 0, &["/", "/x", "/y"])]);

        let mut seen = Vec::new();
        for _ in 0..6 {
            seen.push(next_url(&mut scheduler).await.unwrap());
        }

        let pass = vec![
            "http://example.com/".to_string(),
            "http://example.com/x".to_string(),
            "http://example.com/y".to_string(),
        ];
        assert_eq!(seen[..3], pass[..]);
        assert_eq!(seen[3..], pass[..]);
    }

    #[tokio::test]
    async fn test_once_mode_terminates() {
        let (mut scheduler, _) = scheduler(vec![entry("http://example.com/", 0, &["/", "/a"])]);
        scheduler.set_once(true);

        assert!(next_url(&mut scheduler).await.is_some());
        assert!(next_url(&mut scheduler).await.is_some());
        assert_eq!(next_url(&mut scheduler).await, None);

        // Terminal: stays false
        assert!(!scheduler.next().await);
        assert!(scheduler.err().is_none());
    }

    #[tokio::test]
    async fn test_once_mode_drains_every_domain_once() {
        let (mut scheduler, _) = scheduler(vec![
            entry("http://a.example/", 0, &["/"]),
            entry("http://b.example/", 5, &["/", "/2"]),
        ]);
        scheduler.set_once(true);

        let mut seen = Vec::new();
        while let Some(url) = next_url(&mut scheduler).await {
            seen.push(url);
        }
        seen.sort();

        assert_eq!(
            seen,
            vec![
                "http://a.example/".to_string(),
                "http://b.example/".to_string(),
                "http://b.example/2".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn test_dispatches_respect_delay() {
        let delay = Duration::from_millis(40);
        let (mut scheduler, _) = scheduler(vec![entry(
            "http://example.com/",
            delay.as_millis() as u64,
            &["/1", "/2", "/3", "/4"],
        )]);
        scheduler.set_once(true);

        let mut times = Vec::new();
        while next_url(&mut scheduler).await.is_some() {
            times.push(Instant::now());
        }

        assert_eq!(times.len(), 4);
        for pair in times.windows(2) {
            let gap = pair[1] - pair[0];
            // Allow for the dequeue between receiving and returning
            assert!(
                gap + Duration::from_millis(2) >= delay,
                "dispatch gap {:?} shorter than {:?}",
                gap,
                delay
            );
        }
    }

    #[tokio::test]
    async fn test_stop_unblocks_next() {
        let (mut scheduler, _) = scheduler(vec![entry("http://example.com/", 60_000, &["/"])]);
        let token = scheduler.shutdown_token();

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            token.cancel();
        });

        let found = timeout(Duration::from_secs(5), scheduler.next())
            .await
            .unwrap();
        assert!(!found);
        assert!(scheduler.err().is_none());

        scheduler.shutdown().await;
        assert!(!scheduler.next().await);
    }

    #[tokio::test]
    async fn test_added_links_follow_start_points() {
        let (mut scheduler, _) = scheduler(vec![entry("http://example.com/", 0, &["/"])]);
        scheduler.set_once(true);

        assert_eq!(
            next_url(&mut scheduler).await.as_deref(),
            Some("http://example.com/")
        );
        scheduler.add("http://example.com/a").unwrap();
        assert_eq!(
            next_url(&mut scheduler).await.as_deref(),
            Some("http://example.com/a")
        );
        assert_eq!(next_url(&mut scheduler).await, None);
    }

    #[tokio::test]
    async fn test_update_routes_events() {
        let (scheduler, store) = scheduler(vec![entry("http://example.com/", 0, &[])]);
        let page = Page::new("http://example.com/new");

        scheduler.update(&page, PageEvent::Insert).unwrap();
        assert!(matches!(
            scheduler.update(&page, PageEvent::Insert),
            Err(PaceError::Storage(StorageError::AlreadyExists(_)))
        ));
        scheduler.update(&page, PageEvent::Update).unwrap();
        assert_eq!(store.page_count(), 1);
    }
}
