//! In-memory page store

use crate::config::DomainEntry;
use crate::page::Page;
use crate::storage::traits::{parse_checkpoint, PageStore, StorageError, StorageResult};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

#[derive(Default)]
struct Inner {
    config: Vec<DomainEntry>,
    pages: HashMap<String, Page>,
}

/// Page store that keeps everything in process memory
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store preloaded with a domain list
    pub fn with_config(domains: Vec<DomainEntry>) -> Self {
        Self {
            inner: Mutex::new(Inner {
                config: domains,
                pages: HashMap::new(),
            }),
        }
    }

    /// Number of stored pages
    pub fn page_count(&self) -> usize {
        self.lock().map(|inner| inner.pages.len()).unwrap_or(0)
    }

    fn lock(&self) -> StorageResult<MutexGuard<'_, Inner>> {
        self.inner
            .lock()
            .map_err(|_| StorageError::Database("memory store lock poisoned".to_string()))
    }
}

impl PageStore for MemoryStore {
    fn get_config(&self) -> StorageResult<Vec<DomainEntry>> {
        Ok(self.lock()?.config.clone())
    }

    fn save_config(&self, domains: &[DomainEntry]) -> StorageResult<()> {
        self.lock()?.config = domains.to_vec();
        Ok(())
    }

    fn get_page(&self, url: &str) -> StorageResult<Page> {
        self.lock()?
            .pages
            .get(url)
            .cloned()
            .ok_or_else(|| StorageError::NotFound(url.to_string()))
    }

    fn save_page(&self, page: &Page) -> StorageResult<()> {
        let mut inner = self.lock()?;
        if inner.pages.contains_key(&page.url) {
            return Err(StorageError::AlreadyExists(page.url.clone()));
        }
        inner.pages.insert(page.url.clone(), page.clone());
        Ok(())
    }

    fn update_page(&self, page: &Page) -> StorageResult<()> {
        self.lock()?.pages.insert(page.url.clone(), page.clone());
        Ok(())
    }

    fn get_pages(&self, domain: &str, export_key: &str) -> StorageResult<Vec<Page>> {
        let since = parse_checkpoint(export_key)?;
        let inner = self.lock()?;

        let mut pages: Vec<Page> = inner
            .pages
            .values()
            .filter(|p| p.domain_key().as_deref() == Some(domain))
            .filter(|p| match since {
                Some(since) => p.last_change.map_or(false, |changed| changed > since),
                None => true,
            })
            .cloned()
            .collect();

        pages.sort_by(|a, b| b.last_change.cmp(&a.last_change).then_with(|| a.url.cmp(&b.url)));
        Ok(pages)
    }

    fn close(&self) -> StorageResult<()> {
        Ok(())
    }
}
