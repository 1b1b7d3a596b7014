//! Storage traits and error types
//!
//! This module defines the trait interface for page store backends and
//! associated error types.

use crate::config::DomainEntry;
use crate::page::Page;
use chrono::{DateTime, Utc};
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    /// No page is stored under this URL
    #[error("Page not found: {0}")]
    NotFound(String),

    #[error("Page already exists: {0}")]
    AlreadyExists(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Invalid export checkpoint '{0}'")]
    InvalidCheckpoint(String),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for page store implementations
///
/// A page store persists the domain configuration and one [`Page`] per URL.
/// Implementations must be safe to call from several tasks at once.
pub trait PageStore: Send + Sync {
    // ===== Configuration =====

    /// Loads the configured domain list
    fn get_config(&self) -> StorageResult<Vec<DomainEntry>>;

    /// Replaces the configured domain list
    fn save_config(&self, domains: &[DomainEntry]) -> StorageResult<()>;

    // ===== Pages =====

    /// Gets a page by URL, or `StorageError::NotFound`
    fn get_page(&self, url: &str) -> StorageResult<Page>;

    /// Inserts a newly discovered page
    ///
    /// Fails with `StorageError::AlreadyExists` if the URL is already stored.
    fn save_page(&self, page: &Page) -> StorageResult<()>;

    /// Overwrites a page, inserting it if it was never saved
    fn update_page(&self, page: &Page) -> StorageResult<()>;

    /// Bulk export: pages of `domain` whose content changed after the
    /// checkpoint `export_key` (RFC3339), newest first
    ///
    /// An empty key exports every stored page of the domain.
    fn get_pages(&self, domain: &str, export_key: &str) -> StorageResult<Vec<Page>>;

    /// Flushes and releases backend resources
    fn close(&self) -> StorageResult<()>;
}

/// Parses an export checkpoint; the empty string means "no checkpoint"
pub fn parse_checkpoint(export_key: &str) -> StorageResult<Option<DateTime<Utc>>> {
    let key = export_key.trim();
    if key.is_empty() {
        return Ok(None);
    }

    DateTime::parse_from_rfc3339(key)
        .map(|dt| Some(dt.with_timezone(&Utc)))
        .map_err(|_| StorageError::InvalidCheckpoint(export_key.to_string()))
}
