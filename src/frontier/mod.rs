//! Per-domain crawl frontiers
//!
//! A frontier is a FIFO of URLs waiting to be fetched. The scheduler owns one
//! per domain, each created with [`Frontier::spawn`] from a root instance so
//! that every domain gets an isolated queue on the same backend.
//!
//! Backends:
//! - [`MemoryFrontier`]: ring buffer in process memory
//! - [`SqliteFrontier`]: durable queue in a SQLite file, partitioned by name

mod memory;
mod sqlite;

pub use memory::MemoryFrontier;
pub use sqlite::SqliteFrontier;

use crate::config::{BackendKind, FrontierConfig};
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

/// Errors returned by frontier backends
#[derive(Debug, Error)]
pub enum FrontierError {
    /// No URL is pending
    #[error("Queue empty")]
    Empty,

    /// The backend rejected an exact duplicate of a pending URL
    #[error("Already in queue: {0}")]
    Duplicate(String),

    #[error("Queue backend error: {0}")]
    Backend(String),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Result type for frontier operations
pub type FrontierResult<T> = Result<T, FrontierError>;

/// A FIFO queue of pending URLs
///
/// Implementations must serialize concurrent `enqueue`/`dequeue` calls
/// internally: a domain's notifier task and the crawl consumer both touch
/// the same frontier.
pub trait Frontier: Send + Sync {
    /// Creates a fresh, independent frontier bound to `name`
    fn spawn(&self, name: &str) -> FrontierResult<Arc<dyn Frontier>>;

    /// Appends a URL
    fn enqueue(&self, url: &str) -> FrontierResult<()>;

    /// Removes and returns the oldest URL, or `FrontierError::Empty`
    fn dequeue(&self) -> FrontierResult<String>;

    /// Number of pending URLs (diagnostics only)
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The name this frontier was spawned with
    fn name(&self) -> &str;
}

/// Opens the root frontier described by the configuration
pub fn open_frontier(config: &FrontierConfig) -> FrontierResult<Box<dyn Frontier>> {
    match config.backend {
        BackendKind::Memory => Ok(Box::new(MemoryFrontier::new("root", config.capacity))),
        BackendKind::Sqlite => {
            let path = config.path.as_deref().ok_or_else(|| {
                FrontierError::Backend("sqlite frontier requires a path".to_string())
            })?;
            Ok(Box::new(SqliteFrontier::open(Path::new(path))?))
        }
    }
}
