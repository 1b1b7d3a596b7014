//! Storage module for persisting crawl data
//!
//! This module handles the page store, which holds:
//! - The configured domain list
//! - One page record per known URL
//! - Change timestamps used for bulk export

mod memory;
mod schema;
mod sqlite;
mod traits;

pub use memory::MemoryStore;
pub use sqlite::SqliteStorage;
pub use traits::{parse_checkpoint, PageStore, StorageError, StorageResult};

use crate::config::{BackendKind, StorageConfig};
use std::path::Path;
use std::sync::Arc;

/// Opens the page store selected by the configuration
///
/// # Returns
///
/// * `Ok(Arc<dyn PageStore>)` - A store shared by the scheduler and the driver
/// * `Err(StorageError)` - Failed to open the backend
pub fn open_store(config: &StorageConfig) -> StorageResult<Arc<dyn PageStore>> {
    match config.backend {
        BackendKind::Memory => Ok(Arc::new(MemoryStore::new())),
        BackendKind::Sqlite => {
            let path = config.path.as_deref().ok_or_else(|| {
                StorageError::Database("sqlite storage requires a path".to_string())
            })?;
            Ok(Arc::new(SqliteStorage::new(Path::new(path))?))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_open_memory_store() {
        let store = open_store(&StorageConfig::default()).unwrap();
        assert!(store.get_config().unwrap().is_empty());
    }

    #[test]
    fn test_open_sqlite_store() {
        let dir = TempDir::new().unwrap();
        let config = StorageConfig {
            backend: BackendKind::Sqlite,
            path: Some(dir.path().join("pages.db").to_string_lossy().into_owned()),
        };
        let store = open_store(&config).unwrap();
        assert!(store.get_config().unwrap().is_empty());
    }

    #[test]
    fn test_sqlite_without_path_fails() {
        let config = StorageConfig {
            backend: BackendKind::Sqlite,
            path: None,
        };
        assert!(open_store(&config).is_err());
    }
}
