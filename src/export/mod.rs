//! JSON export of stored data
//!
//! Two read-only views over a page store:
//! - The configured domain list
//! - The pages of one domain that changed after a checkpoint

use crate::config::DomainEntry;
use crate::page::Page;
use crate::storage::{parse_checkpoint, PageStore};
use crate::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::io::Write;

/// Pages of one domain changed since a checkpoint
#[derive(Debug, Clone, Serialize)]
pub struct PageExport {
    pub domain: String,

    /// The checkpoint the export starts after, if any
    pub since: Option<DateTime<Utc>>,

    /// Latest change among the exported pages; pass it back as the next
    /// checkpoint to continue where this export stopped
    pub checkpoint: Option<DateTime<Utc>>,

    pub pages: Vec<Page>,
}

/// Loads the configured domains
pub fn export_config(store: &dyn PageStore) -> Result<Vec<DomainEntry>> {
    Ok(store.get_config()?)
}

/// Loads the pages of `domain` changed after `since` (RFC3339, empty for all)
pub fn export_pages(store: &dyn PageStore, domain: &str, since: &str) -> Result<PageExport> {
    let since_time = parse_checkpoint(since)?;
    let pages = store.get_pages(domain, since)?;
    let checkpoint = pages.iter().filter_map(|p| p.last_change).max().or(since_time);

    Ok(PageExport {
        domain: domain.to_string(),
        since: since_time,
        checkpoint,
        pages,
    })
}

/// Writes a value as pretty-printed JSON followed by a newline
pub fn write_json<W: Write, T: Serialize + ?Sized>(mut writer: W, value: &T) -> Result<()> {
    serde_json::to_writer_pretty(&mut writer, value)?;
    writeln!(writer)?;
    Ok(())
}
