//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the PageStore trait.

use crate::config::DomainEntry;
use crate::page::Page;
use crate::storage::schema::initialize_schema;
use crate::storage::traits::{parse_checkpoint, PageStore, StorageError, StorageResult};
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection, ErrorCode, OptionalExtension};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

const PAGE_COLUMNS: &str = "url, title, checksum, first_seen, last_fetch, last_change";

/// SQLite storage backend
pub struct SqliteStorage {
    conn: Mutex<Connection>,
}

impl SqliteStorage {
    /// Opens or creates a page store at `path`
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    pub fn new(path: &Path) -> StorageResult<Self> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Creates an in-memory database
    pub fn new_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> StorageResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| StorageError::Database("connection lock poisoned".to_string()))
    }
}

/// Formats a timestamp as fixed-width UTC text
fn to_db_time(time: Option<DateTime<Utc>>) -> Option<String> {
    time.map(|t| t.to_rfc3339_opts(SecondsFormat::Nanos, true))
}

fn from_db_time(text: Option<String>) -> StorageResult<Option<DateTime<Utc>>> {
    match text {
        None => Ok(None),
        Some(s) => DateTime::parse_from_rfc3339(&s)
            .map(|dt| Some(dt.with_timezone(&Utc)))
            .map_err(|e| StorageError::Serialization(format!("bad timestamp '{}': {}", s, e))),
    }
}

/// Raw page columns as read from the database
struct PageRow {
    url: String,
    title: String,
    checksum: Option<String>,
    first_seen: Option<String>,
    last_fetch: Option<String>,
    last_change: Option<String>,
}

impl PageRow {
    fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            url: row.get(0)?,
            title: row.get(1)?,
            checksum: row.get(2)?,
            first_seen: row.get(3)?,
            last_fetch: row.get(4)?,
            last_change: row.get(5)?,
        })
    }

    fn into_page(self) -> StorageResult<Page> {
        Ok(Page {
            url: self.url,
            title: self.title,
            checksum: self.checksum,
            first_seen: from_db_time(self.first_seen)?,
            last_fetch: from_db_time(self.last_fetch)?,
            last_change: from_db_time(self.last_change)?,
        })
    }
}

fn load_rules(conn: &Connection, domain_url: &str, kind: &str) -> StorageResult<Vec<String>> {
    let mut stmt = conn.prepare(
        "SELECT rule FROM domain_rules WHERE domain_url = ?1 AND kind = ?2 ORDER BY position",
    )?;
    let rules = stmt
        .query_map(params![domain_url, kind], |row| row.get(0))?
        .collect::<Result<Vec<String>, _>>()?;
    Ok(rules)
}

impl PageStore for SqliteStorage {
    // ===== Configuration =====

    fn get_config(&self) -> StorageResult<Vec<DomainEntry>> {
        let conn = self.conn()?;

        let mut stmt = conn.prepare(
            "SELECT url, name, delay_ms, redownload_secs FROM domains ORDER BY position",
        )?;
        let rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, i64>(2)?,
                    row.get::<_, i64>(3)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let mut points_stmt =
            conn.prepare("SELECT point FROM start_points WHERE domain_url = ?1 ORDER BY position")?;

        let mut entries = Vec::with_capacity(rows.len());
        for (url, name, delay, redownload) in rows {
            let start_points = points_stmt
                .query_map(params![url], |row| row.get(0))?
                .collect::<Result<Vec<String>, _>>()?;

            entries.push(DomainEntry {
                include: load_rules(&conn, &url, "include")?,
                exclude: load_rules(&conn, &url, "exclude")?,
                url,
                name,
                delay: delay.max(0) as u64,
                redownload: redownload.max(0) as u64,
                start_points,
            });
        }

        Ok(entries)
    }

    fn save_config(&self, domains: &[DomainEntry]) -> StorageResult<()> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;

        tx.execute_batch(
            "
            DELETE FROM start_points;
            DELETE FROM domain_rules;
            DELETE FROM domains;
        ",
        )?;

        for (position, entry) in domains.iter().enumerate() {
            tx.execute(
                "INSERT INTO domains (url, position, name, delay_ms, redownload_secs)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    entry.url,
                    position as i64,
                    entry.name,
                    entry.delay as i64,
                    entry.redownload as i64
                ],
            )?;

            for (i, point) in entry.start_points.iter().enumerate() {
                tx.execute(
                    "INSERT INTO start_points (domain_url, position, point) VALUES (?1, ?2, ?3)",
                    params![entry.url, i as i64, point],
                )?;
            }

            let rules = entry
                .include
                .iter()
                .map(|r| ("include", r))
                .chain(entry.exclude.iter().map(|r| ("exclude", r)));
            for (i, (kind, rule)) in rules.enumerate() {
                tx.execute(
                    "INSERT INTO domain_rules (domain_url, kind, position, rule)
                     VALUES (?1, ?2, ?3, ?4)",
                    params![entry.url, kind, i as i64, rule],
                )?;
            }
        }

        tx.commit()?;
        Ok(())
    }

    // ===== Pages =====

    fn get_page(&self, url: &str) -> StorageResult<Page> {
        let conn = self.conn()?;
        let row = conn
            .query_row(
                &format!("SELECT {} FROM pages WHERE url = ?1", PAGE_COLUMNS),
                params![url],
                PageRow::from_row,
            )
            .optional()?;

        match row {
            Some(row) => row.into_page(),
            None => Err(StorageError::NotFound(url.to_string())),
        }
    }

    fn save_page(&self, page: &Page) -> StorageResult<()> {
        let conn = self.conn()?;
        let result = conn.execute(
            "INSERT INTO pages (url, domain, title, checksum, first_seen, last_fetch, last_change)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                page.url,
                page.domain_key().unwrap_or_default(),
                page.title,
                page.checksum,
                to_db_time(page.first_seen),
                to_db_time(page.last_fetch),
                to_db_time(page.last_change)
            ],
        );

        match result {
            Ok(_) => Ok(()),
            Err(rusqlite::Error::SqliteFailure(err, _))
                if err.code == ErrorCode::ConstraintViolation =>
            {
                Err(StorageError::AlreadyExists(page.url.clone()))
            }
            Err(e) => Err(e.into()),
        }
    }

    fn update_page(&self, page: &Page) -> StorageResult<()> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO pages (url, domain, title, checksum, first_seen, last_fetch, last_change)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
             ON CONFLICT(url) DO UPDATE SET
                title = excluded.title,
                checksum = excluded.checksum,
                first_seen = excluded.first_seen,
                last_fetch = excluded.last_fetch,
                last_change = excluded.last_change",
            params![
                page.url,
                page.domain_key().unwrap_or_default(),
                page.title,
                page.checksum,
                to_db_time(page.first_seen),
                to_db_time(page.last_fetch),
                to_db_time(page.last_change)
            ],
        )?;
        Ok(())
    }

    fn get_pages(&self, domain: &str, export_key: &str) -> StorageResult<Vec<Page>> {
        let since = to_db_time(parse_checkpoint(export_key)?);
        let conn = self.conn()?;

        let rows = match since {
            Some(since) => {
                let mut stmt = conn.prepare(&format!(
                    "SELECT {} FROM pages
                     WHERE domain = ?1 AND last_change > ?2
                     ORDER BY last_change DESC, url",
                    PAGE_COLUMNS
                ))?;
                let rows = stmt
                    .query_map(params![domain, since], PageRow::from_row)?
                    .collect::<Result<Vec<_>, _>>()?;
                rows
            }
            None => {
                let mut stmt = conn.prepare(&format!(
                    "SELECT {} FROM pages
                     WHERE domain = ?1
                     ORDER BY last_change IS NULL, last_change DESC, url",
                    PAGE_COLUMNS
                ))?;
                let rows = stmt
                    .query_map(params![domain], PageRow::from_row)?
                    .collect::<Result<Vec<_>, _>>()?;
                rows
            }
        };

        rows.into_iter().map(PageRow::into_page).collect()
    }

    fn close(&self) -> StorageResult<()> {
        self.conn()?.execute_batch("PRAGMA optimize;")?;
        Ok(())
    }
}
