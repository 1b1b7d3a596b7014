//! SQLite-backed frontier
//!
//! All frontiers spawned from one root share a database connection; each
//! one only sees the rows tagged with its own name.

use crate::frontier::{Frontier, FrontierError, FrontierResult};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

const FRONTIER_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS frontier (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    queue TEXT NOT NULL,
    url TEXT NOT NULL,
    UNIQUE(queue, url)
);

CREATE INDEX IF NOT EXISTS idx_frontier_queue ON frontier(queue, id);
"#;

/// Durable frontier stored in a SQLite table, partitioned by queue name
pub struct SqliteFrontier {
    name: String,
    conn: Arc<Mutex<Connection>>,
}

impl SqliteFrontier {
    /// Opens (or creates) the frontier database at `path`
    pub fn open(path: &Path) -> FrontierResult<Self> {
        let conn = Connection::open(path)?;
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
        ",
        )?;
        Self::with_connection(conn)
    }

    /// Creates a frontier in an in-memory database
    pub fn open_in_memory() -> FrontierResult<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> FrontierResult<Self> {
        conn.execute_batch(FRONTIER_SQL)?;
        Ok(Self {
            name: "root".to_string(),
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn lock(&self) -> FrontierResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| FrontierError::Backend("frontier connection lock poisoned".to_string()))
    }
}

impl Frontier for SqliteFrontier {
    fn spawn(&self, name: &str) -> FrontierResult<Arc<dyn Frontier>> {
        Ok(Arc::new(SqliteFrontier {
            name: name.to_string(),
            conn: Arc::clone(&self.conn),
        }))
    }

    fn enqueue(&self, url: &str) -> FrontierResult<()> {
        let conn = self.lock()?;
        let inserted = conn.execute(
            "INSERT OR IGNORE INTO frontier (queue, url) VALUES (?1, ?2)",
            params![self.name, url],
        )?;

        if inserted == 0 {
            return Err(FrontierError::Duplicate(url.to_string()));
        }
        Ok(())
    }

    fn dequeue(&self) -> FrontierResult<String> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;

        let next: Option<(i64, String)> = tx
            .query_row(
                "SELECT id, url FROM frontier WHERE queue = ?1 ORDER BY id ASC LIMIT 1",
                params![self.name],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;

        let (id, url) = next.ok_or(FrontierError::Empty)?;
        tx.execute("DELETE FROM frontier WHERE id = ?1", params![id])?;
        tx.commit()?;

        Ok(url)
    }

    fn len(&self) -> usize {
        let Ok(conn) = self.lock() else {
            return 0;
        };
        conn.query_row(
            "SELECT COUNT(*) FROM frontier WHERE queue = ?1",
            params![self.name],
            |row| row.get::<_, i64>(0),
        )
        .map(|n| n as usize)
        .unwrap_or(0)
    }

    fn name(&self) -> &str {
        &self.name
    }
}
