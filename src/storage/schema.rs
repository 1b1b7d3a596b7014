//! Database schema definitions
//!
//! This module contains all SQL schema definitions for the Sitepace page store.

/// SQL schema for the database
///
/// Timestamps are stored as fixed-width RFC3339 text in UTC so that string
/// comparison matches time order.
pub const SCHEMA_SQL: &str = r#"
-- Configured domains, in configuration order
CREATE TABLE IF NOT EXISTS domains (
    url TEXT PRIMARY KEY,
    position INTEGER NOT NULL,
    name TEXT NOT NULL,
    delay_ms INTEGER NOT NULL,
    redownload_secs INTEGER NOT NULL
);

-- Include/exclude rules per domain
CREATE TABLE IF NOT EXISTS domain_rules (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    domain_url TEXT NOT NULL REFERENCES domains(url) ON DELETE CASCADE,
    kind TEXT NOT NULL CHECK (kind IN ('include', 'exclude')),
    position INTEGER NOT NULL,
    rule TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_domain_rules_domain ON domain_rules(domain_url);

-- Ordered start points per domain
CREATE TABLE IF NOT EXISTS start_points (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    domain_url TEXT NOT NULL REFERENCES domains(url) ON DELETE CASCADE,
    position INTEGER NOT NULL,
    point TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_start_points_domain ON start_points(domain_url);

-- One row per known URL
CREATE TABLE IF NOT EXISTS pages (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    url TEXT NOT NULL UNIQUE,
    domain TEXT NOT NULL,
    title TEXT NOT NULL DEFAULT '',
    checksum TEXT,
    first_seen TEXT,
    last_fetch TEXT,
    last_change TEXT
);

CREATE INDEX IF NOT EXISTS idx_pages_domain ON pages(domain);
CREATE INDEX IF NOT EXISTS idx_pages_domain_change ON pages(domain, last_change);
"#;

/// Initializes the database schema
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}
