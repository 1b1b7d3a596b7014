use serde::{Deserialize, Serialize};

/// Main configuration structure for Sitepace
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub crawler: CrawlerConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub frontier: FrontierConfig,
    #[serde(default, rename = "domain")]
    pub domains: Vec<DomainEntry>,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Stop after every domain's frontier has been drained once
    #[serde(default = "default_once")]
    pub once: bool,

    /// Per-request fetch timeout (milliseconds)
    #[serde(rename = "fetch-timeout", default = "default_fetch_timeout")]
    pub fetch_timeout: u64,

    /// User-Agent header sent with every request
    #[serde(rename = "user-agent", default = "default_user_agent")]
    pub user_agent: String,

    /// Bodies larger than this are treated as fetch failures
    #[serde(rename = "max-body-bytes", default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            once: default_once(),
            fetch_timeout: default_fetch_timeout(),
            user_agent: default_user_agent(),
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

/// Which engine backs a store or frontier
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    #[default]
    Memory,
    Sqlite,
}

/// Page store configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: BackendKind,

    /// Path to the SQLite database file
    pub path: Option<String>,
}

/// Frontier backend configuration
#[derive(Debug, Clone, Deserialize)]
pub struct FrontierConfig {
    #[serde(default)]
    pub backend: BackendKind,

    /// Path to the SQLite queue file
    pub path: Option<String>,

    /// Initial ring capacity of in-memory frontiers
    #[serde(default = "default_capacity")]
    pub capacity: usize,
}

impl Default for FrontierConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::Memory,
            path: None,
            capacity: default_capacity(),
        }
    }
}

/// One crawled domain as written in the config file and persisted by the
/// page store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainEntry {
    /// Base URL of the site (e.g., "https://www.example.com/")
    pub url: String,

    /// Display name; defaults to the host key
    #[serde(default)]
    pub name: String,

    /// Minimum time between two dispatches of this domain (milliseconds)
    #[serde(default)]
    pub delay: u64,

    /// Minimum time before a page is fetched again (seconds)
    #[serde(default)]
    pub redownload: u64,

    /// Absolute URLs or paths relative to `url`
    #[serde(rename = "start-points", default)]
    pub start_points: Vec<String>,

    /// Regex rules a URL must match (if any are given)
    #[serde(default)]
    pub include: Vec<String>,

    /// Regex rules that reject a URL
    #[serde(default)]
    pub exclude: Vec<String>,
}

fn default_once() -> bool {
    true
}

fn default_fetch_timeout() -> u64 {
    5000
}

fn default_user_agent() -> String {
    format!("sitepace/{}", env!("CARGO_PKG_VERSION"))
}

fn default_max_body_bytes() -> usize {
    8 * 1024 * 1024
}

fn default_capacity() -> usize {
    1024
}
