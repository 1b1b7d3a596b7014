//! Sitepace: a polite per-domain web crawler
//!
//! This crate keeps one crawl frontier per configured domain, dispatches exactly
//! one domain at a time according to that domain's delay, deduplicates pages it
//! already knows about, and persists page metadata for change detection.

pub mod config;
pub mod crawler;
pub mod domain;
pub mod export;
pub mod frontier;
pub mod page;
pub mod storage;

use thiserror::Error;

/// Main error type for Sitepace operations
#[derive(Debug, Error)]
pub enum PaceError {
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Page store error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("Frontier error: {0}")]
    Frontier(#[from] frontier::FrontierError),

    #[error("Bad URL: {0}")]
    Url(#[from] UrlError),

    #[error("No frontier registered for {url}")]
    QueueNotFound { url: String },

    #[error("Fetch error: {0}")]
    Fetch(#[from] crawler::FetchError),

    #[error("Frontier for {domain} is still empty after a restart")]
    RestartExhausted { domain: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors found while loading or compiling the configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Cannot read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config file is not valid TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("{0}")]
    Validation(String),

    #[error("Invalid URL in domain config: {0}")]
    InvalidUrl(String),

    #[error("Invalid rule pattern: {0}")]
    InvalidPattern(String),

    #[error("Domain {0} is configured more than once")]
    DuplicateDomain(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Unparseable URL: {0}")]
    Parse(String),

    #[error("Unsupported scheme: {0}")]
    InvalidScheme(String),

    #[error("URL has no host")]
    MissingDomain,
}

/// Result type alias for Sitepace operations
pub type Result<T> = std::result::Result<T, PaceError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

pub use config::Config;
pub use crawler::{CrawlDriver, Scheduler};
pub use domain::{host_key, Domain, DomainRegistry};
pub use page::{FetchOutcome, Page};
