//! Configuration module for Sitepace
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use sitepace::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("sitepace.toml")).unwrap();
//! println!("Once mode: {}", config.crawler.once);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    BackendKind, Config, CrawlerConfig, DomainEntry, FrontierConfig, StorageConfig,
};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
