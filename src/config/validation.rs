use crate::config::types::{BackendKind, Config, CrawlerConfig, FrontierConfig, StorageConfig};
use crate::domain::DomainRegistry;
use crate::ConfigError;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_storage_config(&config.storage)?;
    validate_frontier_config(&config.frontier)?;

    // Compiling the registry checks URLs, start points, rules and key uniqueness
    DomainRegistry::from_entries(&config.domains)?;
    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.fetch_timeout < 100 || config.fetch_timeout > 600_000 {
        return Err(ConfigError::Validation(format!(
            "fetch_timeout must be between 100ms and 600000ms, got {}ms",
            config.fetch_timeout
        )));
    }

    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user_agent cannot be empty".to_string(),
        ));
    }

    if config.max_body_bytes < 1024 {
        return Err(ConfigError::Validation(format!(
            "max_body_bytes must be >= 1024, got {}",
            config.max_body_bytes
        )));
    }

    Ok(())
}

fn validate_storage_config(config: &StorageConfig) -> Result<(), ConfigError> {
    validate_backend_path("storage", config.backend, config.path.as_deref())
}

fn validate_frontier_config(config: &FrontierConfig) -> Result<(), ConfigError> {
    validate_backend_path("frontier", config.backend, config.path.as_deref())?;

    if config.capacity < 1 {
        return Err(ConfigError::Validation(
            "frontier capacity must be >= 1".to_string(),
        ));
    }

    Ok(())
}

/// A SQLite backend needs a non-empty path
fn validate_backend_path(
    section: &str,
    backend: BackendKind,
    path: Option<&str>,
) -> Result<(), ConfigError> {
    if backend == BackendKind::Sqlite && path.map_or(true, |p| p.trim().is_empty()) {
        return Err(ConfigError::Validation(format!(
            "{} backend 'sqlite' requires a path",
            section
        )));
    }
    Ok(())
}
