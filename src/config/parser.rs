use crate::config::types::Config;
use crate::config::validation::validate;
use crate::ConfigError;
use sha2::{Digest, Sha256};
use std::path::Path;

/// Reads, parses and validates the TOML file at `path`
///
/// # Errors
///
/// `ConfigError::Io` if the file cannot be read, `ConfigError::Parse` for
/// malformed TOML, and a validation variant for anything `validate` rejects.
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use sitepace::config::load_config;
///
/// let config = load_config(Path::new("sitepace.toml")).unwrap();
/// println!("Domains: {}", config.domains.len());
/// ```
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    parse_config(&std::fs::read_to_string(path)?)
}

/// Parses and validates configuration text
pub fn parse_config(content: &str) -> Result<Config, ConfigError> {
    let config: Config = toml::from_str(content)?;
    validate(&config)?;
    Ok(config)
}

/// Hex SHA-256 digest of the raw configuration file
///
/// Logged at startup so operators can tell which configuration a run used.
pub fn compute_config_hash(path: &Path) -> Result<String, ConfigError> {
    Ok(digest_hex(&std::fs::read_to_string(path)?))
}

/// Like [`load_config`], also returning the digest of the exact text parsed
pub fn load_config_with_hash(path: &Path) -> Result<(Config, String), ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let config = parse_config(&content)?;
    Ok((config, digest_hex(&content)))
}

fn digest_hex(content: &str) -> String {
    hex::encode(Sha256::digest(content.as_bytes()))
}
