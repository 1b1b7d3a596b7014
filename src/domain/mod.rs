//! Domain registry for Sitepace
//!
//! A [`Domain`] is one crawled site: its base URL, routing key, dispatch delay,
//! start points and link rules. The [`DomainRegistry`] is the immutable set of
//! domains a run works with; its keys decide which frontier a URL belongs to.

mod filter;
mod host;

pub use filter::RuleSet;
pub use host::{host_key, host_key_of, parse_http_url};

use crate::config::DomainEntry;
use crate::page::Page;
use crate::{ConfigError, ConfigResult};
use chrono::{DateTime, Utc};
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// Why a URL was not fetched or admitted
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// Matched an exclude rule
    Excluded { rule: String },

    /// Include rules exist and none matched
    NotIncluded,

    /// The redownload interval has not elapsed since the last fetch
    TooSoon { remaining: Duration },
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Excluded { rule } => write!(f, "excluded by rule '{}'", rule),
            Self::NotIncluded => write!(f, "no include rule matched"),
            Self::TooSoon { remaining } => {
                write!(f, "redownload interval not elapsed ({:?} left)", remaining)
            }
        }
    }
}

/// A crawled site, compiled from its configuration entry
#[derive(Debug, Clone)]
pub struct Domain {
    key: String,
    name: String,
    base: Url,
    delay: Duration,
    redownload: Duration,
    start_points: Vec<Url>,
    rules: RuleSet,
}

impl Domain {
    /// Compiles a configuration entry
    ///
    /// Start points may be absolute URLs or paths relative to the base URL;
    /// either way they must resolve to the same host key as the base URL.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the base URL, a start point or a rule
    /// pattern is invalid.
    pub fn from_entry(entry: &DomainEntry) -> ConfigResult<Self> {
        let base = parse_http_url(&entry.url)
            .map_err(|e| ConfigError::InvalidUrl(e.to_string()))?;
        let key = host_key(&base).ok_or_else(|| {
            ConfigError::InvalidUrl(format!("Domain url '{}' has no host", entry.url))
        })?;

        let mut start_points = Vec::with_capacity(entry.start_points.len());
        for point in &entry.start_points {
            let url = base.join(point.trim()).map_err(|e| {
                ConfigError::InvalidUrl(format!("Invalid start point '{}': {}", point, e))
            })?;

            if url.scheme() != "http" && url.scheme() != "https" {
                return Err(ConfigError::InvalidUrl(format!(
                    "Start point '{}' must use http or https",
                    point
                )));
            }

            if host_key(&url).as_deref() != Some(key.as_str()) {
                return Err(ConfigError::Validation(format!(
                    "Start point '{}' does not belong to domain '{}'",
                    point, key
                )));
            }

            start_points.push(url);
        }

        let rules = RuleSet::new(&entry.include, &entry.exclude)?;
        let name = if entry.name.trim().is_empty() {
            key.clone()
        } else {
            entry.name.clone()
        };

        Ok(Self {
            key,
            name,
            base,
            delay: Duration::from_millis(entry.delay),
            redownload: Duration::from_secs(entry.redownload),
            start_points,
            rules,
        })
    }

    /// The routing key (lowercase host without `www.`)
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    /// Minimum gap between two dispatches of this domain
    pub fn delay(&self) -> Duration {
        self.delay
    }

    pub fn redownload(&self) -> Duration {
        self.redownload
    }

    pub fn start_points(&self) -> &[Url] {
        &self.start_points
    }

    /// URLs that (re)seed this domain's frontier: the start points in
    /// configured order, or the base URL when none are configured
    pub fn seeds(&self) -> Vec<String> {
        if self.start_points.is_empty() {
            vec![self.base.to_string()]
        } else {
            self.start_points.iter().map(|u| u.to_string()).collect()
        }
    }

    /// True if any include or exclude rule is configured
    pub fn has_rules(&self) -> bool {
        !self.rules.is_empty()
    }

    /// Checks a discovered link against the include/exclude rules
    pub fn admits(&self, url: &str) -> Result<(), SkipReason> {
        self.rules.check(url)
    }

    /// Checks whether a dispatched page should be fetched now
    ///
    /// Applies the link rules and the redownload interval measured from the
    /// page's last fetch. A zero interval never blocks.
    pub fn can_download(&self, page: &Page, now: DateTime<Utc>) -> Result<(), SkipReason> {
        self.rules.check(&page.url)?;

        if self.redownload.is_zero() {
            return Ok(());
        }

        if let Some(last) = page.last_fetch {
            let elapsed = (now - last).to_std().unwrap_or(Duration::ZERO);
            if elapsed < self.redownload {
                return Err(SkipReason::TooSoon {
                    remaining: self.redownload - elapsed,
                });
            }
        }

        Ok(())
    }
}

/// The immutable set of domains for one run, in configuration order
#[derive(Debug, Clone, Default)]
pub struct DomainRegistry {
    domains: Vec<Arc<Domain>>,
    keys: HashSet<String>,
}

impl DomainRegistry {
    /// Compiles every entry and checks that host keys are unique
    pub fn from_entries(entries: &[DomainEntry]) -> ConfigResult<Self> {
        let mut registry = Self::default();

        for entry in entries {
            let domain = Domain::from_entry(entry)?;
            if !registry.keys.insert(domain.key().to_string()) {
                return Err(ConfigError::DuplicateDomain(domain.key().to_string()));
            }
            registry.domains.push(Arc::new(domain));
        }

        Ok(registry)
    }

    pub fn len(&self) -> usize {
        self.domains.len()
    }

    pub fn is_empty(&self) -> bool {
        self.domains.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<Domain>> {
        self.domains.iter()
    }
}
