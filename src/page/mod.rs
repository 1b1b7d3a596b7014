//! Page records and change detection
//!
//! A [`Page`] is the persisted metadata for one URL. Fetch results are folded
//! into it with [`Page::record_fetch`], which decides whether the content
//! changed since the previous fetch.

mod checksum;

pub use checksum::{content_checksum, FetchOutcome};

use crate::domain::{host_key, parse_http_url};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Metadata for one distinct URL
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    /// The page URL (identity)
    pub url: String,

    /// Text of the first `<title>` element, empty until known
    pub title: String,

    /// Hex-encoded content checksum of the last fetched body
    pub checksum: Option<String>,

    /// Time of the first successful fetch
    pub first_seen: Option<DateTime<Utc>>,

    /// Time of the most recent successful fetch
    pub last_fetch: Option<DateTime<Utc>>,

    /// Time the checksum last changed
    pub last_change: Option<DateTime<Utc>>,
}

impl Page {
    /// Creates a stub carrying only the URL
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    /// Routing key of this page's URL, if it parses
    pub fn domain_key(&self) -> Option<String> {
        parse_http_url(&self.url).ok().as_ref().and_then(host_key)
    }

    /// Returns true if the page has never been fetched
    pub fn is_stub(&self) -> bool {
        self.last_fetch.is_none()
    }
}
