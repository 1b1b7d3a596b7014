use crate::page::Page;
use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};

/// Result of folding a fetched body into a page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    /// The checksum differs from the stored one (or there was none)
    Modified,

    /// Same checksum as the previous fetch
    NotModified,
}

/// Computes the hex-encoded SHA-256 checksum of a page body
pub fn content_checksum(body: &[u8]) -> String {
    hex::encode(Sha256::digest(body))
}

impl Page {
    /// Records a successful fetch of `body` at `now`
    ///
    /// `first_seen` is set only once, `last_fetch` always advances and
    /// `last_change` moves only when the checksum changes.
    pub fn record_fetch(&mut self, body: &[u8], now: DateTime<Utc>) -> FetchOutcome {
        self.last_fetch = Some(now);
        if self.first_seen.is_none() {
            self.first_seen = Some(now);
        }

        let sum = content_checksum(body);
        if self.checksum.as_deref() == Some(sum.as_str()) {
            return FetchOutcome::NotModified;
        }

        self.checksum = Some(sum);
        self.last_change = Some(now);
        FetchOutcome::Modified
    }
}
