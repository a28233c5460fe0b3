//! Short-lived result cache keyed by normalized search request.
//!
//! Flight prices drift, so entries are only served within a configured
//! freshness window. Time is always passed in by the caller, which keeps
//! expiry testable without sleeping.

use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::domain::search::FlightOffer;

struct CacheEntry {
    offers: Vec<FlightOffer>,
    captured_at: DateTime<Utc>,
}

/// In-memory search-result cache with a freshness window.
pub struct ResultCache {
    freshness: Duration,
    entries: RwLock<HashMap<String, CacheEntry>>,
}

impl ResultCache {
    /// Creates a cache serving entries younger than `freshness`.
    pub fn new(freshness: std::time::Duration) -> Self {
        Self {
            freshness: Duration::from_std(freshness).unwrap_or_else(|_| Duration::hours(1)),
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Returns the cached offers for `key` if captured within the freshness
    /// window as of `now`. Stale entries are treated as absent.
    pub async fn get_fresh(&self, key: &str, now: DateTime<Utc>) -> Option<Vec<FlightOffer>> {
        let entries = self.entries.read().await;
        let entry = entries.get(key)?;
        if now - entry.captured_at <= self.freshness {
            tracing::debug!(key, "cache hit");
            Some(entry.offers.clone())
        } else {
            tracing::debug!(key, "cache entry stale");
            None
        }
    }

    /// Stores (replacing) the offers for `key`, stamped at `now`.
    pub async fn insert(&self, key: &str, offers: Vec<FlightOffer>, now: DateTime<Utc>) {
        let mut entries = self.entries.write().await;
        entries.insert(
            key.to_string(),
            CacheEntry {
                offers,
                captured_at: now,
            },
        );
    }
}
