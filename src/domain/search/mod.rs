//! Search request, offer, and provider failure types.
//!
//! A [`SearchRequest`] is a trip reduced to resolved location codes and
//! canonical dates; its [`cache_key`](SearchRequest::cache_key) is the
//! normalization used by the result cache.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// A provider-specific location code (e.g. "LON", "JFK").
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LocationCode(String);

impl LocationCode {
    /// Creates a code, normalizing to upper case.
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into().trim().to_uppercase())
    }

    /// Returns the code as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LocationCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Sentinel used in cache keys when no return date is present.
const ONE_WAY_SENTINEL: &str = "ONEWAY";

/// A fully resolved, validated flight-search request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchRequest {
    pub origin: LocationCode,
    pub destination: LocationCode,
    pub departure_date: NaiveDate,
    pub return_date: Option<NaiveDate>,
    pub passengers: u8,
}

impl SearchRequest {
    /// Builds the normalized cache key for this request.
    ///
    /// Two requests describing the same trip always produce the same key,
    /// regardless of how the user phrased the locations.
    pub fn cache_key(&self) -> String {
        let ret = self
            .return_date
            .map(|d| d.to_string())
            .unwrap_or_else(|| ONE_WAY_SENTINEL.to_string());
        format!(
            "{}|{}|{}|{}|{}",
            self.origin, self.destination, self.departure_date, ret, self.passengers
        )
    }
}

/// One bookable flight option returned by the search provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlightOffer {
    /// Provider-assigned offer identity.
    pub id: String,
    /// Carrier and flight number, e.g. "BA 247".
    pub carrier: String,
    /// Total price across all passengers.
    pub price_total: f64,
    /// ISO currency code.
    pub currency: String,
    /// Total elapsed duration in minutes, including connections.
    pub duration_minutes: u32,
    /// Number of stops (0 = non-stop).
    pub stops: u8,
    /// Compact route summary, e.g. "LHR → GRU (1 stop, 11h30)".
    pub segment_summary: String,
}

/// Result set from one executed search, tagged with cache provenance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResults {
    pub offers: Vec<FlightOffer>,
    /// True when the payload came from the result cache.
    pub cached: bool,
}

/// Coarse failure categories for the upstream search provider.
///
/// Every provider exception is converted to one of these at the executor
/// boundary; nothing else crosses it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderError {
    #[error("provider call timed out")]
    Timeout,

    #[error("provider rate limit hit")]
    RateLimited,

    #[error("no flights found for the requested route")]
    NotFound,

    #[error("provider rejected location code: {0}")]
    InvalidLocation(String),

    #[error("provider failure: {0}")]
    Unknown(String),
}

impl ProviderError {
    /// True for transient/server-class failures that may be retried once.
    ///
    /// Client-class failures (not-found, invalid-location) are never retried.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            ProviderError::Timeout | ProviderError::RateLimited | ProviderError::Unknown(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(ret: Option<&str>) -> SearchRequest {
        SearchRequest {
            origin: LocationCode::new("nyc"),
            destination: LocationCode::new("LON"),
            departure_date: "2025-12-15".parse().unwrap(),
            return_date: ret.map(|d| d.parse().unwrap()),
            passengers: 2,
        }
    }

    #[test]
    fn location_codes_normalize_to_uppercase() {
        assert_eq!(LocationCode::new(" lhr ").as_str(), "LHR");
    }

    #[test]
    fn cache_key_uses_one_way_sentinel_when_return_absent() {
        assert_eq!(request(None).cache_key(), "NYC|LON|2025-12-15|ONEWAY|2");
    }

    #[test]
    fn cache_key_includes_return_date_when_present() {
        assert_eq!(
            request(Some("2025-12-22")).cache_key(),
            "NYC|LON|2025-12-15|2025-12-22|2"
        );
    }

    #[test]
    fn identical_trips_share_a_cache_key() {
        assert_eq!(request(None).cache_key(), request(None).cache_key());
    }

    #[test]
    fn transient_classification_excludes_client_errors() {
        assert!(ProviderError::Timeout.is_transient());
        assert!(ProviderError::RateLimited.is_transient());
        assert!(ProviderError::Unknown("boom".into()).is_transient());
        assert!(!ProviderError::NotFound.is_transient());
        assert!(!ProviderError::InvalidLocation("XXX".into()).is_transient());
    }
}
