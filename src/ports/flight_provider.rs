//! Flight-inventory port.

use async_trait::async_trait;

use crate::domain::search::{FlightOffer, ProviderError, SearchRequest};

/// A flight-search backend.
///
/// One conversation turn performs at most one provider call (plus a single
/// retry on a transient failure); the caller owns timeout and retry policy.
#[async_trait]
pub trait FlightProvider: Send + Sync {
    async fn search(&self, request: &SearchRequest) -> Result<Vec<FlightOffer>, ProviderError>;
}
