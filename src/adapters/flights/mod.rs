//! Canned flight inventory.
//!
//! Deterministic offers derived from the request, plus failure injection and
//! call counting. Serves as the in-process provider for the REPL and the
//! integration tests.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::domain::search::{FlightOffer, ProviderError, SearchRequest};
use crate::ports::FlightProvider;

#[derive(Default)]
pub struct CannedFlightProvider {
    /// Failures to serve before returning offers again, oldest first.
    failures: Mutex<VecDeque<ProviderError>>,
    calls: AtomicUsize,
    /// When set, every successful call returns no offers.
    empty: std::sync::atomic::AtomicBool,
}

impl CannedFlightProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues one failure; the next call consumes it.
    pub fn push_failure(&self, error: ProviderError) {
        if let Ok(mut failures) = self.failures.lock() {
            failures.push_back(error);
        }
    }

    /// Makes all subsequent successful calls return zero offers.
    pub fn set_empty(&self, empty: bool) {
        self.empty.store(empty, Ordering::SeqCst);
    }

    /// Provider calls made so far.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn offers_for(&self, request: &SearchRequest) -> Vec<FlightOffer> {
        let route = format!("{}-{}", request.origin, request.destination);
        vec![
            FlightOffer {
                id: format!("{route}-fast"),
                carrier: "VL 100".into(),
                price_total: 780.0 * f64::from(request.passengers),
                currency: "USD".into(),
                duration_minutes: 415,
                stops: 0,
                segment_summary: format!("{route} nonstop"),
            },
            FlightOffer {
                id: format!("{route}-cheap"),
                carrier: "VL 220".into(),
                price_total: 320.0 * f64::from(request.passengers),
                currency: "USD".into(),
                duration_minutes: 560,
                stops: 1,
                segment_summary: format!("{route} via KEF"),
            },
            FlightOffer {
                id: format!("{route}-mid"),
                carrier: "VL 340".into(),
                price_total: 410.0 * f64::from(request.passengers),
                currency: "USD".into(),
                duration_minutes: 505,
                stops: 1,
                segment_summary: format!("{route} via DUB"),
            },
        ]
    }
}

#[async_trait]
impl FlightProvider for CannedFlightProvider {
    async fn search(&self, request: &SearchRequest) -> Result<Vec<FlightOffer>, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut failures) = self.failures.lock() {
            if let Some(error) = failures.pop_front() {
                return Err(error);
            }
        }
        if self.empty.load(Ordering::SeqCst) {
            return Ok(Vec::new());
        }
        Ok(self.offers_for(request))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::search::LocationCode;

    fn request() -> SearchRequest {
        SearchRequest {
            origin: LocationCode::new("NYC"),
            destination: LocationCode::new("LON"),
            departure_date: "2025-12-15".parse().unwrap(),
            return_date: None,
            passengers: 2,
        }
    }

    #[tokio::test]
    async fn offers_scale_with_passengers_and_calls_are_counted() {
        let provider = CannedFlightProvider::new();
        let offers = provider.search(&request()).await.unwrap();
        assert_eq!(offers.len(), 3);
        assert_eq!(offers[0].price_total, 1560.0);
        assert_eq!(provider.call_count(), 1);
    }

    #[tokio::test]
    async fn queued_failures_are_served_before_offers() {
        let provider = CannedFlightProvider::new();
        provider.push_failure(ProviderError::Timeout);
        assert_eq!(
            provider.search(&request()).await,
            Err(ProviderError::Timeout)
        );
        assert!(provider.search(&request()).await.is_ok());
    }
}
