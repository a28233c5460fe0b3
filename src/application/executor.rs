//! Search execution: the one place a provider call can happen.
//!
//! The executor re-checks the validator's authorization, resolves free-text
//! locations to codes, consults the cache, and makes at most one provider
//! call per turn (plus a single retry when the failure is transient).

use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;

use crate::application::cache::ResultCache;
use crate::domain::dialog::DialogState;
use crate::domain::search::{FlightOffer, ProviderError, SearchRequest, SearchResults};
use crate::ports::{FlightProvider, LocationResolver};

/// What one execution attempt produced.
#[derive(Debug)]
pub enum ExecutorOutcome {
    /// A search ran (or was served from cache).
    Results {
        request: SearchRequest,
        results: SearchResults,
    },
    /// A location could not be resolved to exactly one code; the message
    /// tells the user what to clarify.
    NeedsClarification(String),
    /// The provider failed even after the retry policy was exhausted.
    ProviderFailure(ProviderError),
    /// The state was never authorized by the validator. Indicates a routing
    /// bug, not user error.
    GateViolation,
}

pub struct SearchExecutor {
    resolver: Arc<dyn LocationResolver>,
    provider: Arc<dyn FlightProvider>,
    cache: Arc<ResultCache>,
    provider_timeout: Duration,
    retry_delay: Duration,
}

impl SearchExecutor {
    pub fn new(
        resolver: Arc<dyn LocationResolver>,
        provider: Arc<dyn FlightProvider>,
        cache: Arc<ResultCache>,
        provider_timeout: Duration,
        retry_delay: Duration,
    ) -> Self {
        Self {
            resolver,
            provider,
            cache,
            provider_timeout,
            retry_delay,
        }
    }

    /// Executes the search described by an authorized state.
    pub async fn execute(&self, state: &DialogState, now: DateTime<Utc>) -> ExecutorOutcome {
        if !state.ready_for_api {
            tracing::error!("search requested for a state the validator never authorized");
            return ExecutorOutcome::GateViolation;
        }

        let (origin, destination) = match (&state.origin, &state.destination) {
            (Some(origin), Some(destination)) => (origin, destination),
            _ => {
                tracing::error!("authorized state is missing a location");
                return ExecutorOutcome::GateViolation;
            }
        };
        let departure_date = match state.departure_date {
            Some(date) => date,
            None => {
                tracing::error!("authorized state is missing a departure date");
                return ExecutorOutcome::GateViolation;
            }
        };

        let origin_code = match self.resolve_one(origin) {
            Ok(code) => code,
            Err(message) => return ExecutorOutcome::NeedsClarification(message),
        };
        let destination_code = match self.resolve_one(destination) {
            Ok(code) => code,
            Err(message) => return ExecutorOutcome::NeedsClarification(message),
        };

        let request = SearchRequest {
            origin: origin_code,
            destination: destination_code,
            departure_date,
            return_date: state.return_date,
            passengers: state.passengers.unwrap_or(1),
        };
        let key = request.cache_key();

        if let Some(offers) = self.cache.get_fresh(&key, now).await {
            return ExecutorOutcome::Results {
                request,
                results: SearchResults {
                    offers,
                    cached: true,
                },
            };
        }

        let outcome = match self.attempt(&request).await {
            Ok(offers) => Ok(offers),
            Err(err) if err.is_transient() => {
                tracing::warn!(error = %err, "transient provider failure, retrying once");
                tokio::time::sleep(self.retry_delay).await;
                self.attempt(&request).await
            }
            Err(err) => Err(err),
        };

        match outcome {
            Ok(offers) => {
                // Empty result sets are not cached: the user will retry with
                // tweaked parameters, and inventory may appear meanwhile.
                if !offers.is_empty() {
                    self.cache.insert(&key, offers.clone(), now).await;
                }
                ExecutorOutcome::Results {
                    request,
                    results: SearchResults {
                        offers,
                        cached: false,
                    },
                }
            }
            // No inventory is a presentable outcome, not a failure.
            Err(ProviderError::NotFound) => ExecutorOutcome::Results {
                request,
                results: SearchResults {
                    offers: Vec::new(),
                    cached: false,
                },
            },
            Err(err) => {
                tracing::warn!(error = %err, "provider failed after retry policy");
                ExecutorOutcome::ProviderFailure(err)
            }
        }
    }

    async fn attempt(&self, request: &SearchRequest) -> Result<Vec<FlightOffer>, ProviderError> {
        match timeout(self.provider_timeout, self.provider.search(request)).await {
            Ok(result) => result,
            Err(_) => Err(ProviderError::Timeout),
        }
    }

    fn resolve_one(
        &self,
        name: &str,
    ) -> Result<crate::domain::search::LocationCode, String> {
        let mut codes = self.resolver.resolve(name);
        match codes.len() {
            1 => Ok(codes.remove(0)),
            0 => Err(format!(
                "I don't recognize \"{name}\" as a city or airport. \
                 Could you give me a nearby major city or an airport code?"
            )),
            _ => {
                let options = codes
                    .iter()
                    .map(|c| c.as_str())
                    .collect::<Vec<_>>()
                    .join(", ");
                Err(format!(
                    "\"{name}\" could mean more than one airport ({options}). Which one?"
                ))
            }
        }
    }
}
