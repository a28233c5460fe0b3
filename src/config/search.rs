//! Search-execution settings.

use serde::Deserialize;
use std::time::Duration;

use super::ValidationError;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Hard deadline on a single provider call, in seconds.
    pub provider_timeout_secs: u64,
    /// Pause before the single transient-failure retry, in milliseconds.
    pub retry_delay_ms: u64,
    /// How long cached results stay servable, in seconds.
    pub cache_freshness_secs: u64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            provider_timeout_secs: 10,
            retry_delay_ms: 500,
            cache_freshness_secs: 3600,
        }
    }
}

impl SearchConfig {
    pub fn provider_timeout(&self) -> Duration {
        Duration::from_secs(self.provider_timeout_secs)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    pub fn cache_freshness(&self) -> Duration {
        Duration::from_secs(self.cache_freshness_secs)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.provider_timeout_secs == 0 {
            return Err(ValidationError::new(
                "search.provider_timeout_secs",
                "must be at least 1",
            ));
        }
        if self.cache_freshness_secs == 0 {
            return Err(ValidationError::new(
                "search.cache_freshness_secs",
                "must be at least 1",
            ));
        }
        Ok(())
    }
}
