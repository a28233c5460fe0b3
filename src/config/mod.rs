//! Application configuration.
//!
//! Settings load from environment variables with the `FLIGHTDESK` prefix and
//! `__` section separator (e.g. `FLIGHTDESK__DIALOG__CLARIFICATION_CAP=3`).
//! Every field has a sensible default, so an empty environment still yields a
//! runnable configuration.

mod ai;
mod dialog;
mod error;
mod search;

pub use ai::AiConfig;
pub use dialog::DialogConfig;
pub use error::{ConfigError, ValidationError};
pub use search::SearchConfig;

use serde::Deserialize;

/// Root configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub dialog: DialogConfig,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub ai: AiConfig,
}

impl AppConfig {
    /// Loads configuration from the environment.
    pub fn load() -> Result<Self, ConfigError> {
        let loaded = config::Config::builder()
            .add_source(
                config::Environment::with_prefix("FLIGHTDESK")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;
        let app: AppConfig = loaded.try_deserialize()?;
        app.validate()?;
        Ok(app)
    }

    /// Cross-checks all sections.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.dialog.validate()?;
        self.search.validate()?;
        self.ai.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.dialog.clarification_cap, 3);
    }
}
