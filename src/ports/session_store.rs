//! Session-persistence port.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::dialog::DialogState;
use crate::domain::foundation::SessionKey;

/// Failure reading or writing a session.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("session store unavailable: {0}")]
    Unavailable(String),
    #[error("stored session is corrupt: {0}")]
    Corrupt(String),
}

/// Keyed storage for per-conversation dialog state.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Loads the state for a session, if one exists.
    async fn get(&self, key: &SessionKey) -> Result<Option<DialogState>, StoreError>;

    /// Stores (replacing) the state for a session.
    async fn set(&self, key: &SessionKey, state: DialogState) -> Result<(), StoreError>;

    /// Drops a session entirely.
    async fn clear(&self, key: &SessionKey) -> Result<(), StoreError>;
}
