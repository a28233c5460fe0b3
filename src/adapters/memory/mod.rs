//! In-memory session storage.

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::domain::dialog::DialogState;
use crate::domain::foundation::SessionKey;
use crate::ports::{SessionStore, StoreError};

/// Process-local session store. Sessions vanish on restart, which is fine
/// for the REPL and for tests.
#[derive(Default)]
pub struct InMemorySessionStore {
    sessions: RwLock<HashMap<SessionKey, DialogState>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn get(&self, key: &SessionKey) -> Result<Option<DialogState>, StoreError> {
        Ok(self.sessions.read().await.get(key).cloned())
    }

    async fn set(&self, key: &SessionKey, state: DialogState) -> Result<(), StoreError> {
        self.sessions.write().await.insert(key.clone(), state);
        Ok(())
    }

    async fn clear(&self, key: &SessionKey) -> Result<(), StoreError> {
        self.sessions.write().await.remove(key);
        Ok(())
    }
}
