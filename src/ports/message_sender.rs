//! Outbound-message port.

use async_trait::async_trait;

/// Delivers a reply to wherever the user is.
///
/// Returns whether delivery succeeded; the engine logs failures but never
/// fails a turn over them.
#[async_trait]
pub trait MessageSender: Send + Sync {
    async fn send(&self, recipient: &str, text: &str) -> bool;
}
