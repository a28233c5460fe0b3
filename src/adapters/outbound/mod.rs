//! Outbound message delivery.

use async_trait::async_trait;
use std::sync::Mutex;

use crate::ports::MessageSender;

/// Logs every outbound message. The REPL prints replies itself; this keeps a
/// structured record alongside.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingMessageSender;

impl TracingMessageSender {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl MessageSender for TracingMessageSender {
    async fn send(&self, recipient: &str, text: &str) -> bool {
        tracing::info!(recipient, chars = text.len(), "outbound message");
        true
    }
}

/// Captures outbound messages for assertions.
#[derive(Default)]
pub struct RecordingMessageSender {
    sent: Mutex<Vec<(String, String)>>,
}

impl RecordingMessageSender {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<(String, String)> {
        self.sent.lock().map(|s| s.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl MessageSender for RecordingMessageSender {
    async fn send(&self, recipient: &str, text: &str) -> bool {
        if let Ok(mut sent) = self.sent.lock() {
            sent.push((recipient.to_string(), text.to_string()));
        }
        true
    }
}
