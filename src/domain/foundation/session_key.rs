//! Session key value object.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque key identifying one conversation.
///
/// The messaging gateway decides what goes in here (a phone number, a chat
/// id); the core only uses it to scope dialog state. Updates for one key are
/// strictly sequential; different keys are fully independent.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionKey(String);

impl SessionKey {
    /// Creates a session key from any string-like value.
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Returns the key as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for SessionKey {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_key_round_trips_through_display() {
        let key = SessionKey::new("whatsapp:+447700900123");
        assert_eq!(key.to_string(), "whatsapp:+447700900123");
        assert_eq!(key.as_str(), "whatsapp:+447700900123");
    }

    #[test]
    fn session_keys_compare_by_value() {
        assert_eq!(SessionKey::from("a"), SessionKey::new("a"));
        assert_ne!(SessionKey::from("a"), SessionKey::new("b"));
    }
}
