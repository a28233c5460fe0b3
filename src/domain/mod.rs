//! Domain layer - pure conversation, extraction, and validation logic.
//!
//! Nothing in here performs I/O. External collaborators are reached through
//! the `ports` module; the application layer wires the two together.

pub mod dialog;
pub mod extract;
pub mod foundation;
pub mod present;
pub mod search;
pub mod validate;
