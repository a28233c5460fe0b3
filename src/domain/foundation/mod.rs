//! Shared building blocks for the domain layer.

mod session_key;
mod state_machine;

pub use session_key::SessionKey;
pub use state_machine::{StateMachine, TransitionError};
