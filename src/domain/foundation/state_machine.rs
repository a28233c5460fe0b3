//! State machine trait for status enums.
//!
//! Provides a consistent interface for validating and performing phase
//! transitions. The dialog phase enum implements this so that routing code
//! never writes an unchecked transition.

use thiserror::Error;

/// Error returned when a phase transition is not allowed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("cannot transition from {from} to {to}")]
pub struct TransitionError {
    /// Phase we were in.
    pub from: String,
    /// Phase that was requested.
    pub to: String,
}

/// Trait for status enums that represent state machines.
///
/// Implementors define valid transitions and get validated transition
/// methods for free.
pub trait StateMachine: Sized + Copy + PartialEq + std::fmt::Debug {
    /// Returns true if transition from self to target is valid.
    fn can_transition_to(&self, target: &Self) -> bool;

    /// Returns all valid target states from the current state.
    fn valid_transitions(&self) -> Vec<Self>;

    /// Performs the transition with validation, returning an error if invalid.
    fn transition_to(&self, target: Self) -> Result<Self, TransitionError> {
        if self.can_transition_to(&target) {
            Ok(target)
        } else {
            Err(TransitionError {
                from: format!("{:?}", self),
                to: format!("{:?}", target),
            })
        }
    }

    /// Checks if the current state is terminal (no valid outgoing transitions).
    fn is_terminal(&self) -> bool {
        self.valid_transitions().is_empty()
    }
}
