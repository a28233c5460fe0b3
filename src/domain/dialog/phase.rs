//! Conversation phases and their allowed transitions.

use crate::domain::foundation::StateMachine;
use serde::{Deserialize, Serialize};

/// Phase of a flight-search conversation.
///
/// `Presenting` is terminal for one search request, but the dialog state
/// persists so a later utterance re-enters `Collecting` with prior fields
/// intact. `Done` is reached only when the clarification loop exhausts its
/// attempt budget.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DialogPhase {
    #[default]
    Collecting,
    Validating,
    Searching,
    Presenting,
    Clarifying,
    Done,
}

impl StateMachine for DialogPhase {
    fn can_transition_to(&self, target: &Self) -> bool {
        use DialogPhase::*;
        matches!(
            (self, target),
            (Collecting, Validating)
                | (Collecting, Clarifying)
                | (Validating, Searching)
                | (Validating, Clarifying)
                | (Searching, Presenting)
                | (Searching, Clarifying)
                | (Presenting, Collecting)
                | (Clarifying, Collecting)
                | (Clarifying, Done)
        )
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use DialogPhase::*;
        match self {
            Collecting => vec![Validating, Clarifying],
            Validating => vec![Searching, Clarifying],
            Searching => vec![Presenting, Clarifying],
            Presenting => vec![Collecting],
            Clarifying => vec![Collecting, Done],
            Done => vec![],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::StateMachine;

    #[test]
    fn validation_gate_is_the_only_road_to_searching() {
        for phase in [
            DialogPhase::Collecting,
            DialogPhase::Searching,
            DialogPhase::Presenting,
            DialogPhase::Clarifying,
            DialogPhase::Done,
        ] {
            assert!(!phase.can_transition_to(&DialogPhase::Searching));
        }
        assert!(DialogPhase::Validating.can_transition_to(&DialogPhase::Searching));
    }

    #[test]
    fn done_is_terminal() {
        assert!(DialogPhase::Done.is_terminal());
        assert!(!DialogPhase::Presenting.is_terminal());
    }

    #[test]
    fn presenting_re_enters_collection_for_follow_up_requests() {
        let next = DialogPhase::Presenting.transition_to(DialogPhase::Collecting);
        assert_eq!(next, Ok(DialogPhase::Collecting));
    }

    #[test]
    fn clarifying_cannot_jump_straight_to_presenting() {
        assert!(DialogPhase::Clarifying
            .transition_to(DialogPhase::Presenting)
            .is_err());
    }
}
