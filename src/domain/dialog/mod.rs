//! Dialog state and conversation phases.

mod phase;
mod state;

pub use phase::DialogPhase;
pub use state::{DialogState, Slot, TripType, TurnRecord, REQUIRED_SLOTS};
