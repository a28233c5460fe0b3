//! The canonical per-conversation record.
//!
//! `DialogState` is an explicit value type updated through copy-on-write
//! `with_*` methods: every turn takes the old state in and hands a new state
//! out, so no shared mutable state is ever visible across turns.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use crate::domain::search::SearchResults;

use super::DialogPhase;

/// One named field of the travel request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Slot {
    Origin,
    Destination,
    DepartureDate,
    ReturnDate,
    Passengers,
    TripType,
}

impl Slot {
    /// Human-readable name used in clarification prompts.
    pub fn display_name(&self) -> &'static str {
        match self {
            Slot::Origin => "departure city",
            Slot::Destination => "destination",
            Slot::DepartureDate => "departure date",
            Slot::ReturnDate => "return date",
            Slot::Passengers => "passenger count",
            Slot::TripType => "trip type",
        }
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// One-way vs round-trip decision.
///
/// Not authoritative until `trip_type_confirmed` is set on the state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TripType {
    #[default]
    Undecided,
    OneWay,
    RoundTrip,
}

impl TripType {
    /// True once the user has picked one of the two real options.
    pub fn is_decided(&self) -> bool {
        !matches!(self, TripType::Undecided)
    }
}

/// One (user utterance, system reply) pair in the transcript.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TurnRecord {
    pub user: String,
    pub system: String,
    pub at: DateTime<Utc>,
}

/// The canonical mutable record of a single conversation.
///
/// Created empty on the first utterance, replaced (never aliased) on every
/// turn, discarded on explicit cancellation or session TTL expiry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DialogState {
    /// Free-text origin, pre code resolution.
    pub origin: Option<String>,
    /// Free-text destination, pre code resolution.
    pub destination: Option<String>,
    pub departure_date: Option<chrono::NaiveDate>,
    pub return_date: Option<chrono::NaiveDate>,
    /// Positive passenger count, domain-capped to 1..=9 at the validation gate.
    pub passengers: Option<u8>,
    pub trip_type: TripType,
    pub trip_type_confirmed: bool,

    /// Last-writer-wins confidence per captured field, never aggregated.
    pub field_confidence: HashMap<Slot, f32>,
    /// Rule violations from the most recent validation pass (replaced, not
    /// appended).
    pub validation_errors: Vec<String>,
    /// Authorization gate: set only by the validator, checked by the executor.
    pub ready_for_api: bool,

    /// Which slot the last system question asked for, if any. Drives the
    /// single-city reply fallback.
    pub pending_question: Option<Slot>,
    /// User-attributable clarification turns so far.
    pub clarification_attempts: u8,
    /// Append-only transcript.
    pub conversation_history: Vec<TurnRecord>,

    pub search_results: Option<SearchResults>,
    pub search_cached: bool,

    pub phase: DialogPhase,
}

/// Required slots, in the order they are asked for.
pub const REQUIRED_SLOTS: [Slot; 3] = [Slot::Origin, Slot::Destination, Slot::DepartureDate];

impl DialogState {
    /// Creates the initial empty state for a new conversation.
    pub fn new() -> Self {
        Self::default()
    }

    /// Ordered list of required slots still missing.
    pub fn missing_fields(&self) -> Vec<Slot> {
        REQUIRED_SLOTS
            .iter()
            .copied()
            .filter(|slot| match slot {
                Slot::Origin => self.origin.is_none(),
                Slot::Destination => self.destination.is_none(),
                Slot::DepartureDate => self.departure_date.is_none(),
                _ => false,
            })
            .collect()
    }

    /// True when origin, destination, and departure date are all captured.
    pub fn has_required_fields(&self) -> bool {
        self.missing_fields().is_empty()
    }

    /// True when no travel field has been captured yet.
    pub fn is_empty(&self) -> bool {
        self.origin.is_none()
            && self.destination.is_none()
            && self.departure_date.is_none()
            && self.return_date.is_none()
            && self.passengers.is_none()
            && !self.trip_type.is_decided()
    }

    /// True when the trip type is decided and confirmed by the user.
    pub fn has_trip_type_decision(&self) -> bool {
        self.trip_type.is_decided() && self.trip_type_confirmed
    }

    /// Most recent system reply, if any.
    pub fn last_system_reply(&self) -> Option<&str> {
        self.conversation_history
            .last()
            .map(|turn| turn.system.as_str())
    }

    /// Returns a new state with the trip type set.
    pub fn with_trip_type(&self, trip_type: TripType, confirmed: bool) -> Self {
        let mut next = self.clone();
        next.trip_type = trip_type;
        next.trip_type_confirmed = confirmed;
        next
    }

    /// Returns a new state with one field's confidence recorded
    /// (last writer wins).
    pub fn with_confidence(&self, slot: Slot, confidence: f32) -> Self {
        let mut next = self.clone();
        next.field_confidence.insert(slot, confidence);
        next
    }

    /// Returns a new state with the phase changed.
    pub fn with_phase(&self, phase: DialogPhase) -> Self {
        let mut next = self.clone();
        next.phase = phase;
        next
    }

    /// Returns a new state with the pending question changed.
    pub fn with_pending_question(&self, slot: Option<Slot>) -> Self {
        let mut next = self.clone();
        next.pending_question = slot;
        next
    }

    /// Returns a new state with the clarification counter bumped.
    ///
    /// The counter is monotonically non-decreasing except on [`reset`].
    ///
    /// [`reset`]: DialogState::reset
    pub fn with_clarification_attempt(&self) -> Self {
        let mut next = self.clone();
        next.clarification_attempts = next.clarification_attempts.saturating_add(1);
        next
    }

    /// Returns a new state with the latest validation outcome recorded.
    ///
    /// `ready_for_api` must only ever be set through this method; the
    /// validator is the single component allowed to authorize a search.
    pub fn with_validation(&self, errors: Vec<String>, ready_for_api: bool) -> Self {
        let mut next = self.clone();
        next.validation_errors = errors;
        next.ready_for_api = ready_for_api;
        next
    }

    /// Returns a new state carrying the search outcome.
    pub fn with_search_results(&self, results: SearchResults) -> Self {
        let mut next = self.clone();
        next.search_cached = results.cached;
        next.search_results = Some(results);
        next
    }

    /// Returns a new state with this turn appended to the transcript.
    pub fn with_turn(&self, user: impl Into<String>, system: impl Into<String>) -> Self {
        let mut next = self.clone();
        next.conversation_history.push(TurnRecord {
            user: user.into(),
            system: system.into(),
            at: Utc::now(),
        });
        next
    }

    /// Returns a fresh state, keeping only the transcript.
    ///
    /// Used on explicit cancellation: captured fields, the counter, and any
    /// search results are dropped.
    pub fn reset(&self) -> Self {
        Self {
            conversation_history: self.conversation_history.clone(),
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_state_is_empty_and_collecting() {
        let state = DialogState::new();
        assert!(state.is_empty());
        assert_eq!(state.phase, DialogPhase::Collecting);
        assert!(!state.ready_for_api);
        assert_eq!(
            state.missing_fields(),
            vec![Slot::Origin, Slot::Destination, Slot::DepartureDate]
        );
    }

    #[test]
    fn with_updates_leave_the_original_untouched() {
        let state = DialogState::new();
        let updated = state
            .with_trip_type(TripType::OneWay, true)
            .with_clarification_attempt();

        assert_eq!(state.trip_type, TripType::Undecided);
        assert_eq!(state.clarification_attempts, 0);
        assert_eq!(updated.trip_type, TripType::OneWay);
        assert_eq!(updated.clarification_attempts, 1);
    }

    #[test]
    fn confidence_is_last_writer_wins() {
        let state = DialogState::new()
            .with_confidence(Slot::Origin, 0.8)
            .with_confidence(Slot::Origin, 0.98);
        assert_eq!(state.field_confidence.get(&Slot::Origin), Some(&0.98));
    }

    #[test]
    fn trip_type_is_not_a_decision_until_confirmed() {
        let state = DialogState::new().with_trip_type(TripType::RoundTrip, false);
        assert!(!state.has_trip_type_decision());
        assert!(state
            .with_trip_type(TripType::RoundTrip, true)
            .has_trip_type_decision());
    }

    #[test]
    fn validation_errors_are_replaced_not_appended() {
        let state = DialogState::new()
            .with_validation(vec!["first".into(), "second".into()], false)
            .with_validation(vec!["third".into()], false);
        assert_eq!(state.validation_errors, vec!["third".to_string()]);
    }

    #[test]
    fn reset_keeps_transcript_but_drops_fields() {
        let mut state = DialogState::new().with_turn("hi", "hello");
        state.origin = Some("NYC".into());
        state.clarification_attempts = 2;

        let fresh = state.reset();
        assert!(fresh.is_empty());
        assert_eq!(fresh.clarification_attempts, 0);
        assert_eq!(fresh.conversation_history.len(), 1);
    }

    #[test]
    fn state_round_trips_through_json() {
        let mut state = DialogState::new().with_confidence(Slot::DepartureDate, 0.7);
        state.origin = Some("NYC".into());
        state.departure_date = Some("2025-12-15".parse().unwrap());

        let json = serde_json::to_string(&state).unwrap();
        let back: DialogState = serde_json::from_str(&json).unwrap();
        assert_eq!(back, state);
    }
}
