//! The validation gate.
//!
//! The validator is the only component allowed to authorize a search: it
//! alone decides `ready_for_api`, and the executor refuses any request that
//! did not pass through here. Every rule is evaluated independently, and the
//! violations come back in a fixed priority order so the presentation layer
//! can surface the most critical problem first.

use chrono::NaiveDate;
use thiserror::Error;

use crate::domain::dialog::{DialogState, Slot, TripType};

/// Furthest bookable departure, in days from today.
pub const MAX_ADVANCE_DAYS: i64 = 730;
/// Longest allowed stay between departure and return, in days.
pub const MAX_TRIP_DAYS: i64 = 365;
/// Most passengers a single request may carry.
pub const MAX_PASSENGERS: u8 = 9;

/// One violated business rule.
///
/// Messages are written for the traveler, not the log.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuleViolation {
    #[error("the departure date has already passed")]
    DepartureInPast,
    #[error("the departure date is more than {MAX_ADVANCE_DAYS} days away, which is further ahead than flights can be booked")]
    DepartureTooFarAhead,
    #[error("the return date must be after the departure date")]
    ReturnNotAfterDeparture,
    #[error("the trip is longer than {MAX_TRIP_DAYS} days, which is the longest stay that can be booked")]
    TripTooLong,
    #[error("the origin and destination are the same place")]
    SameOriginDestination,
    #[error("whether this is a one-way or round trip still needs confirming")]
    TripTypeUnconfirmed,
    #[error("a round trip needs a return date")]
    RoundTripMissingReturn,
    #[error("a one-way trip cannot have a return date")]
    OneWayWithReturn,
    #[error("passenger count between 1 and {MAX_PASSENGERS} is required")]
    PassengersOutOfRange,
}

/// Outcome of one validation pass.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationResult {
    /// Required slots still missing, in the order they are asked for.
    pub missing_required: Vec<Slot>,
    /// Rule violations, in fixed priority order.
    pub violations: Vec<RuleViolation>,
    /// The sole authorization for a provider call.
    pub ready_for_api: bool,
}

impl ValidationResult {
    /// True when nothing is missing and no rule is violated.
    pub fn is_valid(&self) -> bool {
        self.missing_required.is_empty() && self.violations.is_empty()
    }

    /// Violations rendered as traveler-facing messages.
    pub fn messages(&self) -> Vec<String> {
        self.violations.iter().map(|v| v.to_string()).collect()
    }
}

/// Stateless rule evaluator.
#[derive(Debug, Clone, Copy, Default)]
pub struct Validator;

impl Validator {
    pub fn new() -> Self {
        Self
    }

    /// Validates a state against today's date.
    ///
    /// Every rule runs regardless of whether an earlier one fired, so the
    /// result lists everything wrong at once. `ready_for_api` is granted only
    /// when all required slots are present, the trip type is confirmed, and
    /// no rule is violated.
    pub fn validate_at(&self, state: &DialogState, today: NaiveDate) -> ValidationResult {
        let missing_required = state.missing_fields();
        let mut violations = Vec::new();

        if let Some(departure) = state.departure_date {
            if departure < today {
                violations.push(RuleViolation::DepartureInPast);
            }
            if (departure - today).num_days() > MAX_ADVANCE_DAYS {
                violations.push(RuleViolation::DepartureTooFarAhead);
            }
        }

        if let (Some(departure), Some(ret)) = (state.departure_date, state.return_date) {
            if ret <= departure {
                violations.push(RuleViolation::ReturnNotAfterDeparture);
            }
            if (ret - departure).num_days() > MAX_TRIP_DAYS {
                violations.push(RuleViolation::TripTooLong);
            }
        }

        if let (Some(origin), Some(destination)) = (&state.origin, &state.destination) {
            if origin.eq_ignore_ascii_case(destination) {
                violations.push(RuleViolation::SameOriginDestination);
            }
        }

        // Structural return-date problems outrank the confirmation nag.
        match state.trip_type {
            TripType::RoundTrip if state.return_date.is_none() => {
                violations.push(RuleViolation::RoundTripMissingReturn);
            }
            TripType::OneWay if state.return_date.is_some() => {
                violations.push(RuleViolation::OneWayWithReturn);
            }
            _ => {}
        }
        if state.trip_type.is_decided() && !state.trip_type_confirmed {
            violations.push(RuleViolation::TripTypeUnconfirmed);
        }

        match state.passengers {
            Some(n) if (1..=MAX_PASSENGERS).contains(&n) => {}
            _ => violations.push(RuleViolation::PassengersOutOfRange),
        }

        let ready_for_api = missing_required.is_empty()
            && violations.is_empty()
            && state.has_trip_type_decision();
        if !ready_for_api && state.trip_type.is_decided() {
            tracing::debug!(
                missing = missing_required.len(),
                violations = violations.len(),
                "validation withheld search authorization"
            );
        }

        ValidationResult {
            missing_required,
            violations,
            ready_for_api,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn today() -> NaiveDate {
        "2025-06-02".parse().unwrap()
    }

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn complete_one_way() -> DialogState {
        let mut state = DialogState::new();
        state.origin = Some("NYC".into());
        state.destination = Some("LONDON".into());
        state.departure_date = Some(date("2025-12-15"));
        state.passengers = Some(2);
        state.trip_type = TripType::OneWay;
        state.trip_type_confirmed = true;
        state
    }

    #[test]
    fn complete_confirmed_request_is_authorized() {
        let result = Validator::new().validate_at(&complete_one_way(), today());
        assert!(result.is_valid());
        assert!(result.ready_for_api);
    }

    #[test]
    fn missing_fields_block_authorization_without_violations() {
        let mut state = complete_one_way();
        state.destination = None;
        let result = Validator::new().validate_at(&state, today());
        assert_eq!(result.missing_required, vec![Slot::Destination]);
        assert!(result.violations.is_empty());
        assert!(!result.ready_for_api);
    }

    #[test]
    fn all_violations_are_reported_at_once() {
        let mut state = complete_one_way();
        state.destination = Some("nyc".into());
        state.departure_date = Some(date("2024-01-01"));
        state.passengers = Some(0);
        let result = Validator::new().validate_at(&state, today());
        assert_eq!(
            result.violations,
            vec![
                RuleViolation::DepartureInPast,
                RuleViolation::SameOriginDestination,
                RuleViolation::PassengersOutOfRange,
            ]
        );
    }

    #[test]
    fn missing_return_outranks_the_unconfirmed_trip_type() {
        let mut state = complete_one_way();
        state.trip_type = TripType::RoundTrip;
        state.trip_type_confirmed = false;
        let result = Validator::new().validate_at(&state, today());
        assert_eq!(
            result.violations,
            vec![
                RuleViolation::RoundTripMissingReturn,
                RuleViolation::TripTypeUnconfirmed,
            ]
        );
    }

    #[test]
    fn unconfirmed_trip_type_withholds_authorization() {
        let mut state = complete_one_way();
        state.trip_type_confirmed = false;
        let result = Validator::new().validate_at(&state, today());
        assert!(result
            .violations
            .contains(&RuleViolation::TripTypeUnconfirmed));
        assert!(!result.ready_for_api);
    }

    #[test]
    fn undecided_trip_type_is_not_a_violation_but_still_blocks() {
        let mut state = complete_one_way();
        state.trip_type = TripType::Undecided;
        state.trip_type_confirmed = false;
        let result = Validator::new().validate_at(&state, today());
        assert!(result.violations.is_empty());
        assert!(!result.ready_for_api);
    }

    #[test]
    fn round_trip_needs_a_return_and_one_way_forbids_one() {
        let mut round = complete_one_way();
        round.trip_type = TripType::RoundTrip;
        let result = Validator::new().validate_at(&round, today());
        assert!(result
            .violations
            .contains(&RuleViolation::RoundTripMissingReturn));

        let mut one_way = complete_one_way();
        one_way.return_date = Some(date("2025-12-22"));
        let result = Validator::new().validate_at(&one_way, today());
        assert!(result.violations.contains(&RuleViolation::OneWayWithReturn));
    }

    #[test]
    fn horizon_rules() {
        let mut state = complete_one_way();
        state.departure_date = Some(today() + chrono::Duration::days(MAX_ADVANCE_DAYS + 1));
        let result = Validator::new().validate_at(&state, today());
        assert!(result
            .violations
            .contains(&RuleViolation::DepartureTooFarAhead));

        let mut state = complete_one_way();
        state.trip_type = TripType::RoundTrip;
        state.return_date = Some(date("2025-12-15") + chrono::Duration::days(MAX_TRIP_DAYS + 1));
        let result = Validator::new().validate_at(&state, today());
        assert!(result.violations.contains(&RuleViolation::TripTooLong));
    }

    proptest! {
        #[test]
        fn return_on_or_before_departure_is_always_rejected(offset in 0i64..400) {
            let mut state = complete_one_way();
            state.trip_type = TripType::RoundTrip;
            let departure = date("2025-12-15");
            state.return_date = Some(departure - chrono::Duration::days(offset));

            let result = Validator::new().validate_at(&state, today());
            prop_assert!(result
                .violations
                .contains(&RuleViolation::ReturnNotAfterDeparture));
            prop_assert!(!result.ready_for_api);
        }

        #[test]
        fn authorization_implies_every_precondition(pax in 0u8..=12) {
            let mut state = complete_one_way();
            state.passengers = Some(pax);
            let result = Validator::new().validate_at(&state, today());
            if result.ready_for_api {
                prop_assert!(state.has_required_fields());
                prop_assert!(state.has_trip_type_decision());
                prop_assert!(result.violations.is_empty());
                prop_assert!((1..=MAX_PASSENGERS).contains(&pax));
            }
        }
    }
}
