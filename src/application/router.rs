//! Turn orchestration.
//!
//! `ConversationService` owns the full lifecycle of one utterance: load
//! state, screen for cancellation, extract, merge, ask or validate, search,
//! present, persist. Phases move only along the transitions the dialog state
//! machine allows.

use chrono::{FixedOffset, NaiveDate, Offset, Utc};
use std::sync::Arc;
use thiserror::Error;

use crate::application::executor::{ExecutorOutcome, SearchExecutor};
use crate::application::responder::Responder;
use crate::config::DialogConfig;
use crate::domain::dialog::{DialogPhase, DialogState, Slot, TripType};
use crate::domain::extract::Extractor;
use crate::domain::foundation::{SessionKey, StateMachine};
use crate::domain::present::Presenter;
use crate::domain::validate::Validator;
use crate::ports::{SessionStore, StoreError};

/// Failure handling one turn. Anything user-facing (bad input, provider
/// trouble) is a reply, not an error; only infrastructure surfaces here.
#[derive(Debug, Error)]
pub enum TurnError {
    #[error("session store failure: {0}")]
    Store(#[from] StoreError),
}

pub struct ConversationService {
    extractor: Extractor,
    executor: SearchExecutor,
    store: Arc<dyn SessionStore>,
    validator: Validator,
    responder: Responder,
    presenter: Presenter,
    clarification_cap: u8,
    correction_threshold: f32,
    timezone: FixedOffset,
    today_override: Option<NaiveDate>,
}

impl ConversationService {
    pub fn new(
        extractor: Extractor,
        executor: SearchExecutor,
        store: Arc<dyn SessionStore>,
        config: &DialogConfig,
    ) -> Self {
        let timezone = FixedOffset::east_opt(i32::from(config.timezone_offset_hours) * 3600)
            .unwrap_or_else(|| Utc.fix());
        Self {
            extractor,
            executor,
            store,
            validator: Validator::new(),
            responder: Responder::new(),
            presenter: Presenter::new(),
            clarification_cap: config.clarification_cap,
            correction_threshold: config.correction_threshold,
            timezone,
            today_override: None,
        }
    }

    /// Pins "today" to a fixed date. Used by tests to keep relative-date
    /// parsing and validation deterministic.
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today_override = Some(today);
        self
    }

    fn today(&self) -> NaiveDate {
        self.today_override
            .unwrap_or_else(|| Utc::now().with_timezone(&self.timezone).date_naive())
    }

    /// Handles one utterance end to end and returns the reply.
    pub async fn handle_turn(
        &self,
        key: &SessionKey,
        utterance: &str,
    ) -> Result<String, TurnError> {
        let mut state = self.store.get(key).await?.unwrap_or_default();
        let today = self.today();
        let text = utterance.trim();
        let lowered = normalize(text);
        tracing::info!(session = %key, phase = ?state.phase, "handling turn");

        // An ended conversation answers only a restart.
        if state.phase == DialogPhase::Done {
            if is_cancel(&lowered) {
                let fresh = state.reset();
                let reply = self.responder.greeting();
                return self.finish(key, fresh, text, reply).await;
            }
            let reply = self.responder.session_ended();
            return self.finish(key, state, text, reply).await;
        }

        // A finished presentation re-enters collection on the next utterance.
        if state.phase == DialogPhase::Presenting {
            state = self.advance(&state, DialogPhase::Collecting);
        }

        if is_cancel(&lowered) {
            let fresh = state.reset();
            let reply = self.responder.cancelled();
            return self.finish(key, fresh, text, reply).await;
        }

        let extraction = self.extractor.extract(text, &state, today).await;
        let mut progressed = !extraction.is_empty();
        let mut next = extraction.apply_to(&state, self.correction_threshold);

        // A bare yes/no answers the trip-type confirmation question.
        if !progressed
            && state.pending_question == Some(Slot::TripType)
            && state.trip_type.is_decided()
        {
            if is_affirmative(&lowered) {
                next = next.with_trip_type(state.trip_type, true);
                progressed = true;
            } else if is_negative(&lowered) {
                let flipped = match state.trip_type {
                    TripType::RoundTrip => TripType::OneWay,
                    _ => TripType::RoundTrip,
                };
                next = next.with_trip_type(flipped, true);
                if flipped == TripType::OneWay {
                    next.return_date = None;
                    next.field_confidence.remove(&Slot::ReturnDate);
                }
                progressed = true;
            }
        }

        // First contact with nothing extractable reads as a greeting. No
        // pending question is recorded, so a later bare city is not
        // mis-assigned to a slot nobody asked about.
        if state.is_empty() && !progressed {
            let reply = if is_greeting(&lowered) || state.conversation_history.is_empty() {
                self.responder.greeting()
            } else {
                self.responder.did_not_understand(&state)
            };
            let saved = next.with_pending_question(None);
            return self.finish(key, saved, text, reply).await;
        }

        // Collect required fields.
        if !next.has_required_fields() {
            if !progressed {
                let reply = self.responder.did_not_understand(&next);
                return self.clarify(key, next, text, reply).await;
            }
            let slot = next.missing_fields()[0];
            let reply = self.responder.ack_and_ask(&next, slot);
            let saved = next.with_pending_question(Some(slot));
            return self.finish(key, saved, text, reply).await;
        }

        // Required fields in; the trip-type decision comes next.
        if !next.has_trip_type_decision() {
            if !progressed {
                let reply = self.responder.did_not_understand(&next);
                return self.clarify(key, next, text, reply).await;
            }
            let reply = self.responder.confirm_trip_type(next.trip_type);
            let saved = next.with_pending_question(Some(Slot::TripType));
            return self.finish(key, saved, text, reply).await;
        }

        // A complete request only re-runs on new input or an explicit retry.
        if !progressed && !is_retry(&lowered) {
            if next.search_results.is_some() {
                let reply = self.responder.follow_up();
                return self.finish(key, next, text, reply).await;
            }
            let reply = self.responder.did_not_understand(&next);
            return self.clarify(key, next, text, reply).await;
        }

        // Validate.
        let validating = self.advance(&next, DialogPhase::Validating);
        let result = self.validator.validate_at(&validating, today);
        let validated = validating.with_validation(result.messages(), result.ready_for_api);

        if !result.ready_for_api {
            let reply = self.responder.validation_reply(&validated.validation_errors);
            if !progressed {
                return self.clarify(key, validated, text, reply).await;
            }
            let back = self.step_back(&validated);
            return self.finish(key, back, text, reply).await;
        }

        // Search.
        let searching = self.advance(&validated, DialogPhase::Searching);
        match self.executor.execute(&searching, Utc::now()).await {
            ExecutorOutcome::Results { request, results } => {
                let reply = self.presenter.render(&request, &results);
                let saved = self
                    .advance(&searching, DialogPhase::Presenting)
                    .with_search_results(results)
                    .with_pending_question(None);
                self.finish(key, saved, text, reply).await
            }
            ExecutorOutcome::NeedsClarification(message) => {
                if !progressed {
                    return self.clarify(key, searching, text, message).await;
                }
                let back = self.step_back(&searching);
                self.finish(key, back, text, message).await
            }
            ExecutorOutcome::ProviderFailure(err) => {
                // Provider trouble is never the user's fault; the attempt
                // counter stays untouched and the details stay saved.
                let reply = self.responder.provider_failure(&err);
                let back = self.step_back(&searching);
                self.finish(key, back, text, reply).await
            }
            ExecutorOutcome::GateViolation => {
                let reply = self.responder.internal_error();
                let back = self.step_back(&searching);
                self.finish(key, back, text, reply).await
            }
        }
    }

    /// Burns one clarification attempt; ends the conversation at the cap.
    async fn clarify(
        &self,
        key: &SessionKey,
        state: DialogState,
        text: &str,
        reply: String,
    ) -> Result<String, TurnError> {
        let bumped = state.with_clarification_attempt();
        if bumped.clarification_attempts >= self.clarification_cap {
            tracing::info!(session = %key, "clarification budget exhausted, ending conversation");
            let ended = self
                .advance(&self.advance(&bumped, DialogPhase::Clarifying), DialogPhase::Done);
            let reply = self.responder.giving_up();
            return self.finish(key, ended, text, reply).await;
        }
        let back = self.step_back(&bumped);
        self.finish(key, back, text, reply).await
    }

    /// Detours through `Clarifying` back to `Collecting`.
    fn step_back(&self, state: &DialogState) -> DialogState {
        let clarifying = self.advance(state, DialogPhase::Clarifying);
        self.advance(&clarifying, DialogPhase::Collecting)
    }

    fn advance(&self, state: &DialogState, to: DialogPhase) -> DialogState {
        match state.phase.transition_to(to) {
            Ok(phase) => state.with_phase(phase),
            Err(err) => {
                tracing::error!(error = %err, "illegal phase transition, keeping current phase");
                state.clone()
            }
        }
    }

    async fn finish(
        &self,
        key: &SessionKey,
        state: DialogState,
        user_text: &str,
        reply: String,
    ) -> Result<String, TurnError> {
        self.store
            .set(key, state.with_turn(user_text, reply.clone()))
            .await?;
        Ok(reply)
    }
}

fn normalize(text: &str) -> String {
    text.trim()
        .trim_end_matches(['.', '!', '?', ','])
        .to_lowercase()
}

fn is_cancel(lowered: &str) -> bool {
    matches!(
        lowered,
        "cancel"
            | "start over"
            | "never mind"
            | "nevermind"
            | "forget it"
            | "stop"
            | "reset"
            | "quit"
    )
}

fn is_greeting(lowered: &str) -> bool {
    matches!(
        lowered,
        "hi" | "hello"
            | "hey"
            | "yo"
            | "hi there"
            | "hello there"
            | "hey there"
            | "greetings"
            | "good morning"
            | "good afternoon"
            | "good evening"
    )
}

fn is_affirmative(lowered: &str) -> bool {
    matches!(
        lowered,
        "yes" | "yeah" | "yep" | "yup" | "correct" | "right" | "sure" | "that's right" | "exactly"
    )
}

fn is_negative(lowered: &str) -> bool {
    matches!(lowered, "no" | "nope" | "nah" | "wrong" | "incorrect")
}

fn is_retry(lowered: &str) -> bool {
    matches!(
        lowered,
        "search" | "search again" | "try again" | "retry" | "go ahead" | "please search"
    )
}
