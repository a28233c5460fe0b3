//! Traveler-facing reply text.
//!
//! All canned wording lives here so the router stays about flow, not
//! phrasing.

use crate::domain::dialog::{DialogState, Slot, TripType};
use crate::domain::present::Presenter;
use crate::domain::search::ProviderError;

#[derive(Debug, Clone, Copy, Default)]
pub struct Responder {
    presenter: Presenter,
}

impl Responder {
    pub fn new() -> Self {
        Self {
            presenter: Presenter::new(),
        }
    }

    /// Opening line. Deliberately names no field, so no pending question is
    /// recorded and a bare city in reply is not mis-assigned.
    pub fn greeting(&self) -> String {
        "Hi! I can help you find flights. Tell me about the trip you have in mind.".to_string()
    }

    /// Question for one missing slot.
    pub fn question_for(&self, slot: Slot) -> String {
        match slot {
            Slot::Origin => "Which city are you flying from?".to_string(),
            Slot::Destination => "Where would you like to fly to?".to_string(),
            Slot::DepartureDate => "What date would you like to depart?".to_string(),
            Slot::ReturnDate => "What date would you like to return?".to_string(),
            Slot::Passengers => "How many passengers are traveling?".to_string(),
            Slot::TripType => "Is this one way, or a round trip?".to_string(),
        }
    }

    /// Acknowledges captured fields, then asks for the next one.
    pub fn ack_and_ask(&self, state: &DialogState, slot: Slot) -> String {
        format!(
            "Got it — {}. {}",
            self.presenter.trip_summary(state),
            self.question_for(slot)
        )
    }

    /// Asks the user to confirm an implied trip type.
    pub fn confirm_trip_type(&self, trip_type: TripType) -> String {
        match trip_type {
            TripType::RoundTrip => {
                "Just to confirm: this is a round trip, right?".to_string()
            }
            TripType::OneWay => "Just to confirm: this is one way, right?".to_string(),
            TripType::Undecided => self.question_for(Slot::TripType),
        }
    }

    /// Reports the most critical validation problem. Errors arrive in
    /// priority order, and fixing them one at a time keeps each reply a
    /// single question the user can actually answer.
    pub fn validation_reply(&self, errors: &[String]) -> String {
        match errors.first() {
            Some(error) => format!("One thing before I can search: {error}."),
            None => self.internal_error(),
        }
    }

    /// Apology for a provider failure, by category.
    pub fn provider_failure(&self, err: &ProviderError) -> String {
        match err {
            ProviderError::Timeout => {
                "The flight search is taking too long right now. Your trip details are saved — \
                 just say \"search\" in a moment and I'll try again."
                    .to_string()
            }
            ProviderError::RateLimited => {
                "The flight search is very busy right now. Your trip details are saved — \
                 please try again in a minute."
                    .to_string()
            }
            ProviderError::InvalidLocation(code) => format!(
                "The search provider didn't accept \"{code}\" as a location. \
                 Could you try a different city or airport?"
            ),
            _ => "Something went wrong searching for flights. Your trip details are saved — \
                  please try again."
                .to_string(),
        }
    }

    /// Generic apology for an internal routing fault.
    pub fn internal_error(&self) -> String {
        "Sorry, something went wrong on my side. Could you repeat that?".to_string()
    }

    /// Reply when the user cancels mid-conversation.
    pub fn cancelled(&self) -> String {
        "No problem, I've cleared that trip. Tell me whenever you'd like to plan another one."
            .to_string()
    }

    /// Final message when the clarification budget runs out.
    pub fn giving_up(&self) -> String {
        "I'm having trouble understanding what you need, so I'll stop here. \
         Say \"start over\" any time to plan a new trip."
            .to_string()
    }

    /// Reply to anything said after the conversation has ended.
    pub fn session_ended(&self) -> String {
        "This conversation has ended. Say \"start over\" to plan a new trip.".to_string()
    }

    /// Reply after results were already shown and nothing new came in.
    pub fn follow_up(&self) -> String {
        "Happy to adjust that search — tell me a new date, destination, or passenger count \
         and I'll look again."
            .to_string()
    }

    /// Nudge when an utterance produced nothing usable.
    pub fn did_not_understand(&self, state: &DialogState) -> String {
        match state.pending_question {
            Some(slot) => format!(
                "Sorry, I didn't catch that. {}",
                self.question_for(slot)
            ),
            None => "Sorry, I didn't catch that. Could you tell me the route and date you have in mind?"
                .to_string(),
        }
    }
}
