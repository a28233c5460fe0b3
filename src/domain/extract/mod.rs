//! Information extraction: utterance in, field candidates out.
//!
//! Extraction is an ordered strategy chain, each pass returning "no match"
//! rather than failing: correction detection, then the deterministic pattern
//! pass, then the single-city context fallback, and only then the
//! probabilistic language-model pass. Results merge per field with the
//! higher-confidence candidate winning, so a deterministic match always
//! outranks a probabilistic one and a correction outranks both.

pub mod corrections;
pub mod dates;
mod llm;
mod patterns;

use chrono::NaiveDate;
use std::sync::Arc;

use crate::domain::dialog::{DialogState, Slot, TripType};
use crate::ports::LanguageModel;

/// Confidence tier for the deterministic pattern pass.
pub const CONFIDENCE_PATTERN: f32 = 0.95;
/// Confidence tier for correction overrides; always outranks extraction.
pub const CONFIDENCE_CORRECTION: f32 = 0.98;
/// Confidence tier for the language-model pass.
pub const CONFIDENCE_LLM: f32 = 0.80;
/// Lower tier for language-model dates, which are inherently more ambiguous.
pub const CONFIDENCE_LLM_DATE: f32 = 0.70;
/// Confidence for the single-city context fallback.
pub const CONFIDENCE_CONTEXT: f32 = 0.85;
/// Confidence for values the engine implied rather than the user stated.
pub const CONFIDENCE_IMPLIED: f32 = 0.50;

/// Where a candidate value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionSource {
    /// Correction/override detector; authorized to overwrite captured fields.
    Correction,
    /// Deterministic pattern pass.
    Pattern,
    /// Bare single-city reply matched against the pending question.
    ContextFallback,
    /// Probabilistic language-model pass.
    LanguageModel,
    /// Inferred by the engine (passenger default, trip type from return date).
    Implied,
}

/// One candidate value with its confidence and provenance.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate<T> {
    pub value: T,
    pub confidence: f32,
    pub source: ExtractionSource,
}

impl<T> Candidate<T> {
    pub fn new(value: T, confidence: f32, source: ExtractionSource) -> Self {
        Self {
            value,
            confidence,
            source,
        }
    }
}

/// The merged output of one extraction pass over a single utterance.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Extraction {
    pub origin: Option<Candidate<String>>,
    pub destination: Option<Candidate<String>>,
    pub departure_date: Option<Candidate<NaiveDate>>,
    pub return_date: Option<Candidate<NaiveDate>>,
    pub passengers: Option<Candidate<u8>>,
    pub trip_type: Option<Candidate<TripType>>,
    /// Set by a one-way flip: any previously captured return date is dropped.
    pub clear_return_date: bool,
}

impl Extraction {
    /// True when no pass produced anything.
    pub fn is_empty(&self) -> bool {
        self.origin.is_none()
            && self.destination.is_none()
            && self.departure_date.is_none()
            && self.return_date.is_none()
            && self.passengers.is_none()
            && self.trip_type.is_none()
            && !self.clear_return_date
    }

    /// Merges `other` in, keeping the higher-confidence candidate per field.
    pub fn merge(&mut self, other: Extraction) {
        fn keep<T>(mine: &mut Option<Candidate<T>>, theirs: Option<Candidate<T>>) {
            match (mine.as_ref(), theirs) {
                (_, None) => {}
                (None, Some(candidate)) => *mine = Some(candidate),
                (Some(current), Some(candidate)) if candidate.confidence > current.confidence => {
                    *mine = Some(candidate)
                }
                _ => {}
            }
        }
        keep(&mut self.origin, other.origin);
        keep(&mut self.destination, other.destination);
        keep(&mut self.departure_date, other.departure_date);
        keep(&mut self.return_date, other.return_date);
        keep(&mut self.passengers, other.passengers);
        keep(&mut self.trip_type, other.trip_type);
        self.clear_return_date |= other.clear_return_date;
    }

    /// Applies this extraction to a dialog state, returning the new state.
    ///
    /// A captured field is never silently discarded: only a correction with
    /// confidence at or above `correction_threshold` may overwrite one.
    /// Ordinary extraction fills empty slots only.
    pub fn apply_to(&self, state: &DialogState, correction_threshold: f32) -> DialogState {
        let mut next = state.clone();

        if self.clear_return_date && next.return_date.is_some() {
            tracing::debug!("one-way flip clears captured return date");
            next.return_date = None;
            next.field_confidence.remove(&Slot::ReturnDate);
        }

        if let Some(candidate) = &self.origin {
            if allow_write(next.origin.is_some(), candidate, correction_threshold) {
                next.origin = Some(candidate.value.clone());
                next.field_confidence.insert(Slot::Origin, candidate.confidence);
            }
        }
        if let Some(candidate) = &self.destination {
            if allow_write(next.destination.is_some(), candidate, correction_threshold) {
                next.destination = Some(candidate.value.clone());
                next.field_confidence
                    .insert(Slot::Destination, candidate.confidence);
            }
        }
        if let Some(candidate) = &self.departure_date {
            if allow_write(next.departure_date.is_some(), candidate, correction_threshold) {
                next.departure_date = Some(candidate.value);
                next.field_confidence
                    .insert(Slot::DepartureDate, candidate.confidence);
            }
        }
        if let Some(candidate) = &self.return_date {
            if allow_write(next.return_date.is_some(), candidate, correction_threshold) {
                next.return_date = Some(candidate.value);
                next.field_confidence
                    .insert(Slot::ReturnDate, candidate.confidence);
            }
        }
        if let Some(candidate) = &self.passengers {
            if allow_write(next.passengers.is_some(), candidate, correction_threshold) {
                next.passengers = Some(candidate.value);
                next.field_confidence
                    .insert(Slot::Passengers, candidate.confidence);
            }
        }

        if let Some(candidate) = &self.trip_type {
            let occupied = next.trip_type.is_decided();
            if allow_write(occupied, candidate, correction_threshold) {
                next.trip_type = candidate.value;
                // An explicit statement confirms; an implied one does not.
                next.trip_type_confirmed = candidate.source != ExtractionSource::Implied;
                next.field_confidence
                    .insert(Slot::TripType, candidate.confidence);
            }
        } else if self.return_date.is_some() && !next.trip_type.is_decided() {
            // A return date implies a round trip, pending confirmation.
            next.trip_type = TripType::RoundTrip;
            next.trip_type_confirmed = false;
            next.field_confidence
                .insert(Slot::TripType, CONFIDENCE_IMPLIED);
        }

        // Passengers default to 1 when a trip is taking shape but the user
        // never said how many are flying.
        if next.passengers.is_none() && !next.is_empty() && !self.is_empty() {
            next.passengers = Some(1);
            next.field_confidence
                .insert(Slot::Passengers, CONFIDENCE_IMPLIED);
        }

        next
    }
}

/// Merge rule: empty slots always accept; occupied slots only yield to a
/// sufficiently confident correction.
fn allow_write<T>(occupied: bool, candidate: &Candidate<T>, correction_threshold: f32) -> bool {
    if !occupied {
        return true;
    }
    if candidate.source == ExtractionSource::Correction
        && candidate.confidence >= correction_threshold
    {
        return true;
    }
    tracing::debug!(
        confidence = candidate.confidence,
        "discarding candidate for an already-captured field"
    );
    false
}

/// Words that must never be accepted as a location by the context fallback.
const FILLER_BLOCKLIST: &[&str] = &[
    "thanks", "thank", "ok", "okay", "yes", "yeah", "yep", "no", "nope", "hi", "hello", "hey",
    "please", "sure", "cool", "great", "bye", "goodbye", "hmm", "lol", "fine", "right", "maybe",
    "what", "why", "when", "how", "sorry", "perfect", "nice", "good", "alright",
];

/// The multi-pass extractor.
///
/// Holds an optional language-model handle; without one, only the
/// deterministic passes run.
#[derive(Clone)]
pub struct Extractor {
    model: Option<Arc<dyn LanguageModel>>,
}

impl Extractor {
    pub fn new(model: Option<Arc<dyn LanguageModel>>) -> Self {
        Self { model }
    }

    /// Runs the extraction chain over one utterance.
    ///
    /// Never fails: a pass that cannot read the utterance contributes
    /// nothing, and a language-model error degrades to "nothing extracted".
    pub async fn extract(
        &self,
        utterance: &str,
        state: &DialogState,
        today: NaiveDate,
    ) -> Extraction {
        // Corrections are evaluated first and win every merge.
        let mut result = if state.is_empty() {
            Extraction::default()
        } else {
            corrections::detect(utterance, state, today)
        };

        let structured = patterns::parse(utterance, today);
        let structured_matched = structured.is_some();
        if let Some(extraction) = structured {
            result.merge(extraction);
        }

        if !structured_matched {
            if let Some(extraction) = self.context_fallback(utterance, state) {
                result.merge(extraction);
            } else if let Some(model) = &self.model {
                let extraction =
                    llm::extract(model.as_ref(), utterance, state.last_system_reply(), today).await;
                result.merge(extraction);
            }
        }

        result
    }

    /// Maps a bare one-or-two-word reply onto the slot the system just asked
    /// for, and nothing else.
    fn context_fallback(&self, utterance: &str, state: &DialogState) -> Option<Extraction> {
        let slot = match state.pending_question {
            Some(Slot::Origin) if state.origin.is_none() => Slot::Origin,
            Some(Slot::Destination) if state.destination.is_none() => Slot::Destination,
            _ => return None,
        };

        let cleaned = utterance
            .trim()
            .trim_end_matches(['.', '!', '?', ','])
            .trim();
        let words: Vec<&str> = cleaned.split_whitespace().collect();
        if words.is_empty() || words.len() > 2 {
            return None;
        }
        if !words
            .iter()
            .all(|w| w.chars().all(|c| c.is_alphabetic() || c == '-'))
        {
            return None;
        }
        let lowered = cleaned.to_lowercase();
        if FILLER_BLOCKLIST.contains(&lowered.as_str())
            || FILLER_BLOCKLIST.contains(&words[0].to_lowercase().as_str())
        {
            return None;
        }

        let candidate = Candidate::new(
            cleaned.to_uppercase(),
            CONFIDENCE_CONTEXT,
            ExtractionSource::ContextFallback,
        );
        let mut extraction = Extraction::default();
        match slot {
            Slot::Origin => extraction.origin = Some(candidate),
            Slot::Destination => extraction.destination = Some(candidate),
            _ => unreachable!("fallback only targets location slots"),
        }
        Some(extraction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::dialog::DialogPhase;

    fn today() -> NaiveDate {
        "2025-06-02".parse().unwrap()
    }

    fn extractor() -> Extractor {
        Extractor::new(None)
    }

    fn state_with_pending(slot: Slot) -> DialogState {
        DialogState::new().with_pending_question(Some(slot))
    }

    #[tokio::test]
    async fn structured_utterance_extracts_all_fields() {
        let extraction = extractor()
            .extract(
                "NYC to London on 2025-12-15, 2 adults",
                &DialogState::new(),
                today(),
            )
            .await;

        assert_eq!(extraction.origin.as_ref().unwrap().value, "NYC");
        assert_eq!(extraction.destination.as_ref().unwrap().value, "LONDON");
        assert_eq!(
            extraction.departure_date.as_ref().unwrap().value,
            "2025-12-15".parse::<NaiveDate>().unwrap()
        );
        assert_eq!(extraction.passengers.as_ref().unwrap().value, 2);
        assert_eq!(
            extraction.origin.as_ref().unwrap().confidence,
            CONFIDENCE_PATTERN
        );
    }

    #[tokio::test]
    async fn bare_city_fills_the_pending_slot() {
        let state = state_with_pending(Slot::Origin);
        let extraction = extractor().extract("Paris", &state, today()).await;
        let origin = extraction.origin.expect("origin candidate");
        assert_eq!(origin.value, "PARIS");
        assert_eq!(origin.source, ExtractionSource::ContextFallback);
    }

    #[tokio::test]
    async fn bare_city_without_pending_question_is_ignored() {
        let extraction = extractor()
            .extract("Paris", &DialogState::new(), today())
            .await;
        assert!(extraction.is_empty());
    }

    #[tokio::test]
    async fn filler_words_are_never_locations() {
        for word in ["thanks", "ok", "yes", "hello", "thank you"] {
            let state = state_with_pending(Slot::Destination);
            let extraction = extractor().extract(word, &state, today()).await;
            assert!(extraction.is_empty(), "{word:?} must not become a city");
        }
    }

    #[tokio::test]
    async fn fallback_skips_slots_that_are_already_set() {
        let mut state = state_with_pending(Slot::Origin);
        state.origin = Some("NYC".into());
        let extraction = extractor().extract("Paris", &state, today()).await;
        assert!(extraction.is_empty());
    }

    #[test]
    fn merge_prefers_the_higher_confidence_candidate() {
        let mut low = Extraction {
            origin: Some(Candidate::new(
                "BOSTON".into(),
                CONFIDENCE_LLM,
                ExtractionSource::LanguageModel,
            )),
            ..Default::default()
        };
        let high = Extraction {
            origin: Some(Candidate::new(
                "NYC".into(),
                CONFIDENCE_PATTERN,
                ExtractionSource::Pattern,
            )),
            ..Default::default()
        };
        low.merge(high);
        assert_eq!(low.origin.unwrap().value, "NYC");
    }

    #[test]
    fn apply_never_overwrites_without_a_correction() {
        let mut state = DialogState::new();
        state.destination = Some("LONDON".into());

        let extraction = Extraction {
            destination: Some(Candidate::new(
                "PARIS".into(),
                CONFIDENCE_PATTERN,
                ExtractionSource::Pattern,
            )),
            ..Default::default()
        };
        let next = extraction.apply_to(&state, 0.9);
        assert_eq!(next.destination.as_deref(), Some("LONDON"));

        let correction = Extraction {
            destination: Some(Candidate::new(
                "PARIS".into(),
                CONFIDENCE_CORRECTION,
                ExtractionSource::Correction,
            )),
            ..Default::default()
        };
        let next = correction.apply_to(&state, 0.9);
        assert_eq!(next.destination.as_deref(), Some("PARIS"));
    }

    #[test]
    fn return_date_implies_unconfirmed_round_trip() {
        let extraction = Extraction {
            return_date: Some(Candidate::new(
                "2025-12-22".parse().unwrap(),
                CONFIDENCE_PATTERN,
                ExtractionSource::Pattern,
            )),
            ..Default::default()
        };
        let next = extraction.apply_to(&DialogState::new(), 0.9);
        assert_eq!(next.trip_type, TripType::RoundTrip);
        assert!(!next.trip_type_confirmed);
    }

    #[test]
    fn passengers_default_to_one_when_implied() {
        let extraction = Extraction {
            origin: Some(Candidate::new(
                "NYC".into(),
                CONFIDENCE_PATTERN,
                ExtractionSource::Pattern,
            )),
            ..Default::default()
        };
        let next = extraction.apply_to(&DialogState::new(), 0.9);
        assert_eq!(next.passengers, Some(1));
        assert_eq!(
            next.field_confidence.get(&Slot::Passengers),
            Some(&CONFIDENCE_IMPLIED)
        );
    }

    #[test]
    fn empty_extraction_leaves_state_unchanged() {
        let state = DialogState::new().with_phase(DialogPhase::Collecting);
        let next = Extraction::default().apply_to(&state, 0.9);
        assert_eq!(next, state);
    }
}
