//! Correction and override detection.
//!
//! Once a conversation has captured anything, every utterance is first
//! screened for "actually, ..." style overrides. A correction is the only
//! extraction source authorized to overwrite an already-captured field, so
//! its candidates carry the highest confidence tier.

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::domain::dialog::{DialogState, TripType};

use super::dates::parse_natural_date;
use super::patterns::{clean_city, parse_count, trip_type_keyword};
use super::{Candidate, Extraction, ExtractionSource, CONFIDENCE_CORRECTION};

const CITY: &str = r"[a-z][a-z\s.'-]*?";
const DATE_PHRASE: &str = r"[a-z0-9][a-z0-9 ,/-]*?";
const TAIL: &str = r"(?:\s*,|[.!?]|$)";

static CHANGE_DATE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"\b(?:change|move|make)\s+(?:the\s+)?(?:departure\s+)?date\s+to\s+(?:the\s+)?(?P<date>{DATE_PHRASE}){TAIL}"
    ))
    .expect("change-date regex")
});

static DATE_INSTEAD: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"\b(?:on\s+)?(?:the\s+)?(?P<date>{DATE_PHRASE})\s+instead\b"
    ))
    .expect("date-instead regex")
});

static CHANGE_ORIGIN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"\b(?:change|make)\s+(?:the\s+)?(?:origin|departure\s+city)\s+to\s+(?P<city>{CITY}){TAIL}"
    ))
    .expect("change-origin regex")
});

static FROM_INSTEAD: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"\bfrom\s+(?P<city>{CITY})\s+instead\b")).expect("from-instead regex")
});

static CHANGE_DEST: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"\b(?:change|make)\s+(?:the\s+)?destination\s+to\s+(?P<city>{CITY}){TAIL}"
    ))
    .expect("change-destination regex")
});

static TO_INSTEAD: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"\bto\s+(?P<city>{CITY})\s+instead\b")).expect("to-instead regex")
});

static CHANGE_PASSENGERS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"\b(?:make\s+(?:it|that)|change\s+(?:it|that)\s+to)\s+(?P<count>\d{1,2}|one|two|three|four|five|six|seven|eight|nine)\s+(?:adults?|passengers?|people|persons?|travell?ers?)\b",
    )
    .expect("change-passengers regex")
});

static PASSENGERS_OF_US: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(?P<count>\d{1,2}|one|two|three|four|five|six|seven|eight|nine)\s+of\s+us\b")
        .expect("of-us regex")
});

static ADD_RETURN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"\b(?:add\s+a\s+return|returning|coming\s+back|come\s+back|return)\s+(?:on\s+)?(?:the\s+)?(?P<date>{DATE_PHRASE}){TAIL}"
    ))
    .expect("add-return regex")
});

static LEADING_CUE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(?:actually|no|nope|wait|sorry|oops|hold\s+on|scratch\s+that|i\s+meant?|correction)[,!.\s]*",
    )
    .expect("leading-cue regex")
});

/// Screens one utterance for overrides against what is already captured.
///
/// Only meaningful when the state is non-empty; on a fresh conversation there
/// is nothing to correct and the caller skips this pass.
pub fn detect(utterance: &str, state: &DialogState, today: NaiveDate) -> Extraction {
    let text = utterance.trim().to_lowercase();
    let mut extraction = Extraction::default();
    if text.is_empty() {
        return extraction;
    }

    if let Some(caps) = CHANGE_ORIGIN.captures(&text) {
        if let Some(city) = clean_city(&caps["city"]) {
            extraction.origin = Some(correction(city));
        }
    }
    if let Some(caps) = CHANGE_DEST.captures(&text) {
        if let Some(city) = clean_city(&caps["city"]) {
            extraction.destination = Some(correction(city));
        }
    }
    if extraction.origin.is_none() {
        if let Some(caps) = FROM_INSTEAD.captures(&text) {
            if let Some(city) = clean_city(&caps["city"]) {
                extraction.origin = Some(correction(city));
            }
        }
    }
    // Generic "to X instead" means the destination, but not when the origin
    // form already consumed the phrase ("from X instead").
    if extraction.destination.is_none() && extraction.origin.is_none() {
        if let Some(caps) = TO_INSTEAD.captures(&text) {
            if let Some(city) = clean_city(&caps["city"]) {
                extraction.destination = Some(correction(city));
            }
        }
    }

    if let Some(caps) = CHANGE_DATE.captures(&text) {
        if let Some(date) = parse_natural_date(&caps["date"], today) {
            extraction.departure_date = Some(correction(date));
        }
    }

    if let Some(caps) = ADD_RETURN.captures(&text) {
        if let Some(date) = parse_natural_date(&caps["date"], today) {
            extraction.return_date = Some(correction(date));
        }
    }

    if extraction.departure_date.is_none() && extraction.return_date.is_none() {
        if let Some(caps) = DATE_INSTEAD.captures(&text) {
            if let Some(date) = parse_natural_date(&caps["date"], today) {
                extraction.departure_date = Some(correction(date));
            }
        }
    }

    // "no, on the 26th" style: the whole (cue-stripped) utterance is a date
    // phrase, and a departure date is already on file to be fixed.
    if extraction.departure_date.is_none()
        && extraction.return_date.is_none()
        && state.departure_date.is_some()
    {
        let stripped = LEADING_CUE.replace(&text, "");
        let stripped = stripped.trim();
        if stripped.len() < text.len() {
            if let Some(date) = parse_natural_date(stripped, today) {
                extraction.departure_date = Some(correction(date));
            }
        }
    }

    if let Some(caps) = CHANGE_PASSENGERS.captures(&text) {
        if let Some(count) = parse_count(&caps["count"]) {
            extraction.passengers = Some(correction(count));
        }
    }
    if extraction.passengers.is_none() {
        if let Some(caps) = PASSENGERS_OF_US.captures(&text) {
            if let Some(count) = parse_count(&caps["count"]) {
                extraction.passengers = Some(correction(count));
            }
        }
    }

    if let Some(trip_type) = trip_type_keyword(&text) {
        extraction.trip_type = Some(correction(trip_type));
        if trip_type == TripType::OneWay {
            // Flipping to one-way invalidates any captured return date.
            extraction.clear_return_date = true;
        }
    }

    if !extraction.is_empty() {
        tracing::debug!("utterance recognized as a correction");
    }
    extraction
}

fn correction<T>(value: T) -> Candidate<T> {
    Candidate::new(value, CONFIDENCE_CORRECTION, ExtractionSource::Correction)
}
