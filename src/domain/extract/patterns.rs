//! Deterministic fast-path extraction.
//!
//! A small regex table covers the structured phrasings users actually type
//! ("NYC to London on 2025-12-15, 2 adults", "fly from Boston to Paris next
//! friday"). Anything this pass captures carries pattern-tier confidence and
//! skips the language model entirely.

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::domain::dialog::TripType;

use super::dates::parse_natural_date;
use super::{Candidate, Extraction, ExtractionSource, CONFIDENCE_PATTERN};

const CITY: &str = r"[a-z][a-z\s.'-]*?";
const DATE_PHRASE: &str = r"[a-z0-9][a-z0-9 ,/-]*?";

static ROUTE_FROM: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"\bfrom\s+(?P<origin>{CITY})\s+to\s+(?P<dest>{CITY})(?:\s+(?:on|for|departing|leaving|next|this|tomorrow|today)\b|[,.!?]|$)"
    ))
    .expect("route-from regex")
});

static ROUTE_BARE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"^(?P<origin>{CITY})\s+to\s+(?P<dest>{CITY})(?:\s+on\b|[,.!?]|$)"
    ))
    .expect("bare-route regex")
});

static ROUTE_ARROW: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"(?P<origin>{CITY})\s*(?:->|→)\s*(?P<dest>{CITY})(?:\s+on\b|[,.!?]|$)"
    ))
    .expect("arrow-route regex")
});

static DEST_ONLY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"\b(?:fly(?:ing)?|go(?:ing)?|travel(?:ing|ling)?|trip|ticket)\s+to\s+(?P<dest>{CITY})(?:\s+(?:on|for|next|this|tomorrow|today)\b|[,.!?]|$)"
    ))
    .expect("destination-only regex")
});

static ORIGIN_ONLY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"\b(?:fly(?:ing)?|leav(?:e|ing)|depart(?:ing)?)\s+from\s+(?P<origin>{CITY})(?:\s+(?:on|next|this|tomorrow|today)\b|[,.!?]|$)"
    ))
    .expect("origin-only regex")
});

static DEPARTURE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"\b(?:on|departing|leaving)\s+(?P<date>{DATE_PHRASE})(?:\s*,|\s+(?:returning|coming|return|with|for)\b|[.!?]|$)"
    ))
    .expect("departure-date regex")
});

static RETURN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"\b(?:returning|coming\s+back|return)\s+(?:on\s+)?(?:the\s+)?(?P<date>{DATE_PHRASE})(?:\s*,|\s+(?:with|for)\b|[.!?]|$)"
    ))
    .expect("return-date regex")
});

static PASSENGERS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"\b(?P<count>\d{1,2}|one|two|three|four|five|six|seven|eight|nine)\s+(?:adults?|passengers?|people|persons?|travell?ers?|pax)\b",
    )
    .expect("passenger regex")
});

/// Words that disqualify a capture from being a city name. The lazy city
/// captures can swallow surrounding verbs; this keeps them out.
const CITY_STOPWORDS: &[&str] = &[
    "i", "a", "an", "the", "to", "from", "on", "for", "me", "my", "we", "want", "like", "need",
    "book", "fly", "flying", "flight", "flights", "go", "going", "travel", "trip", "ticket",
    "tickets", "please", "would", "d", "instead",
];

/// Runs the pattern table over one utterance.
///
/// Returns `None` when nothing deterministic matched, which hands the
/// utterance to the context fallback and the language model.
pub fn parse(utterance: &str, today: NaiveDate) -> Option<Extraction> {
    let text = utterance.trim().to_lowercase();
    if text.is_empty() {
        return None;
    }

    let mut extraction = Extraction::default();

    let route = ROUTE_FROM
        .captures(&text)
        .or_else(|| ROUTE_BARE.captures(&text))
        .or_else(|| ROUTE_ARROW.captures(&text));
    if let Some(caps) = route {
        let origin = clean_city(&caps["origin"]);
        let destination = clean_city(&caps["dest"]);
        // A route only counts when both endpoints survive the stopword check.
        if let (Some(origin), Some(destination)) = (origin, destination) {
            extraction.origin = Some(pattern_candidate(origin));
            extraction.destination = Some(pattern_candidate(destination));
        }
    }
    if extraction.destination.is_none() {
        if let Some(caps) = DEST_ONLY.captures(&text) {
            if let Some(city) = clean_city(&caps["dest"]) {
                extraction.destination = Some(pattern_candidate(city));
            }
        }
    }
    if extraction.origin.is_none() {
        if let Some(caps) = ORIGIN_ONLY.captures(&text) {
            if let Some(city) = clean_city(&caps["origin"]) {
                extraction.origin = Some(pattern_candidate(city));
            }
        }
    }

    // The return clause is cut out before the departure scan so its "on"
    // cannot be mistaken for a departure date.
    let mut remainder = text.clone();
    if let Some(caps) = RETURN.captures(&text) {
        if let Some(date) = parse_natural_date(&caps["date"], today) {
            extraction.return_date = Some(Candidate::new(
                date,
                CONFIDENCE_PATTERN,
                ExtractionSource::Pattern,
            ));
        }
        let span = caps.get(0).map(|m| m.range());
        if let Some(range) = span {
            remainder.replace_range(range, "");
        }
    }
    if let Some(caps) = DEPARTURE.captures(&remainder) {
        if let Some(date) = parse_natural_date(&caps["date"], today) {
            extraction.departure_date = Some(Candidate::new(
                date,
                CONFIDENCE_PATTERN,
                ExtractionSource::Pattern,
            ));
        }
    }

    if let Some(caps) = PASSENGERS.captures(&text) {
        if let Some(count) = parse_count(&caps["count"]) {
            extraction.passengers = Some(Candidate::new(
                count,
                CONFIDENCE_PATTERN,
                ExtractionSource::Pattern,
            ));
        }
    }

    if let Some(trip_type) = trip_type_keyword(&text) {
        extraction.trip_type = Some(Candidate::new(
            trip_type,
            CONFIDENCE_PATTERN,
            ExtractionSource::Pattern,
        ));
    }

    if extraction.is_empty() {
        None
    } else {
        Some(extraction)
    }
}

/// Scans for an explicit one-way / round-trip keyword.
pub fn trip_type_keyword(text: &str) -> Option<TripType> {
    let t = text.to_lowercase();
    if t.contains("one way") || t.contains("one-way") || t.contains("oneway") {
        Some(TripType::OneWay)
    } else if t.contains("round trip")
        || t.contains("round-trip")
        || t.contains("roundtrip")
        || t.contains("return trip")
        || t.contains("both ways")
    {
        Some(TripType::RoundTrip)
    } else {
        None
    }
}

fn pattern_candidate(city: String) -> Candidate<String> {
    Candidate::new(city, CONFIDENCE_PATTERN, ExtractionSource::Pattern)
}

/// Uppercases a city capture, rejecting anything the lazy regexes swallowed
/// that is clearly not a place name.
pub(super) fn clean_city(raw: &str) -> Option<String> {
    let trimmed = raw.trim().trim_matches(['.', ',', '\'']);
    let words: Vec<&str> = trimmed.split_whitespace().collect();
    if words.is_empty() || words.len() > 4 {
        return None;
    }
    if words.iter().any(|w| CITY_STOPWORDS.contains(w)) {
        return None;
    }
    Some(trimmed.to_uppercase())
}

pub(super) fn parse_count(raw: &str) -> Option<u8> {
    if let Ok(n) = raw.parse::<u8>() {
        return Some(n);
    }
    let n = match raw {
        "one" => 1,
        "two" => 2,
        "three" => 3,
        "four" => 4,
        "five" => 5,
        "six" => 6,
        "seven" => 7,
        "eight" => 8,
        "nine" => 9,
        _ => return None,
    };
    Some(n)
}
