//! Language-model extraction pass.
//!
//! Last resort for utterances the deterministic passes cannot read. The
//! model is asked for a strict JSON object; the reply is parsed defensively
//! field by field, and any failure degrades to "nothing extracted" rather
//! than surfacing an error to the turn.

use chrono::NaiveDate;
use serde_json::Value;

use crate::domain::dialog::TripType;
use crate::ports::LanguageModel;

use super::dates::parse_natural_date;
use super::{Candidate, Extraction, ExtractionSource, CONFIDENCE_LLM, CONFIDENCE_LLM_DATE};

const SYSTEM_PROMPT: &str = "You extract flight-search details from a traveler's message. \
Today's date is {today}. \
Reply with ONLY a JSON object, no prose, with these keys (omit or null any the \
message does not state): \
\"origin\" (departure city or airport), \
\"destination\", \
\"departure_date\" (YYYY-MM-DD, resolve relative phrases against today), \
\"return_date\" (YYYY-MM-DD), \
\"passengers\" (integer), \
\"trip_type\" (\"one_way\" or \"round_trip\"). \
Never guess a value the message does not support.";

/// Runs the model over one utterance.
///
/// The last system question, when present, is prepended as context so a
/// terse answer like "the second one" can be grounded.
pub async fn extract(
    model: &dyn LanguageModel,
    utterance: &str,
    last_question: Option<&str>,
    today: NaiveDate,
) -> Extraction {
    let system = SYSTEM_PROMPT.replace("{today}", &today.format("%Y-%m-%d").to_string());
    let user = match last_question {
        Some(question) => format!("Assistant asked: {question}\nTraveler says: {utterance}"),
        None => utterance.to_string(),
    };

    let raw = match model.complete(&system, &user).await {
        Ok(raw) => raw,
        Err(err) => {
            tracing::warn!(error = %err, "language model unavailable, skipping pass");
            return Extraction::default();
        }
    };

    parse_reply(&raw, today)
}

/// Parses the model's reply, tolerating code fences and stray prose.
fn parse_reply(raw: &str, today: NaiveDate) -> Extraction {
    let mut extraction = Extraction::default();

    let json: Value = match serde_json::from_str(strip_fences(raw)) {
        Ok(json) => json,
        Err(err) => {
            tracing::debug!(error = %err, "model reply is not JSON, extracting nothing");
            return extraction;
        }
    };
    let Some(object) = json.as_object() else {
        tracing::debug!("model reply is not a JSON object, extracting nothing");
        return extraction;
    };

    extraction.origin = string_field(object, "origin")
        .map(|city| llm_candidate(city.to_uppercase(), CONFIDENCE_LLM));
    extraction.destination = string_field(object, "destination")
        .map(|city| llm_candidate(city.to_uppercase(), CONFIDENCE_LLM));

    extraction.departure_date = string_field(object, "departure_date")
        .and_then(|text| parse_natural_date(&text, today))
        .map(|date| llm_candidate(date, CONFIDENCE_LLM_DATE));
    extraction.return_date = string_field(object, "return_date")
        .and_then(|text| parse_natural_date(&text, today))
        .map(|date| llm_candidate(date, CONFIDENCE_LLM_DATE));

    extraction.passengers = object
        .get("passengers")
        .and_then(Value::as_u64)
        .and_then(|n| u8::try_from(n).ok())
        .filter(|n| *n > 0)
        .map(|n| llm_candidate(n, CONFIDENCE_LLM));

    extraction.trip_type = string_field(object, "trip_type")
        .and_then(|text| match text.as_str() {
            "one_way" | "oneway" | "one-way" => Some(TripType::OneWay),
            "round_trip" | "roundtrip" | "round-trip" => Some(TripType::RoundTrip),
            other => {
                tracing::debug!(value = other, "unrecognized trip type from model");
                None
            }
        })
        .map(|trip_type| llm_candidate(trip_type, CONFIDENCE_LLM));

    extraction
}

fn llm_candidate<T>(value: T, confidence: f32) -> Candidate<T> {
    Candidate::new(value, confidence, ExtractionSource::LanguageModel)
}

/// Non-empty, non-null string field.
fn string_field(object: &serde_json::Map<String, Value>, key: &str) -> Option<String> {
    object
        .get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty() && !s.eq_ignore_ascii_case("null"))
        .map(str::to_string)
}

/// Drops a ```json ... ``` fence if the model wrapped its reply in one.
fn strip_fences(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(inner) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let inner = inner.strip_prefix("json").unwrap_or(inner);
    inner.strip_suffix("```").unwrap_or(inner).trim()
}
