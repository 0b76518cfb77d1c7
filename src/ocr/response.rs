/*!
 * Parsing of backend output.
 *
 * Backends are asked for a JSON array of `{"image_order", "extracted_text"}`
 * objects. In practice they also wrap the array in a `{"results": [...]}`
 * object (forced JSON-object mode) or in a markdown code fence, and some
 * report overload in the body of a successful response.
 */

use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use crate::errors::ProviderError;
use crate::ocr::RecognizedText;
use crate::providers::openai::truncate;

static CODE_FENCE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)```(?:json)?\s*(.*?)\s*```").unwrap());

const OVERLOAD_MARKERS: [&str; 2] = ["high load", "quota exceeded"];

/// Whether the raw response text is an overload or quota notice
pub fn is_overload_notice(raw: &str) -> bool {
    let lower = raw.to_lowercase();
    OVERLOAD_MARKERS.iter().any(|marker| lower.contains(marker))
}

/// Parse raw backend output into positioned texts, in response order.
///
/// Entries without a usable `image_order` get position 0 so the caller can
/// report them; the number of returned entries always equals the number of
/// entries in the response.
pub fn parse_response(raw: &str) -> Result<Vec<RecognizedText>, ProviderError> {
    if is_overload_notice(raw) {
        return Err(ProviderError::Overloaded(truncate(raw.trim(), 200)));
    }

    let body = strip_code_fence(raw);
    let value: Value = serde_json::from_str(body)
        .map_err(|e| ProviderError::Parse(format!("{}: {}", e, truncate(body, 300))))?;

    let entries = match value {
        Value::Array(entries) => entries,
        Value::Object(mut object) => match object.remove("results") {
            Some(Value::Array(entries)) => entries,
            _ => {
                return Err(ProviderError::Parse(format!(
                    "expected a list or an object with 'results': {}",
                    truncate(body, 300)
                )));
            }
        },
        other => {
            return Err(ProviderError::Parse(format!(
                "unexpected JSON value: {}",
                truncate(&other.to_string(), 300)
            )));
        }
    };

    Ok(entries.iter().map(parse_entry).collect())
}

fn strip_code_fence(raw: &str) -> &str {
    match CODE_FENCE.captures(raw).and_then(|c| c.get(1)) {
        Some(inner) => inner.as_str(),
        None => raw.trim(),
    }
}

fn parse_entry(entry: &Value) -> RecognizedText {
    let position = match entry.get("image_order") {
        Some(Value::Number(n)) => n.as_u64().map(|n| n as usize).unwrap_or(0),
        Some(Value::String(s)) => s.trim().parse::<usize>().unwrap_or(0),
        _ => 0,
    };

    let text = match entry.get("extracted_text") {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    };

    if position == 0 {
        debug!("Entry without a usable image_order: {}", truncate(&entry.to_string(), 120));
    }

    RecognizedText { position, text }
}
