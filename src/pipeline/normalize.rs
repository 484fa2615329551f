//! Response normalisation: model text → `Vec<CandidateTransaction>`.
//!
//! Models are told to answer with bare JSON and still wrap it in
//! ```` ```json ... ``` ```` fences, sometimes only half of one. Fence markers
//! at either end are stripped, the rest parsed.
//! The batch is all-or-nothing: invalid JSON, a non-array, or any element
//! that is not an object rejects the whole reply.

use crate::error::ReceiptError;
use crate::output::CandidateTransaction;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use tracing::debug;

/// Longest slice of the reply quoted back in a [`ReceiptError::MalformedOutput`].
const EXCERPT_CHARS: usize = 120;

/// Strip fences and parse the reply into candidates, preserving order.
pub fn normalize_response(raw: &str) -> Result<Vec<CandidateTransaction>, ReceiptError> {
    let cleaned = strip_code_fences(raw);

    let value: Value = serde_json::from_str(&cleaned)
        .map_err(|e| malformed(format!("not valid JSON ({e})"), &cleaned))?;

    let items = match value {
        Value::Array(items) => items,
        other => {
            return Err(malformed(
                format!("expected a JSON array, got {}", json_type(&other)),
                &cleaned,
            ))
        }
    };

    let transactions = items
        .into_iter()
        .enumerate()
        .map(|(i, item)| {
            if !item.is_object() {
                return Err(malformed(
                    format!("element {i} is {}, not an object", json_type(&item)),
                    &cleaned,
                ));
            }
            serde_json::from_value(item)
                .map_err(|e| malformed(format!("element {i}: {e}"), &cleaned))
        })
        .collect::<Result<Vec<CandidateTransaction>, _>>()?;

    debug!("Normalised reply into {} candidates", transactions.len());
    Ok(transactions)
}

// ── Fence stripping ──────────────────────────────────────────────────────────

static RE_OPENING_FENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^```[A-Za-z0-9_+-]*[ \t]*\r?\n?").unwrap());

static RE_CLOSING_FENCE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\r?\n?```$").unwrap());

/// Remove code-fence markers (with optional language tag) and trim.
///
/// Opening and closing markers are stripped independently, so a reply that
/// carries only one of them still parses. Stripping repeats until neither end
/// carries a marker; applying this twice equals applying it once.
pub fn strip_code_fences(input: &str) -> String {
    let mut text = input.trim();
    loop {
        let before = text.len();
        if let Some(m) = RE_OPENING_FENCE.find(text) {
            text = text[m.end()..].trim_start();
        }
        if let Some(m) = RE_CLOSING_FENCE.find(text) {
            text = text[..m.start()].trim_end();
        }
        if text.len() == before {
            return text.to_string();
        }
    }
}

// ── Helpers ──────────────────────────────────────────────────────────────────

fn malformed(reason: String, text: &str) -> ReceiptError {
    ReceiptError::MalformedOutput {
        reason,
        excerpt: text.chars().take(EXCERPT_CHARS).collect(),
    }
}

fn json_type(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
