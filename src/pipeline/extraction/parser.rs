//! Response parsing and per-field validation.

use serde_json::{Map, Value};

use super::error::ExtractionError;
use super::types::ParsedFact;
use crate::pipeline::variables::PhaseSchema;

/// Parse a sanitized completion against the phase schema.
///
/// Each field is independently nullable: a missing field, a `null` field or
/// a fact whose `value` is `null` yields no observation. A present value
/// that does not fit the declared type fails the whole answer, as would a
/// structured-output validator. Keys outside the schema are ignored.
pub fn parse_extraction_response(
    response: &str,
    schema: &PhaseSchema,
) -> Result<Vec<ParsedFact>, ExtractionError> {
    let root: Value = serde_json::from_str(response)?;
    let obj = root
        .as_object()
        .ok_or_else(|| ExtractionError::JsonParsing("expected a JSON object".into()))?;

    if let Some(reason) = refusal_reason(obj) {
        return Err(ExtractionError::Refusal(reason));
    }

    let mut facts = Vec::new();
    for def in &schema.fields {
        let Some(field) = obj.get(def.id) else {
            continue;
        };
        if field.is_null() {
            continue;
        }

        let invalid = |reason: String| ExtractionError::Validation {
            variable: def.id.to_string(),
            reason,
        };

        let fact = field
            .as_object()
            .ok_or_else(|| invalid(format!("expected fact object, got {field}")))?;

        let raw_value = fact.get("value").unwrap_or(&Value::Null);
        if raw_value.is_null() {
            continue;
        }
        let value = def.value_type.coerce(raw_value).map_err(invalid)?;

        let citation = fact
            .get("citation")
            .and_then(Value::as_str)
            .ok_or_else(|| invalid("missing citation".into()))?
            .to_string();

        let note_id = fact
            .get("note_id")
            .and_then(note_id_of)
            .ok_or_else(|| invalid("missing or non-integer note_id".into()))?;

        facts.push(ParsedFact {
            variable_id: def.id.to_string(),
            value,
            citation,
            note_id,
        });
    }
    Ok(facts)
}

/// `{"refusal": "..."}` answers, as emitted by structured-output servers.
fn refusal_reason(obj: &Map<String, Value>) -> Option<String> {
    match obj.get("refusal") {
        Some(Value::String(reason)) if !reason.is_empty() => Some(reason.clone()),
        _ => None,
    }
}

/// Integer note id; numeric strings are tolerated.
fn note_id_of(v: &Value) -> Option<i64> {
    v.as_i64().or_else(|| v.as_str().and_then(|s| s.trim().parse().ok()))
}
