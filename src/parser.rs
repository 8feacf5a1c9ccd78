//! Strict parsing and validation of raw model output.
//!
//! The raw text must be exactly one JSON object. Nothing is stripped or
//! extracted from surrounding prose: a response that needs repair is reported
//! as malformed so the caller can re-prompt.

use crate::schema::{FieldKind, FieldSpec, StructuredOutput, FLASHCARD_FIELDS};
use serde_json::{Map, Value};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// The text is not a single JSON object
    #[error("malformed model output: {0}")]
    Malformed(String),
    /// Valid JSON that does not match the schema
    #[error("schema violation at `{field}`: {reason}")]
    SchemaViolation { field: String, reason: String },
}

impl ParseError {
    fn violation(field: impl Into<String>, reason: impl Into<String>) -> Self {
        ParseError::SchemaViolation {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// Parse `raw` and validate it against `T`'s schema.
///
/// Returns the typed result only when every declared field is present and
/// well-formed; any failure rejects the whole response.
pub fn parse_output<T: StructuredOutput>(raw: &str) -> Result<T, ParseError> {
    let object = parse_object(raw)?;
    validate_fields(&object, T::SCHEMA.fields(), "")?;

    serde_json::from_value(Value::Object(object))
        .map_err(|e| ParseError::violation(T::SCHEMA.name(), e.to_string()))
}

/// Strictly parse `raw` as a JSON object
fn parse_object(raw: &str) -> Result<Map<String, Value>, ParseError> {
    let value: Value =
        serde_json::from_str(raw).map_err(|e| ParseError::Malformed(e.to_string()))?;

    match value {
        Value::Object(object) => Ok(object),
        other => Err(ParseError::Malformed(format!(
            "expected a JSON object, found {}",
            json_type(&other)
        ))),
    }
}

fn validate_fields(
    object: &Map<String, Value>,
    fields: &[FieldSpec],
    prefix: &str,
) -> Result<(), ParseError> {
    for field in fields {
        let path = format!("{}{}", prefix, field.name);
        let value = object
            .get(field.name)
            .ok_or_else(|| ParseError::violation(&path, "missing required field"))?;
        validate_value(value, field.kind, &path)?;
    }
    Ok(())
}

fn validate_value(value: &Value, kind: FieldKind, path: &str) -> Result<(), ParseError> {
    match kind {
        FieldKind::Text => expect_string(value, path).map(|_| ()),
        FieldKind::NonEmptyText => {
            if expect_string(value, path)?.trim().is_empty() {
                return Err(ParseError::violation(path, "must not be empty"));
            }
            Ok(())
        }
        FieldKind::TextList { min, max } => {
            let items = expect_array(value, path)?;
            if items.len() < min || items.len() > max {
                return Err(ParseError::violation(
                    path,
                    format!("expected {}-{} items, found {}", min, max, items.len()),
                ));
            }
            for (i, item) in items.iter().enumerate() {
                expect_string(item, &format!("{}[{}]", path, i))?;
            }
            Ok(())
        }
        FieldKind::FlashcardList => {
            let cards = expect_array(value, path)?;
            for (i, card) in cards.iter().enumerate() {
                let card_path = format!("{}[{}]", path, i);
                let object = card.as_object().ok_or_else(|| {
                    ParseError::violation(
                        &card_path,
                        format!("expected object, found {}", json_type(card)),
                    )
                })?;
                validate_fields(object, FLASHCARD_FIELDS, &format!("{}.", card_path))?;
            }
            Ok(())
        }
    }
}

fn expect_string<'a>(value: &'a Value, path: &str) -> Result<&'a str, ParseError> {
    value.as_str().ok_or_else(|| {
        ParseError::violation(path, format!("expected string, found {}", json_type(value)))
    })
}

fn expect_array<'a>(value: &'a Value, path: &str) -> Result<&'a Vec<Value>, ParseError> {
    value.as_array().ok_or_else(|| {
        ParseError::violation(path, format!("expected array, found {}", json_type(value)))
    })
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
