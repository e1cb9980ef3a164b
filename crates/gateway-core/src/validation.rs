//! Request body validation.
//!
//! The validator checks every field of the payload and reports all violations
//! at once as a [`FlattenedErrors`] report: problems with the payload as a whole
//! go to `formErrors`, per-field problems to `fieldErrors`.
//!
//! Schema:
//!
//! | Field      | Rule                                              |
//! |------------|---------------------------------------------------|
//! | `prompt`   | required string, at least 1 character             |
//! | `threadID` | optional string                                   |
//! | `provider` | optional, one of `openai`, `anthropic`, `gemini`  |
//! | `model`    | optional, one of the [`Model`] identifiers        |
//!
//! Unknown keys are ignored.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::str::FromStr;

use crate::request::IncomingRequest;
use crate::types::{Model, Provider};

const PROMPT_MIN_LENGTH: usize = 1;

/// Field-indexed report of every schema violation in one payload
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlattenedErrors {
    /// Violations of the payload as a whole
    pub form_errors: Vec<String>,
    /// Violations keyed by field name
    pub field_errors: BTreeMap<String, Vec<String>>,
}

impl FlattenedErrors {
    /// Whether no violation was recorded
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.form_errors.is_empty() && self.field_errors.is_empty()
    }

    /// Record a payload-level violation
    pub fn add_form_error(&mut self, message: impl Into<String>) {
        self.form_errors.push(message.into());
    }

    /// Record a violation on `field`
    pub fn add_field_error(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.field_errors
            .entry(field.into())
            .or_default()
            .push(message.into());
    }

    /// Messages recorded for `field`
    #[cfg(test)]
    pub fn field(&self, field: &str) -> &[String] {
        self.field_errors.get(field).map_or(&[], Vec::as_slice)
    }
}

/// Validator for inbound prompt requests
#[derive(Debug, Clone, Copy, Default)]
pub struct RequestValidator;

impl RequestValidator {
    /// Create a validator
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Validate a decoded payload.
    ///
    /// `None` stands for an absent body.
    pub fn validate(&self, payload: Option<&Value>) -> Result<IncomingRequest, FlattenedErrors> {
        let mut errors = FlattenedErrors::default();

        let fields = match payload {
            None => {
                errors.add_form_error("Required");
                return Err(errors);
            }
            Some(Value::Object(fields)) => fields,
            Some(other) => {
                errors.add_form_error(format!("Expected object, received {}", type_name(other)));
                return Err(errors);
            }
        };

        let prompt = string_field(fields, "prompt", true, &mut errors);
        if let Some(prompt) = &prompt {
            if prompt.chars().count() < PROMPT_MIN_LENGTH {
                errors.add_field_error(
                    "prompt",
                    format!("String must contain at least {PROMPT_MIN_LENGTH} character(s)"),
                );
            }
        }

        let thread_id = string_field(fields, "threadID", false, &mut errors);
        let provider = enum_field::<Provider>(
            fields,
            "provider",
            &Provider::ALL.map(Provider::as_str),
            &mut errors,
        );
        let model =
            enum_field::<Model>(fields, "model", &Model::ALL.map(Model::as_str), &mut errors);

        match prompt {
            Some(prompt) if errors.is_empty() => Ok(IncomingRequest {
                prompt,
                thread_id,
                provider,
                model,
            }),
            _ => Err(errors),
        }
    }
}

/// JSON type name as it appears in validation messages
fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn string_field(
    fields: &Map<String, Value>,
    name: &str,
    required: bool,
    errors: &mut FlattenedErrors,
) -> Option<String> {
    match fields.get(name) {
        None => {
            if required {
                errors.add_field_error(name, "Required");
            }
            None
        }
        Some(Value::String(s)) => Some(s.clone()),
        Some(other) => {
            errors.add_field_error(
                name,
                format!("Expected string, received {}", type_name(other)),
            );
            None
        }
    }
}

fn enum_field<T: FromStr>(
    fields: &Map<String, Value>,
    name: &str,
    allowed: &[&str],
    errors: &mut FlattenedErrors,
) -> Option<T> {
    let expected = allowed
        .iter()
        .map(|v| format!("'{v}'"))
        .collect::<Vec<_>>()
        .join(" | ");

    match fields.get(name) {
        None => None,
        Some(Value::String(s)) => {
            let parsed = s.parse::<T>().ok();
            if parsed.is_none() {
                errors.add_field_error(
                    name,
                    format!("Invalid enum value. Expected {expected}, received '{s}'"),
                );
            }
            parsed
        }
        Some(other) => {
            errors.add_field_error(
                name,
                format!("Expected {expected}, received {}", type_name(other)),
            );
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn validate(value: &Value) -> Result<IncomingRequest, FlattenedErrors> {
        RequestValidator::new().validate(Some(value))
    }

    #[test]
    fn test_minimal_request() {
        let request = validate(&json!({"prompt": "hello"})).unwrap();

        assert_eq!(request.prompt, "hello");
        assert!(request.provider.is_none());
        assert!(request.model.is_none());
        assert!(request.thread_id.is_none());
    }

    #[test]
    fn test_full_request() {
        let request = validate(&json!({
            "prompt": "hello",
            "threadID": "thread-1",
            "provider": "anthropic",
            "model": "claude-3-opus-20240229"
        }))
        .unwrap();

        assert_eq!(request.thread_id.as_deref(), Some("thread-1"));
        assert_eq!(request.provider, Some(Provider::Anthropic));
        assert_eq!(request.model, Some(Model::Claude3Opus));
    }

    #[test]
    fn test_missing_prompt() {
        let errors = validate(&json!({"provider": "openai"})).unwrap_err();
        assert_eq!(errors.field("prompt"), ["Required"]);
        assert!(errors.form_errors.is_empty());
    }

    #[test]
    fn test_empty_prompt_reports_minimum_length() {
        let errors = validate(&json!({"prompt": ""})).unwrap_err();
        assert_eq!(
            errors.field("prompt"),
            ["String must contain at least 1 character(s)"]
        );
    }

    #[test]
    fn test_prompt_wrong_type() {
        let errors = validate(&json!({"prompt": 42})).unwrap_err();
        assert_eq!(errors.field("prompt"), ["Expected string, received number"]);
    }

    #[test]
    fn test_every_violation_is_reported() {
        let errors = validate(&json!({
            "prompt": "",
            "threadID": 7,
            "provider": "mistral",
            "model": ["gpt-4"]
        }))
        .unwrap_err();

        assert_eq!(errors.field_errors.len(), 4);
        assert_eq!(
            errors.field("provider"),
            ["Invalid enum value. Expected 'openai' | 'anthropic' | 'gemini', received 'mistral'"]
        );
        assert_eq!(errors.field("threadID"), ["Expected string, received number"]);
        assert!(errors.field("model")[0].ends_with("received array"));
    }

    #[test]
    fn test_null_optional_field_is_rejected() {
        let errors = validate(&json!({"prompt": "hi", "provider": null})).unwrap_err();
        assert!(errors.field("provider")[0].ends_with("received null"));
    }

    #[test]
    fn test_non_object_payload() {
        let errors = validate(&json!("hello")).unwrap_err();
        assert_eq!(errors.form_errors, ["Expected object, received string"]);
        assert!(errors.field_errors.is_empty());

        let errors = validate(&Value::Null).unwrap_err();
        assert_eq!(errors.form_errors, ["Expected object, received null"]);
    }

    #[test]
    fn test_absent_payload() {
        let errors = RequestValidator::new().validate(None).unwrap_err();
        assert_eq!(errors.form_errors, ["Required"]);
    }

    #[test]
    fn test_unknown_keys_are_ignored() {
        let request = validate(&json!({"prompt": "hi", "temperature": 0.2})).unwrap();
        assert_eq!(request.prompt, "hi");
    }

    #[test]
    fn test_mismatched_provider_and_model_are_accepted() {
        let request = validate(&json!({
            "prompt": "hi",
            "provider": "gemini",
            "model": "gpt-4"
        }))
        .unwrap();

        assert_eq!(request.provider, Some(Provider::Gemini));
        assert_eq!(request.model, Some(Model::Gpt4));
    }

    #[test]
    fn test_validation_is_idempotent() {
        let payload = json!({"prompt": "same", "provider": "openai"});
        assert_eq!(validate(&payload).unwrap(), validate(&payload).unwrap());
    }

    #[test]
    fn test_flattened_errors_wire_format() {
        let errors = validate(&json!({"prompt": ""})).unwrap_err();
        let json = serde_json::to_value(&errors).unwrap();

        assert_eq!(json["formErrors"], json!([]));
        assert_eq!(
            json["fieldErrors"]["prompt"][0],
            "String must contain at least 1 character(s)"
        );
    }
}
