//! Argument decoding and typed accessors for tool handlers.
//!
//! ```rust
//! use pprovider::ToolArguments;
//! use ptooling::{decode_arguments, required_number};
//!
//! let args = decode_arguments(&ToolArguments::Encoded(r#"{"a":2}"#.to_string()))
//!     .expect("object should decode");
//! assert_eq!(required_number(&args, "a").expect("a is present"), 2.0);
//! ```

use pprovider::ToolArguments;
use serde_json::{Map, Value};

use crate::ToolError;

pub type ToolArgs = Map<String, Value>;

/// Arguments ready for invocation, plus a diagnostic when the payload had to be replaced.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedArguments {
    pub args: ToolArgs,
    pub diagnostic: Option<String>,
}

pub fn parse_json_value(args_json: &str) -> Result<Value, ToolError> {
    serde_json::from_str(args_json)
        .map_err(|err| ToolError::invalid_arguments(format!("invalid JSON arguments: {err}")))
}

pub fn decode_arguments(arguments: &ToolArguments) -> Result<ToolArgs, ToolError> {
    let value = match arguments {
        ToolArguments::Structured(value) => value.clone(),
        ToolArguments::Encoded(encoded) if encoded.trim().is_empty() => {
            return Ok(ToolArgs::new());
        }
        ToolArguments::Encoded(encoded) => parse_json_value(encoded)?,
    };

    match value {
        Value::Object(map) => Ok(map),
        Value::Null => Ok(ToolArgs::new()),
        other => Err(ToolError::invalid_arguments(format!(
            "expected JSON object arguments, got {other}"
        ))),
    }
}

/// Decodes `arguments`, substituting an empty set when they cannot be decoded.
pub fn decode_or_empty(tool_name: &str, arguments: &ToolArguments) -> DecodedArguments {
    match decode_arguments(arguments) {
        Ok(args) => DecodedArguments {
            args,
            diagnostic: None,
        },
        Err(error) => {
            let diagnostic = format!(
                "[Warning] Could not decode arguments for tool '{tool_name}': {} ({})",
                arguments.to_encoded(),
                error.message
            );
            tracing::warn!(tool = tool_name, error = %error.message, "substituting empty tool arguments");
            DecodedArguments {
                args: ToolArgs::new(),
                diagnostic: Some(diagnostic),
            }
        }
    }
}

pub fn required_string(args: &ToolArgs, key: &str) -> Result<String, ToolError> {
    args.get(key)
        .and_then(Value::as_str)
        .map(ToString::to_string)
        .ok_or_else(|| ToolError::invalid_arguments(format!("missing required string: '{key}'")))
}

/// Reads a number, accepting numeric strings since models often quote them.
pub fn required_number(args: &ToolArgs, key: &str) -> Result<f64, ToolError> {
    let value = args
        .get(key)
        .ok_or_else(|| ToolError::invalid_arguments(format!("missing required number: '{key}'")))?;

    match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse::<f64>().ok(),
        _ => None,
    }
    .ok_or_else(|| ToolError::invalid_arguments(format!("'{key}' must be a number, got {value}")))
}

/// Like [`required_number`], but an absent or null key yields `None`.
pub fn optional_number(args: &ToolArgs, key: &str) -> Result<Option<f64>, ToolError> {
    match args.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(_) => required_number(args, key).map(Some),
    }
}

/// Accepts `true`/`false` and their quoted forms.
pub fn optional_bool(args: &ToolArgs, key: &str) -> Result<Option<bool>, ToolError> {
    match args.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Bool(flag)) => Ok(Some(*flag)),
        Some(Value::String(text)) if text.trim().eq_ignore_ascii_case("true") => Ok(Some(true)),
        Some(Value::String(text)) if text.trim().eq_ignore_ascii_case("false") => Ok(Some(false)),
        Some(other) => Err(ToolError::invalid_arguments(format!(
            "'{key}' must be a boolean, got {other}"
        ))),
    }
}

pub fn required_channel(args: &ToolArgs, key: &str) -> Result<u8, ToolError> {
    let value = required_number(args, key)?;
    if value.fract() != 0.0 || !(0.0..=255.0).contains(&value) {
        return Err(ToolError::invalid_arguments(format!(
            "'{key}' must be an integer in 0..=255, got {value}"
        )));
    }
    Ok(value as u8)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::ToolErrorKind;

    #[test]
    fn structured_objects_are_used_as_is() {
        let args = decode_arguments(&ToolArguments::Structured(json!({"a": 2, "b": 3})))
            .expect("object should decode");
        assert_eq!(args.get("b"), Some(&json!(3)));
    }

    #[test]
    fn empty_encoded_payload_is_an_empty_object() {
        let args = decode_arguments(&ToolArguments::Encoded("  ".to_string()))
            .expect("empty payload should decode");
        assert!(args.is_empty());
    }

    #[test]
    fn non_object_payloads_are_invalid() {
        let error = decode_arguments(&ToolArguments::Encoded("[1,2]".to_string()))
            .expect_err("array should be rejected");
        assert_eq!(error.kind, ToolErrorKind::InvalidArguments);
    }

    #[test]
    fn malformed_payload_is_replaced_with_diagnostic() {
        let decoded = decode_or_empty(
            "add_two_numbers",
            &ToolArguments::Encoded("{\"a\": 2,".to_string()),
        );

        assert!(decoded.args.is_empty());
        let diagnostic = decoded.diagnostic.expect("diagnostic should be recorded");
        assert!(diagnostic.contains("add_two_numbers"));
        assert!(diagnostic.contains("{\"a\": 2,"));
    }

    #[test]
    fn numbers_accept_quoted_values() {
        let args = decode_arguments(&ToolArguments::Structured(json!({"a": "2.5", "b": true})))
            .expect("object should decode");

        assert_eq!(required_number(&args, "a").expect("quoted number"), 2.5);
        assert!(required_number(&args, "b").is_err());
        assert!(required_number(&args, "c").is_err());
    }

    #[test]
    fn optional_values_tolerate_absence_but_not_garbage() {
        let args = decode_arguments(&ToolArguments::Structured(json!({
            "count": "3",
            "fetch": "TRUE",
            "skip": null,
            "bad": [1]
        })))
        .expect("object should decode");

        assert_eq!(optional_number(&args, "count").expect("count"), Some(3.0));
        assert_eq!(optional_number(&args, "skip").expect("null"), None);
        assert_eq!(optional_bool(&args, "fetch").expect("fetch"), Some(true));
        assert_eq!(optional_bool(&args, "absent").expect("absent"), None);
        assert!(optional_bool(&args, "bad").is_err());
        assert!(optional_number(&args, "bad").is_err());
    }

    #[test]
    fn channels_must_fit_in_a_byte() {
        let args = decode_arguments(&ToolArguments::Structured(json!({"r": 255, "g": 256, "b": 1.5})))
            .expect("object should decode");

        assert_eq!(required_channel(&args, "r").expect("valid channel"), 255);
        assert!(required_channel(&args, "g").is_err());
        assert!(required_channel(&args, "b").is_err());
    }
}
