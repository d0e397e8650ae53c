//! Client spellings of an output state.
//!
//! Clients send `"on"`/`"off"`, the Russian `"вкл"`/`"выкл"`, `"1"`/`"0"`,
//! `"true"`/`"false"` (any case), JSON booleans, or the numbers `1`/`0`.

use serde_json::Value;

use ledbridge_domain::error::ValidationError;
use ledbridge_domain::output::LineState;

/// Normalize a JSON state value.
///
/// # Errors
///
/// Returns [`ValidationError::InvalidState`] for any other value.
pub fn parse(value: &Value) -> Result<LineState, ValidationError> {
    match value {
        Value::Bool(true) => Ok(LineState::On),
        Value::Bool(false) => Ok(LineState::Off),
        Value::Number(number) => match number.as_u64() {
            Some(1) => Ok(LineState::On),
            Some(0) => Ok(LineState::Off),
            _ => Err(ValidationError::InvalidState(number.to_string())),
        },
        Value::String(text) => parse_text(text),
        other => Err(ValidationError::InvalidState(other.to_string())),
    }
}

/// Normalize a textual state value.
///
/// # Errors
///
/// Returns [`ValidationError::InvalidState`] for unknown spellings.
pub fn parse_text(raw: &str) -> Result<LineState, ValidationError> {
    match raw.trim().to_lowercase().as_str() {
        "on" | "вкл" | "1" | "true" => Ok(LineState::On),
        "off" | "выкл" | "0" | "false" => Ok(LineState::Off),
        _ => Err(ValidationError::InvalidState(raw.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn should_accept_every_on_spelling() {
        for value in [
            json!("on"),
            json!("ON"),
            json!(" On "),
            json!("вкл"),
            json!("ВКЛ"),
            json!("1"),
            json!("true"),
            json!(true),
            json!(1),
        ] {
            assert_eq!(parse(&value), Ok(LineState::On), "{value}");
        }
    }

    #[test]
    fn should_accept_every_off_spelling() {
        for value in [
            json!("off"),
            json!("Выкл"),
            json!("0"),
            json!("FALSE"),
            json!(false),
            json!(0),
        ] {
            assert_eq!(parse(&value), Ok(LineState::Off), "{value}");
        }
    }

    #[test]
    fn should_reject_unknown_values() {
        for value in [json!("dim"), json!(2), json!(null), json!(["on"]), json!("")] {
            assert!(
                matches!(parse(&value), Err(ValidationError::InvalidState(_))),
                "{value}"
            );
        }
    }

    #[test]
    fn should_keep_raw_text_in_error() {
        let err = parse_text("dim").unwrap_err();
        assert_eq!(err, ValidationError::InvalidState("dim".to_string()));
    }
}
