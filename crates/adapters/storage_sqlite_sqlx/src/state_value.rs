//! Spellings found in the `state` column.

use ledbridge_domain::error::ValidationError;
use ledbridge_domain::output::LineState;

/// Normalize a stored state: `on`/`off`, `вкл`/`выкл`, `1`/`0` and
/// `true`/`false`, in any case and with surrounding whitespace.
///
/// # Errors
///
/// Returns [`ValidationError::InvalidState`] for unknown spellings.
pub fn parse(raw: &str) -> Result<LineState, ValidationError> {
    match raw.trim().to_lowercase().as_str() {
        "on" | "вкл" | "1" | "true" => Ok(LineState::On),
        "off" | "выкл" | "0" | "false" => Ok(LineState::Off),
        _ => Err(ValidationError::InvalidState(raw.to_string())),
    }
}
