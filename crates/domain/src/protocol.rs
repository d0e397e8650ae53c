//! Wire protocol spoken with the microcontroller.
//!
//! Text based, newline delimited, one command per line:
//!
//! ```text
//! host   -> device   ON:5\n
//! device -> host     OK\n
//! host   -> device   OFF:7\n
//! device -> host     ERROR bad line\n
//! ```

use crate::error::DeviceError;
use crate::id::PhysicalLine;
use crate::output::LineState;

/// Token that starts a successful acknowledgement.
pub const SUCCESS_TOKEN: &str = "OK";
/// Token that starts a rejection.
pub const ERROR_TOKEN: &str = "ERROR";
/// Separator between the directive and the line number.
pub const DELIMITER: char = ':';

/// A request to drive one line to a state. Lives for one round-trip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Command {
    pub line: PhysicalLine,
    pub state: LineState,
}

impl Command {
    #[must_use]
    pub fn new(line: PhysicalLine, state: LineState) -> Self {
        Self { line, state }
    }

    /// The directive token for the requested state.
    #[must_use]
    pub fn directive(&self) -> &'static str {
        match self.state {
            LineState::On => "ON",
            LineState::Off => "OFF",
        }
    }

    /// Encode as a complete wire frame, newline included.
    #[must_use]
    pub fn encode(&self) -> String {
        format!("{}{DELIMITER}{}\n", self.directive(), self.line)
    }
}

impl std::fmt::Display for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{DELIMITER}{}", self.directive(), self.line)
    }
}

/// Classified reply to a [`Command`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Acknowledgement {
    Confirmed,
    /// Carries the advisory text that followed the error token.
    Rejected(String),
    Timeout,
    /// Carries the raw text that was received.
    Malformed(String),
}

impl Acknowledgement {
    /// Classify one received line (trailing `\r`/`\n` are ignored).
    #[must_use]
    pub fn classify(raw: &str) -> Self {
        let line = raw.trim_end_matches(['\r', '\n']);
        if line.starts_with(SUCCESS_TOKEN) {
            Self::Confirmed
        } else if let Some(rest) = line.strip_prefix(ERROR_TOKEN) {
            Self::Rejected(rest.trim_start_matches(DELIMITER).trim().to_string())
        } else {
            Self::Malformed(line.to_string())
        }
    }

    /// Whether the device confirmed the command.
    #[must_use]
    pub fn is_confirmed(&self) -> bool {
        matches!(self, Self::Confirmed)
    }

    /// Convert into a result, mapping every non-confirmed outcome to its
    /// [`DeviceError`] kind.
    ///
    /// # Errors
    ///
    /// Returns the matching [`DeviceError`] for `Rejected`, `Timeout` and
    /// `Malformed`.
    pub fn into_result(self) -> Result<(), DeviceError> {
        match self {
            Self::Confirmed => Ok(()),
            Self::Rejected(detail) => Err(DeviceError::Rejected { detail }),
            Self::Timeout => Err(DeviceError::Timeout),
            Self::Malformed(response) => Err(DeviceError::Malformed { response }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_encode_on_command() {
        let cmd = Command::new(PhysicalLine::new(5), LineState::On);
        assert_eq!(cmd.encode(), "ON:5\n");
    }

    #[test]
    fn should_encode_off_command() {
        let cmd = Command::new(PhysicalLine::new(13), LineState::Off);
        assert_eq!(cmd.encode(), "OFF:13\n");
        assert_eq!(cmd.to_string(), "OFF:13");
    }

    #[test]
    fn should_classify_bare_ok_as_confirmed() {
        assert_eq!(Acknowledgement::classify("OK\r\n"), Acknowledgement::Confirmed);
    }

    #[test]
    fn should_classify_ok_with_detail_as_confirmed() {
        assert_eq!(
            Acknowledgement::classify("OK LED 5 ON\n"),
            Acknowledgement::Confirmed
        );
    }

    #[test]
    fn should_classify_error_and_keep_detail() {
        assert_eq!(
            Acknowledgement::classify("ERROR bad line\n"),
            Acknowledgement::Rejected("bad line".to_string())
        );
        assert_eq!(
            Acknowledgement::classify("ERROR: Invalid pin"),
            Acknowledgement::Rejected("Invalid pin".to_string())
        );
    }

    #[test]
    fn should_classify_garbage_as_malformed() {
        assert_eq!(
            Acknowledgement::classify("Arduino ready\n"),
            Acknowledgement::Malformed("Arduino ready".to_string())
        );
    }

    #[test]
    fn should_classify_empty_line_as_malformed() {
        assert_eq!(
            Acknowledgement::classify("\r\n"),
            Acknowledgement::Malformed(String::new())
        );
    }

    #[test]
    fn should_be_case_sensitive_on_tokens() {
        assert!(matches!(
            Acknowledgement::classify("ok"),
            Acknowledgement::Malformed(_)
        ));
    }

    #[test]
    fn should_map_outcomes_to_device_errors() {
        assert!(Acknowledgement::Confirmed.into_result().is_ok());
        assert_eq!(
            Acknowledgement::Timeout.into_result(),
            Err(DeviceError::Timeout)
        );
        assert_eq!(
            Acknowledgement::Rejected("x".to_string()).into_result(),
            Err(DeviceError::Rejected {
                detail: "x".to_string()
            })
        );
        assert_eq!(
            Acknowledgement::Malformed("??".to_string()).into_result(),
            Err(DeviceError::Malformed {
                response: "??".to_string()
            })
        );
    }
}
