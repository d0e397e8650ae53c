//! Common error types used across the workspace.
//!
//! Each layer defines its own typed errors and converts into
//! [`BridgeError`] via `#[from]`.

use crate::id::{OutputId, PhysicalLine};

/// Top-level error shared by every layer.
#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    /// A domain invariant was violated.
    #[error("validation error")]
    Validation(#[from] ValidationError),

    /// The requested item does not exist.
    #[error(transparent)]
    NotFound(#[from] NotFoundError),

    /// The device did not accept a command, or cannot be reached.
    #[error(transparent)]
    Device(#[from] DeviceError),

    /// The desired-state store failed.
    #[error("storage error")]
    Storage(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Invariant violations detected while building domain values.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("output id must be positive")]
    ZeroOutputId,
    #[error("output label must not be empty")]
    EmptyLabel,
    #[error("output {0} is declared more than once")]
    DuplicateOutputId(OutputId),
    #[error("physical line {0} is assigned to more than one output")]
    DuplicateLine(PhysicalLine),
    #[error("unrecognized state value {0:?}")]
    InvalidState(String),
    #[error("invalid output id {0:?}")]
    InvalidOutputId(String),
}

/// A lookup by identity found nothing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{entity} {id} not found")]
pub struct NotFoundError {
    pub entity: &'static str,
    pub id: String,
}

/// Per-command and channel-level failures reported by the device link.
///
/// Every variant is a distinct outcome kind: callers (and operators) can tell
/// a device that refuses a command apart from one that stays silent.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DeviceError {
    /// The serial channel was never opened, or was lost.
    #[error("device unavailable")]
    Unavailable,
    /// The device answered with its error token.
    #[error("device rejected the command: {detail}")]
    Rejected { detail: String },
    /// No acknowledgement arrived within the timeout.
    #[error("device did not acknowledge in time")]
    Timeout,
    /// The device answered with something that is neither a success nor an
    /// error token.
    #[error("malformed acknowledgement {response:?}")]
    Malformed { response: String },
}

impl DeviceError {
    /// Short machine-readable name of the outcome kind.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Unavailable => "device_unavailable",
            Self::Rejected { .. } => "rejected",
            Self::Timeout => "timeout",
            Self::Malformed { .. } => "malformed",
        }
    }
}
