//! Output — one addressable digital line (an LED) on the microcontroller.

use serde::{Deserialize, Serialize};

use crate::error::{BridgeError, ValidationError};
use crate::id::{OutputId, PhysicalLine};

/// Binary logical state of a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineState {
    On,
    Off,
}

impl LineState {
    /// The opposite state.
    #[must_use]
    pub fn toggled(self) -> Self {
        match self {
            Self::On => Self::Off,
            Self::Off => Self::On,
        }
    }
}

impl std::fmt::Display for LineState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::On => f.write_str("on"),
            Self::Off => f.write_str("off"),
        }
    }
}

/// A catalogued output.
///
/// `initial_state` is the state the line is known to hold right after the
/// channel is opened, if any. The runtime state lives in the state cache.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Output {
    pub id: OutputId,
    pub label: String,
    pub line: PhysicalLine,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initial_state: Option<LineState>,
}

impl Output {
    /// Create a builder for constructing an [`Output`].
    #[must_use]
    pub fn builder() -> OutputBuilder {
        OutputBuilder::default()
    }

    /// Check domain invariants.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::Validation`] when the id is zero or the label
    /// is empty.
    pub fn validate(&self) -> Result<(), BridgeError> {
        if self.id.get() == 0 {
            return Err(ValidationError::ZeroOutputId.into());
        }
        if self.label.trim().is_empty() {
            return Err(ValidationError::EmptyLabel.into());
        }
        Ok(())
    }
}

/// Step-by-step builder for [`Output`].
#[derive(Debug, Default)]
pub struct OutputBuilder {
    id: Option<OutputId>,
    label: Option<String>,
    line: Option<PhysicalLine>,
    initial_state: Option<LineState>,
}

impl OutputBuilder {
    #[must_use]
    pub fn id(mut self, id: u32) -> Self {
        self.id = Some(OutputId::new(id));
        self
    }

    #[must_use]
    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    #[must_use]
    pub fn line(mut self, line: u16) -> Self {
        self.line = Some(PhysicalLine::new(line));
        self
    }

    #[must_use]
    pub fn initial_state(mut self, state: LineState) -> Self {
        self.initial_state = Some(state);
        self
    }

    /// Consume the builder, validate, and return an [`Output`].
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::Validation`] if the id is missing or zero, or
    /// the label is missing or empty.
    pub fn build(self) -> Result<Output, BridgeError> {
        let output = Output {
            id: self.id.unwrap_or(OutputId::new(0)),
            label: self.label.unwrap_or_default(),
            line: self.line.unwrap_or(PhysicalLine::new(0)),
            initial_state: self.initial_state,
        };
        output.validate()?;
        Ok(output)
    }
}

/// One row of a desired-state set, as reported by a control-plane source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DesiredState {
    pub output_id: OutputId,
    pub label: String,
    pub line: PhysicalLine,
    pub state: LineState,
}
