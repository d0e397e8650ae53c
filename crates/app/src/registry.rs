//! The configured catalogue of addressable outputs.
//!
//! Built once at startup and read-only afterwards. Re-addressing a physical
//! line means changing the configuration and restarting.

use std::collections::{HashMap, HashSet};

use ledbridge_domain::error::{BridgeError, NotFoundError, ValidationError};
use ledbridge_domain::id::{OutputId, PhysicalLine};
use ledbridge_domain::output::{LineState, Output};

/// Immutable catalogue of outputs, in configuration order.
#[derive(Debug, Clone)]
pub struct OutputRegistry {
    outputs: Vec<Output>,
    index: HashMap<OutputId, usize>,
}

impl OutputRegistry {
    /// Validate and index the given outputs.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::Validation`] if an output is invalid, or if an
    /// id or a physical line appears twice.
    pub fn new(outputs: Vec<Output>) -> Result<Self, BridgeError> {
        let mut index = HashMap::with_capacity(outputs.len());
        let mut lines = HashSet::with_capacity(outputs.len());

        for (position, output) in outputs.iter().enumerate() {
            output.validate()?;
            if index.insert(output.id, position).is_some() {
                return Err(ValidationError::DuplicateOutputId(output.id).into());
            }
            if !lines.insert(output.line) {
                return Err(ValidationError::DuplicateLine(output.line).into());
            }
        }

        Ok(Self { outputs, index })
    }

    /// Look up an output by identity.
    ///
    /// # Errors
    ///
    /// Returns [`NotFoundError`] when no output has this id.
    pub fn resolve(&self, id: OutputId) -> Result<&Output, NotFoundError> {
        self.index
            .get(&id)
            .map(|&position| &self.outputs[position])
            .ok_or_else(|| NotFoundError {
                entity: "Output",
                id: id.to_string(),
            })
    }

    /// All outputs, in configuration order.
    #[must_use]
    pub fn all(&self) -> &[Output] {
        &self.outputs
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.outputs.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.outputs.is_empty()
    }

    /// Lines whose state is known right after the channel opens.
    pub fn initial_states(&self) -> impl Iterator<Item = (PhysicalLine, LineState)> + '_ {
        self.outputs
            .iter()
            .filter_map(|output| output.initial_state.map(|state| (output.line, state)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn output(id: u32, line: u16) -> Output {
        Output::builder()
            .id(id)
            .label(format!("LED {id}"))
            .line(line)
            .build()
            .unwrap()
    }

    #[test]
    fn should_resolve_configured_output() {
        let registry = OutputRegistry::new(vec![output(1, 2), output(2, 3)]).unwrap();
        let found = registry.resolve(OutputId::new(2)).unwrap();
        assert_eq!(found.line, PhysicalLine::new(3));
    }

    #[test]
    fn should_return_not_found_for_unknown_id() {
        let registry = OutputRegistry::new(vec![output(1, 2)]).unwrap();
        let err = registry.resolve(OutputId::new(9)).unwrap_err();
        assert_eq!(err.id, "9");
    }

    #[test]
    fn should_keep_configuration_order() {
        let registry =
            OutputRegistry::new(vec![output(3, 4), output(1, 2), output(2, 3)]).unwrap();
        let ids: Vec<u32> = registry.all().iter().map(|o| o.id.get()).collect();
        assert_eq!(ids, vec![3, 1, 2]);
    }

    #[test]
    fn should_reject_duplicate_line() {
        let result = OutputRegistry::new(vec![output(1, 2), output(2, 2)]);
        assert!(matches!(
            result,
            Err(BridgeError::Validation(ValidationError::DuplicateLine(line))) if line == PhysicalLine::new(2)
        ));
    }

    #[test]
    fn should_reject_duplicate_id() {
        let result = OutputRegistry::new(vec![output(1, 2), output(1, 3)]);
        assert!(matches!(
            result,
            Err(BridgeError::Validation(ValidationError::DuplicateOutputId(_)))
        ));
    }

    #[test]
    fn should_list_only_declared_initial_states() {
        let mut seeded = output(1, 2);
        seeded.initial_state = Some(LineState::Off);
        let registry = OutputRegistry::new(vec![seeded, output(2, 3)]).unwrap();

        let initial: Vec<_> = registry.initial_states().collect();
        assert_eq!(initial, vec![(PhysicalLine::new(2), LineState::Off)]);
    }

    #[test]
    fn should_accept_empty_catalogue() {
        let registry = OutputRegistry::new(Vec::new()).unwrap();
        assert!(registry.is_empty());
    }
}
