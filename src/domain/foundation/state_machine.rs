//! Transition table trait for lifecycle enums.

use super::ValidationError;

/// A stage enum whose legal moves are a static table.
///
/// Implementors only list outgoing edges; checking and terminal detection
/// follow from the table.
pub trait StateMachine: Sized + Copy + PartialEq + std::fmt::Debug + 'static {
    /// Stages reachable in one step from `self`.
    fn valid_transitions(&self) -> &'static [Self];

    fn can_transition_to(&self, target: &Self) -> bool {
        self.valid_transitions().contains(target)
    }

    fn transition_to(&self, target: Self) -> Result<Self, ValidationError> {
        if self.can_transition_to(&target) {
            Ok(target)
        } else {
            Err(ValidationError::invalid_format(
                "stage",
                format!("{:?} cannot move to {:?}", self, target),
            ))
        }
    }

    fn is_terminal(&self) -> bool {
        self.valid_transitions().is_empty()
    }
}
