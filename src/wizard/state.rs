//! Wizard state machine: tracks the active section, completion and the
//! submission phase.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::validation::FieldErrors;

/// Lifecycle phase of a wizard session.
///
/// Editing → Submitting → Submitted, with Submitting → Editing when the
/// gateway rejects the submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WizardPhase {
    Editing,
    Submitting,
    Submitted,
}

impl WizardPhase {
    /// Check if a transition from `self` to `target` is valid.
    pub fn can_transition_to(&self, target: WizardPhase) -> bool {
        use WizardPhase::*;
        matches!(
            (self, target),
            (Editing, Submitting) | (Submitting, Submitted) | (Submitting, Editing)
        )
    }

    /// Whether edits and navigation are accepted.
    pub fn is_editable(&self) -> bool {
        matches!(self, Self::Editing)
    }
}

impl Default for WizardPhase {
    fn default() -> Self {
        Self::Editing
    }
}

impl std::fmt::Display for WizardPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Editing => "editing",
            Self::Submitting => "submitting",
            Self::Submitted => "submitted",
        };
        write!(f, "{s}")
    }
}

/// Navigation and validation state of one session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WizardState {
    pub active_index: usize,
    /// Sections that passed validation. Only ever grows.
    pub completed: BTreeSet<usize>,
    /// Sections the visitor has been on.
    pub visited: BTreeSet<usize>,
    /// Errors from the most recent validation attempt.
    pub errors: FieldErrors,
    pub phase: WizardPhase,
}

impl Default for WizardState {
    fn default() -> Self {
        Self {
            active_index: 0,
            completed: BTreeSet::new(),
            visited: BTreeSet::from([0]),
            errors: FieldErrors::new(),
            phase: WizardPhase::default(),
        }
    }
}

impl WizardState {
    /// Move to `index` and remember it as visited.
    pub fn move_to(&mut self, index: usize) {
        self.active_index = index;
        self.visited.insert(index);
    }

    /// Mark the active section as passed and step forward.
    pub fn advance(&mut self) -> usize {
        self.errors.clear();
        self.completed.insert(self.active_index);
        self.move_to(self.active_index + 1);
        self.active_index
    }

    /// Switch phase. Returns an error on an invalid transition.
    pub fn transition(&mut self, target: WizardPhase) -> Result<(), String> {
        if !self.phase.can_transition_to(target) {
            return Err(format!("Cannot transition from {} to {}", self.phase, target));
        }
        self.phase = target;
        Ok(())
    }
}
