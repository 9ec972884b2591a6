//! Multi-step registration wizard.
//!
//! A wizard is built from a [`FlowDefinition`]: declared fields, an ordered
//! list of sections with their required fields, reset rules and the wire
//! transform table. A [`WizardController`] owns one visitor's record and
//! navigation state and drives validation and submission.

pub mod controller;
pub mod flow;
pub mod record;
pub mod section;
pub mod state;
pub mod transform;
pub mod validation;

pub use controller::{
    EditOutcome, NavOutcome, SectionStatus, SectionView, SubmitOutcome, SubmitRejection,
    WizardController, WizardSnapshot,
};
pub use flow::{FlowBuilder, FlowDefinition, FlowEndpoints, JumpPolicy, ResetRule, SubmitPolicy};
pub use record::{FieldKind, FieldSpec, FieldValue, FormRecord};
pub use section::{Condition, REQUIRED_MESSAGE, Requirement, Rule, SectionSpec};
pub use state::{WizardPhase, WizardState};
pub use transform::{TransformTable, WirePayload, WireTransform};
pub use validation::FieldErrors;
