//! Section definitions: the ordered steps of a wizard and their requirements.

use std::fmt;
use std::sync::Arc;

use super::record::{FieldValue, FormRecord};
use crate::render::FieldRenderer;

/// Message used when a required field is left empty.
pub const REQUIRED_MESSAGE: &str = "This field is required";

type Predicate = dyn Fn(&FormRecord) -> bool + Send + Sync;

/// A predicate over the current record that switches a requirement (or a
/// rendered field) on and off.
#[derive(Clone)]
pub struct Condition {
    description: String,
    keys: Vec<&'static str>,
    predicate: Arc<Predicate>,
}

impl Condition {
    /// Arbitrary predicate. `keys` lists the fields it reads, so flow
    /// construction can check they are declared.
    pub fn new<F>(description: impl Into<String>, keys: &[&'static str], predicate: F) -> Self
    where
        F: Fn(&FormRecord) -> bool + Send + Sync + 'static,
    {
        Self {
            description: description.into(),
            keys: keys.to_vec(),
            predicate: Arc::new(predicate),
        }
    }

    /// Holds while `key` equals `value` exactly.
    pub fn equals(key: &'static str, value: impl Into<FieldValue>) -> Self {
        let value = value.into();
        let description = format!("{key} == {value:?}");
        Self::new(description, &[key], move |record| {
            record.get(key) == Some(&value)
        })
    }

    /// Holds while the flag `key` is true.
    pub fn is_true(key: &'static str) -> Self {
        Self::equals(key, true)
    }

    pub fn holds(&self, record: &FormRecord) -> bool {
        (self.predicate)(record)
    }

    /// Fields this condition reads.
    pub fn keys(&self) -> &[&'static str] {
        &self.keys
    }
}

impl fmt::Debug for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Condition").field(&self.description).finish()
    }
}

/// What a required field must look like to pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    /// Non-empty text, non-empty list, or any answered flag.
    Present,
    /// A flag that must be checked (consent, waiver).
    Accepted,
}

/// One entry in a section's requirement list.
#[derive(Debug, Clone)]
pub struct Requirement {
    pub field: &'static str,
    pub rule: Rule,
    /// When set, the requirement only applies while the condition holds.
    pub condition: Option<Condition>,
    message: Option<String>,
}

impl Requirement {
    pub fn present(field: &'static str) -> Self {
        Self {
            field,
            rule: Rule::Present,
            condition: None,
            message: None,
        }
    }

    pub fn accepted(field: &'static str) -> Self {
        Self {
            field,
            rule: Rule::Accepted,
            condition: None,
            message: None,
        }
    }

    pub fn when(mut self, condition: Condition) -> Self {
        self.condition = Some(condition);
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Whether this requirement is part of the effective set for `record`.
    pub fn applies(&self, record: &FormRecord) -> bool {
        self.condition.as_ref().is_none_or(|c| c.holds(record))
    }

    pub fn is_satisfied(&self, record: &FormRecord) -> bool {
        match self.rule {
            Rule::Present => record.is_filled(self.field),
            Rule::Accepted => record.flag(self.field) == Some(true),
        }
    }

    /// Message reported when the requirement fails.
    pub fn message(&self) -> &str {
        self.message.as_deref().unwrap_or(REQUIRED_MESSAGE)
    }
}

/// A single step of the wizard.
#[derive(Clone)]
pub struct SectionSpec {
    pub label: String,
    pub requirements: Vec<Requirement>,
    pub renderer: Arc<dyn FieldRenderer>,
}

impl SectionSpec {
    pub fn new(label: impl Into<String>, renderer: impl FieldRenderer + 'static) -> Self {
        Self {
            label: label.into(),
            requirements: Vec::new(),
            renderer: Arc::new(renderer),
        }
    }

    /// Require each of `fields` to be non-empty.
    pub fn require(mut self, fields: &[&'static str]) -> Self {
        self.requirements
            .extend(fields.iter().copied().map(Requirement::present));
        self
    }

    /// Like [`require`](Self::require), each field with its own message.
    pub fn require_with_messages(mut self, fields: &[(&'static str, &str)]) -> Self {
        self.requirements.extend(
            fields
                .iter()
                .map(|&(field, message)| Requirement::present(field).with_message(message)),
        );
        self
    }

    /// Require `field` to be non-empty only while `condition` holds.
    pub fn require_when(mut self, field: &'static str, condition: Condition) -> Self {
        self.requirements
            .push(Requirement::present(field).when(condition));
        self
    }

    /// Require the flag `field` to be checked.
    pub fn require_accepted(mut self, field: &'static str, message: impl Into<String>) -> Self {
        self.requirements
            .push(Requirement::accepted(field).with_message(message));
        self
    }

    /// Requirements that apply to the current record.
    pub fn effective_requirements<'a>(
        &'a self,
        record: &'a FormRecord,
    ) -> impl Iterator<Item = &'a Requirement> + 'a {
        self.requirements.iter().filter(move |r| r.applies(record))
    }
}

impl fmt::Debug for SectionSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SectionSpec")
            .field("label", &self.label)
            .field("requirements", &self.requirements)
            .finish_non_exhaustive()
    }
}
