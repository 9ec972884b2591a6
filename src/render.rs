//! Field rendering: turns the current record and errors into a
//! serializable description of the active section.
//!
//! Renderers never mutate the record. The hosting page draws the returned
//! view and reports every edit back through the wizard controller.

use serde::Serialize;

use crate::wizard::{Condition, FieldErrors, FieldValue, FormRecord};

/// The kind of input a field is drawn with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InputKind {
    Text,
    Email,
    Phone,
    Number,
    Date,
    Time,
    TextArea,
    Checkbox,
    YesNo,
    Select { options: Vec<String> },
    Radio { options: Vec<String> },
    MultiSelect { options: Vec<String> },
}

/// One drawn field.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldView {
    pub key: String,
    pub label: String,
    pub input: InputKind,
    pub value: FieldValue,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// What a renderer produces for a section.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SectionBody {
    /// Static copy shown above the fields (fees, agreement text).
    pub notes: Vec<String>,
    pub fields: Vec<FieldView>,
}

/// Rendering capability carried by each section.
pub trait FieldRenderer: Send + Sync {
    fn render(&self, record: &FormRecord, errors: &FieldErrors) -> SectionBody;
}

/// A field as declared for rendering.
#[derive(Debug, Clone)]
pub struct FieldPrompt {
    pub key: &'static str,
    pub label: String,
    pub input: InputKind,
    /// Hidden unless the condition holds.
    pub visible_when: Option<Condition>,
}

/// Declarative renderer: a list of prompts plus optional notes.
#[derive(Debug, Clone, Default)]
pub struct FormRenderer {
    notes: Vec<String>,
    prompts: Vec<FieldPrompt>,
}

impl FormRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn note(mut self, text: impl Into<String>) -> Self {
        self.notes.push(text.into());
        self
    }

    pub fn field(mut self, key: &'static str, label: impl Into<String>, input: InputKind) -> Self {
        self.prompts.push(FieldPrompt {
            key,
            label: label.into(),
            input,
            visible_when: None,
        });
        self
    }

    pub fn text(self, key: &'static str, label: impl Into<String>) -> Self {
        self.field(key, label, InputKind::Text)
    }

    /// Add a field that is only drawn while `condition` holds.
    pub fn field_when(
        mut self,
        key: &'static str,
        label: impl Into<String>,
        input: InputKind,
        condition: Condition,
    ) -> Self {
        self.prompts.push(FieldPrompt {
            key,
            label: label.into(),
            input,
            visible_when: Some(condition),
        });
        self
    }
}

impl FieldRenderer for FormRenderer {
    fn render(&self, record: &FormRecord, errors: &FieldErrors) -> SectionBody {
        let fields = self
            .prompts
            .iter()
            .filter(|p| p.visible_when.as_ref().is_none_or(|c| c.holds(record)))
            .map(|p| FieldView {
                key: p.key.to_string(),
                label: p.label.clone(),
                input: p.input.clone(),
                value: record.get(p.key).cloned().unwrap_or(FieldValue::Unset),
                error: errors.get(p.key).cloned(),
            })
            .collect();

        SectionBody {
            notes: self.notes.clone(),
            fields,
        }
    }
}

/// Build an owned option list from string literals.
pub fn options(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}
