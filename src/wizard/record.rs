//! Form record: the accumulated answers of one registration session.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A single answer value.
///
/// Deserializes from plain JSON: a string, a boolean, an array of strings,
/// or `null` for [`FieldValue::Unset`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Text(String),
    Flag(bool),
    List(Vec<String>),
    Unset,
}

impl FieldValue {
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    pub fn list<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::List(items.into_iter().map(Into::into).collect())
    }

    /// Whether the value counts as answered.
    ///
    /// Text must contain something other than whitespace, lists must hold at
    /// least one item, and any flag (true or false) is an answer.
    pub fn is_filled(&self) -> bool {
        match self {
            Self::Text(s) => !s.trim().is_empty(),
            Self::Flag(_) => true,
            Self::List(items) => !items.is_empty(),
            Self::Unset => false,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn as_flag(&self) -> Option<bool> {
        match self {
            Self::Flag(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            Self::List(items) => Some(items.as_slice()),
            _ => None,
        }
    }

    /// Short shape name used in error messages.
    pub fn shape(&self) -> &'static str {
        match self {
            Self::Text(_) => "text",
            Self::Flag(_) => "flag",
            Self::List(_) => "list",
            Self::Unset => "unset",
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        Self::Flag(value)
    }
}

impl From<Vec<String>> for FieldValue {
    fn from(value: Vec<String>) -> Self {
        Self::List(value)
    }
}

/// Declared shape of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Text,
    Flag,
    List,
}

impl FieldKind {
    /// The value a field of this kind is reset to.
    pub fn empty_value(self) -> FieldValue {
        match self {
            Self::Text => FieldValue::Text(String::new()),
            Self::Flag => FieldValue::Flag(false),
            Self::List => FieldValue::List(Vec::new()),
        }
    }

    /// Whether `value` has this shape. `Unset` fits every kind.
    pub fn accepts(self, value: &FieldValue) -> bool {
        matches!(
            (self, value),
            (_, FieldValue::Unset)
                | (Self::Text, FieldValue::Text(_))
                | (Self::Flag, FieldValue::Flag(_))
                | (Self::List, FieldValue::List(_))
        )
    }
}

impl std::fmt::Display for FieldKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Text => "text",
            Self::Flag => "flag",
            Self::List => "list",
        };
        write!(f, "{s}")
    }
}

/// Declaration of one field in a flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSpec {
    pub key: &'static str,
    pub kind: FieldKind,
    pub initial: FieldValue,
}

impl FieldSpec {
    pub fn text(key: &'static str) -> Self {
        Self::new(key, FieldKind::Text)
    }

    pub fn flag(key: &'static str) -> Self {
        Self::new(key, FieldKind::Flag)
    }

    pub fn list(key: &'static str) -> Self {
        Self::new(key, FieldKind::List)
    }

    fn new(key: &'static str, kind: FieldKind) -> Self {
        Self {
            key,
            kind,
            initial: kind.empty_value(),
        }
    }

    /// Start the field unanswered (e.g. a yes/no radio nobody picked yet).
    pub fn unset(mut self) -> Self {
        self.initial = FieldValue::Unset;
        self
    }

    pub fn with_initial(mut self, value: impl Into<FieldValue>) -> Self {
        self.initial = value.into();
        self
    }
}

/// Mapping from field key to answer.
///
/// Only the wizard controller mutates a record; everything else reads it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FormRecord {
    values: BTreeMap<String, FieldValue>,
}

impl FormRecord {
    /// Build a record holding every declared field at its initial value.
    pub fn from_fields(fields: &[FieldSpec]) -> Self {
        let values = fields
            .iter()
            .map(|f| (f.key.to_string(), f.initial.clone()))
            .collect();
        Self { values }
    }

    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        self.values.get(key)
    }

    /// Whether `key` holds an answered value. Missing keys are unanswered.
    pub fn is_filled(&self, key: &str) -> bool {
        self.get(key).is_some_and(FieldValue::is_filled)
    }

    pub fn text(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(FieldValue::as_text)
    }

    pub fn flag(&self, key: &str) -> Option<bool> {
        self.get(key).and_then(FieldValue::as_flag)
    }

    pub fn list(&self, key: &str) -> Option<&[String]> {
        self.get(key).and_then(FieldValue::as_list)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub(crate) fn set(&mut self, key: &str, value: FieldValue) {
        self.values.insert(key.to_string(), value);
    }
}
