//! Wire transforms: how the record is flattened into the intake payload.

use std::collections::BTreeMap;

use serde_json::Value;

use super::record::{FieldValue, FormRecord};

/// JSON object posted to the intake endpoint.
pub type WirePayload = serde_json::Map<String, Value>;

/// Per-field conversion applied at submission time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WireTransform {
    /// Re-express the answer as the literal tokens `"yes"` / `"no"`.
    YesNo,
    /// Send text with surrounding whitespace removed.
    Trimmed,
}

impl WireTransform {
    fn apply(self, value: &FieldValue) -> Value {
        match self {
            Self::YesNo => {
                let yes = match value {
                    FieldValue::Flag(b) => *b,
                    FieldValue::Text(s) => s.trim().eq_ignore_ascii_case("yes"),
                    FieldValue::List(items) => !items.is_empty(),
                    FieldValue::Unset => false,
                };
                Value::String(if yes { "yes" } else { "no" }.to_string())
            }
            Self::Trimmed => match value {
                FieldValue::Text(s) => Value::String(s.trim().to_string()),
                other => plain(other),
            },
        }
    }
}

/// Untransformed wire value. Unanswered fields go out as empty strings.
fn plain(value: &FieldValue) -> Value {
    match value {
        FieldValue::Text(s) => Value::String(s.clone()),
        FieldValue::Flag(b) => Value::Bool(*b),
        FieldValue::List(items) => Value::Array(items.iter().cloned().map(Value::String).collect()),
        FieldValue::Unset => Value::String(String::new()),
    }
}

/// Declarative table of per-field transforms for one flow.
#[derive(Debug, Clone, Default)]
pub struct TransformTable {
    entries: BTreeMap<&'static str, WireTransform>,
}

impl TransformTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: &'static str, transform: WireTransform) -> Self {
        self.entries.insert(key, transform);
        self
    }

    pub fn keys(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.entries.keys().copied()
    }

    /// Flatten the whole record, applying each field's transform if any.
    pub fn apply(&self, record: &FormRecord) -> WirePayload {
        record
            .iter()
            .map(|(key, value)| {
                let wire = match self.entries.get(key) {
                    Some(t) => t.apply(value),
                    None => plain(value),
                };
                (key.to_string(), wire)
            })
            .collect()
    }
}
