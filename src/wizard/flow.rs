//! Flow definitions: the static configuration a wizard is built from.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::record::{FieldSpec, FieldValue};
use super::section::SectionSpec;
use super::transform::TransformTable;
use crate::error::WizardError;

/// Whether clickable step indicators may move the wizard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JumpPolicy {
    /// Step indicators are render-only.
    Disabled,
    /// Jumps allowed to sections already visited.
    VisitedOnly,
    /// Any section may be jumped to.
    Free,
}

/// What `submit` requires before calling the gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmitPolicy {
    /// Every section must pass validation.
    RequireComplete,
    /// Send as-is and let the intake endpoint reject incomplete records.
    DeferToGateway,
}

/// Where a flow submits to and where the visitor goes afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowEndpoints {
    pub submit_url: String,
    pub redirect_url: String,
}

impl FlowEndpoints {
    pub fn new(submit_url: impl Into<String>, redirect_url: impl Into<String>) -> Self {
        Self {
            submit_url: submit_url.into(),
            redirect_url: redirect_url.into(),
        }
    }
}

/// Compound edit: setting `governor` to `trigger` resets `dependents` to
/// their empty value so stale answers cannot be submitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResetRule {
    pub governor: &'static str,
    pub trigger: FieldValue,
    pub dependents: Vec<&'static str>,
}

impl ResetRule {
    pub fn new(
        governor: &'static str,
        trigger: impl Into<FieldValue>,
        dependents: &[&'static str],
    ) -> Self {
        Self {
            governor,
            trigger: trigger.into(),
            dependents: dependents.to_vec(),
        }
    }
}

/// A complete registration flow.
#[derive(Debug, Clone)]
pub struct FlowDefinition {
    pub id: String,
    pub title: String,
    pub fields: Vec<FieldSpec>,
    pub sections: Vec<SectionSpec>,
    pub resets: Vec<ResetRule>,
    pub transforms: TransformTable,
    pub jump_policy: JumpPolicy,
    pub submit_policy: SubmitPolicy,
    pub endpoints: FlowEndpoints,
    pub success_message: String,
}

impl FlowDefinition {
    pub fn builder(
        id: impl Into<String>,
        title: impl Into<String>,
        endpoints: FlowEndpoints,
    ) -> FlowBuilder {
        FlowBuilder {
            flow: FlowDefinition {
                id: id.into(),
                title: title.into(),
                fields: Vec::new(),
                sections: Vec::new(),
                resets: Vec::new(),
                transforms: TransformTable::new(),
                jump_policy: JumpPolicy::Disabled,
                submit_policy: SubmitPolicy::RequireComplete,
                endpoints,
                success_message: "Your form has been submitted.".to_string(),
            },
        }
    }

    pub fn field(&self, key: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.key == key)
    }

    pub fn last_index(&self) -> usize {
        self.sections.len().saturating_sub(1)
    }

    /// Check that every key the flow references is declared.
    fn check(&self) -> Result<(), WizardError> {
        if self.sections.is_empty() {
            return Err(WizardError::EmptyFlow {
                flow: self.id.clone(),
            });
        }

        let declared: HashSet<&str> = self.fields.iter().map(|f| f.key).collect();
        let undeclared = |section: &str, key: &str| WizardError::UndeclaredRequirement {
            section: section.to_string(),
            key: key.to_string(),
        };

        for section in &self.sections {
            for req in &section.requirements {
                if !declared.contains(req.field) {
                    return Err(undeclared(&section.label, req.field));
                }
                let condition_keys = req.condition.iter().flat_map(|c| c.keys());
                for key in condition_keys {
                    if !declared.contains(key) {
                        return Err(undeclared(&section.label, key));
                    }
                }
            }
        }

        for rule in &self.resets {
            for key in std::iter::once(&rule.governor).chain(&rule.dependents) {
                if !declared.contains(key) {
                    return Err(undeclared("reset rules", key));
                }
            }
        }

        for key in self.transforms.keys() {
            if !declared.contains(key) {
                return Err(undeclared("transforms", key));
            }
        }

        Ok(())
    }
}

/// Builder for [`FlowDefinition`]; `build` checks the definition.
pub struct FlowBuilder {
    flow: FlowDefinition,
}

impl FlowBuilder {
    pub fn field(mut self, field: FieldSpec) -> Self {
        self.flow.fields.push(field);
        self
    }

    pub fn fields(mut self, fields: impl IntoIterator<Item = FieldSpec>) -> Self {
        self.flow.fields.extend(fields);
        self
    }

    pub fn section(mut self, section: SectionSpec) -> Self {
        self.flow.sections.push(section);
        self
    }

    pub fn reset(mut self, rule: ResetRule) -> Self {
        self.flow.resets.push(rule);
        self
    }

    pub fn transforms(mut self, table: TransformTable) -> Self {
        self.flow.transforms = table;
        self
    }

    pub fn jump_policy(mut self, policy: JumpPolicy) -> Self {
        self.flow.jump_policy = policy;
        self
    }

    pub fn submit_policy(mut self, policy: SubmitPolicy) -> Self {
        self.flow.submit_policy = policy;
        self
    }

    pub fn success_message(mut self, message: impl Into<String>) -> Self {
        self.flow.success_message = message.into();
        self
    }

    pub fn build(self) -> Result<FlowDefinition, WizardError> {
        self.flow.check()?;
        Ok(self.flow)
    }
}
