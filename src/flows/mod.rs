//! Shipped registration flows.

pub mod professionals;
pub mod support_group;
pub mod workshop;

use crate::config::FlowSettings;
use crate::error::WizardError;
use crate::wizard::FlowDefinition;

/// Build every flow that has endpoints configured.
pub fn enabled(settings: &FlowSettings) -> Result<Vec<FlowDefinition>, WizardError> {
    let mut flows = Vec::new();
    if let Some(endpoints) = &settings.workshop {
        flows.push(workshop::definition(endpoints.clone())?);
    }
    if let Some(endpoints) = &settings.support_group {
        flows.push(support_group::definition(endpoints.clone())?);
    }
    if let Some(endpoints) = &settings.professionals {
        flows.push(professionals::definition(endpoints.clone())?);
    }
    Ok(flows)
}
