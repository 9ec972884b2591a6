//! Required-field validation over sections and whole forms.

use std::collections::BTreeMap;

use super::record::FormRecord;
use super::section::SectionSpec;

/// Field key → message for every field that failed validation.
pub type FieldErrors = BTreeMap<String, String>;

/// Validate one section against the record. Empty map means it passes.
pub fn validate_section(section: &SectionSpec, record: &FormRecord) -> FieldErrors {
    section
        .effective_requirements(record)
        .filter(|r| !r.is_satisfied(record))
        .map(|r| (r.field.to_string(), r.message().to_string()))
        .collect()
}

pub fn section_passes(section: &SectionSpec, record: &FormRecord) -> bool {
    section
        .effective_requirements(record)
        .all(|r| r.is_satisfied(record))
}

/// Index of the first section whose effective requirements are not met.
pub fn first_incomplete_section(sections: &[SectionSpec], record: &FormRecord) -> Option<usize> {
    sections.iter().position(|s| !section_passes(s, record))
}

/// Whether every section passes. Always derived from the current record.
pub fn is_form_complete(sections: &[SectionSpec], record: &FormRecord) -> bool {
    first_incomplete_section(sections, record).is_none()
}
