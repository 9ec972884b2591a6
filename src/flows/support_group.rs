//! Monthly support group for mothers raising children with special needs.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::error::WizardError;
use crate::render::{FormRenderer, InputKind};
use crate::wizard::{
    Condition, FieldSpec, FlowDefinition, FlowEndpoints, JumpPolicy, ResetRule, SectionSpec,
    SubmitPolicy, TransformTable, WireTransform,
};

pub const FLOW_ID: &str = "support-group";

pub const DEFAULT_SUBMIT_URL: &str = "https://admin.harmoniemente.com/api/public/support-group";
pub const DEFAULT_REDIRECT_URL: &str =
    "https://book.carepatron.com/Harmonie-Mente-/All?p=jHVgIDhDTrOzfpa6dFuRjQ&i=dDw79KM7";

/// Session fee shown on the payment step. Payment itself happens elsewhere.
pub const SESSION_FEE: Decimal = dec!(50);

pub fn default_endpoints() -> FlowEndpoints {
    FlowEndpoints::new(DEFAULT_SUBMIT_URL, DEFAULT_REDIRECT_URL)
}

pub fn definition(endpoints: FlowEndpoints) -> Result<FlowDefinition, WizardError> {
    let participated = || Condition::is_true("previousGroupParticipation");

    FlowDefinition::builder(FLOW_ID, "Support Group Registration", endpoints)
        .fields([
            FieldSpec::text("fullName"),
            FieldSpec::text("email"),
            FieldSpec::text("phone"),
            FieldSpec::text("street"),
            FieldSpec::text("city"),
            FieldSpec::text("state"),
            FieldSpec::text("zip"),
            FieldSpec::text("country"),
            FieldSpec::text("childFirstName"),
            FieldSpec::text("childAge"),
            FieldSpec::text("diagnosis"),
            FieldSpec::text("primaryCaregiver"),
            FieldSpec::text("groupChallenges"),
            FieldSpec::text("reasonsForJoining"),
            FieldSpec::text("goals"),
            FieldSpec::flag("previousGroupParticipation").unset(),
            FieldSpec::text("previousGroupDetails"),
            FieldSpec::flag("agreementSigned"),
        ])
        .section(
            SectionSpec::new(
                "Personal Information",
                FormRenderer::new()
                    .text("fullName", "Full Name")
                    .field("email", "Email", InputKind::Email)
                    .field("phone", "Phone", InputKind::Phone)
                    .text("street", "Street")
                    .text("city", "City")
                    .text("state", "State")
                    .text("zip", "Zip")
                    .text("country", "Country"),
            )
            .require(&[
                "fullName", "email", "phone", "street", "city", "state", "zip", "country",
            ]),
        )
        .section(
            SectionSpec::new(
                "Child's Information",
                FormRenderer::new()
                    .text("childFirstName", "Child First Name")
                    .field("childAge", "Child Age", InputKind::Number)
                    .text("diagnosis", "Diagnosis")
                    .text("primaryCaregiver", "Primary Caregiver"),
            )
            .require(&["childFirstName", "childAge", "diagnosis", "primaryCaregiver"]),
        )
        .section(
            SectionSpec::new(
                "Support Needs and Group Preferences",
                FormRenderer::new()
                    .field(
                        "groupChallenges",
                        "What specific challenges or areas would you like to address in the group?",
                        InputKind::TextArea,
                    )
                    .field(
                        "reasonsForJoining",
                        "Why are you interested in joining this support group?",
                        InputKind::TextArea,
                    )
                    .field(
                        "goals",
                        "What would you hope to gain from participating in this support group?",
                        InputKind::TextArea,
                    )
                    .field(
                        "previousGroupParticipation",
                        "Have you participated in similar support groups before?",
                        InputKind::YesNo,
                    )
                    .field_when(
                        "previousGroupDetails",
                        "If yes, please specify",
                        InputKind::TextArea,
                        participated(),
                    ),
            )
            .require(&[
                "groupChallenges",
                "reasonsForJoining",
                "goals",
                "previousGroupParticipation",
            ])
            .require_when("previousGroupDetails", participated()),
        )
        .section(SectionSpec::new(
            "Payment Information",
            FormRenderer::new()
                .note(format!("Workshop Fee: ${SESSION_FEE}"))
                .note("Payment Method: Secure payment link (provided upon registration)"),
        ))
        .section(
            SectionSpec::new(
                "Confidentiality Agreement",
                FormRenderer::new()
                    .note(
                        "All discussions in the support group will remain confidential \
                         and will not be shared outside the group.",
                    )
                    .field(
                        "agreementSigned",
                        "I agree to the confidentiality agreement.",
                        InputKind::Checkbox,
                    ),
            )
            .require_accepted(
                "agreementSigned",
                "You must agree to the confidentiality agreement.",
            ),
        )
        .reset(ResetRule::new(
            "previousGroupParticipation",
            false,
            &["previousGroupDetails"],
        ))
        .transforms(
            TransformTable::new().with("previousGroupParticipation", WireTransform::YesNo),
        )
        .jump_policy(JumpPolicy::Disabled)
        .submit_policy(SubmitPolicy::DeferToGateway)
        .success_message("Your form has been submitted.")
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wizard::{FieldErrors, FormRecord, validation};

    #[test]
    fn payment_step_has_no_requirements_and_shows_fee() {
        let flow = definition(default_endpoints()).unwrap();
        let payment = &flow.sections[3];
        assert!(payment.requirements.is_empty());

        let record = FormRecord::from_fields(&flow.fields);
        let body = payment.renderer.render(&record, &FieldErrors::new());
        assert!(body.fields.is_empty());
        assert_eq!(body.notes[0], "Workshop Fee: $50");
    }

    #[test]
    fn details_hidden_and_optional_until_participation() {
        let flow = definition(default_endpoints()).unwrap();
        let prefs = &flow.sections[2];
        let mut record = FormRecord::from_fields(&flow.fields);
        for key in ["groupChallenges", "reasonsForJoining", "goals"] {
            record.set(key, "Something".into());
        }

        // Unanswered yes/no still blocks
        let errors = validation::validate_section(prefs, &record);
        assert_eq!(errors.keys().collect::<Vec<_>>(), ["previousGroupParticipation"]);

        record.set("previousGroupParticipation", false.into());
        assert!(validation::validate_section(prefs, &record).is_empty());
        let body = prefs.renderer.render(&record, &FieldErrors::new());
        assert!(body.fields.iter().all(|f| f.key != "previousGroupDetails"));

        record.set("previousGroupParticipation", true.into());
        let errors = validation::validate_section(prefs, &record);
        assert!(errors.contains_key("previousGroupDetails"));
        let body = prefs.renderer.render(&record, &FieldErrors::new());
        assert!(body.fields.iter().any(|f| f.key == "previousGroupDetails"));
    }

    #[test]
    fn participation_goes_out_as_yes_no() {
        let flow = definition(default_endpoints()).unwrap();
        let mut record = FormRecord::from_fields(&flow.fields);
        assert_eq!(flow.transforms.apply(&record)["previousGroupParticipation"], "no");
        record.set("previousGroupParticipation", true.into());
        assert_eq!(flow.transforms.apply(&record)["previousGroupParticipation"], "yes");
    }
}
