//! General workshop registration.

use crate::error::WizardError;
use crate::render::{FormRenderer, InputKind, options};
use crate::wizard::{
    Condition, FieldSpec, FlowDefinition, FlowEndpoints, JumpPolicy, ResetRule, SectionSpec,
    SubmitPolicy, TransformTable, WireTransform,
};

pub const FLOW_ID: &str = "workshop";

const LEVELS: &[&str] = &["Beginner", "Intermediate", "Advanced"];

pub fn definition(endpoints: FlowEndpoints) -> Result<FlowDefinition, WizardError> {
    let attended = || Condition::equals("previousWorkshops", "yes");

    FlowDefinition::builder(FLOW_ID, "Workshop Registration", endpoints)
        .fields([
            FieldSpec::text("fullName"),
            FieldSpec::text("dob"),
            FieldSpec::text("gender"),
            FieldSpec::text("phone"),
            FieldSpec::text("email"),
            FieldSpec::text("street"),
            FieldSpec::text("city"),
            FieldSpec::text("state"),
            FieldSpec::text("zip"),
            FieldSpec::text("workshopTitle"),
            FieldSpec::text("workshopDate"),
            FieldSpec::text("workshopTime"),
            FieldSpec::text("location"),
            FieldSpec::text("emergencyName"),
            FieldSpec::text("emergencyRelationship"),
            FieldSpec::text("emergencyPhone"),
            FieldSpec::text("goals"),
            FieldSpec::text("previousWorkshops"),
            FieldSpec::text("workshopLevel"),
            FieldSpec::flag("waiverAgreement"),
        ])
        .section(
            SectionSpec::new(
                "Personal Information",
                FormRenderer::new()
                    .text("fullName", "Full Name")
                    .field("dob", "Date of Birth", InputKind::Date)
                    .text("gender", "Gender")
                    .field("phone", "Phone", InputKind::Phone)
                    .field("email", "Email", InputKind::Email)
                    .text("street", "Street")
                    .text("city", "City")
                    .text("state", "State")
                    .text("zip", "Zip"),
            )
            .require(&[
                "fullName", "dob", "gender", "phone", "email", "street", "city", "state", "zip",
            ]),
        )
        .section(
            SectionSpec::new(
                "Workshop Details",
                FormRenderer::new()
                    .text("workshopTitle", "Workshop Title")
                    .field("workshopDate", "Workshop Date", InputKind::Date)
                    .field("workshopTime", "Workshop Time", InputKind::Time)
                    .text("location", "Location"),
            )
            .require(&["workshopTitle", "workshopDate", "workshopTime", "location"]),
        )
        .section(
            SectionSpec::new(
                "Emergency Contact",
                FormRenderer::new()
                    .text("emergencyName", "Name")
                    .text("emergencyRelationship", "Relationship")
                    .field("emergencyPhone", "Phone", InputKind::Phone),
            )
            .require(&["emergencyName", "emergencyRelationship", "emergencyPhone"]),
        )
        .section(
            SectionSpec::new(
                "Workshop Preferences",
                FormRenderer::new()
                    .field(
                        "goals",
                        "Do you have any specific goals for the workshop?",
                        InputKind::TextArea,
                    )
                    .field(
                        "previousWorkshops",
                        "Have you attended any previous workshops?",
                        InputKind::Radio {
                            options: options(&["yes", "no"]),
                        },
                    )
                    .field_when(
                        "workshopLevel",
                        "If yes, please specify the level:",
                        InputKind::Radio {
                            options: options(LEVELS),
                        },
                        attended(),
                    ),
            )
            .require(&["goals", "previousWorkshops"])
            .require_when("workshopLevel", attended()),
        )
        .section(
            SectionSpec::new(
                "Waiver and Consent",
                FormRenderer::new().field(
                    "waiverAgreement",
                    "I agree to the waiver and terms",
                    InputKind::Checkbox,
                ),
            )
            .require_accepted("waiverAgreement", "You must agree to the waiver and terms."),
        )
        .reset(ResetRule::new("previousWorkshops", "no", &["workshopLevel"]))
        .transforms(TransformTable::new().with("previousWorkshops", WireTransform::YesNo))
        .jump_policy(JumpPolicy::Free)
        .submit_policy(SubmitPolicy::RequireComplete)
        .success_message("Your registration has been submitted.")
        .build()
}
