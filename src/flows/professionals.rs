//! Working professionals men's support group.

use crate::error::WizardError;
use crate::render::{FormRenderer, InputKind, options};
use crate::wizard::{
    FieldSpec, FlowDefinition, FlowEndpoints, JumpPolicy, SectionSpec, SubmitPolicy,
    TransformTable, WireTransform,
};

pub const FLOW_ID: &str = "professionals";

const CONTACT_METHODS: &[&str] = &["email", "phone", "whatsapp"];
const PRONOUNS: &[&str] = &["he/him", "they/them", "other"];
const COUNTRIES: &[&str] = &["USA", "Canada"];

const TOPICS: &[&str] = &[
    "Balancing Work and Family",
    "Managing Career Stress and Burnout",
    "Mental Health and Wellbeing",
    "Leadership and Personal Development",
    "Workplace Conflicts",
    "Coping with Work-Related Anxiety",
    "Work-Life Balance",
    "Addiction and Coping Strategies",
];

const REASONS: &[&str] = &[
    "Seeking support",
    "Sharing experiences",
    "Learning coping strategies",
    "Building community",
    "Networking with professionals",
    "Personal growth and self-reflection",
];

pub fn definition(endpoints: FlowEndpoints) -> Result<FlowDefinition, WizardError> {
    let select = |items: &[&str]| InputKind::Select {
        options: options(items),
    };

    FlowDefinition::builder(
        FLOW_ID,
        "Working Professionals Men's Support Group Registration",
        endpoints,
    )
    .fields([
        FieldSpec::text("fullName"),
        FieldSpec::text("email"),
        FieldSpec::text("phone"),
        FieldSpec::text("preferredContactMethod"),
        FieldSpec::text("preferredPronouns"),
        FieldSpec::text("countryOfResidence"),
        FieldSpec::text("currentOccupation"),
        FieldSpec::text("industry"),
        FieldSpec::list("topicsOfInterest"),
        FieldSpec::text("otherTopic"),
        FieldSpec::text("participatedInSupportGroup"),
        FieldSpec::list("reasonsForJoining"),
        FieldSpec::text("heardAboutUs"),
        FieldSpec::list("preferredMeetingTimes"),
        FieldSpec::text("emergencyContactName"),
        FieldSpec::text("emergencyContactRelationship"),
        FieldSpec::text("emergencyContactPhone"),
        FieldSpec::flag("confidentialityAgreement"),
        FieldSpec::text("paymentMethod").with_initial("link"),
    ])
    .section(
        SectionSpec::new(
            "Personal Information",
            FormRenderer::new()
                .text("fullName", "Full Name")
                .field("email", "Email Address", InputKind::Email)
                .field("phone", "Phone Number", InputKind::Phone)
                .field(
                    "preferredContactMethod",
                    "Preferred Contact Method",
                    select(CONTACT_METHODS),
                )
                .field("preferredPronouns", "Preferred Pronouns", select(PRONOUNS)),
        )
        .require_with_messages(&[
            ("fullName", "Full name is required"),
            ("email", "Email is required"),
            ("phone", "Phone number is required"),
            ("preferredContactMethod", "Preferred contact method is required"),
            ("preferredPronouns", "Preferred pronouns are required"),
        ]),
    )
    .section(
        SectionSpec::new(
            "Professional Background",
            FormRenderer::new()
                .field("countryOfResidence", "Country of Residence", select(COUNTRIES))
                .text("currentOccupation", "Current Occupation")
                .text("industry", "Industry"),
        )
        .require_with_messages(&[
            ("countryOfResidence", "Country is required"),
            ("currentOccupation", "Occupation is required"),
            ("industry", "Industry is required"),
        ]),
    )
    .section(
        SectionSpec::new(
            "Group Interest & Participation",
            FormRenderer::new()
                .field(
                    "topicsOfInterest",
                    "Topics of Interest",
                    InputKind::MultiSelect {
                        options: options(TOPICS),
                    },
                )
                .text("otherTopic", "Other (please specify)")
                .field(
                    "participatedInSupportGroup",
                    "Have you participated in a support group before?",
                    InputKind::Radio {
                        options: options(&["yes", "no"]),
                    },
                )
                .field(
                    "reasonsForJoining",
                    "Main Reasons for Joining",
                    InputKind::MultiSelect {
                        options: options(REASONS),
                    },
                )
                .text("heardAboutUs", "How did you hear about us?"),
        )
        .require_with_messages(&[
            ("topicsOfInterest", "Please select at least one topic of interest"),
            (
                "participatedInSupportGroup",
                "Please answer if you participated in a support group before",
            ),
            ("reasonsForJoining", "Please select at least one reason for joining"),
            ("heardAboutUs", "Please tell us how you heard about us"),
        ]),
    )
    .section(
        SectionSpec::new(
            "Emergency Contact",
            FormRenderer::new()
                .text("emergencyContactName", "Emergency Contact Name")
                .text("emergencyContactRelationship", "Emergency Contact Relationship")
                .field("emergencyContactPhone", "Emergency Contact Phone", InputKind::Phone),
        )
        .require_with_messages(&[
            ("emergencyContactName", "Emergency contact name is required"),
            (
                "emergencyContactRelationship",
                "Emergency contact relationship is required",
            ),
            ("emergencyContactPhone", "Emergency contact phone is required"),
        ]),
    )
    .section(
        SectionSpec::new(
            "Confidentiality",
            FormRenderer::new().field(
                "confidentialityAgreement",
                "I agree to the confidentiality agreement",
                InputKind::Checkbox,
            ),
        )
        .require_accepted(
            "confidentialityAgreement",
            "You must agree to the confidentiality agreement",
        ),
    )
    .transforms(TransformTable::new().with("participatedInSupportGroup", WireTransform::YesNo))
    .jump_policy(JumpPolicy::VisitedOnly)
    .submit_policy(SubmitPolicy::DeferToGateway)
    .success_message("Your registration has been submitted.")
    .build()
}
