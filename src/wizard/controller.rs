//! The wizard controller owns one registration session: the form record,
//! the active section, validation and submission.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use super::flow::{FlowDefinition, JumpPolicy, SubmitPolicy};
use super::record::{FieldKind, FieldSpec, FieldValue, FormRecord};
use super::state::{WizardPhase, WizardState};
use super::validation::{self, FieldErrors};
use crate::error::WizardError;
use crate::gateway::SubmissionGateway;
use crate::notify::{GENERIC_FAILURE_MESSAGE, Notice, Notifier};
use crate::render::SectionBody;

/// Result of an edit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum EditOutcome {
    Applied {
        /// Dependent fields cleared by a reset rule.
        #[serde(skip_serializing_if = "Vec::is_empty")]
        reset: Vec<String>,
    },
    /// Edits are ignored while submitting or after submission.
    Ignored,
}

/// Result of a navigation request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum NavOutcome {
    Moved { from: usize, to: usize },
    /// Validation failed; the listed fields are in the error map.
    Blocked { invalid: Vec<String> },
    /// Already on the first (previous) or last (next) section.
    AtBoundary,
    /// The flow's jump policy forbids this jump.
    JumpDenied,
    /// Navigation is ignored while submitting or after submission.
    Ignored,
}

/// Why `submit` refused to call the gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmitRejection {
    NotOnFinalSection,
    /// The first section that does not pass validation.
    Incomplete { section: usize },
}

/// Result of a submit request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SubmitOutcome {
    Submitted { notice: Notice },
    Failed { notice: Notice },
    Rejected { reason: SubmitRejection },
    /// A submission is already in flight or done.
    Ignored,
}

/// Step indicator entry in a snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SectionStatus {
    pub index: usize,
    pub label: String,
    pub active: bool,
    pub completed: bool,
}

/// Everything the hosting page needs to draw the wizard chrome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WizardSnapshot {
    pub flow: String,
    pub title: String,
    pub phase: WizardPhase,
    pub active_index: usize,
    pub sections: Vec<SectionStatus>,
    pub errors: FieldErrors,
    pub record: FormRecord,
    pub form_complete: bool,
    pub can_go_back: bool,
    pub on_last_section: bool,
    pub submit_enabled: bool,
    pub jump_policy: JumpPolicy,
}

/// The active section drawn by its renderer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SectionView {
    pub index: usize,
    pub label: String,
    #[serde(flatten)]
    pub body: SectionBody,
}

struct Session {
    record: FormRecord,
    state: WizardState,
}

/// Coordinates step navigation, validation and submission for one session.
pub struct WizardController {
    flow: Arc<FlowDefinition>,
    gateway: Arc<dyn SubmissionGateway>,
    notifier: Arc<dyn Notifier>,
    session: RwLock<Session>,
}

impl WizardController {
    pub fn new(
        flow: Arc<FlowDefinition>,
        gateway: Arc<dyn SubmissionGateway>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let session = Session {
            record: FormRecord::from_fields(&flow.fields),
            state: WizardState::default(),
        };
        Self {
            flow,
            gateway,
            notifier,
            session: RwLock::new(session),
        }
    }

    pub fn flow(&self) -> &FlowDefinition {
        &self.flow
    }

    pub fn section_count(&self) -> usize {
        self.flow.sections.len()
    }

    // ── Edits ───────────────────────────────────────────────────────

    /// Replace the value of `key`. No validation happens here.
    ///
    /// If a reset rule is triggered, its dependent fields are cleared in the
    /// same step.
    pub async fn set_field(
        &self,
        key: &str,
        value: impl Into<FieldValue>,
    ) -> Result<EditOutcome, WizardError> {
        let value = value.into();
        let spec = self.declared(key)?;
        if !spec.kind.accepts(&value) {
            return Err(WizardError::FieldShape {
                key: key.to_string(),
                expected: spec.kind.to_string(),
                actual: value.shape().to_string(),
            });
        }

        let mut session = self.session.write().await;
        Ok(self.apply_edit(&mut session, key, value))
    }

    /// Multi-select edit: remove `item` from the list if present, append it
    /// otherwise. The read and the write happen under one guard.
    pub async fn toggle_item(&self, key: &str, item: &str) -> Result<EditOutcome, WizardError> {
        let spec = self.declared(key)?;
        if spec.kind != FieldKind::List {
            return Err(WizardError::FieldShape {
                key: key.to_string(),
                expected: FieldKind::List.to_string(),
                actual: spec.kind.to_string(),
            });
        }

        let mut session = self.session.write().await;
        let mut items = session
            .record
            .list(key)
            .map(<[String]>::to_vec)
            .unwrap_or_default();
        if let Some(pos) = items.iter().position(|i| i == item) {
            items.remove(pos);
        } else {
            items.push(item.to_string());
        }
        Ok(self.apply_edit(&mut session, key, FieldValue::List(items)))
    }

    fn declared(&self, key: &str) -> Result<&FieldSpec, WizardError> {
        self.flow
            .field(key)
            .ok_or_else(|| WizardError::UnknownField {
                key: key.to_string(),
            })
    }

    /// Write a shape-checked value with the session guard already held.
    fn apply_edit(&self, session: &mut Session, key: &str, value: FieldValue) -> EditOutcome {
        if !session.state.phase.is_editable() {
            debug!(flow = %self.flow.id, key, phase = %session.state.phase, "Edit ignored");
            return EditOutcome::Ignored;
        }

        let mut reset = Vec::new();
        for rule in self.flow.resets.iter().filter(|r| r.governor == key) {
            if rule.trigger != value {
                continue;
            }
            for dependent in &rule.dependents {
                if let Some(dep) = self.flow.field(dependent) {
                    session.record.set(dependent, dep.kind.empty_value());
                    reset.push(dependent.to_string());
                }
            }
        }
        session.record.set(key, value);

        EditOutcome::Applied { reset }
    }

    // ── Navigation ──────────────────────────────────────────────────

    /// Validate the active section and step forward if it passes.
    pub async fn go_to_next(&self) -> NavOutcome {
        let mut session = self.session.write().await;
        if !session.state.phase.is_editable() {
            return NavOutcome::Ignored;
        }

        let from = session.state.active_index;
        if from >= self.flow.last_index() {
            return NavOutcome::AtBoundary;
        }

        let errors = validation::validate_section(&self.flow.sections[from], &session.record);
        if !errors.is_empty() {
            let invalid: Vec<String> = errors.keys().cloned().collect();
            debug!(flow = %self.flow.id, section = from, ?invalid, "Section failed validation");
            session.state.errors = errors;
            return NavOutcome::Blocked { invalid };
        }

        let to = session.state.advance();
        info!(flow = %self.flow.id, from, to, "Section completed");
        NavOutcome::Moved { from, to }
    }

    /// Step back one section. Completion and errors are left alone.
    pub async fn go_to_previous(&self) -> NavOutcome {
        let mut session = self.session.write().await;
        if !session.state.phase.is_editable() {
            return NavOutcome::Ignored;
        }

        let from = session.state.active_index;
        if from == 0 {
            return NavOutcome::AtBoundary;
        }
        session.state.move_to(from - 1);
        NavOutcome::Moved { from, to: from - 1 }
    }

    /// Move straight to `index` without validating the section being left.
    pub async fn jump_to(&self, index: usize) -> Result<NavOutcome, WizardError> {
        let count = self.section_count();
        if index >= count {
            return Err(WizardError::StepOutOfRange { index, count });
        }

        let mut session = self.session.write().await;
        if !session.state.phase.is_editable() {
            return Ok(NavOutcome::Ignored);
        }

        let permitted = match self.flow.jump_policy {
            JumpPolicy::Disabled => false,
            JumpPolicy::VisitedOnly => session.state.visited.contains(&index),
            JumpPolicy::Free => true,
        };
        if !permitted {
            debug!(flow = %self.flow.id, index, policy = ?self.flow.jump_policy, "Jump denied");
            return Ok(NavOutcome::JumpDenied);
        }

        let from = session.state.active_index;
        session.state.move_to(index);
        Ok(NavOutcome::Moved { from, to: index })
    }

    // ── Queries ─────────────────────────────────────────────────────

    pub async fn is_section_complete(&self, index: usize) -> bool {
        self.session.read().await.state.completed.contains(&index)
    }

    /// Whether every section passes, derived from the current record.
    pub async fn is_form_complete(&self) -> bool {
        let session = self.session.read().await;
        validation::is_form_complete(&self.flow.sections, &session.record)
    }

    pub async fn active_index(&self) -> usize {
        self.session.read().await.state.active_index
    }

    pub async fn phase(&self) -> WizardPhase {
        self.session.read().await.state.phase
    }

    pub async fn errors(&self) -> FieldErrors {
        self.session.read().await.state.errors.clone()
    }

    pub async fn record(&self) -> FormRecord {
        self.session.read().await.record.clone()
    }

    pub async fn state(&self) -> WizardState {
        self.session.read().await.state.clone()
    }

    pub async fn snapshot(&self) -> WizardSnapshot {
        let session = self.session.read().await;
        let state = &session.state;
        let form_complete = validation::is_form_complete(&self.flow.sections, &session.record);
        let on_last_section = state.active_index == self.flow.last_index();

        let sections = self
            .flow
            .sections
            .iter()
            .enumerate()
            .map(|(index, s)| SectionStatus {
                index,
                label: s.label.clone(),
                active: index == state.active_index,
                completed: state.completed.contains(&index),
            })
            .collect();

        let submit_enabled = state.phase.is_editable()
            && on_last_section
            && (form_complete || self.flow.submit_policy == SubmitPolicy::DeferToGateway);

        WizardSnapshot {
            flow: self.flow.id.clone(),
            title: self.flow.title.clone(),
            phase: state.phase,
            active_index: state.active_index,
            sections,
            errors: state.errors.clone(),
            record: session.record.clone(),
            form_complete,
            can_go_back: state.phase.is_editable() && state.active_index > 0,
            on_last_section,
            submit_enabled,
            jump_policy: self.flow.jump_policy,
        }
    }

    /// Draw the active section with its renderer.
    pub async fn render_active(&self) -> SectionView {
        let session = self.session.read().await;
        let index = session.state.active_index;
        let section = &self.flow.sections[index];
        SectionView {
            index,
            label: section.label.clone(),
            body: section.renderer.render(&session.record, &session.state.errors),
        }
    }

    // ── Submission ──────────────────────────────────────────────────

    /// Send the record to the intake endpoint.
    ///
    /// The session is `Submitting` while the gateway call is pending; a
    /// second submit in that window is a no-op. On failure the session goes
    /// back to editing the last section with the record untouched.
    pub async fn submit(&self) -> SubmitOutcome {
        let payload = {
            let mut session = self.session.write().await;
            if !session.state.phase.is_editable() {
                debug!(flow = %self.flow.id, phase = %session.state.phase, "Submit ignored");
                return SubmitOutcome::Ignored;
            }

            let last = self.flow.last_index();
            if session.state.active_index != last {
                return SubmitOutcome::Rejected {
                    reason: SubmitRejection::NotOnFinalSection,
                };
            }

            if self.flow.submit_policy == SubmitPolicy::RequireComplete {
                let errors =
                    validation::validate_section(&self.flow.sections[last], &session.record);
                session.state.errors = errors;
                if let Some(section) =
                    validation::first_incomplete_section(&self.flow.sections, &session.record)
                {
                    debug!(flow = %self.flow.id, section, "Submit refused, form incomplete");
                    return SubmitOutcome::Rejected {
                        reason: SubmitRejection::Incomplete { section },
                    };
                }
            }

            if let Err(e) = session.state.transition(WizardPhase::Submitting) {
                warn!(flow = %self.flow.id, "{e}");
                return SubmitOutcome::Ignored;
            }
            self.flow.transforms.apply(&session.record)
        };

        info!(flow = %self.flow.id, fields = payload.len(), "Submitting registration");
        let result = self.gateway.submit(&payload).await;

        let outcome = {
            let mut session = self.session.write().await;
            match result {
                Ok(receipt) => {
                    session.state.phase = WizardPhase::Submitted;
                    info!(flow = %self.flow.id, status = receipt.status, "Registration submitted");
                    SubmitOutcome::Submitted {
                        notice: Notice::success(
                            self.flow.success_message.clone(),
                            self.flow.endpoints.redirect_url.clone(),
                        ),
                    }
                }
                Err(e) => {
                    session.state.phase = WizardPhase::Editing;
                    warn!(flow = %self.flow.id, error = %e, "Registration submission failed");
                    let message = e.visitor_message().unwrap_or(GENERIC_FAILURE_MESSAGE);
                    SubmitOutcome::Failed {
                        notice: Notice::failure(message),
                    }
                }
            }
        };

        if let SubmitOutcome::Submitted { notice } | SubmitOutcome::Failed { notice } = &outcome {
            self.notifier.notify(notice);
        }
        outcome
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;

    use super::*;
    use crate::error::GatewayError;
    use crate::gateway::GatewayReceipt;
    use crate::notify::Outcome;
    use crate::render::FormRenderer;
    use crate::wizard::{
        Condition, FieldSpec, FlowEndpoints, ResetRule, SectionSpec, TransformTable,
        WirePayload, WireTransform,
    };

    const REDIRECT: &str = "https://book.test/schedule";

    /// Gateway stub that records payloads and answers with a fixed result.
    struct StubGateway {
        calls: AtomicUsize,
        payloads: Mutex<Vec<WirePayload>>,
        result: Result<(), GatewayError>,
        delay: Duration,
    }

    impl StubGateway {
        fn ok() -> Arc<Self> {
            Self::with(Ok(()), Duration::ZERO)
        }

        fn failing(err: GatewayError) -> Arc<Self> {
            Self::with(Err(err), Duration::ZERO)
        }

        fn with(result: Result<(), GatewayError>, delay: Duration) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                payloads: Mutex::new(Vec::new()),
                result,
                delay,
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl SubmissionGateway for StubGateway {
        async fn submit(&self, payload: &WirePayload) -> Result<GatewayReceipt, GatewayError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.payloads.lock().unwrap().push(payload.clone());
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            self.result.clone().map(|()| GatewayReceipt { status: 200 })
        }
    }

    #[derive(Default)]
    struct RecordingNotifier {
        notices: Mutex<Vec<Notice>>,
    }

    impl Notifier for RecordingNotifier {
        fn notify(&self, notice: &Notice) {
            self.notices.lock().unwrap().push(notice.clone());
        }
    }

    fn flow(jump: JumpPolicy, submit: SubmitPolicy) -> Arc<FlowDefinition> {
        let flow = FlowDefinition::builder(
            "workshop",
            "Workshop Registration",
            FlowEndpoints::new("https://intake.test/workshop", REDIRECT),
        )
        .fields([
            FieldSpec::text("fullName"),
            FieldSpec::text("email"),
            FieldSpec::text("phone"),
            FieldSpec::text("goals"),
            FieldSpec::text("previousParticipation"),
            FieldSpec::text("details"),
            FieldSpec::list("topics"),
            FieldSpec::flag("hasAllergies").unset(),
            FieldSpec::text("allergyNotes"),
            FieldSpec::flag("waiverAgreement"),
        ])
        .section(
            SectionSpec::new("Personal Information", FormRenderer::new().text("fullName", "Full Name"))
                .require(&["fullName", "email", "phone"]),
        )
        .section(
            SectionSpec::new("Preferences", FormRenderer::new())
                .require(&["goals", "previousParticipation"])
                .require_when("details", Condition::equals("previousParticipation", "Yes")),
        )
        .section(
            SectionSpec::new("Waiver and Consent", FormRenderer::new())
                .require_accepted("waiverAgreement", "You must agree to the waiver."),
        )
        .reset(ResetRule::new("hasAllergies", false, &["allergyNotes"]))
        .transforms(TransformTable::new().with("hasAllergies", WireTransform::YesNo))
        .jump_policy(jump)
        .submit_policy(submit)
        .build()
        .unwrap();
        Arc::new(flow)
    }

    fn controller_with(
        gateway: Arc<StubGateway>,
        jump: JumpPolicy,
        submit: SubmitPolicy,
    ) -> (WizardController, Arc<RecordingNotifier>) {
        let notifier = Arc::new(RecordingNotifier::default());
        let ctrl = WizardController::new(flow(jump, submit), gateway, notifier.clone());
        (ctrl, notifier)
    }

    fn controller(gateway: Arc<StubGateway>) -> (WizardController, Arc<RecordingNotifier>) {
        controller_with(gateway, JumpPolicy::Free, SubmitPolicy::RequireComplete)
    }

    async fn fill_personal(ctrl: &WizardController) {
        ctrl.set_field("fullName", "Jane Doe").await.unwrap();
        ctrl.set_field("email", "jane@x.com").await.unwrap();
        ctrl.set_field("phone", "123").await.unwrap();
    }

    async fn walk_to_last(ctrl: &WizardController) {
        fill_personal(ctrl).await;
        assert!(matches!(ctrl.go_to_next().await, NavOutcome::Moved { from: 0, to: 1 }));
        ctrl.set_field("goals", "Less stress").await.unwrap();
        ctrl.set_field("previousParticipation", "No").await.unwrap();
        assert!(matches!(ctrl.go_to_next().await, NavOutcome::Moved { from: 1, to: 2 }));
        ctrl.set_field("waiverAgreement", true).await.unwrap();
    }

    #[tokio::test]
    async fn starts_editing_first_section_with_empty_record() {
        let (ctrl, _) = controller(StubGateway::ok());
        assert_eq!(ctrl.active_index().await, 0);
        assert_eq!(ctrl.phase().await, WizardPhase::Editing);
        assert!(ctrl.errors().await.is_empty());
        assert_eq!(ctrl.record().await.text("fullName"), Some(""));
        assert!(!ctrl.is_form_complete().await);
    }

    #[tokio::test]
    async fn missing_email_blocks_next() {
        let (ctrl, _) = controller(StubGateway::ok());
        ctrl.set_field("fullName", "Jane Doe").await.unwrap();
        ctrl.set_field("phone", "123").await.unwrap();

        let outcome = ctrl.go_to_next().await;
        assert_eq!(
            outcome,
            NavOutcome::Blocked {
                invalid: vec!["email".to_string()]
            }
        );
        assert_eq!(ctrl.active_index().await, 0);
        let errors = ctrl.errors().await;
        assert_eq!(errors.len(), 1);
        assert_eq!(errors["email"], "This field is required");
        assert!(!ctrl.is_section_complete(0).await);
    }

    #[tokio::test]
    async fn next_reports_exactly_the_empty_fields() {
        let (ctrl, _) = controller(StubGateway::ok());
        ctrl.set_field("email", "jane@x.com").await.unwrap();

        let NavOutcome::Blocked { invalid } = ctrl.go_to_next().await else {
            panic!("expected validation to block");
        };
        assert_eq!(invalid, vec!["fullName".to_string(), "phone".to_string()]);
    }

    #[tokio::test]
    async fn passing_next_advances_by_one_and_marks_completed() {
        let (ctrl, _) = controller(StubGateway::ok());
        fill_personal(&ctrl).await;

        assert_eq!(ctrl.go_to_next().await, NavOutcome::Moved { from: 0, to: 1 });
        assert_eq!(ctrl.active_index().await, 1);
        assert!(ctrl.is_section_complete(0).await);
        assert!(!ctrl.is_section_complete(1).await);
        assert!(ctrl.errors().await.is_empty());
    }

    #[tokio::test]
    async fn fixing_errors_then_next_clears_them() {
        let (ctrl, _) = controller(StubGateway::ok());
        assert!(matches!(ctrl.go_to_next().await, NavOutcome::Blocked { .. }));
        assert_eq!(ctrl.errors().await.len(), 3);

        fill_personal(&ctrl).await;
        assert!(matches!(ctrl.go_to_next().await, NavOutcome::Moved { .. }));
        assert!(ctrl.errors().await.is_empty());
    }

    #[tokio::test]
    async fn previous_keeps_completion_and_errors() {
        let (ctrl, _) = controller(StubGateway::ok());
        fill_personal(&ctrl).await;
        ctrl.go_to_next().await;
        // Fail validation on section 1 so there are errors to keep
        assert!(matches!(ctrl.go_to_next().await, NavOutcome::Blocked { .. }));
        let before = ctrl.state().await;

        assert_eq!(ctrl.go_to_previous().await, NavOutcome::Moved { from: 1, to: 0 });
        let after = ctrl.state().await;
        assert_eq!(after.active_index, 0);
        assert_eq!(after.completed, before.completed);
        assert_eq!(after.errors, before.errors);

        assert_eq!(ctrl.go_to_previous().await, NavOutcome::AtBoundary);
    }

    #[tokio::test]
    async fn next_on_last_section_is_boundary() {
        let (ctrl, _) = controller(StubGateway::ok());
        walk_to_last(&ctrl).await;
        assert_eq!(ctrl.go_to_next().await, NavOutcome::AtBoundary);
        assert_eq!(ctrl.active_index().await, 2);
    }

    #[tokio::test]
    async fn conditional_details_requirement() {
        let (ctrl, _) = controller(StubGateway::ok());
        fill_personal(&ctrl).await;
        ctrl.go_to_next().await;
        ctrl.set_field("goals", "Connect with others").await.unwrap();

        ctrl.set_field("previousParticipation", "Yes").await.unwrap();
        ctrl.set_field("details", "").await.unwrap();
        assert_eq!(
            ctrl.go_to_next().await,
            NavOutcome::Blocked {
                invalid: vec!["details".to_string()]
            }
        );
        assert_eq!(ctrl.active_index().await, 1);

        ctrl.set_field("previousParticipation", "No").await.unwrap();
        assert_eq!(ctrl.go_to_next().await, NavOutcome::Moved { from: 1, to: 2 });
    }

    #[tokio::test]
    async fn reset_rule_clears_dependents() {
        let (ctrl, _) = controller(StubGateway::ok());
        ctrl.set_field("hasAllergies", true).await.unwrap();
        ctrl.set_field("allergyNotes", "peanuts").await.unwrap();

        let outcome = ctrl.set_field("hasAllergies", false).await.unwrap();
        assert_eq!(
            outcome,
            EditOutcome::Applied {
                reset: vec!["allergyNotes".to_string()]
            }
        );
        let record = ctrl.record().await;
        assert_eq!(record.text("allergyNotes"), Some(""));
        assert_eq!(record.flag("hasAllergies"), Some(false));
    }

    #[tokio::test]
    async fn set_field_rejects_unknown_keys_and_wrong_shapes() {
        let (ctrl, _) = controller(StubGateway::ok());
        assert_eq!(
            ctrl.set_field("nickname", "JD").await,
            Err(WizardError::UnknownField {
                key: "nickname".to_string()
            })
        );
        assert!(matches!(
            ctrl.set_field("waiverAgreement", "yes").await,
            Err(WizardError::FieldShape { .. })
        ));
        assert!(ctrl.set_field("email", FieldValue::Unset).await.is_ok());
    }

    #[tokio::test]
    async fn toggle_item_adds_and_removes() {
        let (ctrl, _) = controller(StubGateway::ok());
        ctrl.toggle_item("topics", "Work-Life Balance").await.unwrap();
        ctrl.toggle_item("topics", "Workplace Conflicts").await.unwrap();
        ctrl.toggle_item("topics", "Work-Life Balance").await.unwrap();

        let record = ctrl.record().await;
        assert_eq!(
            record.list("topics"),
            Some(&["Workplace Conflicts".to_string()][..])
        );
        assert!(matches!(
            ctrl.toggle_item("email", "x").await,
            Err(WizardError::FieldShape { .. })
        ));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_toggles_keep_every_item() {
        let (ctrl, _) = controller(StubGateway::ok());
        let ctrl = Arc::new(ctrl);

        let handles: Vec<_> = (0..400)
            .map(|i| {
                let ctrl = ctrl.clone();
                tokio::spawn(async move { ctrl.toggle_item("topics", &format!("item{i}")).await })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let record = ctrl.record().await;
        assert_eq!(record.list("topics").map(<[String]>::len), Some(400));
    }

    #[tokio::test]
    async fn jump_policies() {
        let (free, _) = controller_with(StubGateway::ok(), JumpPolicy::Free, SubmitPolicy::RequireComplete);
        assert_eq!(free.jump_to(2).await, Ok(NavOutcome::Moved { from: 0, to: 2 }));
        // Leaving section 0 by jumping does not validate or complete it
        assert!(free.errors().await.is_empty());
        assert!(!free.is_section_complete(0).await);
        assert_eq!(
            free.jump_to(3).await,
            Err(WizardError::StepOutOfRange { index: 3, count: 3 })
        );

        let (disabled, _) =
            controller_with(StubGateway::ok(), JumpPolicy::Disabled, SubmitPolicy::RequireComplete);
        assert_eq!(disabled.jump_to(1).await, Ok(NavOutcome::JumpDenied));
        assert_eq!(disabled.active_index().await, 0);

        let (visited, _) =
            controller_with(StubGateway::ok(), JumpPolicy::VisitedOnly, SubmitPolicy::RequireComplete);
        assert_eq!(visited.jump_to(1).await, Ok(NavOutcome::JumpDenied));
        fill_personal(&visited).await;
        visited.go_to_next().await;
        assert_eq!(visited.jump_to(0).await, Ok(NavOutcome::Moved { from: 1, to: 0 }));
        assert_eq!(visited.jump_to(1).await, Ok(NavOutcome::Moved { from: 0, to: 1 }));
    }

    #[tokio::test]
    async fn form_complete_is_recomputed_from_record() {
        let (ctrl, _) = controller(StubGateway::ok());
        walk_to_last(&ctrl).await;
        assert!(ctrl.is_form_complete().await);

        // Out-of-order edit turns on the conditional requirement
        ctrl.set_field("previousParticipation", "Yes").await.unwrap();
        assert!(!ctrl.is_form_complete().await);
        ctrl.set_field("details", "Two workshops last year").await.unwrap();
        assert!(ctrl.is_form_complete().await);
    }

    #[tokio::test]
    async fn end_to_end_success_notifies_with_redirect() {
        let gateway = StubGateway::ok();
        let (ctrl, notifier) = controller(gateway.clone());
        walk_to_last(&ctrl).await;
        ctrl.set_field("hasAllergies", true).await.unwrap();

        let outcome = ctrl.submit().await;
        let SubmitOutcome::Submitted { notice } = outcome else {
            panic!("expected success, got {outcome:?}");
        };
        assert_eq!(notice.outcome, Outcome::Success);
        assert_eq!(notice.redirect_url.as_deref(), Some(REDIRECT));
        assert_eq!(ctrl.phase().await, WizardPhase::Submitted);

        let notices = notifier.notices.lock().unwrap();
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].outcome, Outcome::Success);
        assert_eq!(notices[0].redirect_url.as_deref(), Some(REDIRECT));

        let payloads = gateway.payloads.lock().unwrap();
        assert_eq!(payloads[0]["fullName"], "Jane Doe");
        assert_eq!(payloads[0]["hasAllergies"], "yes");
        assert_eq!(payloads[0]["waiverAgreement"], true);
    }

    #[tokio::test]
    async fn submitted_session_ignores_further_operations() {
        let gateway = StubGateway::ok();
        let (ctrl, _) = controller(gateway.clone());
        walk_to_last(&ctrl).await;
        assert!(matches!(ctrl.submit().await, SubmitOutcome::Submitted { .. }));

        assert_eq!(ctrl.submit().await, SubmitOutcome::Ignored);
        assert_eq!(ctrl.go_to_previous().await, NavOutcome::Ignored);
        assert_eq!(ctrl.set_field("fullName", "Other").await, Ok(EditOutcome::Ignored));
        assert_eq!(ctrl.record().await.text("fullName"), Some("Jane Doe"));
        assert_eq!(gateway.calls(), 1);
    }

    #[tokio::test]
    async fn gateway_failure_returns_to_editing_with_record_intact() {
        let gateway = StubGateway::failing(GatewayError::Rejected {
            status: 409,
            message: Some("Duplicate entry".to_string()),
        });
        let (ctrl, notifier) = controller(gateway.clone());
        walk_to_last(&ctrl).await;
        let before = ctrl.record().await;

        let outcome = ctrl.submit().await;
        let SubmitOutcome::Failed { notice } = outcome else {
            panic!("expected failure, got {outcome:?}");
        };
        assert_eq!(notice.outcome, Outcome::Failure);
        assert_eq!(notice.message, "Duplicate entry");
        assert_eq!(ctrl.phase().await, WizardPhase::Editing);
        assert_eq!(ctrl.active_index().await, 2);
        assert_eq!(ctrl.record().await, before);
        assert_eq!(notifier.notices.lock().unwrap()[0].message, "Duplicate entry");

        // The visitor may retry
        assert!(matches!(ctrl.submit().await, SubmitOutcome::Failed { .. }));
        assert_eq!(gateway.calls(), 2);
    }

    #[tokio::test]
    async fn transport_failure_uses_generic_message() {
        let gateway = StubGateway::failing(GatewayError::Transport("connection reset".into()));
        let (ctrl, _) = controller(gateway);
        walk_to_last(&ctrl).await;

        let SubmitOutcome::Failed { notice } = ctrl.submit().await else {
            panic!("expected failure");
        };
        assert_eq!(notice.message, GENERIC_FAILURE_MESSAGE);
    }

    #[tokio::test]
    async fn double_submit_calls_gateway_once() {
        let gateway = StubGateway::with(Ok(()), Duration::from_millis(50));
        let (ctrl, notifier) = controller(gateway.clone());
        walk_to_last(&ctrl).await;

        let (first, second) = tokio::join!(ctrl.submit(), ctrl.submit());
        assert!(matches!(first, SubmitOutcome::Submitted { .. }));
        assert_eq!(second, SubmitOutcome::Ignored);
        assert_eq!(gateway.calls(), 1);
        assert_eq!(notifier.notices.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn edits_are_ignored_while_submitting() {
        let gateway = StubGateway::with(Ok(()), Duration::from_millis(50));
        let (ctrl, _) = controller(gateway);
        walk_to_last(&ctrl).await;

        let (outcome, edit, nav) = tokio::join!(
            ctrl.submit(),
            ctrl.set_field("fullName", "Changed"),
            ctrl.go_to_previous()
        );
        assert!(matches!(outcome, SubmitOutcome::Submitted { .. }));
        assert_eq!(edit, Ok(EditOutcome::Ignored));
        assert_eq!(nav, NavOutcome::Ignored);
        assert_eq!(ctrl.record().await.text("fullName"), Some("Jane Doe"));
    }

    #[tokio::test]
    async fn submit_requires_final_section() {
        let gateway = StubGateway::ok();
        let (ctrl, _) = controller(gateway.clone());
        assert_eq!(
            ctrl.submit().await,
            SubmitOutcome::Rejected {
                reason: SubmitRejection::NotOnFinalSection
            }
        );
        assert_eq!(gateway.calls(), 0);
    }

    #[tokio::test]
    async fn strict_policy_refuses_incomplete_form() {
        let gateway = StubGateway::ok();
        let (ctrl, _) = controller(gateway.clone());
        ctrl.jump_to(2).await.unwrap();

        let outcome = ctrl.submit().await;
        assert_eq!(
            outcome,
            SubmitOutcome::Rejected {
                reason: SubmitRejection::Incomplete { section: 0 }
            }
        );
        assert!(ctrl.errors().await.contains_key("waiverAgreement"));
        assert_eq!(gateway.calls(), 0);
        assert_eq!(ctrl.phase().await, WizardPhase::Editing);
    }

    #[tokio::test]
    async fn lenient_policy_defers_to_gateway() {
        let gateway = StubGateway::failing(GatewayError::Rejected {
            status: 422,
            message: Some("Email is required".to_string()),
        });
        let (ctrl, _) = controller_with(gateway.clone(), JumpPolicy::Free, SubmitPolicy::DeferToGateway);
        ctrl.jump_to(2).await.unwrap();

        let SubmitOutcome::Failed { notice } = ctrl.submit().await else {
            panic!("expected the gateway to be called");
        };
        assert_eq!(notice.message, "Email is required");
        assert_eq!(gateway.calls(), 1);
    }

    #[tokio::test]
    async fn snapshot_reflects_progress() {
        let (ctrl, _) = controller(StubGateway::ok());
        let snap = ctrl.snapshot().await;
        assert_eq!(snap.sections.len(), 3);
        assert!(snap.sections[0].active);
        assert!(!snap.can_go_back);
        assert!(!snap.submit_enabled);

        walk_to_last(&ctrl).await;
        let snap = ctrl.snapshot().await;
        assert!(snap.on_last_section);
        assert!(snap.form_complete);
        assert!(snap.submit_enabled);
        assert!(snap.sections[0].completed && snap.sections[1].completed);
        assert!(!snap.sections[2].completed);

        let json = serde_json::to_value(&snap).unwrap();
        assert_eq!(json["phase"], "editing");
        assert_eq!(json["record"]["fullName"], "Jane Doe");
    }

    #[tokio::test]
    async fn render_active_uses_section_renderer() {
        let (ctrl, _) = controller(StubGateway::ok());
        ctrl.set_field("fullName", "Jane Doe").await.unwrap();
        ctrl.go_to_next().await;

        let view = ctrl.render_active().await;
        assert_eq!(view.index, 0);
        assert_eq!(view.label, "Personal Information");
        assert_eq!(view.body.fields.len(), 1);
        assert_eq!(view.body.fields[0].value, FieldValue::text("Jane Doe"));
    }
}
