//! Wizard controller
//!
//! Sequences the steps, gates forward navigation on the step validator,
//! drives uploads into the draft and performs the final submission. All
//! session state sits behind one async mutex, so navigation requests are
//! processed one at a time; the lock is never held across the storage or
//! gateway call.

use futures::StreamExt;
use serde::Serialize;
use std::sync::Arc;
use thesis_core::models::{
    AttemptId, DocumentReference, DraftField, DraftPatch, DraftSubmission, FileUpload,
    SubmissionPayload, SubmissionRecord, Supervisor, UploadAttempt, ValidationResult, WizardStep,
};
use thesis_core::{
    DirectoryLookup, ErrorMetadata, GatewayError, StepValidator, SubmissionGateway, UploadError,
    WizardConfig, WizardError,
};
use thesis_storage::Storage;
use tokio::sync::{Mutex, MutexGuard};
use uuid::Uuid;

use crate::draft::DraftState;
use crate::upload::{UploadChannel, UploadEvent, UploadStream};

/// Where the session stands outside of plain step navigation.
#[derive(Debug, Clone, PartialEq)]
pub enum WizardPhase {
    Editing,
    Submitting,
    Submitted(SubmissionRecord),
    Failed(WizardError),
}

/// Serializable view of an error, for the UI layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorView {
    pub code: &'static str,
    pub message: String,
    pub suggested_action: Option<&'static str>,
    pub recoverable: bool,
}

impl From<&WizardError> for ErrorView {
    fn from(err: &WizardError) -> Self {
        Self {
            code: err.error_code(),
            message: err.client_message(),
            suggested_action: err.suggested_action(),
            recoverable: err.is_recoverable(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum PhaseView {
    Editing,
    Submitting,
    Submitted { record: SubmissionRecord },
    Failed { error: ErrorView },
}

impl From<&WizardPhase> for PhaseView {
    fn from(phase: &WizardPhase) -> Self {
        match phase {
            WizardPhase::Editing => PhaseView::Editing,
            WizardPhase::Submitting => PhaseView::Submitting,
            WizardPhase::Submitted(record) => PhaseView::Submitted {
                record: record.clone(),
            },
            WizardPhase::Failed(error) => PhaseView::Failed {
                error: error.into(),
            },
        }
    }
}

/// Everything the UI needs to render the wizard.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WizardSnapshot {
    pub session_id: Uuid,
    pub phase: PhaseView,
    pub current_step: usize,
    pub step_titles: Vec<&'static str>,
    pub last_validation: Option<ValidationResult>,
    pub upload: UploadAttempt,
    pub draft: DraftSubmission,
    pub supervisors: Vec<Supervisor>,
}

struct Session {
    phase: WizardPhase,
    current_step: usize,
    draft: DraftState,
    validator: StepValidator,
    last_validation: Option<ValidationResult>,
    supervisors: Vec<Supervisor>,
    closed: bool,
}

impl Session {
    fn validate(&self, step_index: usize) -> ValidationResult {
        self.validator
            .validate(step_index, self.draft.get(), self.draft.upload())
    }

    fn last_step(&self) -> usize {
        self.validator.step_count().saturating_sub(1)
    }

    fn ensure_editable(&self) -> Result<(), WizardError> {
        match &self.phase {
            WizardPhase::Submitting => Err(WizardError::Busy),
            WizardPhase::Submitted(_) => Err(WizardError::InvalidState(
                "The proposal has already been submitted".to_string(),
            )),
            WizardPhase::Editing | WizardPhase::Failed(_) => Ok(()),
        }
    }

    /// Returns the fields edited since the previous transition.
    fn move_to(&mut self, step_index: usize) -> Vec<DraftField> {
        self.current_step = step_index;
        if matches!(self.phase, WizardPhase::Failed(_)) {
            self.phase = WizardPhase::Editing;
        }
        self.draft.checkpoint()
    }

    fn reset(&mut self) {
        self.draft.reset();
        self.current_step = 0;
        self.last_validation = None;
        self.phase = WizardPhase::Editing;
    }
}

/// Orchestrates one wizard session.
pub struct WizardController {
    session_id: Uuid,
    config: WizardConfig,
    channel: UploadChannel,
    gateway: Arc<dyn SubmissionGateway>,
    directory: Option<Arc<dyn DirectoryLookup>>,
    session: Mutex<Session>,
}

impl WizardController {
    pub fn new(
        config: WizardConfig,
        storage: Arc<dyn Storage>,
        gateway: Arc<dyn SubmissionGateway>,
    ) -> Self {
        let validator = StepValidator::standard(&config.rules);
        Self::with_validator(config, validator, storage, gateway)
    }

    pub fn with_validator(
        config: WizardConfig,
        validator: StepValidator,
        storage: Arc<dyn Storage>,
        gateway: Arc<dyn SubmissionGateway>,
    ) -> Self {
        let session_id = Uuid::new_v4();
        let channel = UploadChannel::from_rules(&config.rules, storage, config.upload_timeout);

        tracing::info!(
            session_id = %session_id,
            steps = validator.step_count(),
            "Wizard session opened"
        );

        Self {
            session_id,
            config,
            channel,
            gateway,
            directory: None,
            session: Mutex::new(Session {
                phase: WizardPhase::Editing,
                current_step: 0,
                draft: DraftState::new(),
                validator,
                last_validation: None,
                supervisors: Vec::new(),
                closed: false,
            }),
        }
    }

    pub fn with_directory(mut self, directory: Arc<dyn DirectoryLookup>) -> Self {
        self.directory = Some(directory);
        self
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    async fn open_session(&self) -> Result<MutexGuard<'_, Session>, WizardError> {
        let session = self.session.lock().await;
        if session.closed {
            return Err(WizardError::Closed);
        }
        Ok(session)
    }

    pub async fn phase(&self) -> WizardPhase {
        self.session.lock().await.phase.clone()
    }

    pub async fn current_step(&self) -> usize {
        self.session.lock().await.current_step
    }

    /// Copy of the current draft.
    pub async fn draft(&self) -> DraftSubmission {
        self.session.lock().await.draft.get().clone()
    }

    pub async fn is_closed(&self) -> bool {
        self.session.lock().await.closed
    }

    /// Merge fields into the draft. Returns the fields that changed.
    pub async fn set(&self, patch: DraftPatch) -> Result<Vec<DraftField>, WizardError> {
        let mut session = self.open_session().await?;
        session.ensure_editable()?;

        let changed = session.draft.set(patch);
        if !changed.is_empty() {
            tracing::debug!(
                session_id = %self.session_id,
                step = session.current_step,
                fields = ?changed,
                "Draft updated"
            );
        }
        Ok(changed)
    }

    /// Validate a step against the current draft without navigating.
    pub async fn validate_step(&self, step_index: usize) -> Result<ValidationResult, WizardError> {
        let mut session = self.open_session().await?;
        let result = session.validate(step_index);
        session.last_validation = Some(result.clone());
        Ok(result)
    }

    /// Move to the next step if the current one validates.
    pub async fn advance(&self) -> Result<usize, WizardError> {
        let mut session = self.open_session().await?;
        session.ensure_editable()?;

        let from = session.current_step;
        let result = session.validate(from);
        session.last_validation = Some(result.clone());

        if !result.is_valid() {
            let err = WizardError::Validation(result);
            err.log("Step validation blocked navigation");
            return Err(err);
        }
        if from >= session.last_step() {
            return Err(WizardError::InvalidState(
                "Already on the last step".to_string(),
            ));
        }

        let to = from + 1;
        let changed = session.move_to(to);
        tracing::debug!(
            session_id = %self.session_id,
            from,
            to,
            changed = ?changed,
            "Advanced wizard step"
        );
        Ok(to)
    }

    /// Move back one step. Never validates; on the first step this is a no-op.
    pub async fn previous(&self) -> Result<usize, WizardError> {
        let mut session = self.open_session().await?;
        session.ensure_editable()?;

        let from = session.current_step;
        let to = from.saturating_sub(1);
        session.last_validation = None;
        let changed = session.move_to(to);
        tracing::debug!(
            session_id = %self.session_id,
            from,
            to,
            changed = ?changed,
            "Moved back a wizard step"
        );
        Ok(to)
    }

    /// Jump to a step. Backwards is always allowed; forwards only when every
    /// earlier step validates.
    pub async fn go_to_step(&self, target: usize) -> Result<usize, WizardError> {
        let mut session = self.open_session().await?;
        session.ensure_editable()?;

        if target > session.last_step() {
            return Err(WizardError::InvalidState(format!(
                "Step {} does not exist",
                target
            )));
        }

        if target > session.current_step {
            for index in 0..target {
                let result = session.validate(index);
                if !result.is_valid() {
                    session.last_validation = Some(result.clone());
                    let err = WizardError::Validation(result);
                    err.log("Step validation blocked navigation");
                    return Err(err);
                }
            }
        }

        let from = session.current_step;
        session.last_validation = None;
        let changed = session.move_to(target);
        tracing::debug!(
            session_id = %self.session_id,
            from,
            to = target,
            changed = ?changed,
            "Jumped to wizard step"
        );
        Ok(target)
    }

    /// Validate the selected file and start its transfer.
    ///
    /// Any previous attempt is superseded: its reference is dropped from the
    /// draft and its late events are ignored. An invalid file fails with
    /// `InvalidFile` and leaves the draft untouched.
    pub async fn begin_upload(&self, file: FileUpload) -> Result<UploadStream, WizardError> {
        let mut session = self.open_session().await?;
        session.ensure_editable()?;

        if let Err(e) = self.channel.validate(&file) {
            let err = WizardError::from(e);
            err.log("Selected file rejected");
            return Err(err);
        }

        let attempt = session.draft.begin_upload(file.descriptor.clone());
        tracing::info!(
            session_id = %self.session_id,
            attempt = %attempt,
            filename = %file.descriptor.name,
            bytes = file.size(),
            "Upload attempt started"
        );
        Ok(self.channel.start(attempt, file))
    }

    /// Apply one upload event to the draft.
    ///
    /// Returns `Ok(false)` when `attempt` has been superseded by a newer one;
    /// the event is then discarded.
    pub async fn apply_upload_event(
        &self,
        attempt: AttemptId,
        event: &UploadEvent,
    ) -> Result<bool, WizardError> {
        let mut session = self.open_session().await?;

        if !session.draft.upload().is_current(attempt) {
            tracing::debug!(
                session_id = %self.session_id,
                attempt = %attempt,
                "Ignoring event from superseded upload attempt"
            );
            return Ok(false);
        }

        match event {
            UploadEvent::Progress(percent) => {
                session.draft.record_upload_progress(attempt, *percent);
            }
            UploadEvent::Succeeded(reference) => {
                session.draft.set_upload_result(attempt, reference.clone());
            }
            UploadEvent::Failed(error) => {
                session.draft.fail_upload(attempt, error.to_string());
            }
        }
        Ok(true)
    }

    /// Upload a file and write its reference into the draft.
    ///
    /// Progress is reflected in [`WizardController::snapshot`] while the
    /// transfer runs. If a newer upload starts meanwhile, this one is aborted
    /// and fails with `UploadError::Interrupted`.
    pub async fn upload_document(&self, file: FileUpload) -> Result<DocumentReference, WizardError> {
        let mut stream = self.begin_upload(file).await?;
        let attempt = stream.attempt();

        while let Some(event) = stream.next().await {
            if !self.apply_upload_event(attempt, &event).await? {
                return Err(WizardError::Upload(UploadError::Interrupted));
            }
            match event {
                UploadEvent::Progress(_) => {}
                UploadEvent::Succeeded(reference) => return Ok(reference),
                UploadEvent::Failed(error) => {
                    let err = WizardError::Upload(error);
                    err.log("Document upload failed");
                    return Err(err);
                }
            }
        }
        Err(WizardError::Upload(UploadError::Interrupted))
    }

    /// Fetch eligible supervisors and restrict the supervisor step to them.
    pub async fn load_supervisors(&self) -> Result<Vec<Supervisor>, WizardError> {
        let directory = self.directory.clone().ok_or_else(|| {
            WizardError::InvalidState("No supervisor directory configured".to_string())
        })?;
        drop(self.open_session().await?);

        let supervisors = directory.list_supervisors().await.map_err(|e| {
            let err = WizardError::Directory(e);
            err.log("Supervisor directory lookup failed");
            err
        })?;

        let mut session = self.open_session().await?;
        session.validator.set_eligible_supervisors(&supervisors);
        session.supervisors = supervisors.clone();
        tracing::debug!(
            session_id = %self.session_id,
            count = supervisors.len(),
            "Loaded eligible supervisors"
        );
        Ok(supervisors)
    }

    /// Revalidate every step, then send the draft to the submission gateway.
    ///
    /// Only callable from the last step. While a submission is in flight any
    /// further call returns `Busy` without contacting the gateway. On failure
    /// the draft is left exactly as it was; nothing is retried automatically.
    pub async fn submit(&self) -> Result<SubmissionRecord, WizardError> {
        let payload = {
            let mut session = self.open_session().await?;
            session.ensure_editable()?;

            if session.current_step != session.last_step() {
                return Err(WizardError::InvalidState(
                    "Submit is only available on the last step".to_string(),
                ));
            }

            if let Err(result) = session
                .validator
                .validate_all(session.draft.get(), session.draft.upload())
            {
                let failing = result.step_index();
                session.last_validation = Some(result.clone());
                session.move_to(failing);
                let err = WizardError::Validation(result);
                err.log("Submission blocked by revalidation");
                return Err(err);
            }

            let payload = SubmissionPayload::try_from(session.draft.get()).map_err(|field| {
                WizardError::InvalidState(format!("{} is missing", field.label()))
            })?;

            session.phase = WizardPhase::Submitting;
            payload
        };

        tracing::info!(session_id = %self.session_id, "Submitting proposal");

        let outcome = match tokio::time::timeout(
            self.config.submission_timeout,
            self.gateway.create_submission(&payload),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(GatewayError::Timeout),
        };

        let mut session = self.session.lock().await;
        if session.closed {
            tracing::info!(
                session_id = %self.session_id,
                succeeded = outcome.is_ok(),
                "Discarding submission outcome for closed session"
            );
            return Err(WizardError::Closed);
        }

        match outcome {
            Ok(record) => {
                session.reset();
                session.phase = WizardPhase::Submitted(record.clone());
                tracing::info!(
                    session_id = %self.session_id,
                    record_id = %record.id,
                    "Proposal submitted"
                );
                Ok(record)
            }
            Err(e) => {
                let target = match &e {
                    GatewayError::Validation {
                        field: Some(field), ..
                    } => DraftField::from_wire(field).map(|f| WizardStep::owning(f).index()),
                    _ => None,
                };
                if let Some(step) = target {
                    session.current_step = step.min(session.last_step());
                }

                let err = WizardError::Submission(e);
                err.log("Proposal submission failed");
                session.phase = WizardPhase::Failed(err.clone());
                Err(err)
            }
        }
    }

    /// Discard the draft and start over from the first step.
    pub async fn cancel(&self) -> Result<(), WizardError> {
        let mut session = self.open_session().await?;
        if matches!(session.phase, WizardPhase::Submitting) {
            return Err(WizardError::Busy);
        }
        session.reset();
        tracing::info!(session_id = %self.session_id, "Wizard draft cancelled");
        Ok(())
    }

    /// Abandon the session. The draft is discarded and outcomes of work still
    /// in flight are ignored. Every later call fails with `Closed`.
    pub async fn close(&self) {
        let mut session = self.session.lock().await;
        if session.closed {
            return;
        }
        session.reset();
        session.closed = true;
        tracing::info!(session_id = %self.session_id, "Wizard session closed");
    }

    pub async fn snapshot(&self) -> Result<WizardSnapshot, WizardError> {
        let session = self.open_session().await?;
        Ok(WizardSnapshot {
            session_id: self.session_id,
            phase: (&session.phase).into(),
            current_step: session.current_step,
            step_titles: session
                .validator
                .steps()
                .iter()
                .map(|s| s.step.title())
                .collect(),
            last_validation: session.last_validation.clone(),
            upload: session.draft.upload().clone(),
            draft: session.draft.get().clone(),
            supervisors: session.supervisors.clone(),
        })
    }
}
