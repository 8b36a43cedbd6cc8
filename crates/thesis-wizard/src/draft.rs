//! Draft state owned by one wizard session.
//!
//! Holds the in-progress [`DraftSubmission`] together with the single active
//! [`UploadAttempt`]. The document reference can only be written through
//! [`DraftState::set_upload_result`], and only for the attempt that is still
//! current.

use thesis_core::models::{
    AttemptId, DocumentReference, DraftField, DraftPatch, DraftSubmission, FileDescriptor,
    UploadAttempt,
};

#[derive(Debug, Clone)]
pub struct DraftState {
    draft: DraftSubmission,
    upload: UploadAttempt,
    last_attempt: AttemptId,
    checkpoint: DraftSubmission,
}

impl Default for DraftState {
    fn default() -> Self {
        Self::new()
    }
}

impl DraftState {
    pub fn new() -> Self {
        Self {
            draft: DraftSubmission::default(),
            upload: UploadAttempt::idle(),
            last_attempt: AttemptId::new(0),
            checkpoint: DraftSubmission::default(),
        }
    }

    pub fn get(&self) -> &DraftSubmission {
        &self.draft
    }

    pub fn upload(&self) -> &UploadAttempt {
        &self.upload
    }

    /// Shallow merge. Fields absent from the patch keep their value.
    pub fn set(&mut self, patch: DraftPatch) -> Vec<DraftField> {
        self.draft.apply(patch)
    }

    /// Start tracking a new upload. The previous attempt and any reference it
    /// produced are discarded.
    pub fn begin_upload(&mut self, file: FileDescriptor) -> AttemptId {
        let attempt = self.last_attempt.next();
        self.last_attempt = attempt;
        self.upload = UploadAttempt::begin(attempt, file);
        self.draft.document_reference = None;
        attempt
    }

    /// Returns false when the attempt is stale or no longer in progress.
    pub fn record_upload_progress(&mut self, attempt: AttemptId, percent: u8) -> bool {
        self.upload.is_current(attempt) && self.upload.record_progress(percent)
    }

    /// Store the reference produced by a successful upload.
    ///
    /// Ignored (returns false) unless `attempt` is the current, unresolved
    /// attempt, so a late result from a superseded upload never lands.
    pub fn set_upload_result(&mut self, attempt: AttemptId, reference: DocumentReference) -> bool {
        if !self.upload.is_current(attempt) {
            return false;
        }
        if !self.upload.succeed(reference.clone()) {
            return false;
        }
        self.draft.document_reference = Some(reference);
        true
    }

    pub fn fail_upload(&mut self, attempt: AttemptId, detail: impl Into<String>) -> bool {
        self.upload.is_current(attempt) && self.upload.fail(detail)
    }

    /// Fields changed since the previous checkpoint. Moves the checkpoint forward.
    pub fn checkpoint(&mut self) -> Vec<DraftField> {
        let changed = self.checkpoint.diff(&self.draft);
        self.checkpoint = self.draft.clone();
        changed
    }

    /// Clear all fields and the upload state.
    ///
    /// Attempt ids keep counting up, so an upload started before the reset
    /// can never be mistaken for one started after it.
    pub fn reset(&mut self) {
        self.draft = DraftSubmission::default();
        self.upload = UploadAttempt::idle();
        self.checkpoint = DraftSubmission::default();
    }
}
