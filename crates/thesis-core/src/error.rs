//! Error types module
//!
//! Failures are converted to typed errors at the boundary where they occur:
//! `UploadError` at the upload channel, `GatewayError` at the submission and
//! directory endpoints. `WizardError` is what the wizard hands to the UI layer.
//! Every variant self-describes through [`ErrorMetadata`].

use std::time::Duration;

use crate::models::ValidationResult;
use crate::validation::FileValidationError;

/// Log level for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Debug level - for expected errors like validation failures
    Debug,
    /// Warning level - for recoverable issues like transient network failures
    Warn,
    /// Error level - for unexpected failures
    Error,
}

/// Metadata describing how an error should be presented to the user
pub trait ErrorMetadata {
    /// Machine-readable error code (e.g., "UPLOAD_FAILED")
    fn error_code(&self) -> &'static str;

    /// Whether the user can retry the same action without changing input
    fn is_recoverable(&self) -> bool;

    /// Suggested action for the user
    fn suggested_action(&self) -> Option<&'static str>;

    /// User-facing message (may differ from internal error message)
    fn client_message(&self) -> String;

    /// Log level for this error
    fn log_level(&self) -> LogLevel;
}

/// Failure while transferring a file to the storage endpoint.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UploadError {
    #[error("Upload timed out after {0:?}")]
    Timeout(Duration),

    #[error("Network error during upload: {0}")]
    Network(String),

    #[error("Storage endpoint rejected the upload ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Upload was interrupted before completing")]
    Interrupted,
}

/// Failure reported by the submission endpoint or directory lookup.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GatewayError {
    #[error("Submission rejected: {message}")]
    Validation {
        message: String,
        field: Option<String>,
    },

    #[error("Server error ({status}): {message}")]
    Server { status: u16, message: String },

    #[error("Request timed out")]
    Timeout,

    #[error("Network error: {0}")]
    Network(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Unexpected response: {0}")]
    InvalidResponse(String),
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum WizardError {
    #[error("Invalid file: {0}")]
    InvalidFile(#[from] FileValidationError),

    #[error("Upload failed: {0}")]
    Upload(#[from] UploadError),

    #[error("Step {} has invalid fields: {}", .0.step_index(), .0.summary())]
    Validation(ValidationResult),

    #[error("Submission failed: {0}")]
    Submission(#[from] GatewayError),

    #[error("Supervisor directory unavailable: {0}")]
    Directory(GatewayError),

    #[error("A submission is already in progress")]
    Busy,

    #[error("Invalid wizard state: {0}")]
    InvalidState(String),

    #[error("Wizard session is closed")]
    Closed,
}

/// Static metadata for each variant: (error_code, recoverable, suggested_action, log_level).
fn wizard_error_static_metadata(
    err: &WizardError,
) -> (&'static str, bool, Option<&'static str>, LogLevel) {
    match err {
        WizardError::InvalidFile(_) => (
            "INVALID_FILE",
            false,
            Some("Select a PDF document within the size limit"),
            LogLevel::Debug,
        ),
        WizardError::Upload(UploadError::Rejected { .. }) => (
            "UPLOAD_REJECTED",
            true,
            Some("Upload the document again"),
            LogLevel::Warn,
        ),
        WizardError::Upload(_) => (
            "UPLOAD_FAILED",
            true,
            Some("Upload the document again"),
            LogLevel::Warn,
        ),
        WizardError::Validation(_) => (
            "VALIDATION_ERROR",
            false,
            Some("Correct the highlighted fields"),
            LogLevel::Debug,
        ),
        WizardError::Submission(GatewayError::Validation { .. }) => (
            "SUBMISSION_REJECTED",
            false,
            Some("Review the highlighted step and submit again"),
            LogLevel::Debug,
        ),
        WizardError::Submission(GatewayError::Unauthorized(_)) => (
            "UNAUTHORIZED",
            false,
            Some("Sign in again, then retry the submission"),
            LogLevel::Warn,
        ),
        WizardError::Submission(GatewayError::InvalidResponse(_)) => (
            "INVALID_RESPONSE",
            true,
            Some("Retry the submission; contact support if this persists"),
            LogLevel::Error,
        ),
        WizardError::Submission(_) => (
            "SUBMISSION_FAILED",
            true,
            Some("Retry the submission; your answers are kept"),
            LogLevel::Warn,
        ),
        WizardError::Directory(_) => (
            "DIRECTORY_UNAVAILABLE",
            true,
            Some("Reload the supervisor list"),
            LogLevel::Warn,
        ),
        WizardError::Busy => (
            "SUBMISSION_IN_PROGRESS",
            false,
            Some("Wait for the current submission to finish"),
            LogLevel::Debug,
        ),
        WizardError::InvalidState(_) => ("INVALID_STATE", false, None, LogLevel::Error),
        WizardError::Closed => (
            "SESSION_CLOSED",
            false,
            Some("Open the submission wizard again"),
            LogLevel::Debug,
        ),
    }
}

impl ErrorMetadata for WizardError {
    fn error_code(&self) -> &'static str {
        wizard_error_static_metadata(self).0
    }

    fn is_recoverable(&self) -> bool {
        wizard_error_static_metadata(self).1
    }

    fn suggested_action(&self) -> Option<&'static str> {
        wizard_error_static_metadata(self).2
    }

    fn log_level(&self) -> LogLevel {
        wizard_error_static_metadata(self).3
    }

    fn client_message(&self) -> String {
        match self {
            WizardError::InvalidFile(e) => e.to_string(),
            WizardError::Upload(UploadError::Timeout(_)) => {
                "The upload took too long and was stopped".to_string()
            }
            WizardError::Upload(UploadError::Rejected { message, .. }) => {
                format!("The document was not accepted: {}", message)
            }
            WizardError::Upload(_) => "The document could not be uploaded".to_string(),
            WizardError::Validation(result) => result.summary(),
            WizardError::Submission(GatewayError::Validation { message, .. }) => message.clone(),
            WizardError::Submission(GatewayError::Timeout) => {
                "The server did not answer in time".to_string()
            }
            WizardError::Submission(GatewayError::Unauthorized(_)) => {
                "Your session has expired".to_string()
            }
            WizardError::Submission(_) => "The proposal could not be submitted".to_string(),
            WizardError::Directory(_) => "The supervisor list could not be loaded".to_string(),
            WizardError::Busy => "Your proposal is already being submitted".to_string(),
            WizardError::InvalidState(_) => "Unexpected wizard state".to_string(),
            WizardError::Closed => "The submission wizard was closed".to_string(),
        }
    }
}

impl WizardError {
    /// Emit this error through `tracing` at its configured level.
    pub fn log(&self, context: &str) {
        match self.log_level() {
            LogLevel::Debug => tracing::debug!(error_code = self.error_code(), error = %self, "{}", context),
            LogLevel::Warn => tracing::warn!(error_code = self.error_code(), error = %self, "{}", context),
            LogLevel::Error => tracing::error!(error_code = self.error_code(), error = %self, "{}", context),
        }
    }
}

impl From<validator::ValidationErrors> for FileValidationError {
    fn from(err: validator::ValidationErrors) -> Self {
        FileValidationError::InvalidFilename(format!("Validation error: {}", err))
    }
}
