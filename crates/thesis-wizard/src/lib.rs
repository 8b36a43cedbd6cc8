//! Thesis Wizard Library
//!
//! The multi-step proposal submission workflow: a [`DraftState`] owned by one
//! [`WizardController`], an [`UploadChannel`] that streams transfer progress,
//! and the submission through a [`SubmissionGateway`].
//!
//! [`SubmissionGateway`]: thesis_core::SubmissionGateway

pub mod controller;
pub mod draft;
pub mod upload;

pub use controller::{ErrorView, PhaseView, WizardController, WizardPhase, WizardSnapshot};
pub use draft::DraftState;
pub use upload::{UploadChannel, UploadEvent, UploadStream};
