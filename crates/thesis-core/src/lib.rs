//! Thesis Core Library
//!
//! This crate provides the domain model, error types, configuration, and step
//! validation shared by the storage backends, the API client, and the wizard.

pub mod config;
pub mod error;
pub mod gateway;
pub mod models;
pub mod storage_types;
pub mod validation;

// Re-export commonly used types
pub use config::{StorageConfig, ValidationRules, WizardConfig};
pub use error::{ErrorMetadata, GatewayError, LogLevel, UploadError, WizardError};
pub use gateway::{DirectoryLookup, SubmissionGateway};
pub use storage_types::StorageBackend;
pub use validation::{FileValidationError, FileValidator, StepValidator};
