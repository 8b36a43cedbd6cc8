//! Storage abstraction trait
//!
//! This module defines the Storage trait that all storage backends must implement.

use async_trait::async_trait;
use thesis_core::models::{DocumentReference, FileUpload};
use thesis_core::{StorageBackend, UploadError};
use thiserror::Error;
use tokio::sync::mpsc;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Storage endpoint rejected the request ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timed out")]
    Timeout,

    #[error("Delete failed: {0}")]
    DeleteFailed(String),

    #[error("Invalid storage reference: {0}")]
    InvalidReference(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

impl From<StorageError> for UploadError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::Rejected { status, message } => UploadError::Rejected { status, message },
            StorageError::Network(msg) => UploadError::Network(msg),
            // The channel owns the deadline; a backend timeout carries no duration.
            StorageError::Timeout => UploadError::Network("request timed out".to_string()),
            other => UploadError::Storage(other.to_string()),
        }
    }
}

/// Outcome of a successful transfer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredFile {
    /// Server-assigned location of the stored file
    pub reference: DocumentReference,
    /// Public URL, when the backend exposes one separately from the reference
    pub url: Option<String>,
    pub size: u64,
}

/// Receives cumulative transferred byte counts.
#[derive(Debug, Clone, Default)]
pub struct ProgressSink {
    tx: Option<mpsc::UnboundedSender<u64>>,
}

impl ProgressSink {
    pub fn new(tx: mpsc::UnboundedSender<u64>) -> Self {
        Self { tx: Some(tx) }
    }

    /// A sink that drops every report.
    pub fn disabled() -> Self {
        Self { tx: None }
    }

    pub fn report(&self, bytes_sent: u64) {
        if let Some(tx) = &self.tx {
            // Receiver gone means nobody is interested anymore.
            let _ = tx.send(bytes_sent);
        }
    }
}

/// Storage abstraction trait
///
/// All storage backends (HTTP endpoint, local filesystem) implement this trait
/// so the upload channel works with any of them.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Transfer a file and return its stable reference.
    ///
    /// Exactly one transfer per call. Progress is reported as cumulative bytes
    /// and never decreases.
    async fn upload(&self, file: &FileUpload, progress: ProgressSink) -> StorageResult<StoredFile>;

    /// Delete a previously stored file
    async fn delete(&self, reference: &DocumentReference) -> StorageResult<()>;

    /// Get the storage backend type
    fn backend_type(&self) -> StorageBackend;
}
