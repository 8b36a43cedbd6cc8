use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use validator::Validate;

use super::draft::DocumentReference;

/// Declared properties of a selected file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct FileDescriptor {
    /// Original filename
    #[validate(length(
        min = 1,
        max = 255,
        message = "Filename must be between 1 and 255 characters"
    ))]
    pub name: String,
    /// File size in bytes
    pub size: u64,
    /// Content type (MIME type) as declared by the client
    #[validate(length(
        min = 1,
        max = 255,
        message = "Content type must be between 1 and 255 characters"
    ))]
    pub content_type: String,
}

impl FileDescriptor {
    pub fn extension(&self) -> Option<String> {
        std::path::Path::new(&self.name)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
    }
}

/// A selected file together with its content.
#[derive(Debug, Clone)]
pub struct FileUpload {
    pub descriptor: FileDescriptor,
    pub data: Bytes,
}

impl FileUpload {
    pub fn new(name: impl Into<String>, content_type: impl Into<String>, data: impl Into<Bytes>) -> Self {
        let data = data.into();
        Self {
            descriptor: FileDescriptor {
                name: name.into(),
                size: data.len() as u64,
                content_type: content_type.into(),
            },
            data,
        }
    }

    /// Length of the content actually carried.
    pub fn size(&self) -> u64 {
        self.data.len() as u64
    }
}

/// Monotonic identifier of an upload attempt within one wizard session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AttemptId(u64);

impl AttemptId {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn next(&self) -> Self {
        Self(self.0 + 1)
    }
}

impl Display for AttemptId {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UploadStatus {
    Idle,
    InProgress,
    Succeeded,
    Failed,
}

/// State of the single active upload slot of a draft.
///
/// Transitions are only possible through the methods below, which keep the
/// invariants: progress never decreases while in progress, and the result
/// reference is set exactly once, together with the move to `Succeeded`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadAttempt {
    id: Option<AttemptId>,
    file: Option<FileDescriptor>,
    status: UploadStatus,
    progress_percent: u8,
    result_reference: Option<DocumentReference>,
    error_detail: Option<String>,
}

impl Default for UploadAttempt {
    fn default() -> Self {
        Self::idle()
    }
}

impl UploadAttempt {
    pub fn idle() -> Self {
        Self {
            id: None,
            file: None,
            status: UploadStatus::Idle,
            progress_percent: 0,
            result_reference: None,
            error_detail: None,
        }
    }

    /// Start a fresh attempt. Any previous attempt's outcome is discarded.
    pub fn begin(id: AttemptId, file: FileDescriptor) -> Self {
        Self {
            id: Some(id),
            file: Some(file),
            status: UploadStatus::InProgress,
            progress_percent: 0,
            result_reference: None,
            error_detail: None,
        }
    }

    /// Record progress. Lower values than already seen are ignored.
    /// Returns true when the stored percentage changed.
    pub fn record_progress(&mut self, percent: u8) -> bool {
        if self.status != UploadStatus::InProgress {
            return false;
        }
        let percent = percent.min(100);
        if percent <= self.progress_percent {
            return false;
        }
        self.progress_percent = percent;
        true
    }

    pub fn succeed(&mut self, reference: DocumentReference) -> bool {
        if self.status != UploadStatus::InProgress {
            return false;
        }
        self.status = UploadStatus::Succeeded;
        self.progress_percent = 100;
        self.result_reference = Some(reference);
        true
    }

    pub fn fail(&mut self, detail: impl Into<String>) -> bool {
        if self.status != UploadStatus::InProgress {
            return false;
        }
        self.status = UploadStatus::Failed;
        self.error_detail = Some(detail.into());
        true
    }

    pub fn id(&self) -> Option<AttemptId> {
        self.id
    }

    pub fn file(&self) -> Option<&FileDescriptor> {
        self.file.as_ref()
    }

    pub fn status(&self) -> UploadStatus {
        self.status
    }

    pub fn progress_percent(&self) -> u8 {
        self.progress_percent
    }

    pub fn result_reference(&self) -> Option<&DocumentReference> {
        self.result_reference.as_ref()
    }

    pub fn error_detail(&self) -> Option<&str> {
        self.error_detail.as_deref()
    }

    pub fn is_current(&self, id: AttemptId) -> bool {
        self.id == Some(id)
    }
}
