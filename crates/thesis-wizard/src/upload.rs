//! Upload channel
//!
//! Runs one file transfer per invocation and exposes it as a finite stream of
//! [`UploadEvent`]s: zero or more `Progress` events with non-decreasing
//! percentages, then exactly one terminal `Succeeded` or `Failed` event.
//! Dropping the stream aborts the transfer.

use futures::Stream;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;
use thesis_core::models::{AttemptId, DocumentReference, FileUpload};
use thesis_core::{FileValidationError, FileValidator, UploadError, ValidationRules};
use thesis_storage::{ProgressSink, Storage};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

const EVENT_BUFFER: usize = 32;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadEvent {
    Progress(u8),
    Succeeded(DocumentReference),
    Failed(UploadError),
}

impl UploadEvent {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, UploadEvent::Progress(_))
    }
}

/// Transfers proposal documents to the storage backend.
#[derive(Clone)]
pub struct UploadChannel {
    validator: FileValidator,
    storage: Arc<dyn Storage>,
    timeout: Duration,
}

impl UploadChannel {
    pub fn new(validator: FileValidator, storage: Arc<dyn Storage>, timeout: Duration) -> Self {
        Self {
            validator,
            storage,
            timeout,
        }
    }

    pub fn from_rules(rules: &ValidationRules, storage: Arc<dyn Storage>, timeout: Duration) -> Self {
        Self::new(FileValidator::from_rules(rules), storage, timeout)
    }

    /// Check a file against the type and size constraints. No I/O.
    pub fn validate(&self, file: &FileUpload) -> Result<(), FileValidationError> {
        self.validator.validate_upload(file)
    }

    /// Validate then start the transfer. An invalid file fails here, before
    /// any network call.
    pub fn upload(&self, attempt: AttemptId, file: FileUpload) -> Result<UploadStream, FileValidationError> {
        self.validate(&file)?;
        Ok(self.start(attempt, file))
    }

    /// Start the transfer of an already validated file.
    pub fn start(&self, attempt: AttemptId, file: FileUpload) -> UploadStream {
        let (tx, rx) = mpsc::channel(EVENT_BUFFER);
        let storage = self.storage.clone();
        let timeout = self.timeout;

        tracing::debug!(
            attempt = %attempt,
            filename = %file.descriptor.name,
            bytes = file.size(),
            backend = %storage.backend_type(),
            "Starting document upload"
        );

        let task = tokio::spawn(async move {
            let terminal = transfer(storage, file, timeout, &tx).await;
            match &terminal {
                UploadEvent::Succeeded(reference) => {
                    tracing::info!(attempt = %attempt, reference = %reference, "Document upload succeeded")
                }
                UploadEvent::Failed(error) => {
                    tracing::warn!(attempt = %attempt, error = %error, "Document upload failed")
                }
                UploadEvent::Progress(_) => {}
            }
            let _ = tx.send(terminal).await;
        });

        UploadStream {
            attempt,
            rx,
            task,
            finished: false,
        }
    }
}

/// Forward byte counts as percentages while the transfer runs, then return
/// the terminal event.
async fn transfer(
    storage: Arc<dyn Storage>,
    file: FileUpload,
    timeout: Duration,
    events: &mpsc::Sender<UploadEvent>,
) -> UploadEvent {
    let total = file.size();
    let (bytes_tx, mut bytes_rx) = mpsc::unbounded_channel();
    let upload = tokio::time::timeout(timeout, storage.upload(&file, ProgressSink::new(bytes_tx)));
    tokio::pin!(upload);

    let mut last_percent = 0u8;
    let outcome = loop {
        tokio::select! {
            biased;
            Some(bytes) = bytes_rx.recv() => {
                let percent = percent_of(bytes, total);
                // Never wait on a slow consumer. A full buffer drops this
                // update and the next byte count reports it again.
                if percent > last_percent && events.try_send(UploadEvent::Progress(percent)).is_ok() {
                    last_percent = percent;
                }
            }
            result = &mut upload => break result,
        }
    };

    match outcome {
        Ok(Ok(stored)) => {
            if last_percent < 100 {
                let _ = events.send(UploadEvent::Progress(100)).await;
            }
            UploadEvent::Succeeded(stored.reference)
        }
        Ok(Err(e)) => UploadEvent::Failed(e.into()),
        Err(_) => UploadEvent::Failed(UploadError::Timeout(timeout)),
    }
}

fn percent_of(bytes: u64, total: u64) -> u8 {
    if total == 0 {
        return 100;
    }
    ((bytes.min(total) * 100) / total) as u8
}

/// Events of one upload attempt.
///
/// Yields `Failed(UploadError::Interrupted)` if the transfer task ends
/// without reporting an outcome, so a terminal event is always observed.
pub struct UploadStream {
    attempt: AttemptId,
    rx: mpsc::Receiver<UploadEvent>,
    task: JoinHandle<()>,
    finished: bool,
}

impl UploadStream {
    pub fn attempt(&self) -> AttemptId {
        self.attempt
    }

    /// Drain the stream and return its terminal outcome.
    pub async fn outcome(mut self) -> Result<DocumentReference, UploadError> {
        use futures::StreamExt;

        while let Some(event) = self.next().await {
            match event {
                UploadEvent::Progress(_) => continue,
                UploadEvent::Succeeded(reference) => return Ok(reference),
                UploadEvent::Failed(error) => return Err(error),
            }
        }
        Err(UploadError::Interrupted)
    }
}

impl Stream for UploadStream {
    type Item = UploadEvent;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        if self.finished {
            return Poll::Ready(None);
        }
        match self.rx.poll_recv(cx) {
            Poll::Ready(Some(event)) => {
                if event.is_terminal() {
                    self.finished = true;
                }
                Poll::Ready(Some(event))
            }
            Poll::Ready(None) => {
                self.finished = true;
                Poll::Ready(Some(UploadEvent::Failed(UploadError::Interrupted)))
            }
            Poll::Pending => Poll::Pending,
        }
    }
}

impl Drop for UploadStream {
    fn drop(&mut self) {
        self.task.abort();
    }
}
