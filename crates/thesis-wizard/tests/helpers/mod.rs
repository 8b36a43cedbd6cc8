//! In-memory collaborators for wizard tests.

#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use thesis_core::models::{
    DocumentReference, DraftPatch, FileUpload, ProposalType, SubmissionPayload, SubmissionRecord,
    Supervisor, SupervisorId,
};
use thesis_core::{DirectoryLookup, GatewayError, StorageBackend, SubmissionGateway, WizardConfig};
use thesis_storage::{ProgressSink, Storage, StorageError, StorageResult, StoredFile};
use thesis_wizard::WizardController;
use tokio::sync::Notify;

/// Submission gateway that records every payload it receives.
pub struct MockGateway {
    calls: Mutex<Vec<SubmissionPayload>>,
    responses: Mutex<VecDeque<Result<SubmissionRecord, GatewayError>>>,
    gate: Option<Arc<Notify>>,
    delay: Option<Duration>,
    counter: AtomicU64,
}

impl MockGateway {
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            responses: Mutex::new(VecDeque::new()),
            gate: None,
            delay: None,
            counter: AtomicU64::new(0),
        }
    }

    /// Every call waits until the returned handle is notified.
    pub fn gated() -> (Self, Arc<Notify>) {
        let gate = Arc::new(Notify::new());
        let mut gateway = Self::new();
        gateway.gate = Some(gate.clone());
        (gateway, gate)
    }

    pub fn slow(delay: Duration) -> Self {
        let mut gateway = Self::new();
        gateway.delay = Some(delay);
        gateway
    }

    /// Queue the answer for the next call. Calls without a queued answer succeed.
    pub fn respond_with(&self, response: Result<SubmissionRecord, GatewayError>) {
        self.responses.lock().unwrap().push_back(response);
    }

    pub fn calls(&self) -> Vec<SubmissionPayload> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl SubmissionGateway for MockGateway {
    async fn create_submission(
        &self,
        payload: &SubmissionPayload,
    ) -> Result<SubmissionRecord, GatewayError> {
        self.calls.lock().unwrap().push(payload.clone());
        let n = self.counter.fetch_add(1, Ordering::SeqCst) + 1;

        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let queued = self.responses.lock().unwrap().pop_front();
        queued.unwrap_or_else(|| {
            Ok(SubmissionRecord {
                id: format!("prop-{}", n),
                status: Some("pending".to_string()),
                created_at: None,
            })
        })
    }
}

/// Storage that keeps uploads in memory and answers with `doc://{filename}`.
///
/// Individual files can be held until released, or made to fail.
pub struct MemoryStorage {
    uploaded: Mutex<Vec<String>>,
    calls: AtomicU64,
    gates: Mutex<HashMap<String, Arc<Notify>>>,
    failures: Mutex<HashMap<String, u16>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self {
            uploaded: Mutex::new(Vec::new()),
            calls: AtomicU64::new(0),
            gates: Mutex::new(HashMap::new()),
            failures: Mutex::new(HashMap::new()),
        }
    }

    /// The upload of `filename` stalls at 50% until the handle is notified.
    pub fn hold(&self, filename: &str) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        self.gates
            .lock()
            .unwrap()
            .insert(filename.to_string(), gate.clone());
        gate
    }

    pub fn reject(&self, filename: &str, status: u16) {
        self.failures
            .lock()
            .unwrap()
            .insert(filename.to_string(), status);
    }

    pub fn call_count(&self) -> u64 {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn uploaded(&self) -> Vec<String> {
        self.uploaded.lock().unwrap().clone()
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn upload(&self, file: &FileUpload, progress: ProgressSink) -> StorageResult<StoredFile> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let name = file.descriptor.name.clone();

        progress.report(file.size() / 2);

        let gate = self.gates.lock().unwrap().get(&name).cloned();
        if let Some(gate) = gate {
            gate.notified().await;
        }

        let failure = self.failures.lock().unwrap().get(&name).copied();
        if let Some(status) = failure {
            return Err(StorageError::Rejected {
                status,
                message: "rejected by test storage".to_string(),
            });
        }

        progress.report(file.size());
        self.uploaded.lock().unwrap().push(name.clone());

        Ok(StoredFile {
            reference: DocumentReference::new(format!("doc://{}", name)),
            url: None,
            size: file.size(),
        })
    }

    async fn delete(&self, _reference: &DocumentReference) -> StorageResult<()> {
        Ok(())
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Local
    }
}

pub struct MockDirectory {
    supervisors: Vec<Supervisor>,
    fail: bool,
}

impl MockDirectory {
    pub fn with(ids: &[&str]) -> Self {
        Self {
            supervisors: ids
                .iter()
                .map(|id| Supervisor {
                    id: SupervisorId::new(*id),
                    name: format!("Supervisor {}", id),
                    department: Some("Computer Science".to_string()),
                })
                .collect(),
            fail: false,
        }
    }

    pub fn unavailable() -> Self {
        Self {
            supervisors: Vec::new(),
            fail: true,
        }
    }
}

#[async_trait]
impl DirectoryLookup for MockDirectory {
    async fn list_supervisors(&self) -> Result<Vec<Supervisor>, GatewayError> {
        if self.fail {
            return Err(GatewayError::Server {
                status: 503,
                message: "directory offline".to_string(),
            });
        }
        Ok(self.supervisors.clone())
    }
}

pub struct TestWizard {
    pub wizard: Arc<WizardController>,
    pub gateway: Arc<MockGateway>,
    pub storage: Arc<MemoryStorage>,
}

pub fn wizard_with(gateway: MockGateway, config: WizardConfig) -> TestWizard {
    let gateway = Arc::new(gateway);
    let storage = Arc::new(MemoryStorage::new());
    let wizard = WizardController::new(config, storage.clone(), gateway.clone());
    TestWizard {
        wizard: Arc::new(wizard),
        gateway,
        storage,
    }
}

pub fn test_wizard() -> TestWizard {
    wizard_with(MockGateway::new(), WizardConfig::default())
}

pub fn pdf(name: &str, size: usize) -> FileUpload {
    FileUpload::new(name, "application/pdf", vec![0x25u8; size])
}

pub fn abstract_of(chars: usize) -> String {
    "a".repeat(chars)
}

/// Fields for every step except the document.
pub fn valid_fields() -> DraftPatch {
    DraftPatch::new()
        .title("Thesis X")
        .proposal_type(ProposalType::Thesis)
        .keywords(["distributed systems", "consensus"])
        .abstract_text(abstract_of(600))
        .primary_supervisor(Some(SupervisorId::new("T1")))
}

/// Fill every step with valid data, upload `proposal.pdf` and walk to the
/// review step.
pub async fn complete_to_review(wizard: &WizardController) -> DocumentReference {
    wizard.set(valid_fields()).await.unwrap();
    let reference = wizard
        .upload_document(pdf("proposal.pdf", 4096))
        .await
        .unwrap();
    while wizard.current_step().await < 5 {
        wizard.advance().await.unwrap();
    }
    reference
}
