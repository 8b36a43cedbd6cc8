//! Collaborator interfaces
//!
//! The wizard consumes these services but does not implement them. The HTTP
//! client crate provides the production implementation; tests substitute
//! in-memory fakes.

use async_trait::async_trait;

use crate::error::GatewayError;
use crate::models::{SubmissionPayload, SubmissionRecord, Supervisor};

/// Persists a completed submission server-side.
///
/// Implementations must never retry on their own: a retry after a timeout is
/// a user decision.
#[async_trait]
pub trait SubmissionGateway: Send + Sync {
    async fn create_submission(
        &self,
        payload: &SubmissionPayload,
    ) -> Result<SubmissionRecord, GatewayError>;
}

/// Read-only list of supervisors eligible for the supervisor step.
#[async_trait]
pub trait DirectoryLookup: Send + Sync {
    async fn list_supervisors(&self) -> Result<Vec<Supervisor>, GatewayError>;
}
