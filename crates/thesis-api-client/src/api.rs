//! Domain methods for the proposal API client.

use crate::{api_prefix, ApiClient};
use async_trait::async_trait;
use thesis_core::models::{SubmissionPayload, SubmissionRecord, Supervisor};
use thesis_core::{DirectoryLookup, GatewayError, SubmissionGateway};

impl ApiClient {
    /// Persist a completed proposal. Called once per user-initiated submit.
    pub async fn create_submission(
        &self,
        payload: &SubmissionPayload,
    ) -> Result<SubmissionRecord, GatewayError> {
        let path = format!("{}/proposals", api_prefix());
        tracing::debug!(
            path = %path,
            proposal_type = %payload.proposal_type,
            "Creating proposal submission"
        );

        let record: SubmissionRecord = self.post_json(&path, payload).await?;
        if record.id.trim().is_empty() {
            return Err(GatewayError::InvalidResponse(
                "Submission record has an empty id".to_string(),
            ));
        }
        Ok(record)
    }

    /// List supervisors, optionally filtered by department.
    pub async fn list_supervisors(
        &self,
        department: Option<&str>,
    ) -> Result<Vec<Supervisor>, GatewayError> {
        let mut query = Vec::new();
        if let Some(d) = department {
            query.push(("department", d.to_string()));
        }
        self.get(&format!("{}/supervisors", api_prefix()), &query)
            .await
    }
}

#[async_trait]
impl SubmissionGateway for ApiClient {
    async fn create_submission(
        &self,
        payload: &SubmissionPayload,
    ) -> Result<SubmissionRecord, GatewayError> {
        ApiClient::create_submission(self, payload).await
    }
}

#[async_trait]
impl DirectoryLookup for ApiClient {
    async fn list_supervisors(&self) -> Result<Vec<Supervisor>, GatewayError> {
        ApiClient::list_supervisors(self, self.department()).await
    }
}
