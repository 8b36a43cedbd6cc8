use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::draft::{DocumentReference, DraftField, DraftSubmission, ProposalType, SupervisorId};

/// Final payload sent to the submission endpoint, assembled from a draft.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionPayload {
    pub title: String,
    #[serde(rename = "type")]
    pub proposal_type: ProposalType,
    #[serde(rename = "abstract")]
    pub abstract_text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub methodology: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub references: Option<String>,
    pub keywords: Vec<String>,
    pub team_members: Vec<String>,
    pub primary_supervisor_id: SupervisorId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub co_supervisor_id: Option<SupervisorId>,
    pub document_reference: DocumentReference,
}

impl TryFrom<&DraftSubmission> for SubmissionPayload {
    type Error = DraftField;

    /// Fails with the first mandatory field that is still unset.
    fn try_from(draft: &DraftSubmission) -> Result<Self, Self::Error> {
        let proposal_type = draft.proposal_type.ok_or(DraftField::ProposalType)?;
        let primary_supervisor_id = draft
            .primary_supervisor_id
            .clone()
            .ok_or(DraftField::PrimarySupervisor)?;
        let document_reference = draft
            .document_reference
            .clone()
            .ok_or(DraftField::DocumentReference)?;

        Ok(SubmissionPayload {
            title: draft.title.trim().to_string(),
            proposal_type,
            abstract_text: draft.abstract_text.trim().to_string(),
            methodology: non_blank(&draft.methodology),
            references: non_blank(&draft.references),
            keywords: draft.keywords.clone(),
            team_members: draft.team_members.clone(),
            primary_supervisor_id,
            co_supervisor_id: draft.co_supervisor_id.clone(),
            document_reference,
        })
    }
}

fn non_blank(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(String::from)
}

/// Durable record returned by the submission endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionRecord {
    pub id: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}
