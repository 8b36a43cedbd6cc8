use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

/// Kind of proposal being submitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProposalType {
    Thesis,
    Project,
    Research,
}

impl FromStr for ProposalType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "thesis" => Ok(ProposalType::Thesis),
            "project" => Ok(ProposalType::Project),
            "research" => Ok(ProposalType::Research),
            _ => Err(anyhow::anyhow!("Invalid proposal type: {}", s)),
        }
    }
}

impl Display for ProposalType {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            ProposalType::Thesis => write!(f, "thesis"),
            ProposalType::Project => write!(f, "project"),
            ProposalType::Research => write!(f, "research"),
        }
    }
}

/// Identifier of a supervisor as issued by the directory.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SupervisorId(String);

impl SupervisorId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for SupervisorId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl Display for SupervisorId {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(&self.0)
    }
}

/// Opaque handle to a stored document, assigned by the storage endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentReference(String);

impl DocumentReference {
    pub fn new(reference: impl Into<String>) -> Self {
        Self(reference.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for DocumentReference {
    fn from(reference: &str) -> Self {
        Self::new(reference)
    }
}

impl Display for DocumentReference {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(&self.0)
    }
}

/// Every field of a draft submission. Serialized with the wire name the
/// submission endpoint uses, so server-side field errors map back here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DraftField {
    #[serde(rename = "title")]
    Title,
    #[serde(rename = "type")]
    ProposalType,
    #[serde(rename = "abstract")]
    Abstract,
    #[serde(rename = "methodology")]
    Methodology,
    #[serde(rename = "references")]
    References,
    #[serde(rename = "keywords")]
    Keywords,
    #[serde(rename = "teamMembers")]
    TeamMembers,
    #[serde(rename = "primarySupervisorId")]
    PrimarySupervisor,
    #[serde(rename = "coSupervisorId")]
    CoSupervisor,
    #[serde(rename = "documentReference")]
    DocumentReference,
}

impl DraftField {
    pub const ALL: [DraftField; 10] = [
        DraftField::Title,
        DraftField::ProposalType,
        DraftField::Abstract,
        DraftField::Methodology,
        DraftField::References,
        DraftField::Keywords,
        DraftField::TeamMembers,
        DraftField::PrimarySupervisor,
        DraftField::CoSupervisor,
        DraftField::DocumentReference,
    ];

    pub fn wire_name(&self) -> &'static str {
        match self {
            DraftField::Title => "title",
            DraftField::ProposalType => "type",
            DraftField::Abstract => "abstract",
            DraftField::Methodology => "methodology",
            DraftField::References => "references",
            DraftField::Keywords => "keywords",
            DraftField::TeamMembers => "teamMembers",
            DraftField::PrimarySupervisor => "primarySupervisorId",
            DraftField::CoSupervisor => "coSupervisorId",
            DraftField::DocumentReference => "documentReference",
        }
    }

    /// Human-readable label used in validation messages.
    pub fn label(&self) -> &'static str {
        match self {
            DraftField::Title => "Title",
            DraftField::ProposalType => "Proposal type",
            DraftField::Abstract => "Abstract",
            DraftField::Methodology => "Methodology",
            DraftField::References => "References",
            DraftField::Keywords => "Keywords",
            DraftField::TeamMembers => "Team members",
            DraftField::PrimarySupervisor => "Primary supervisor",
            DraftField::CoSupervisor => "Co-supervisor",
            DraftField::DocumentReference => "Proposal document",
        }
    }

    /// Resolve a field name reported by the server. Accepts the wire name and
    /// the snake_case spelling.
    pub fn from_wire(name: &str) -> Option<Self> {
        let normalized: String = name
            .trim()
            .chars()
            .filter(|c| *c != '_')
            .collect::<String>()
            .to_lowercase();
        DraftField::ALL
            .into_iter()
            .find(|f| f.wire_name().to_lowercase() == normalized)
            .or(match normalized.as_str() {
                "proposaltype" => Some(DraftField::ProposalType),
                "abstracttext" => Some(DraftField::Abstract),
                "supervisorid" | "primarysupervisor" => Some(DraftField::PrimarySupervisor),
                "cosupervisor" => Some(DraftField::CoSupervisor),
                "document" => Some(DraftField::DocumentReference),
                _ => None,
            })
    }
}

impl Display for DraftField {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.wire_name())
    }
}

/// In-progress proposal assembled across the wizard steps.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftSubmission {
    pub title: String,
    #[serde(rename = "type")]
    pub proposal_type: Option<ProposalType>,
    #[serde(rename = "abstract")]
    pub abstract_text: String,
    pub methodology: Option<String>,
    pub references: Option<String>,
    pub keywords: Vec<String>,
    pub team_members: Vec<String>,
    pub primary_supervisor_id: Option<SupervisorId>,
    pub co_supervisor_id: Option<SupervisorId>,
    pub document_reference: Option<DocumentReference>,
}

impl DraftSubmission {
    pub fn is_empty(&self) -> bool {
        *self == DraftSubmission::default()
    }

    /// Shallow merge: only the fields present in the patch are replaced.
    /// Returns the fields whose value actually changed.
    pub fn apply(&mut self, patch: DraftPatch) -> Vec<DraftField> {
        let before = self.clone();

        if let Some(title) = patch.title {
            self.title = title;
        }
        if let Some(proposal_type) = patch.proposal_type {
            self.proposal_type = proposal_type;
        }
        if let Some(abstract_text) = patch.abstract_text {
            self.abstract_text = abstract_text;
        }
        if let Some(methodology) = patch.methodology {
            self.methodology = methodology;
        }
        if let Some(references) = patch.references {
            self.references = references;
        }
        if let Some(keywords) = patch.keywords {
            self.keywords = normalize_ordered_set(keywords);
        }
        if let Some(team_members) = patch.team_members {
            self.team_members = normalize_ordered_set(team_members);
        }
        if let Some(primary) = patch.primary_supervisor_id {
            self.primary_supervisor_id = primary;
        }
        if let Some(co) = patch.co_supervisor_id {
            self.co_supervisor_id = co;
        }

        before.diff(self)
    }

    /// Fields that differ between `self` and `other`.
    pub fn diff(&self, other: &DraftSubmission) -> Vec<DraftField> {
        DraftField::ALL
            .into_iter()
            .filter(|field| match field {
                DraftField::Title => self.title != other.title,
                DraftField::ProposalType => self.proposal_type != other.proposal_type,
                DraftField::Abstract => self.abstract_text != other.abstract_text,
                DraftField::Methodology => self.methodology != other.methodology,
                DraftField::References => self.references != other.references,
                DraftField::Keywords => self.keywords != other.keywords,
                DraftField::TeamMembers => self.team_members != other.team_members,
                DraftField::PrimarySupervisor => {
                    self.primary_supervisor_id != other.primary_supervisor_id
                }
                DraftField::CoSupervisor => self.co_supervisor_id != other.co_supervisor_id,
                DraftField::DocumentReference => {
                    self.document_reference != other.document_reference
                }
            })
            .collect()
    }
}

/// Partial update of a draft. `None` leaves a field untouched; for optional
/// fields `Some(None)` clears it.
///
/// The document reference is deliberately absent: it is only ever written by
/// a successful upload.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DraftPatch {
    pub title: Option<String>,
    pub proposal_type: Option<Option<ProposalType>>,
    pub abstract_text: Option<String>,
    pub methodology: Option<Option<String>>,
    pub references: Option<Option<String>>,
    pub keywords: Option<Vec<String>>,
    pub team_members: Option<Vec<String>>,
    pub primary_supervisor_id: Option<Option<SupervisorId>>,
    pub co_supervisor_id: Option<Option<SupervisorId>>,
}

impl DraftPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn proposal_type(mut self, proposal_type: ProposalType) -> Self {
        self.proposal_type = Some(Some(proposal_type));
        self
    }

    pub fn abstract_text(mut self, text: impl Into<String>) -> Self {
        self.abstract_text = Some(text.into());
        self
    }

    pub fn methodology(mut self, methodology: Option<String>) -> Self {
        self.methodology = Some(methodology);
        self
    }

    pub fn references(mut self, references: Option<String>) -> Self {
        self.references = Some(references);
        self
    }

    pub fn keywords<I, S>(mut self, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.keywords = Some(keywords.into_iter().map(Into::into).collect());
        self
    }

    pub fn team_members<I, S>(mut self, members: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.team_members = Some(members.into_iter().map(Into::into).collect());
        self
    }

    pub fn primary_supervisor(mut self, id: Option<SupervisorId>) -> Self {
        self.primary_supervisor_id = Some(id);
        self
    }

    pub fn co_supervisor(mut self, id: Option<SupervisorId>) -> Self {
        self.co_supervisor_id = Some(id);
        self
    }

    pub fn is_empty(&self) -> bool {
        *self == DraftPatch::default()
    }
}

/// Trim entries, drop blanks, and remove case-insensitive duplicates while
/// keeping the first occurrence in place.
pub fn normalize_ordered_set(values: Vec<String>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    values
        .into_iter()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .filter(|v| seen.insert(v.to_lowercase()))
        .collect()
}
