use std::collections::{BTreeMap, BTreeSet};

use crate::config::ValidationRules;
use crate::models::{
    DraftField, DraftSubmission, FieldRule, StepDefinition, Supervisor, SupervisorId,
    UploadAttempt, UploadStatus, ValidationResult,
};

/// Rule checker for wizard steps.
///
/// `validate` has no side effects and touches no network: the result depends
/// only on the step definitions, the draft, the upload slot and the eligible
/// supervisor list (when one was loaded).
#[derive(Debug, Clone)]
pub struct StepValidator {
    steps: Vec<StepDefinition>,
    eligible_supervisors: Option<BTreeSet<SupervisorId>>,
}

impl StepValidator {
    pub fn new(steps: Vec<StepDefinition>) -> Self {
        Self {
            steps,
            eligible_supervisors: None,
        }
    }

    pub fn standard(rules: &ValidationRules) -> Self {
        Self::new(StepDefinition::standard(rules))
    }

    pub fn steps(&self) -> &[StepDefinition] {
        &self.steps
    }

    pub fn step_count(&self) -> usize {
        self.steps.len()
    }

    /// Restrict supervisor fields to the given directory entries.
    pub fn set_eligible_supervisors(&mut self, supervisors: &[Supervisor]) {
        self.eligible_supervisors = Some(supervisors.iter().map(|s| s.id.clone()).collect());
    }

    /// Validate one step. An index without a definition has no rules and is valid.
    pub fn validate(
        &self,
        step_index: usize,
        draft: &DraftSubmission,
        upload: &UploadAttempt,
    ) -> ValidationResult {
        let Some(definition) = self.steps.get(step_index) else {
            return ValidationResult::valid(step_index);
        };

        let mut errors: BTreeMap<DraftField, Vec<String>> = BTreeMap::new();

        for rule in &definition.rules {
            if let Some(message) = self.check_rule(rule, draft, upload) {
                errors.entry(rule.field()).or_default().push(message);
            }
        }

        // A field already flagged by a rule does not also get a "required" message.
        for field in &definition.required_fields {
            if !errors.contains_key(field) && is_missing(*field, draft) {
                errors
                    .entry(*field)
                    .or_default()
                    .push(format!("{} is required", field.label()));
            }
        }

        ValidationResult::new(step_index, errors)
    }

    /// Validate every step in order and return the first failing result.
    pub fn validate_all(
        &self,
        draft: &DraftSubmission,
        upload: &UploadAttempt,
    ) -> Result<(), ValidationResult> {
        for index in 0..self.steps.len() {
            let result = self.validate(index, draft, upload);
            if !result.is_valid() {
                return Err(result);
            }
        }
        Ok(())
    }

    fn check_rule(
        &self,
        rule: &FieldRule,
        draft: &DraftSubmission,
        upload: &UploadAttempt,
    ) -> Option<String> {
        match rule {
            FieldRule::MaxLength { field, max } => {
                let len = text_of(*field, draft).map(char_len).unwrap_or(0);
                (len > *max)
                    .then(|| format!("{} must be at most {} characters", field.label(), max))
            }
            FieldRule::LengthBetween { field, min, max } => {
                let len = text_of(*field, draft).map(char_len).unwrap_or(0);
                // Blank values are reported by the required check instead.
                (len > 0 && (len < *min || len > *max)).then(|| {
                    format!(
                        "{} must be between {} and {} characters (currently {})",
                        field.label(),
                        min,
                        max,
                        len
                    )
                })
            }
            FieldRule::MaxItems { field, max } => {
                let count = items_of(*field, draft).map(<[String]>::len).unwrap_or(0);
                (count > *max).then(|| format!("At most {} {} are allowed", max, field.label().to_lowercase()))
            }
            FieldRule::Distinct { field, other } => {
                let value = supervisor_of(*field, draft)?;
                let other_value = supervisor_of(*other, draft)?;
                (value == other_value)
                    .then(|| format!("{} must differ from the {}", field.label(), other.label().to_lowercase()))
            }
            FieldRule::EligibleSupervisor(field) => {
                let eligible = self.eligible_supervisors.as_ref()?;
                let value = supervisor_of(*field, draft)?;
                (!eligible.contains(value))
                    .then(|| format!("{} '{}' is not available", field.label(), value))
            }
            FieldRule::UploadCompleted => upload_message(draft, upload),
        }
    }
}

fn upload_message(draft: &DraftSubmission, upload: &UploadAttempt) -> Option<String> {
    match upload.status() {
        UploadStatus::Idle => None,
        UploadStatus::InProgress => Some("Document upload is still in progress".to_string()),
        UploadStatus::Failed => {
            Some("Document upload failed; upload the file again".to_string())
        }
        UploadStatus::Succeeded => {
            let matches = draft.document_reference.is_some()
                && draft.document_reference.as_ref() == upload.result_reference();
            (!matches).then(|| "Upload the proposal document again".to_string())
        }
    }
}

fn is_missing(field: DraftField, draft: &DraftSubmission) -> bool {
    match field {
        DraftField::ProposalType => draft.proposal_type.is_none(),
        DraftField::Keywords | DraftField::TeamMembers => {
            items_of(field, draft).map(<[String]>::is_empty).unwrap_or(true)
        }
        DraftField::PrimarySupervisor | DraftField::CoSupervisor => {
            supervisor_of(field, draft).is_none()
        }
        DraftField::DocumentReference => draft.document_reference.is_none(),
        _ => text_of(field, draft)
            .map(|t| t.trim().is_empty())
            .unwrap_or(true),
    }
}

fn text_of(field: DraftField, draft: &DraftSubmission) -> Option<&str> {
    match field {
        DraftField::Title => Some(draft.title.as_str()),
        DraftField::Abstract => Some(draft.abstract_text.as_str()),
        DraftField::Methodology => draft.methodology.as_deref(),
        DraftField::References => draft.references.as_deref(),
        _ => None,
    }
}

fn items_of(field: DraftField, draft: &DraftSubmission) -> Option<&[String]> {
    match field {
        DraftField::Keywords => Some(draft.keywords.as_slice()),
        DraftField::TeamMembers => Some(draft.team_members.as_slice()),
        _ => None,
    }
}

fn supervisor_of(field: DraftField, draft: &DraftSubmission) -> Option<&SupervisorId> {
    match field {
        DraftField::PrimarySupervisor => draft.primary_supervisor_id.as_ref(),
        DraftField::CoSupervisor => draft.co_supervisor_id.as_ref(),
        _ => None,
    }
}

/// Length in characters of the trimmed text.
fn char_len(text: &str) -> usize {
    text.trim().chars().count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AttemptId, DraftPatch, FileDescriptor, ProposalType, WizardStep};

    fn validator() -> StepValidator {
        StepValidator::standard(&ValidationRules::default())
    }

    fn abstract_of(len: usize) -> String {
        "a".repeat(len)
    }

    fn pdf() -> FileDescriptor {
        FileDescriptor {
            name: "proposal.pdf".to_string(),
            size: 2048,
            content_type: "application/pdf".to_string(),
        }
    }

    fn complete_draft() -> (DraftSubmission, UploadAttempt) {
        let mut draft = DraftSubmission::default();
        draft.apply(
            DraftPatch::new()
                .title("Thesis X")
                .proposal_type(ProposalType::Thesis)
                .keywords(["rust", "compilers"])
                .abstract_text(abstract_of(600))
                .primary_supervisor(Some("T1".into())),
        );
        let mut upload = UploadAttempt::begin(AttemptId::new(1), pdf());
        upload.succeed("doc://abc123".into());
        draft.document_reference = Some("doc://abc123".into());
        (draft, upload)
    }

    #[test]
    fn test_complete_draft_passes_every_step() {
        let (draft, upload) = complete_draft();
        assert!(validator().validate_all(&draft, &upload).is_ok());
    }

    #[test]
    fn test_empty_draft_fails_first_step() {
        let result = validator().validate(0, &DraftSubmission::default(), &UploadAttempt::idle());
        assert!(!result.is_valid());
        assert_eq!(result.errors_for(DraftField::Title), ["Title is required"]);
        assert!(!result.errors_for(DraftField::ProposalType).is_empty());
        assert!(!result.errors_for(DraftField::Keywords).is_empty());
    }

    #[test]
    fn test_title_too_long() {
        let (mut draft, upload) = complete_draft();
        draft.title = "t".repeat(201);
        let result = validator().validate(0, &draft, &upload);
        assert_eq!(
            result.errors_for(DraftField::Title),
            ["Title must be at most 200 characters"]
        );
    }

    #[test]
    fn test_whitespace_title_is_missing() {
        let (mut draft, upload) = complete_draft();
        draft.title = "   ".to_string();
        let result = validator().validate(0, &draft, &upload);
        assert_eq!(result.errors_for(DraftField::Title), ["Title is required"]);
    }

    #[test]
    fn test_abstract_bounds() {
        let (mut draft, upload) = complete_draft();
        let v = validator();

        draft.abstract_text = abstract_of(149);
        assert!(!v.validate(1, &draft, &upload).is_valid());

        draft.abstract_text = abstract_of(150);
        assert!(v.validate(1, &draft, &upload).is_valid());

        draft.abstract_text = abstract_of(3000);
        assert!(v.validate(1, &draft, &upload).is_valid());

        draft.abstract_text = abstract_of(3001);
        let result = v.validate(1, &draft, &upload);
        assert_eq!(result.errors_for(DraftField::Abstract).len(), 1);
        assert!(result.errors_for(DraftField::Abstract)[0].contains("between 150 and 3000"));
    }

    #[test]
    fn test_abstract_counts_characters_not_bytes() {
        let (mut draft, upload) = complete_draft();
        draft.abstract_text = "é".repeat(150);
        assert!(validator().validate(1, &draft, &upload).is_valid());
    }

    #[test]
    fn test_too_many_team_members() {
        let (mut draft, upload) = complete_draft();
        draft.apply(DraftPatch::new().team_members(["a", "b", "c", "d", "e"]));
        let result = validator().validate(WizardStep::Team.index(), &draft, &upload);
        assert!(!result.is_valid());
    }

    #[test]
    fn test_supervisor_required_and_distinct() {
        let (mut draft, upload) = complete_draft();
        let v = validator();
        let step = WizardStep::Supervisors.index();

        draft.primary_supervisor_id = None;
        let result = v.validate(step, &draft, &upload);
        assert_eq!(
            result.errors_for(DraftField::PrimarySupervisor),
            ["Primary supervisor is required"]
        );

        draft.primary_supervisor_id = Some("T1".into());
        draft.co_supervisor_id = Some("T1".into());
        let result = v.validate(step, &draft, &upload);
        assert_eq!(result.errors_for(DraftField::CoSupervisor).len(), 1);
        assert!(result.errors_for(DraftField::PrimarySupervisor).is_empty());
    }

    #[test]
    fn test_supervisor_must_be_eligible_once_directory_loaded() {
        let (draft, upload) = complete_draft();
        let mut v = validator();
        let step = WizardStep::Supervisors.index();
        assert!(v.validate(step, &draft, &upload).is_valid());

        v.set_eligible_supervisors(&[Supervisor {
            id: "T2".into(),
            name: "Dr. Two".to_string(),
            department: None,
        }]);
        let result = v.validate(step, &draft, &upload);
        assert_eq!(
            result.errors_for(DraftField::PrimarySupervisor),
            ["Primary supervisor 'T1' is not available"]
        );
    }

    #[test]
    fn test_documentation_requires_finished_upload() {
        let v = validator();
        let step = WizardStep::Documentation.index();
        let draft = DraftSubmission::default();

        let result = v.validate(step, &draft, &UploadAttempt::idle());
        assert_eq!(
            result.errors_for(DraftField::DocumentReference),
            ["Proposal document is required"]
        );

        let pending = UploadAttempt::begin(AttemptId::new(2), pdf());
        let result = v.validate(step, &draft, &pending);
        assert_eq!(
            result.errors_for(DraftField::DocumentReference),
            ["Document upload is still in progress"]
        );
    }

    #[test]
    fn test_documentation_rejects_stale_reference() {
        let (mut draft, upload) = complete_draft();
        draft.document_reference = Some("doc://old".into());
        let result = validator().validate(WizardStep::Documentation.index(), &draft, &upload);
        assert!(!result.is_valid());
    }

    #[test]
    fn test_validate_all_returns_first_failing_step() {
        let (mut draft, upload) = complete_draft();
        draft.primary_supervisor_id = None;
        draft.title.clear();
        let failing = validator().validate_all(&draft, &upload).unwrap_err();
        assert_eq!(failing.step_index(), 0);
    }

    #[test]
    fn test_unknown_step_is_valid() {
        let result = validator().validate(42, &DraftSubmission::default(), &UploadAttempt::idle());
        assert!(result.is_valid());
        assert_eq!(result.step_index(), 42);
    }

    #[test]
    fn test_validate_is_deterministic() {
        let (draft, upload) = complete_draft();
        let v = validator();
        assert_eq!(v.validate(3, &draft, &upload), v.validate(3, &draft, &upload));
    }
}
