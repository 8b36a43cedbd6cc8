use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use super::draft::DraftField;
use crate::config::ValidationRules;

/// The fixed sequence of wizard steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WizardStep {
    BasicInformation,
    Description,
    Team,
    Supervisors,
    Documentation,
    Review,
}

impl WizardStep {
    pub const ALL: [WizardStep; 6] = [
        WizardStep::BasicInformation,
        WizardStep::Description,
        WizardStep::Team,
        WizardStep::Supervisors,
        WizardStep::Documentation,
        WizardStep::Review,
    ];

    pub const COUNT: usize = Self::ALL.len();

    pub fn index(&self) -> usize {
        match self {
            WizardStep::BasicInformation => 0,
            WizardStep::Description => 1,
            WizardStep::Team => 2,
            WizardStep::Supervisors => 3,
            WizardStep::Documentation => 4,
            WizardStep::Review => 5,
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            WizardStep::BasicInformation => "Basic information",
            WizardStep::Description => "Description",
            WizardStep::Team => "Team",
            WizardStep::Supervisors => "Supervisors",
            WizardStep::Documentation => "Documentation",
            WizardStep::Review => "Review",
        }
    }

    /// Step on which a field is entered.
    pub fn owning(field: DraftField) -> Self {
        match field {
            DraftField::Title | DraftField::ProposalType | DraftField::Keywords => {
                WizardStep::BasicInformation
            }
            DraftField::Abstract | DraftField::Methodology | DraftField::References => {
                WizardStep::Description
            }
            DraftField::TeamMembers => WizardStep::Team,
            DraftField::PrimarySupervisor | DraftField::CoSupervisor => WizardStep::Supervisors,
            DraftField::DocumentReference => WizardStep::Documentation,
        }
    }
}

/// Per-field predicate evaluated by the step validator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldRule {
    /// Text field at most `max` characters long
    MaxLength { field: DraftField, max: usize },
    /// Text field length within `[min, max]` characters
    LengthBetween {
        field: DraftField,
        min: usize,
        max: usize,
    },
    /// List field with at most `max` entries
    MaxItems { field: DraftField, max: usize },
    /// Optional supervisor field must not repeat `other`
    Distinct { field: DraftField, other: DraftField },
    /// Supervisor must appear in the directory list, when one is loaded
    EligibleSupervisor(DraftField),
    /// The upload slot holds a finished upload matching the draft reference
    UploadCompleted,
}

impl FieldRule {
    pub fn field(&self) -> DraftField {
        match self {
            FieldRule::MaxLength { field, .. }
            | FieldRule::LengthBetween { field, .. }
            | FieldRule::MaxItems { field, .. }
            | FieldRule::Distinct { field, .. }
            | FieldRule::EligibleSupervisor(field) => *field,
            FieldRule::UploadCompleted => DraftField::DocumentReference,
        }
    }
}

/// Static definition of one step: what must be present and what must hold.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepDefinition {
    pub index: usize,
    pub step: WizardStep,
    pub required_fields: BTreeSet<DraftField>,
    pub rules: Vec<FieldRule>,
}

impl StepDefinition {
    /// The standard six-step proposal wizard built from configured limits.
    pub fn standard(rules: &ValidationRules) -> Vec<StepDefinition> {
        WizardStep::ALL
            .into_iter()
            .map(|step| {
                let (required, field_rules): (Vec<DraftField>, Vec<FieldRule>) = match step {
                    WizardStep::BasicInformation => (
                        vec![
                            DraftField::Title,
                            DraftField::ProposalType,
                            DraftField::Keywords,
                        ],
                        vec![
                            FieldRule::MaxLength {
                                field: DraftField::Title,
                                max: rules.max_title_length,
                            },
                            FieldRule::MaxItems {
                                field: DraftField::Keywords,
                                max: rules.max_keywords,
                            },
                        ],
                    ),
                    WizardStep::Description => (
                        vec![DraftField::Abstract],
                        vec![
                            FieldRule::LengthBetween {
                                field: DraftField::Abstract,
                                min: rules.abstract_min_length,
                                max: rules.abstract_max_length,
                            },
                            FieldRule::MaxLength {
                                field: DraftField::Methodology,
                                max: rules.max_methodology_length,
                            },
                            FieldRule::MaxLength {
                                field: DraftField::References,
                                max: rules.max_references_length,
                            },
                        ],
                    ),
                    WizardStep::Team => (
                        vec![],
                        vec![FieldRule::MaxItems {
                            field: DraftField::TeamMembers,
                            max: rules.max_team_members,
                        }],
                    ),
                    WizardStep::Supervisors => (
                        vec![DraftField::PrimarySupervisor],
                        vec![
                            FieldRule::EligibleSupervisor(DraftField::PrimarySupervisor),
                            FieldRule::EligibleSupervisor(DraftField::CoSupervisor),
                            FieldRule::Distinct {
                                field: DraftField::CoSupervisor,
                                other: DraftField::PrimarySupervisor,
                            },
                        ],
                    ),
                    WizardStep::Documentation => (
                        vec![DraftField::DocumentReference],
                        vec![FieldRule::UploadCompleted],
                    ),
                    WizardStep::Review => (vec![], vec![]),
                };

                StepDefinition {
                    index: step.index(),
                    step,
                    required_fields: required.into_iter().collect(),
                    rules: field_rules,
                }
            })
            .collect()
    }
}
