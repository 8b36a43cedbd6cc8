use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::draft::DraftField;

/// Outcome of validating one step. Produced fresh on every request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    step_index: usize,
    is_valid: bool,
    field_errors: BTreeMap<DraftField, Vec<String>>,
}

impl ValidationResult {
    pub fn new(step_index: usize, field_errors: BTreeMap<DraftField, Vec<String>>) -> Self {
        let field_errors: BTreeMap<_, _> = field_errors
            .into_iter()
            .filter(|(_, messages)| !messages.is_empty())
            .collect();
        Self {
            step_index,
            is_valid: field_errors.is_empty(),
            field_errors,
        }
    }

    pub fn valid(step_index: usize) -> Self {
        Self::new(step_index, BTreeMap::new())
    }

    pub fn step_index(&self) -> usize {
        self.step_index
    }

    pub fn is_valid(&self) -> bool {
        self.is_valid
    }

    pub fn field_errors(&self) -> &BTreeMap<DraftField, Vec<String>> {
        &self.field_errors
    }

    pub fn errors_for(&self, field: DraftField) -> &[String] {
        self.field_errors
            .get(&field)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// All messages joined for logs and generic error displays.
    pub fn summary(&self) -> String {
        self.field_errors
            .values()
            .flatten()
            .cloned()
            .collect::<Vec<_>>()
            .join("; ")
    }
}
