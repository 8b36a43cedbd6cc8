use serde::{Deserialize, Serialize};

use super::draft::SupervisorId;

/// Eligible supervisor as listed by the directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Supervisor {
    pub id: SupervisorId,
    pub name: String,
    #[serde(default)]
    pub department: Option<String>,
}
