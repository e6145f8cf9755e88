use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::config::ProvisionConfig;
use super::outcome::StepOutcome;
use super::state::ProvisionState;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct LocatedArtifacts {
    pub client_bin: PathBuf,
    pub server_bin: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepRecord {
    pub state: ProvisionState,
    pub outcome: StepOutcome,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProvisionReport {
    pub final_state: ProvisionState,
    pub config: ProvisionConfig,
    pub artifacts: LocatedArtifacts,
    pub steps: Vec<StepRecord>,
    pub summary: String,
}

impl ProvisionReport {
    pub fn outcome_of(&self, state: ProvisionState) -> Option<&StepOutcome> {
        self.steps
            .iter()
            .find(|r| r.state == state)
            .map(|r| &r.outcome)
    }
}
