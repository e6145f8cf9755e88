use serde::{Deserialize, Serialize};

/// Result of a step that did not abort the run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", tag = "kind")]
pub enum StepOutcome {
    Succeeded,
    SkippedNotApplicable { reason: String },
    FailedNonFatal { reason: String },
}

impl StepOutcome {
    pub fn skipped(reason: impl Into<String>) -> Self {
        StepOutcome::SkippedNotApplicable {
            reason: reason.into(),
        }
    }

    pub fn failed(reason: impl Into<String>) -> Self {
        StepOutcome::FailedNonFatal {
            reason: reason.into(),
        }
    }

    /// Log the outcome for `step` at a level matching its kind.
    pub fn log(&self, step: &str) {
        match self {
            StepOutcome::Succeeded => tracing::info!(step, "step succeeded"),
            StepOutcome::SkippedNotApplicable { reason } => {
                tracing::warn!(step, %reason, "step skipped")
            }
            StepOutcome::FailedNonFatal { reason } => {
                tracing::warn!(step, %reason, "step failed, continuing")
            }
        }
    }

    /// Folds two sub-outcomes of one step: any failure wins, then success.
    pub fn combine(self, other: StepOutcome) -> StepOutcome {
        match (self, other) {
            (f @ StepOutcome::FailedNonFatal { .. }, _) => f,
            (_, f @ StepOutcome::FailedNonFatal { .. }) => f,
            (StepOutcome::Succeeded, _) | (_, StepOutcome::Succeeded) => StepOutcome::Succeeded,
            (skipped, _) => skipped,
        }
    }
}
