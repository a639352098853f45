use serde::{Deserialize, Serialize};

use super::enums::ActionKind;
use super::patient::PatientState;

/// One recommended medication action.
///
/// Position in the plan is significant: actions are emitted in clinical
/// priority order (safety → red flags → organ protection → intensification)
/// and the order is stable for a given patient and guideline edition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionRecord {
    pub kind: ActionKind,
    pub headline: String,
    pub rationale: String,
    /// Reference into the underlying consensus report / update.
    pub citation: String,
}

/// Headline status of a finished plan, for the results screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanStatus {
    /// At least one action to discuss.
    ActionsRecommended,
    /// Nothing to change and glycemia at target: organ-protected and optimized.
    AtTarget,
    /// Above target but the standard escalation ladder is exhausted;
    /// specialist review (pumps, advanced technology) is the next step.
    Refractory,
}

impl PlanStatus {
    pub fn from_plan(patient: &PatientState, actions: &[ActionRecord]) -> Self {
        if !actions.is_empty() {
            PlanStatus::ActionsRecommended
        } else if patient.hba1c <= patient.target_hba1c {
            PlanStatus::AtTarget
        } else {
            PlanStatus::Refractory
        }
    }
}
