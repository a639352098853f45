//! Rule engine: turns a [`PatientState`] into an ordered action plan.
//!
//! Two guideline editions are implemented as two independent pipelines
//! ([`consensus_2022`], [`consensus_2025`]) sharing the same working-context
//! type and the same reusable sub-rules. Each pipeline is a strictly ordered
//! sequence of rule groups; every rule's condition is evaluated against the
//! cumulative working medication set, so later rules see the effect of
//! earlier ones within the same evaluation.

pub mod consensus_2022;
pub mod consensus_2025;

use tracing::debug;

use crate::formulary::class_info;
use crate::models::enums::{ActionKind, DrugClass, GuidelineEdition};
use crate::models::patient::PatientState;
use crate::models::plan::ActionRecord;

/// Evaluate one patient under one guideline edition.
///
/// Pure and deterministic: the same input and edition always produce the
/// same ordered action sequence. The working medication set lives and dies
/// inside this call.
pub fn evaluate(patient: &PatientState, edition: GuidelineEdition) -> Vec<ActionRecord> {
    let mut ctx = PlanContext::new(patient);
    match edition {
        GuidelineEdition::Ada2022 => consensus_2022::generate_plan(patient, &mut ctx),
        GuidelineEdition::Ada2025 => consensus_2025::generate_plan(patient, &mut ctx),
    }
    debug!(
        edition = edition.as_str(),
        actions = ctx.actions.len(),
        "plan evaluation finished"
    );
    ctx.actions
}

/// Mutable working context for one evaluation.
///
/// Owns a private copy of the patient's medication set plus the action
/// accumulator. Rule groups receive it by `&mut` in sequence; nothing
/// retains a reference past its own invocation and nothing survives the
/// evaluation call.
pub(crate) struct PlanContext {
    /// Hypothetical medication set as rules fire (set semantics).
    meds: Vec<DrugClass>,
    /// Medication set as it was at entry, for persistence-of-failure checks.
    baseline: Vec<DrugClass>,
    actions: Vec<ActionRecord>,
}

impl PlanContext {
    pub(crate) fn new(patient: &PatientState) -> Self {
        let mut meds: Vec<DrugClass> = Vec::with_capacity(patient.current_meds.len());
        for &class in &patient.current_meds {
            if !meds.contains(&class) {
                meds.push(class);
            }
        }
        PlanContext {
            baseline: meds.clone(),
            meds,
            actions: Vec::new(),
        }
    }

    pub(crate) fn has(&self, class: DrugClass) -> bool {
        self.meds.contains(&class)
    }

    /// Incretin axis: GLP-1 RA or the dual GIP/GLP-1 agonist.
    pub(crate) fn has_incretin(&self) -> bool {
        self.has(DrugClass::Glp1Ra) || self.has(DrugClass::GipGlp1)
    }

    /// Was the class already on board before the engine started adding?
    pub(crate) fn had_at_entry(&self, class: DrugClass) -> bool {
        self.baseline.contains(&class)
    }

    pub(crate) fn add(&mut self, class: DrugClass) {
        if !self.meds.contains(&class) {
            self.meds.push(class);
        }
    }

    pub(crate) fn remove(&mut self, class: DrugClass) {
        self.meds.retain(|&c| c != class);
    }

    pub(crate) fn push(
        &mut self,
        kind: ActionKind,
        headline: &str,
        rationale: &str,
        citation: &str,
    ) {
        debug!(kind = kind.as_str(), headline, "rule fired");
        self.actions.push(ActionRecord {
            kind,
            headline: headline.to_string(),
            rationale: rationale.to_string(),
            citation: citation.to_string(),
        });
    }

    #[cfg(test)]
    pub(crate) fn working_set(&self) -> &[DrugClass] {
        &self.meds
    }

    #[cfg(test)]
    pub(crate) fn actions(&self) -> &[ActionRecord] {
        &self.actions
    }
}

// ─── Reusable sub-rules ──────────────────────────────────────────────────────
// Invoked at every site where their precondition can newly become true, so
// no finished plan can leave the forbidden combination standing.

/// Stop the sulfonylurea if present. Called at every insulin-START site:
/// the engine never *creates* an insulin + sulfonylurea combination.
pub(crate) fn retire_sulfonylurea(ctx: &mut PlanContext, rationale: &str, citation: &str) {
    if ctx.has(DrugClass::Sulfonylurea) {
        ctx.push(
            ActionKind::Stop,
            "Stop the sulfonylurea",
            rationale,
            citation,
        );
        ctx.remove(DrugClass::Sulfonylurea);
    }
}

/// Stop a DPP-4 inhibitor that coexists with any conflicting incretin
/// agent. Called from the safety group and after every incretin addition.
pub(crate) fn drop_redundant_dpp4(ctx: &mut PlanContext) {
    let conflicted = class_info(DrugClass::Dpp4i)
        .conflicts_with
        .iter()
        .any(|&c| ctx.has(c));
    if ctx.has(DrugClass::Dpp4i) && conflicted {
        ctx.push(
            ActionKind::Stop,
            "Stop the DPP-4 inhibitor",
            "Do not combine a DPP-4 inhibitor with a GLP-1 RA or GIP/GLP-1 RA: same incretin axis, negligible added benefit.",
            "Consensus Report: Principles of Care",
        );
        ctx.remove(DrugClass::Dpp4i);
    }
}
