//! Glycoplan: a guideline-driven diabetes therapy planner.
//!
//! Turns one patient's diabetes profile (labs, comorbidities, current
//! medications, red-flag symptoms) into an ordered list of recommended
//! medication actions, each with a headline, a rationale and a citation into
//! the clinical guideline. Two rule-set editions are implemented: the
//! ADA/EASD 2022 consensus report and the 2025 update, which differ in
//! gating and tie-break priorities.
//!
//! The engine is a pure, synchronous function: no persistence, no I/O, no
//! shared state across evaluations. Callers validate input ranges at the
//! boundary ([`validation::validate`], or the [`recommend`] convenience
//! wrapper) and render the returned [`ActionRecord`] sequence however they
//! like; the order is clinically significant and stable.

pub mod engine;
pub mod formulary;
pub mod models;
pub mod validation;

pub use engine::evaluate;
pub use models::enums::{ActionKind, Albuminuria, DrugClass, GuidelineEdition, Route};
pub use models::patient::PatientState;
pub use models::plan::{ActionRecord, PlanStatus};
pub use validation::{validate, ValidationError};

/// Validate the patient record, then evaluate it under the given edition.
pub fn recommend(
    patient: &PatientState,
    edition: GuidelineEdition,
) -> Result<Vec<ActionRecord>, ValidationError> {
    validation::validate(patient)?;
    Ok(engine::evaluate(patient, edition))
}
