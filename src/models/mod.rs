pub mod enums;
pub mod patient;
pub mod plan;

pub use enums::*;
pub use patient::PatientState;
pub use plan::{ActionRecord, PlanStatus};
