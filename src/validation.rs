//! Input validation boundary.
//!
//! The rule engine is a total function over in-range input; anything out of
//! the declared field ranges is rejected here, naming the offending field.
//! Values are never silently clamped.

use thiserror::Error;

use crate::models::patient::PatientState;

#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("{field} out of range: {value} (allowed {min}..={max})")]
    OutOfRange {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("target_hba1c must be one of 6.5, 7.0, 7.5, 8.0 (got {0})")]
    UnsupportedTarget(f64),

    #[error("Invalid enum value for {field}: {value}")]
    InvalidEnum { field: String, value: String },
}

const TARGETS: [f64; 4] = [6.5, 7.0, 7.5, 8.0];

fn check_range(
    field: &'static str,
    value: f64,
    min: f64,
    max: f64,
) -> Result<(), ValidationError> {
    if value < min || value > max {
        return Err(ValidationError::OutOfRange {
            field,
            value,
            min,
            max,
        });
    }
    Ok(())
}

/// Validate every declared field range. Fail fast on the first violation.
pub fn validate(patient: &PatientState) -> Result<(), ValidationError> {
    check_range("age", patient.age as f64, 18.0, 100.0)?;
    check_range("weight_kg", patient.weight_kg as f64, 40.0, 250.0)?;
    check_range("height_cm", patient.height_cm as f64, 100.0, 240.0)?;
    check_range("hba1c", patient.hba1c, 4.0, 18.0)?;
    check_range("egfr", patient.egfr as f64, 5.0, 140.0)?;

    if !TARGETS.contains(&patient.target_hba1c) {
        return Err(ValidationError::UnsupportedTarget(patient.target_hba1c));
    }

    Ok(())
}
