use serde::{Deserialize, Serialize};

use super::enums::{Albuminuria, DrugClass};

/// One patient's diabetes profile at the moment of evaluation.
///
/// Immutable during a single plan evaluation: the engine copies
/// `current_meds` into its own working set and never writes back.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatientState {
    pub age: u32,
    pub weight_kg: u32,
    pub height_cm: u32,

    /// Glycated hemoglobin, percent.
    pub hba1c: f64,
    /// Agreed individual target, percent (6.5 / 7.0 / 7.5 / 8.0).
    pub target_hba1c: f64,
    /// Estimated glomerular filtration rate, mL/min.
    pub egfr: u32,
    pub albuminuria: Albuminuria,

    pub ascvd: bool,
    pub heart_failure: bool,
    pub ckd_diagnosed: bool,
    /// Steatotic liver disease. Only the 2025 pipeline acts on it.
    pub masld: bool,

    pub newly_diagnosed: bool,
    pub catabolic_symptoms: bool,
    pub ketosis: bool,
    pub acute_illness: bool,
    pub suspected_type1: bool,

    pub current_meds: Vec<DrugClass>,
}

impl PatientState {
    /// Body mass index, kg/m².
    pub fn bmi(&self) -> f64 {
        let height_m = self.height_cm as f64 / 100.0;
        self.weight_kg as f64 / (height_m * height_m)
    }

    /// CKD is established either by diagnosis or by any albuminuria.
    pub fn has_ckd(&self) -> bool {
        self.ckd_diagnosed || self.albuminuria != Albuminuria::Normal
    }

    /// Severity indicators that override step-wise escalation in favour of
    /// immediate insulin.
    pub fn has_red_flags(&self) -> bool {
        self.suspected_type1 || self.ketosis || self.catabolic_symptoms || self.acute_illness
    }

    /// Distance above target; positive means intensification territory.
    pub fn glycemic_gap(&self) -> f64 {
        self.hba1c - self.target_hba1c
    }

    pub fn is_taking(&self, class: DrugClass) -> bool {
        self.current_meds.contains(&class)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> PatientState {
        PatientState {
            age: 55,
            weight_kg: 95,
            height_cm: 175,
            hba1c: 8.2,
            target_hba1c: 7.0,
            egfr: 45,
            albuminuria: Albuminuria::Normal,
            ascvd: false,
            heart_failure: false,
            ckd_diagnosed: false,
            masld: false,
            newly_diagnosed: false,
            catabolic_symptoms: false,
            ketosis: false,
            acute_illness: false,
            suspected_type1: false,
            current_meds: vec![],
        }
    }

    #[test]
    fn bmi_is_weight_over_height_squared() {
        let p = base();
        assert!((p.bmi() - 31.02).abs() < 0.01);
    }

    #[test]
    fn albuminuria_forces_ckd() {
        let mut p = base();
        assert!(!p.has_ckd());
        p.albuminuria = Albuminuria::Micro;
        assert!(p.has_ckd());
        p.albuminuria = Albuminuria::Normal;
        p.ckd_diagnosed = true;
        assert!(p.has_ckd());
    }

    #[test]
    fn any_severity_flag_raises_red_flags() {
        let mut p = base();
        assert!(!p.has_red_flags());
        p.catabolic_symptoms = true;
        assert!(p.has_red_flags());
        p.catabolic_symptoms = false;
        p.suspected_type1 = true;
        assert!(p.has_red_flags());
    }

    #[test]
    fn patient_state_round_trips_through_json() {
        let mut p = base();
        p.current_meds = vec![DrugClass::Metformin, DrugClass::Sglt2i];
        let json = serde_json::to_string(&p).unwrap();
        let back: PatientState = serde_json::from_str(&json).unwrap();
        assert_eq!(back.current_meds, p.current_meds);
        assert_eq!(back.egfr, p.egfr);
    }
}
