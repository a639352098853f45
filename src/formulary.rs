//! Static drug-class knowledge base.
//!
//! Per-class safety thresholds, organ-benefit tags and class conflicts as
//! tabulated by the consensus report (Table 1 and accompanying text). The
//! table is a closed enumeration over [`DrugClass`]: lookups are total and
//! never allocate, and nothing here is mutated at runtime.

use serde::{Deserialize, Serialize};

use crate::models::enums::{DrugClass, Route};

/// Organ-benefit tag attached to a drug class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrganBenefit {
    HeartFailure,
    Ckd,
    /// Secondary renal evidence (GLP-1 RA).
    CkdSecondary,
    Ascvd,
    Weight,
    Glycemia,
}

/// Static profile of one drug class.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrugClassInfo {
    pub route: Route,
    /// Hard eGFR floor (mL/min): below this the class must not be
    /// initiated. For metformin it is also a stop threshold.
    pub floor_egfr: Option<u32>,
    /// Soft threshold: below this, dose reduction / caution applies.
    pub warning_egfr: Option<u32>,
    pub organ_benefits: &'static [OrganBenefit],
    /// Classes this one must never be combined with.
    pub conflicts_with: &'static [DrugClass],
    pub hypoglycemia_risk: bool,
    /// Fluid retention makes the class unsafe in heart failure (TZD).
    pub contraindicated_in_hf: bool,
}

static METFORMIN: DrugClassInfo = DrugClassInfo {
    route: Route::Oral,
    floor_egfr: Some(30),
    warning_egfr: Some(45),
    organ_benefits: &[],
    conflicts_with: &[],
    hypoglycemia_risk: false,
    contraindicated_in_hf: false,
};

static SGLT2I: DrugClassInfo = DrugClassInfo {
    route: Route::Oral,
    // Initiation floor only: an SGLT2i already on board is continued while
    // tolerated, whatever the eGFR.
    floor_egfr: Some(20),
    warning_egfr: None,
    organ_benefits: &[
        OrganBenefit::HeartFailure,
        OrganBenefit::Ckd,
        OrganBenefit::Ascvd,
    ],
    conflicts_with: &[],
    hypoglycemia_risk: false,
    contraindicated_in_hf: false,
};

static GLP1_RA: DrugClassInfo = DrugClassInfo {
    route: Route::Injectable,
    floor_egfr: Some(15),
    warning_egfr: None,
    organ_benefits: &[
        OrganBenefit::Ascvd,
        OrganBenefit::Weight,
        OrganBenefit::CkdSecondary,
    ],
    conflicts_with: &[],
    hypoglycemia_risk: false,
    contraindicated_in_hf: false,
};

static GIP_GLP1: DrugClassInfo = DrugClassInfo {
    route: Route::Injectable,
    floor_egfr: Some(15),
    warning_egfr: None,
    organ_benefits: &[OrganBenefit::Weight, OrganBenefit::Glycemia],
    conflicts_with: &[],
    hypoglycemia_risk: false,
    contraindicated_in_hf: false,
};

static DPP4I: DrugClassInfo = DrugClassInfo {
    route: Route::Oral,
    floor_egfr: None,
    warning_egfr: None,
    organ_benefits: &[],
    // Same incretin axis; combining adds cost without benefit.
    conflicts_with: &[DrugClass::Glp1Ra, DrugClass::GipGlp1],
    hypoglycemia_risk: false,
    contraindicated_in_hf: false,
};

static SULFONYLUREA: DrugClassInfo = DrugClassInfo {
    route: Route::Oral,
    floor_egfr: None,
    warning_egfr: Some(60),
    organ_benefits: &[],
    conflicts_with: &[],
    hypoglycemia_risk: true,
    contraindicated_in_hf: false,
};

static TZD: DrugClassInfo = DrugClassInfo {
    route: Route::Oral,
    floor_egfr: None,
    warning_egfr: None,
    organ_benefits: &[],
    conflicts_with: &[],
    hypoglycemia_risk: false,
    contraindicated_in_hf: true,
};

static INSULIN_BASAL: DrugClassInfo = DrugClassInfo {
    route: Route::Injectable,
    floor_egfr: None,
    warning_egfr: None,
    organ_benefits: &[],
    conflicts_with: &[],
    hypoglycemia_risk: true,
    contraindicated_in_hf: false,
};

static INSULIN_PRANDIAL: DrugClassInfo = DrugClassInfo {
    route: Route::Injectable,
    floor_egfr: None,
    warning_egfr: None,
    organ_benefits: &[],
    conflicts_with: &[],
    hypoglycemia_risk: true,
    contraindicated_in_hf: false,
};

/// Look up the static profile for a drug class. Total over the enum.
pub fn class_info(class: DrugClass) -> &'static DrugClassInfo {
    match class {
        DrugClass::Metformin => &METFORMIN,
        DrugClass::Sglt2i => &SGLT2I,
        DrugClass::Glp1Ra => &GLP1_RA,
        DrugClass::GipGlp1 => &GIP_GLP1,
        DrugClass::Dpp4i => &DPP4I,
        DrugClass::Sulfonylurea => &SULFONYLUREA,
        DrugClass::Tzd => &TZD,
        DrugClass::InsulinBasal => &INSULIN_BASAL,
        DrugClass::InsulinPrandial => &INSULIN_PRANDIAL,
    }
}
