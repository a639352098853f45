//! ADA/EASD 2025 update pipeline.
//!
//! Same group skeleton as the 2022 consensus with the 2025 policy changes:
//! red flags halt the pipeline after insulin is secured, CKD gets incretin
//! combination therapy on top of an SGLT2 inhibitor, MASLD joins the organ
//! targets, the ASCVD BMI tie-break is reversed, the weight rule always
//! reaches for the dual agonist, and a GLP-1 RA precedes insulin regardless
//! of the HbA1c value.

use super::{drop_redundant_dpp4, retire_sulfonylurea, PlanContext};
use crate::formulary::class_info;
use crate::models::enums::{ActionKind, DrugClass};
use crate::models::patient::PatientState;

const SU_ON_INSULIN_RATIONALE: &str =
    "On insulin initiation, sulfonylureas sharply raise the hypoglycemia risk.";
const SU_ON_INSULIN_CITATION: &str = "2025 Update: Hypoglycemia risk";
const ASCVD_CITATION: &str = "2025 Update: People with established CVD";

pub(crate) fn generate_plan(patient: &PatientState, ctx: &mut PlanContext) {
    sanitize(patient, ctx);

    // 2025 divergence: once red flags are handled, nothing else runs.
    if escalate_red_flags(patient, ctx) {
        return;
    }

    protect_organs(patient, ctx);
    intensify(patient, ctx);
}

/// May an SGLT2 inhibitor be initiated right now?
fn sglt2i_initiation_ok(patient: &PatientState, ctx: &PlanContext) -> bool {
    let floor = class_info(DrugClass::Sglt2i).floor_egfr;
    !ctx.has(DrugClass::Sglt2i)
        && matches!(floor, Some(f) if patient.egfr >= f)
        && !patient.ketosis
        && !patient.acute_illness
}

// ─── Group 1: safety sanitization ───────────────────────────────────────────

fn sanitize(patient: &PatientState, ctx: &mut PlanContext) {
    let metformin = class_info(DrugClass::Metformin);
    if ctx.has(DrugClass::Metformin) {
        if matches!(metformin.floor_egfr, Some(f) if patient.egfr < f) {
            ctx.push(
                ActionKind::Stop,
                "Stop metformin",
                "Contraindicated: eGFR below 30 mL/min.",
                "2025 Update: Renal safety",
            );
            ctx.remove(DrugClass::Metformin);
        } else if matches!(metformin.warning_egfr, Some(w) if patient.egfr < w) {
            ctx.push(
                ActionKind::Alert,
                "Reduce the metformin dose",
                "Consider dose reduction once eGFR falls below 45.",
                "2025 Update: Renal safety",
            );
        }
    }

    let sglt2i_floor = class_info(DrugClass::Sglt2i).floor_egfr;
    if ctx.has(DrugClass::Sglt2i) && matches!(sglt2i_floor, Some(f) if patient.egfr < f) {
        ctx.push(
            ActionKind::Alert,
            "Do not initiate an SGLT2 inhibitor below eGFR 20; continue the established one until dialysis",
            "The 2025 update recommends continuing an established SGLT2 inhibitor for cardio-renal protection until dialysis or transplant, while tolerated.",
            "2025 Update: People with CKD",
        );
    }

    if ctx.has(DrugClass::Tzd)
        && patient.heart_failure
        && class_info(DrugClass::Tzd).contraindicated_in_hf
    {
        ctx.push(
            ActionKind::Stop,
            "Stop the TZD (pioglitazone)",
            "Fluid retention risk and worsening of heart failure.",
            "2025 Update: Thiazolidinediones",
        );
        ctx.remove(DrugClass::Tzd);
    }

    drop_redundant_dpp4(ctx);

    if ctx.has(DrugClass::Sglt2i) && (patient.ketosis || patient.acute_illness) {
        ctx.push(
            ActionKind::Alert,
            "Consider a temporary pause of the SGLT2 inhibitor",
            "Acute illness or suspected ketosis raises the risk of diabetic ketoacidosis; reassess after stabilisation.",
            "2025 Update: Sick-day guidance",
        );
    }
}

// ─── Group 2: red flags → insulin, then halt ────────────────────────────────

/// Returns true when red flags were present and the pipeline must stop.
fn escalate_red_flags(patient: &PatientState, ctx: &mut PlanContext) -> bool {
    if !patient.has_red_flags() {
        return false;
    }

    if !ctx.has(DrugClass::InsulinBasal) {
        ctx.push(
            ActionKind::Start,
            "Start basal insulin (priority)",
            "Red flags (catabolism, ketosis, acute illness, suspected type 1) call for rapid, safe control; stabilise before any further therapy changes.",
            "2025 Update: Place of Insulin",
        );
        ctx.add(DrugClass::InsulinBasal);
    }

    retire_sulfonylurea(ctx, SU_ON_INSULIN_RATIONALE, SU_ON_INSULIN_CITATION);

    true
}

// ─── Group 3: organ protection ──────────────────────────────────────────────

fn protect_organs(patient: &PatientState, ctx: &mut PlanContext) {
    if patient.heart_failure && sglt2i_initiation_ok(patient, ctx) {
        ctx.push(
            ActionKind::Start,
            "Start an SGLT2 inhibitor (dapagliflozin/empagliflozin)",
            "Proven reduction of HF hospitalisations and cardiovascular mortality in heart failure.",
            "2025 Update: People with HF",
        );
        ctx.add(DrugClass::Sglt2i);
    }

    if patient.has_ckd() && sglt2i_initiation_ok(patient, ctx) {
        ctx.push(
            ActionKind::Start,
            "Start an SGLT2 inhibitor",
            "Preferred to slow CKD progression and reduce HF hospitalisations.",
            "2025 Update: People with CKD",
        );
        ctx.add(DrugClass::Sglt2i);
    }

    // 2025 divergence: CKD warrants a GLP-1 RA even on top of an SGLT2
    // inhibitor (combination therapy), which also covers the case where the
    // SGLT2i cannot be initiated at all.
    let glp1_floor = class_info(DrugClass::Glp1Ra).floor_egfr;
    if patient.has_ckd()
        && !ctx.has_incretin()
        && matches!(glp1_floor, Some(f) if patient.egfr >= f)
    {
        ctx.push(
            ActionKind::Start,
            "Add a GLP-1 RA (renal combination therapy)",
            "CKD benefits from a GLP-1 RA on top of, or instead of, an SGLT2 inhibitor.",
            "2025 Update: CKD combination therapy",
        );
        ctx.add(DrugClass::Glp1Ra);
        drop_redundant_dpp4(ctx);
    }

    // ASCVD: the 2025 update credits the dual agonist's CV evidence, and
    // the BMI tie-break is reversed relative to 2022.
    if patient.ascvd {
        let protected =
            ctx.has(DrugClass::Sglt2i) || ctx.has(DrugClass::Glp1Ra) || ctx.has(DrugClass::GipGlp1);

        if !protected {
            ctx.push(
                ActionKind::Start,
                "Start a GLP-1 RA or SGLT2 inhibitor",
                "Established ASCVD: add an agent with proven CV benefit, independent of HbA1c.",
                ASCVD_CITATION,
            );
            if patient.bmi() > 27.0 {
                ctx.add(DrugClass::Glp1Ra);
                drop_redundant_dpp4(ctx);
            } else if patient.egfr >= 20 && !patient.ketosis && !patient.acute_illness {
                ctx.add(DrugClass::Sglt2i);
            } else {
                ctx.add(DrugClass::Glp1Ra);
                drop_redundant_dpp4(ctx);
            }
        }
    }

    // MASLD joined the organ targets in 2025. Heart failure keeps priority;
    // its SGLT2i pathway is handled above.
    if patient.masld
        && !patient.heart_failure
        && !ctx.has(DrugClass::Glp1Ra)
        && !ctx.has(DrugClass::GipGlp1)
        && !ctx.has(DrugClass::Tzd)
    {
        ctx.push(
            ActionKind::Start,
            "Start a GLP-1 RA (alternatively pioglitazone)",
            "MASLD with metabolic dysfunction: incretin therapy improves steatosis and weight; pioglitazone is the alternative.",
            "2025 Update: MASLD",
        );
        ctx.add(DrugClass::Glp1Ra);
        drop_redundant_dpp4(ctx);
    }
}

// ─── Group 4: weight & glycemic intensification ─────────────────────────────

fn intensify(patient: &PatientState, ctx: &mut PlanContext) {
    let gap = patient.glycemic_gap();
    if gap <= 0.0 {
        return;
    }

    // Weight first. 2025 always prefers the dual agonist, and an SGLT2i no
    // longer counts as weight-effective. This rule and the renal GLP-1 rule
    // above do not check each other; whichever fires first parks an incretin
    // and thereby silences the other.
    if patient.bmi() >= 30.0 && !ctx.has(DrugClass::Glp1Ra) && !ctx.has(DrugClass::GipGlp1) {
        ctx.push(
            ActionKind::Start,
            "Add a GIP/GLP-1 RA (tirzepatide)",
            "Obesity is a primary treatment target; the dual agonist delivers the largest weight and HbA1c reductions.",
            "2025 Update: Weight management",
        );
        ctx.add(DrugClass::GipGlp1);
        drop_redundant_dpp4(ctx);
    }

    if patient.newly_diagnosed && gap >= 1.5 {
        ctx.push(
            ActionKind::Start,
            "Consider early combination therapy",
            "Recent diagnosis with HbA1c at least 1.5% above target: initial combination can outperform stepwise addition.",
            "2025 Update: Early combination / VERIFY",
        );
    }

    let metformin_floor = class_info(DrugClass::Metformin).floor_egfr;
    if !ctx.has(DrugClass::Metformin) && matches!(metformin_floor, Some(f) if patient.egfr >= f) {
        ctx.push(
            ActionKind::Start,
            "Add metformin",
            "Good efficacy, low cost, long experience.",
            "2025 Update: Glycemic management",
        );
        ctx.add(DrugClass::Metformin);
    }

    if ctx.has(DrugClass::Dpp4i) && gap > 0.5 {
        ctx.push(
            ActionKind::Switch,
            "Replace the DPP-4 inhibitor with a GLP-1 RA or GIP/GLP-1 RA",
            "Modest DPP-4i efficacy; incretin agonists are more effective with additional benefits.",
            "2025 Update: Comparative efficacy",
        );
        ctx.remove(DrugClass::Dpp4i);
        if !ctx.has_incretin() {
            ctx.add(DrugClass::Glp1Ra);
        }
    }

    // 2025 sequencing collapse: no potent injectable on board means a GLP-1
    // RA comes first, whatever the HbA1c (the 2022 "HbA1c >= 10 straight to
    // insulin" branch is gone).
    if !ctx.has_incretin() && !ctx.has(DrugClass::InsulinBasal) {
        ctx.push(
            ActionKind::Start,
            "Start a GLP-1 RA (before any insulin)",
            "2025 sequencing: an incretin agonist precedes basal insulin regardless of the HbA1c value.",
            "2025 Update: Injectable therapy sequencing",
        );
        ctx.add(DrugClass::Glp1Ra);
        drop_redundant_dpp4(ctx);
    }

    // Escalate to basal insulin only for an incretin that was on board at
    // entry: persistent failure of optimised non-insulin therapy.
    let incretin_at_entry =
        ctx.had_at_entry(DrugClass::Glp1Ra) || ctx.had_at_entry(DrugClass::GipGlp1);
    if incretin_at_entry && !ctx.has(DrugClass::InsulinBasal) {
        ctx.push(
            ActionKind::Start,
            "Start basal insulin",
            "Persistently above target despite optimised non-insulin therapy.",
            "2025 Update: Insulin initiation",
        );
        ctx.add(DrugClass::InsulinBasal);
        retire_sulfonylurea(ctx, SU_ON_INSULIN_RATIONALE, SU_ON_INSULIN_CITATION);
    }

    // Advisory: the 2025 update leaves the choice between prandial insulin
    // and an injectable GLP-1 boost open, so the working set is untouched.
    if ctx.has(DrugClass::InsulinBasal) && !ctx.has(DrugClass::InsulinPrandial) {
        ctx.push(
            ActionKind::Start,
            "Add prandial insulin or boost with an injectable GLP-1 RA",
            "Above target on basal insulin; intensify with prandial insulin or an injectable incretin.",
            "2025 Update: Insulin intensification",
        );
        retire_sulfonylurea(
            ctx,
            "Sulfonylurea plus intensified insulin therapy sharply raises the hypoglycemia risk.",
            SU_ON_INSULIN_CITATION,
        );
    }
}
