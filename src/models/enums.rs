use crate::validation::ValidationError;
use serde::{Deserialize, Serialize};

/// Macro to generate enum with as_str + std::str::FromStr pattern
macro_rules! str_enum {
    ($name:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $s),+
                }
            }
        }

        impl std::str::FromStr for $name {
            type Err = ValidationError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($s => Ok(Self::$variant)),+,
                    _ => Err(ValidationError::InvalidEnum {
                        field: stringify!($name).into(),
                        value: s.into(),
                    }),
                }
            }
        }
    };
}

str_enum!(DrugClass {
    Metformin => "metformin",
    Sglt2i => "sglt2i",
    Glp1Ra => "glp1_ra",
    GipGlp1 => "gip_glp1",
    Dpp4i => "dpp4i",
    Sulfonylurea => "sulfonylurea",
    Tzd => "tzd",
    InsulinBasal => "insulin_basal",
    InsulinPrandial => "insulin_prandial",
});

impl DrugClass {
    /// Closed enumeration: every class the formulary knows about.
    pub const ALL: [DrugClass; 9] = [
        DrugClass::Metformin,
        DrugClass::Sglt2i,
        DrugClass::Glp1Ra,
        DrugClass::GipGlp1,
        DrugClass::Dpp4i,
        DrugClass::Sulfonylurea,
        DrugClass::Tzd,
        DrugClass::InsulinBasal,
        DrugClass::InsulinPrandial,
    ];

    /// Display label used in action headlines and rationales.
    pub fn label(&self) -> &'static str {
        match self {
            DrugClass::Metformin => "metformin",
            DrugClass::Sglt2i => "SGLT2 inhibitor",
            DrugClass::Glp1Ra => "GLP-1 RA",
            DrugClass::GipGlp1 => "GIP/GLP-1 RA",
            DrugClass::Dpp4i => "DPP-4 inhibitor",
            DrugClass::Sulfonylurea => "sulfonylurea",
            DrugClass::Tzd => "TZD (pioglitazone)",
            DrugClass::InsulinBasal => "basal insulin",
            DrugClass::InsulinPrandial => "prandial insulin",
        }
    }
}

str_enum!(ActionKind {
    Stop => "stop",
    Start => "start",
    Switch => "switch",
    Alert => "alert",
});

str_enum!(Albuminuria {
    Normal => "normal",
    Micro => "micro",
    Macro => "macro",
});

str_enum!(Route {
    Oral => "oral",
    Injectable => "injectable",
});

str_enum!(GuidelineEdition {
    Ada2022 => "ada2022",
    Ada2025 => "ada2025",
});

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn drug_class_round_trips_through_str() {
        for class in DrugClass::ALL {
            assert_eq!(DrugClass::from_str(class.as_str()).unwrap(), class);
        }
    }

    #[test]
    fn unknown_drug_class_is_a_parse_error() {
        let err = DrugClass::from_str("biguanide_xr").unwrap_err();
        assert!(err.to_string().contains("biguanide_xr"));
    }

    #[test]
    fn serde_tokens_match_as_str() {
        let json = serde_json::to_string(&DrugClass::GipGlp1).unwrap();
        assert_eq!(json, "\"gip_glp1\"");
        let back: DrugClass = serde_json::from_str("\"insulin_basal\"").unwrap();
        assert_eq!(back, DrugClass::InsulinBasal);

        assert_eq!(
            serde_json::to_string(&ActionKind::Switch).unwrap(),
            "\"switch\""
        );
    }
}
