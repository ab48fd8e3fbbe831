use crate::db::DatabaseError;
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
            type Err = DatabaseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($s => Ok(Self::$variant)),+,
                    _ => Err(DatabaseError::InvalidEnum {
                        field: stringify!($name).into(),
                        value: s.into(),
                    }),
                }
            }
        }
    };
}

str_enum!(Role {
    BasicVet => "basic_vet",
    SectorVet => "sector_vet",
    DistrictVet => "district_vet",
    Pharmacy => "pharmacy",
});

impl Role {
    /// Roles that own clinical resources (patients, medicines, treatments).
    pub fn is_field_role(&self) -> bool {
        matches!(self, Role::BasicVet | Role::Pharmacy)
    }

    /// Reviewer tiers: sector vets review at tier 1, district vets at tier 2.
    pub fn is_reviewer(&self) -> bool {
        matches!(self, Role::SectorVet | Role::DistrictVet)
    }
}

str_enum!(ApprovalStatus {
    Pending => "pending",
    Approved => "approved",
    Rejected => "rejected",
});

str_enum!(ReportType {
    Monthly => "monthly",
    Quarterly => "quarterly",
    Annual => "annual",
    Emergency => "emergency",
    Incident => "incident",
    VaccinationCampaign => "vaccination_campaign",
    DiseaseOutbreak => "disease_outbreak",
    Pharmaceutical => "pharmaceutical",
    Other => "other",
});

str_enum!(ReportStatus {
    Pending => "pending",
    Reviewed => "reviewed",
    Approved => "approved",
    Rejected => "rejected",
    RequiresRevision => "requires_revision",
});

str_enum!(LicenseStatus {
    Pending => "pending",
    Approved => "approved",
    Rejected => "rejected",
    RequiresDocuments => "requires_documents",
});

str_enum!(LicenseType {
    AnimalHealthAssistant => "animal_health_assistant",
    BasicPractice => "basic_practice",
    AdvancedPractice => "advanced_practice",
    SpecialistPractice => "specialist_practice",
});

impl LicenseType {
    /// Application fee in RWF for each license tier.
    pub fn fee_rwf(&self) -> u32 {
        match self {
            LicenseType::AnimalHealthAssistant => 10_000,
            LicenseType::BasicPractice => 25_000,
            LicenseType::AdvancedPractice => 50_000,
            LicenseType::SpecialistPractice => 100_000,
        }
    }
}

str_enum!(MovementType {
    StockIn => "stock_in",
    StockOut => "stock_out",
});
