use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// The single system-wide SARS configuration record.
///
/// Rates are stored as fractions (`0.01` for 1%). Legacy records that hold a
/// whole percentage are normalised when the effective config is read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlobalSarsConfig {
    pub uif_percent: Decimal,
    pub sdl_percent: Decimal,
    pub uif_salary_cap: Decimal,
    pub uif_monthly_cap: Decimal,
    pub medical_primary_credit: Decimal,
    pub medical_dependant_credit: Decimal,
    pub tax_year_start_month: u32,
    pub tax_year_start_day: u32,
    pub tax_authority_name: String,
    pub currency_symbol: String,
    pub tax_year_display: String,
}

impl Default for GlobalSarsConfig {
    /// Seed values written when the global record is first created.
    fn default() -> Self {
        Self {
            uif_percent: Decimal::new(1, 2),
            sdl_percent: Decimal::new(1, 2),
            uif_salary_cap: Decimal::new(1_771_200, 2),
            uif_monthly_cap: Decimal::new(17_712, 2),
            medical_primary_credit: Decimal::new(364, 0),
            medical_dependant_credit: Decimal::new(246, 0),
            tax_year_start_month: 3,
            tax_year_start_day: 1,
            tax_authority_name: "SARS".to_string(),
            currency_symbol: "R".to_string(),
            tax_year_display: "2024/2025".to_string(),
        }
    }
}

/// Company-specific overrides. `None` means "use the global value".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompanySarsOverride {
    pub company_id: i64,
    pub uif_percent: Option<Decimal>,
    pub sdl_percent: Option<Decimal>,
    pub uif_salary_cap: Option<Decimal>,
    pub uif_monthly_cap: Option<Decimal>,
    pub medical_primary_credit: Option<Decimal>,
    pub medical_dependant_credit: Option<Decimal>,
    pub tax_year_start_month: Option<u32>,
    pub tax_year_start_day: Option<u32>,
    pub tax_authority_name: Option<String>,
    pub currency_symbol: Option<String>,
}

impl CompanySarsOverride {
    /// An override record with every field unset.
    pub fn empty(company_id: i64) -> Self {
        Self {
            company_id,
            ..Self::default()
        }
    }
}

/// The resolved configuration used for one payroll run. Every field has a value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EffectiveSarsConfig {
    pub uif_percent: Decimal,
    pub sdl_percent: Decimal,
    pub uif_salary_cap: Decimal,
    pub uif_monthly_cap: Decimal,
    pub medical_primary_credit: Decimal,
    pub medical_dependant_credit: Decimal,
    pub tax_year_start_month: u32,
    pub tax_year_start_day: u32,
    pub tax_authority_name: String,
    pub currency_symbol: String,
    pub tax_year_display: String,
}
