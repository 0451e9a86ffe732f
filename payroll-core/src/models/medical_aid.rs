use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Medical aid membership details for one employee.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MedicalAidInfo {
    pub employee_id: i64,
    pub scheme_name: Option<String>,
    pub membership_number: Option<String>,
    pub number_of_dependants: u32,
    pub additional_dependants: u32,
    pub main_member: bool,
    pub employer_contribution_override: Option<Decimal>,
    pub employee_contribution_override: Option<Decimal>,
    /// When false the contribution overrides replace the SARS formula.
    pub use_sars_calculation: bool,
}

impl MedicalAidInfo {
    pub fn new(employee_id: i64) -> Self {
        Self {
            employee_id,
            scheme_name: None,
            membership_number: None,
            number_of_dependants: 0,
            additional_dependants: 0,
            main_member: true,
            employer_contribution_override: None,
            employee_contribution_override: None,
            use_sars_calculation: true,
        }
    }

    pub fn total_dependants(&self) -> u32 {
        self.number_of_dependants.saturating_add(self.additional_dependants)
    }
}
