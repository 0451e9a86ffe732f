use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SalaryType {
    Monthly,
    Hourly,
    Daily,
    Piece,
}

impl SalaryType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Monthly => "monthly",
            Self::Hourly => "hourly",
            Self::Daily => "daily",
            Self::Piece => "piece",
        }
    }

    /// Case-insensitive parse of the stored salary type.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "monthly" => Some(Self::Monthly),
            "hourly" => Some(Self::Hourly),
            "daily" => Some(Self::Daily),
            "piece" => Some(Self::Piece),
            _ => None,
        }
    }

    /// Overtime, Sunday and public holiday premiums only apply to time-based pay.
    pub fn earns_premiums(&self) -> bool {
        matches!(self, Self::Hourly | Self::Daily)
    }
}

/// Payroll defaults a company hands down to new employees.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompanyPayrollDefaults {
    pub overtime_multiplier: Decimal,
    pub sunday_multiplier: Decimal,
    pub public_holiday_multiplier: Decimal,
    pub ordinary_hours_per_day: Decimal,
    pub work_days_per_month: Decimal,
    pub paye_exempt: bool,
}

impl Default for CompanyPayrollDefaults {
    fn default() -> Self {
        Self {
            overtime_multiplier: Decimal::new(15, 1),
            sunday_multiplier: Decimal::new(20, 1),
            public_holiday_multiplier: Decimal::new(25, 1),
            ordinary_hours_per_day: Decimal::new(8, 0),
            work_days_per_month: Decimal::new(22, 0),
            paye_exempt: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Company {
    pub id: i64,
    pub name: String,
    pub defaults: CompanyPayrollDefaults,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewCompany {
    pub name: String,
    pub defaults: CompanyPayrollDefaults,
}

/// Payroll settings for one employee.
///
/// The meaning of `salary` depends on `salary_type`: a monthly amount, an
/// hourly rate, or the daily figure used by the daily formula. Piece workers
/// carry their rate in `piece_rate`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmployeePayrollProfile {
    pub id: i64,
    pub company_id: i64,
    pub employee_number: String,
    pub full_name: String,
    pub start_date: NaiveDate,
    pub salary_type: SalaryType,
    pub salary: Decimal,
    pub piece_rate: Option<Decimal>,
    pub ordinary_hours_per_day: Option<Decimal>,
    pub work_days_per_month: Option<Decimal>,
    pub overtime_multiplier: Option<Decimal>,
    pub sunday_multiplier: Option<Decimal>,
    pub holiday_multiplier: Option<Decimal>,
    pub paye_exempt: bool,
    pub medical_aid_dependants: u32,
}

/// For creating new employees (no id).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewEmployee {
    pub company_id: i64,
    pub employee_number: String,
    pub full_name: String,
    pub start_date: NaiveDate,
    pub salary_type: SalaryType,
    pub salary: Decimal,
    pub piece_rate: Option<Decimal>,
    pub ordinary_hours_per_day: Option<Decimal>,
    pub work_days_per_month: Option<Decimal>,
    pub overtime_multiplier: Option<Decimal>,
    pub sunday_multiplier: Option<Decimal>,
    pub holiday_multiplier: Option<Decimal>,
    pub paye_exempt: Option<bool>,
    pub medical_aid_dependants: u32,
}

impl NewEmployee {
    /// Fills every unset hour, day and multiplier field from the company defaults.
    /// Values that were set explicitly are kept.
    pub fn with_company_defaults(
        mut self,
        defaults: &CompanyPayrollDefaults,
    ) -> Self {
        self.ordinary_hours_per_day = self
            .ordinary_hours_per_day
            .or(Some(defaults.ordinary_hours_per_day));
        self.work_days_per_month = self
            .work_days_per_month
            .or(Some(defaults.work_days_per_month));
        self.overtime_multiplier = self
            .overtime_multiplier
            .or(Some(defaults.overtime_multiplier));
        self.sunday_multiplier = self
            .sunday_multiplier
            .or(Some(defaults.sunday_multiplier));
        self.holiday_multiplier = self
            .holiday_multiplier
            .or(Some(defaults.public_holiday_multiplier));
        self.paye_exempt = self.paye_exempt.or(Some(defaults.paye_exempt));
        self
    }
}
