mod employee;
mod medical_aid;
mod pay_period;
mod paye_bracket;
mod payroll_entry;
mod recurring_deduction;
mod sars_config;
mod ytd;

pub use employee::{
    Company, CompanyPayrollDefaults, EmployeePayrollProfile, NewCompany, NewEmployee, SalaryType,
};
pub use medical_aid::MedicalAidInfo;
pub use pay_period::PayPeriodInput;
pub use paye_bracket::PayeBracket;
pub use payroll_entry::{DeductionLine, PayrollEntry, StoredPayrollEntry};
pub use recurring_deduction::{
    AmountType, Beneficiary, BeneficiaryType, DeductionValidationError, NewBeneficiary,
    NewRecurringDeduction, RecurringDeduction,
};
pub use sars_config::{CompanySarsOverride, EffectiveSarsConfig, GlobalSarsConfig};
pub use ytd::YtdTotals;
