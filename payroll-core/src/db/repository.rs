use async_trait::async_trait;
use chrono::NaiveDate;
use thiserror::Error;

use crate::models::{
    Beneficiary, Company, CompanySarsOverride, EmployeePayrollProfile, GlobalSarsConfig,
    MedicalAidInfo, NewBeneficiary, NewCompany, NewEmployee, NewRecurringDeduction, PayeBracket,
    PayrollEntry, RecurringDeduction, StoredPayrollEntry,
};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RepositoryError {
    #[error("Record not found")]
    NotFound,

    #[error("Database error: {0}")]
    Database(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Validation error: {0}")]
    Validation(String),
}

#[async_trait]
pub trait PayrollRepository: Send + Sync {
    // Global SARS configuration

    /// Returns the global record, inserting the statutory defaults first if
    /// none exists yet.
    async fn ensure_global_sars_config(&self) -> Result<GlobalSarsConfig, RepositoryError>;
    async fn update_global_sars_config(
        &self,
        config: &GlobalSarsConfig,
    ) -> Result<(), RepositoryError>;

    // Company overrides
    async fn get_company_sars_override(
        &self,
        company_id: i64,
    ) -> Result<Option<CompanySarsOverride>, RepositoryError>;
    async fn upsert_company_sars_override(
        &self,
        config: &CompanySarsOverride,
    ) -> Result<(), RepositoryError>;

    // Companies
    async fn create_company(
        &self,
        company: NewCompany,
    ) -> Result<Company, RepositoryError>;
    async fn get_company(
        &self,
        id: i64,
    ) -> Result<Company, RepositoryError>;

    // Employees

    /// Unset employee fields are filled from the company's payroll defaults.
    async fn create_employee(
        &self,
        employee: NewEmployee,
    ) -> Result<EmployeePayrollProfile, RepositoryError>;
    async fn get_employee(
        &self,
        id: i64,
    ) -> Result<EmployeePayrollProfile, RepositoryError>;

    // Medical aid
    async fn get_medical_aid_info(
        &self,
        employee_id: i64,
    ) -> Result<Option<MedicalAidInfo>, RepositoryError>;
    async fn upsert_medical_aid_info(
        &self,
        info: &MedicalAidInfo,
    ) -> Result<(), RepositoryError>;

    // Beneficiaries and recurring deductions
    async fn create_beneficiary(
        &self,
        beneficiary: NewBeneficiary,
    ) -> Result<Beneficiary, RepositoryError>;
    async fn get_beneficiary(
        &self,
        id: i64,
    ) -> Result<Beneficiary, RepositoryError>;

    /// Rejects deductions that fail [`NewRecurringDeduction::validate`] with
    /// [`RepositoryError::Validation`].
    async fn create_recurring_deduction(
        &self,
        deduction: NewRecurringDeduction,
    ) -> Result<RecurringDeduction, RepositoryError>;
    async fn list_active_recurring_deductions(
        &self,
        employee_id: i64,
    ) -> Result<Vec<RecurringDeduction>, RepositoryError>;

    // PAYE brackets
    async fn get_paye_brackets(
        &self,
        tax_year: i32,
    ) -> Result<Vec<PayeBracket>, RepositoryError>;
    async fn insert_paye_bracket(
        &self,
        bracket: &PayeBracket,
    ) -> Result<(), RepositoryError>;
    async fn delete_paye_brackets(
        &self,
        tax_year: i32,
    ) -> Result<(), RepositoryError>;
    async fn list_paye_tax_years(&self) -> Result<Vec<i32>, RepositoryError>;

    // Payroll entries

    /// Inserts or replaces the entry for the same employee and period, and
    /// marks it verified.
    async fn save_payroll_entry(
        &self,
        entry: &PayrollEntry,
    ) -> Result<StoredPayrollEntry, RepositoryError>;
    async fn get_payroll_entry(
        &self,
        id: i64,
    ) -> Result<StoredPayrollEntry, RepositoryError>;
    async fn find_payroll_entry_for_period(
        &self,
        employee_id: i64,
        pay_period_start: NaiveDate,
        pay_period_end: NaiveDate,
    ) -> Result<Option<StoredPayrollEntry>, RepositoryError>;
    async fn finalize_payroll_entry(
        &self,
        id: i64,
    ) -> Result<StoredPayrollEntry, RepositoryError>;
    async fn list_payroll_entries(
        &self,
        employee_id: i64,
    ) -> Result<Vec<StoredPayrollEntry>, RepositoryError>;
}
