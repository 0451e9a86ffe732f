//! In-memory [`PayrollRepository`] for unit tests.

use std::collections::BTreeMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};

use super::repository::{PayrollRepository, RepositoryError};
use crate::models::{
    Beneficiary, Company, CompanySarsOverride, EmployeePayrollProfile, GlobalSarsConfig,
    MedicalAidInfo, NewBeneficiary, NewCompany, NewEmployee, NewRecurringDeduction, PayeBracket,
    PayrollEntry, RecurringDeduction, StoredPayrollEntry,
};

#[derive(Default)]
struct State {
    global: Option<GlobalSarsConfig>,
    overrides: BTreeMap<i64, CompanySarsOverride>,
    companies: Vec<Company>,
    employees: Vec<EmployeePayrollProfile>,
    medical: BTreeMap<i64, MedicalAidInfo>,
    beneficiaries: Vec<Beneficiary>,
    deductions: Vec<RecurringDeduction>,
    brackets: Vec<PayeBracket>,
    entries: Vec<StoredPayrollEntry>,
}

#[derive(Default)]
pub(crate) struct InMemoryRepository {
    state: Mutex<State>,
}

impl InMemoryRepository {
    /// A repository holding the 2025 PAYE table.
    pub(crate) fn with_sars_2025() -> Self {
        let repo = Self::default();
        repo.state.lock().unwrap().brackets = PayeBracket::sars_2025();
        repo
    }
}

#[async_trait]
impl PayrollRepository for InMemoryRepository {
    async fn ensure_global_sars_config(&self) -> Result<GlobalSarsConfig, RepositoryError> {
        let mut state = self.state.lock().unwrap();
        Ok(state.global.get_or_insert_with(GlobalSarsConfig::default).clone())
    }

    async fn update_global_sars_config(
        &self,
        config: &GlobalSarsConfig,
    ) -> Result<(), RepositoryError> {
        self.state.lock().unwrap().global = Some(config.clone());
        Ok(())
    }

    async fn get_company_sars_override(
        &self,
        company_id: i64,
    ) -> Result<Option<CompanySarsOverride>, RepositoryError> {
        Ok(self.state.lock().unwrap().overrides.get(&company_id).cloned())
    }

    async fn upsert_company_sars_override(
        &self,
        config: &CompanySarsOverride,
    ) -> Result<(), RepositoryError> {
        self.state
            .lock()
            .unwrap()
            .overrides
            .insert(config.company_id, config.clone());
        Ok(())
    }

    async fn create_company(
        &self,
        company: NewCompany,
    ) -> Result<Company, RepositoryError> {
        let mut state = self.state.lock().unwrap();
        let created = Company {
            id: state.companies.len() as i64 + 1,
            name: company.name,
            defaults: company.defaults,
        };
        state.companies.push(created.clone());
        Ok(created)
    }

    async fn get_company(
        &self,
        id: i64,
    ) -> Result<Company, RepositoryError> {
        let state = self.state.lock().unwrap();
        state
            .companies
            .iter()
            .find(|c| c.id == id)
            .cloned()
            .ok_or(RepositoryError::NotFound)
    }

    async fn create_employee(
        &self,
        employee: NewEmployee,
    ) -> Result<EmployeePayrollProfile, RepositoryError> {
        let company = self.get_company(employee.company_id).await?;
        let employee = employee.with_company_defaults(&company.defaults);
        let mut state = self.state.lock().unwrap();
        let created = EmployeePayrollProfile {
            id: state.employees.len() as i64 + 1,
            company_id: employee.company_id,
            employee_number: employee.employee_number,
            full_name: employee.full_name,
            start_date: employee.start_date,
            salary_type: employee.salary_type,
            salary: employee.salary,
            piece_rate: employee.piece_rate,
            ordinary_hours_per_day: employee.ordinary_hours_per_day,
            work_days_per_month: employee.work_days_per_month,
            overtime_multiplier: employee.overtime_multiplier,
            sunday_multiplier: employee.sunday_multiplier,
            holiday_multiplier: employee.holiday_multiplier,
            paye_exempt: employee.paye_exempt.unwrap_or(false),
            medical_aid_dependants: employee.medical_aid_dependants,
        };
        state.employees.push(created.clone());
        Ok(created)
    }

    async fn get_employee(
        &self,
        id: i64,
    ) -> Result<EmployeePayrollProfile, RepositoryError> {
        let state = self.state.lock().unwrap();
        state
            .employees
            .iter()
            .find(|e| e.id == id)
            .cloned()
            .ok_or(RepositoryError::NotFound)
    }

    async fn get_medical_aid_info(
        &self,
        employee_id: i64,
    ) -> Result<Option<MedicalAidInfo>, RepositoryError> {
        Ok(self.state.lock().unwrap().medical.get(&employee_id).cloned())
    }

    async fn upsert_medical_aid_info(
        &self,
        info: &MedicalAidInfo,
    ) -> Result<(), RepositoryError> {
        self.state
            .lock()
            .unwrap()
            .medical
            .insert(info.employee_id, info.clone());
        Ok(())
    }

    async fn create_beneficiary(
        &self,
        beneficiary: NewBeneficiary,
    ) -> Result<Beneficiary, RepositoryError> {
        let mut state = self.state.lock().unwrap();
        let created = Beneficiary {
            id: state.beneficiaries.len() as i64 + 1,
            company_id: beneficiary.company_id,
            kind: beneficiary.kind,
            name: beneficiary.name,
        };
        state.beneficiaries.push(created.clone());
        Ok(created)
    }

    async fn get_beneficiary(
        &self,
        id: i64,
    ) -> Result<Beneficiary, RepositoryError> {
        let state = self.state.lock().unwrap();
        state
            .beneficiaries
            .iter()
            .find(|b| b.id == id)
            .cloned()
            .ok_or(RepositoryError::NotFound)
    }

    async fn create_recurring_deduction(
        &self,
        deduction: NewRecurringDeduction,
    ) -> Result<RecurringDeduction, RepositoryError> {
        let beneficiary = self.get_beneficiary(deduction.beneficiary_id).await?;
        deduction
            .validate(beneficiary.kind)
            .map_err(|e| RepositoryError::Validation(e.to_string()))?;

        let mut state = self.state.lock().unwrap();
        let created = RecurringDeduction {
            id: state.deductions.len() as i64 + 1,
            employee_id: deduction.employee_id,
            beneficiary_id: beneficiary.id,
            beneficiary_kind: beneficiary.kind,
            beneficiary_name: beneficiary.name,
            amount_type: deduction.amount_type,
            value: deduction.value,
            is_active: deduction.is_active,
            effective_date: deduction.effective_date,
            end_date: deduction.end_date,
            notes: deduction.notes,
        };
        state.deductions.push(created.clone());
        Ok(created)
    }

    async fn list_active_recurring_deductions(
        &self,
        employee_id: i64,
    ) -> Result<Vec<RecurringDeduction>, RepositoryError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .deductions
            .iter()
            .filter(|d| d.employee_id == employee_id && d.is_active)
            .cloned()
            .collect())
    }

    async fn get_paye_brackets(
        &self,
        tax_year: i32,
    ) -> Result<Vec<PayeBracket>, RepositoryError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .brackets
            .iter()
            .filter(|b| b.tax_year == tax_year)
            .cloned()
            .collect())
    }

    async fn insert_paye_bracket(
        &self,
        bracket: &PayeBracket,
    ) -> Result<(), RepositoryError> {
        self.state.lock().unwrap().brackets.push(bracket.clone());
        Ok(())
    }

    async fn delete_paye_brackets(
        &self,
        tax_year: i32,
    ) -> Result<(), RepositoryError> {
        self.state
            .lock()
            .unwrap()
            .brackets
            .retain(|b| b.tax_year != tax_year);
        Ok(())
    }

    async fn list_paye_tax_years(&self) -> Result<Vec<i32>, RepositoryError> {
        let state = self.state.lock().unwrap();
        let mut years: Vec<i32> = state.brackets.iter().map(|b| b.tax_year).collect();
        years.sort_unstable_by(|a, b| b.cmp(a));
        years.dedup();
        Ok(years)
    }

    async fn save_payroll_entry(
        &self,
        entry: &PayrollEntry,
    ) -> Result<StoredPayrollEntry, RepositoryError> {
        let mut state = self.state.lock().unwrap();
        let now = Utc::now();
        let next_id = state.entries.len() as i64 + 1;

        let existing = state.entries.iter_mut().find(|s| {
            s.entry.employee_id == entry.employee_id
                && s.entry.pay_period_start == entry.pay_period_start
                && s.entry.pay_period_end == entry.pay_period_end
        });
        if let Some(stored) = existing {
            stored.entry = entry.clone();
            stored.is_verified = true;
            stored.verified_at = Some(now);
            stored.updated_at = now;
            return Ok(stored.clone());
        }

        let stored = StoredPayrollEntry {
            id: next_id,
            entry: entry.clone(),
            is_verified: true,
            verified_at: Some(now),
            is_finalized: false,
            finalized_at: None,
            created_at: now,
            updated_at: now,
        };
        state.entries.push(stored.clone());
        Ok(stored)
    }

    async fn get_payroll_entry(
        &self,
        id: i64,
    ) -> Result<StoredPayrollEntry, RepositoryError> {
        let state = self.state.lock().unwrap();
        state
            .entries
            .iter()
            .find(|s| s.id == id)
            .cloned()
            .ok_or(RepositoryError::NotFound)
    }

    async fn find_payroll_entry_for_period(
        &self,
        employee_id: i64,
        pay_period_start: NaiveDate,
        pay_period_end: NaiveDate,
    ) -> Result<Option<StoredPayrollEntry>, RepositoryError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .entries
            .iter()
            .find(|s| {
                s.entry.employee_id == employee_id
                    && s.entry.pay_period_start == pay_period_start
                    && s.entry.pay_period_end == pay_period_end
            })
            .cloned())
    }

    async fn finalize_payroll_entry(
        &self,
        id: i64,
    ) -> Result<StoredPayrollEntry, RepositoryError> {
        let mut state = self.state.lock().unwrap();
        let stored = state
            .entries
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or(RepositoryError::NotFound)?;
        let now = Utc::now();
        stored.is_finalized = true;
        stored.finalized_at = Some(now);
        stored.updated_at = now;
        Ok(stored.clone())
    }

    async fn list_payroll_entries(
        &self,
        employee_id: i64,
    ) -> Result<Vec<StoredPayrollEntry>, RepositoryError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .entries
            .iter()
            .filter(|s| s.entry.employee_id == employee_id)
            .cloned()
            .collect())
    }
}
