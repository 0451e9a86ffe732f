//! Payroll runs against a [`PayrollRepository`].
//!
//! [`PayrollService`] loads everything one run needs, hands it to the
//! calculation engine and persists the result.

use chrono::NaiveDate;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::calculations::{
    PayrollAssembler, PayrollError, PayrollInputs, SarsConfigError, compute_ytd,
    resolve_sars_config,
};
use crate::db::repository::{PayrollRepository, RepositoryError};
use crate::models::{
    EffectiveSarsConfig, PayPeriodInput, PayeBracket, PayrollEntry, StoredPayrollEntry, YtdTotals,
};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PayrollServiceError {
    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error(transparent)]
    Payroll(#[from] PayrollError),

    #[error(transparent)]
    SarsConfig(#[from] SarsConfigError),

    #[error("no PAYE table loaded for tax year {0} or earlier")]
    MissingPayeTable(i32),

    #[error("payroll entry {0} is finalized and cannot be recalculated")]
    EntryFinalized(i64),
}

pub struct PayrollService<'a> {
    repo: &'a dyn PayrollRepository,
}

impl<'a> PayrollService<'a> {
    pub fn new(repo: &'a dyn PayrollRepository) -> Self {
        Self { repo }
    }

    /// The SARS configuration in force for `company_id`.
    pub async fn effective_config(
        &self,
        company_id: i64,
    ) -> Result<EffectiveSarsConfig, PayrollServiceError> {
        let global = self.repo.ensure_global_sars_config().await?;
        let company = self.repo.get_company_sars_override(company_id).await?;
        Ok(resolve_sars_config(company.as_ref(), &global))
    }

    /// PAYE brackets for the tax year ending in `tax_year`.
    ///
    /// Falls back to the most recent earlier table when that year has not
    /// been loaded.
    pub async fn paye_brackets(
        &self,
        tax_year: i32,
    ) -> Result<Vec<PayeBracket>, PayrollServiceError> {
        let brackets = self.repo.get_paye_brackets(tax_year).await?;
        if !brackets.is_empty() {
            return Ok(brackets);
        }

        let fallback = self
            .repo
            .list_paye_tax_years()
            .await?
            .into_iter()
            .filter(|year| *year < tax_year)
            .max()
            .ok_or(PayrollServiceError::MissingPayeTable(tax_year))?;

        warn!(
            tax_year,
            fallback, "no PAYE table for tax year; using most recent earlier table"
        );
        Ok(self.repo.get_paye_brackets(fallback).await?)
    }

    /// Calculates the entry for one pay period without saving it.
    pub async fn calculate(
        &self,
        period: &PayPeriodInput,
    ) -> Result<PayrollEntry, PayrollServiceError> {
        let profile = self.repo.get_employee(period.employee_id).await?;
        let config = self.effective_config(profile.company_id).await?;
        let tax_year = config.tax_year_ending(period.pay_period_start)?;
        let brackets = self.paye_brackets(tax_year).await?;
        let deductions = self
            .repo
            .list_active_recurring_deductions(profile.id)
            .await?;
        let medical_aid = self.repo.get_medical_aid_info(profile.id).await?;

        debug!(
            employee_id = profile.id,
            tax_year,
            deductions = deductions.len(),
            "payroll inputs loaded"
        );

        let entry = PayrollAssembler::new(&config, &brackets).assemble(&PayrollInputs {
            profile: &profile,
            period,
            deductions: &deductions,
            medical_aid: medical_aid.as_ref(),
        })?;

        Ok(entry)
    }

    /// Calculates and saves the entry for one pay period.
    ///
    /// An existing entry for the same employee and period is replaced,
    /// unless it has been finalized.
    ///
    /// # Errors
    ///
    /// Returns [`PayrollServiceError::EntryFinalized`] when the period has a
    /// finalized entry, and otherwise any repository or calculation error.
    pub async fn run_payroll(
        &self,
        period: &PayPeriodInput,
    ) -> Result<StoredPayrollEntry, PayrollServiceError> {
        let existing = self
            .repo
            .find_payroll_entry_for_period(
                period.employee_id,
                period.pay_period_start,
                period.pay_period_end,
            )
            .await?;
        if let Some(existing) = existing.filter(|e| e.is_finalized) {
            return Err(PayrollServiceError::EntryFinalized(existing.id));
        }

        let entry = self.calculate(period).await?;
        let stored = self.repo.save_payroll_entry(&entry).await?;

        info!(
            entry_id = stored.id,
            employee_id = entry.employee_id,
            period = %entry.month_year,
            net = %entry.net_pay,
            "payroll entry saved"
        );

        Ok(stored)
    }

    /// Marks an entry as final. Finalizing twice returns the entry unchanged.
    pub async fn finalize_entry(
        &self,
        entry_id: i64,
    ) -> Result<StoredPayrollEntry, PayrollServiceError> {
        let stored = self.repo.get_payroll_entry(entry_id).await?;
        if stored.is_finalized {
            return Ok(stored);
        }

        let finalized = self.repo.finalize_payroll_entry(entry_id).await?;
        info!(entry_id, "payroll entry finalized");
        Ok(finalized)
    }

    /// Year-to-date totals for an employee as of `today`.
    ///
    /// `tax_year_start` defaults to the start of the tax year containing
    /// `today`. An unknown employee has zero totals.
    pub async fn year_to_date(
        &self,
        employee_id: i64,
        tax_year_start: Option<NaiveDate>,
        today: NaiveDate,
    ) -> Result<YtdTotals, PayrollServiceError> {
        let profile = match self.repo.get_employee(employee_id).await {
            Ok(profile) => profile,
            Err(RepositoryError::NotFound) => {
                debug!(employee_id, "unknown employee; year-to-date totals are zero");
                return Ok(YtdTotals::default());
            }
            Err(e) => return Err(e.into()),
        };

        let tax_year_start = match tax_year_start {
            Some(start) => start,
            None => {
                self.effective_config(profile.company_id)
                    .await?
                    .tax_year_start(today)?
            }
        };

        let entries = self.repo.list_payroll_entries(employee_id).await?;
        Ok(compute_ytd(&entries, profile.start_date, tax_year_start, today))
    }
}
