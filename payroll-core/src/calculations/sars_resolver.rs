//! Resolution of a company's effective SARS configuration.
//!
//! Each configurable field comes from the company override when it is set
//! and from the global record otherwise. The global record always exists, so
//! resolution cannot fail.
//!
//! # Example
//!
//! ```
//! use rust_decimal_macros::dec;
//! use payroll_core::calculations::resolve_sars_config;
//! use payroll_core::{CompanySarsOverride, GlobalSarsConfig};
//!
//! let global = GlobalSarsConfig::default();
//! let company = CompanySarsOverride {
//!     uif_monthly_cap: Some(dec!(200.00)),
//!     ..CompanySarsOverride::empty(7)
//! };
//!
//! let config = resolve_sars_config(Some(&company), &global);
//!
//! assert_eq!(config.uif_monthly_cap, dec!(200.00));
//! assert_eq!(config.uif_salary_cap, dec!(17712.00));
//! ```

use chrono::{Datelike, Month, NaiveDate};
use rust_decimal::Decimal;
use thiserror::Error;
use tracing::debug;

use crate::models::{CompanySarsOverride, EffectiveSarsConfig, GlobalSarsConfig};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SarsConfigError {
    #[error("invalid tax year start: month {month}, day {day}")]
    InvalidTaxYearStart { month: u32, day: u32 },
}

/// Merges a company override onto the global record, field by field.
///
/// `tax_year_display` is not overridable and always comes from the global
/// record.
pub fn resolve_sars_config(
    company: Option<&CompanySarsOverride>,
    global: &GlobalSarsConfig,
) -> EffectiveSarsConfig {
    let Some(company) = company else {
        debug!("no company SARS override; using global configuration");
        return EffectiveSarsConfig::from(global.clone());
    };

    EffectiveSarsConfig {
        uif_percent: company.uif_percent.unwrap_or(global.uif_percent),
        sdl_percent: company.sdl_percent.unwrap_or(global.sdl_percent),
        uif_salary_cap: company.uif_salary_cap.unwrap_or(global.uif_salary_cap),
        uif_monthly_cap: company.uif_monthly_cap.unwrap_or(global.uif_monthly_cap),
        medical_primary_credit: company
            .medical_primary_credit
            .unwrap_or(global.medical_primary_credit),
        medical_dependant_credit: company
            .medical_dependant_credit
            .unwrap_or(global.medical_dependant_credit),
        tax_year_start_month: company
            .tax_year_start_month
            .unwrap_or(global.tax_year_start_month),
        tax_year_start_day: company
            .tax_year_start_day
            .unwrap_or(global.tax_year_start_day),
        tax_authority_name: company
            .tax_authority_name
            .clone()
            .unwrap_or_else(|| global.tax_authority_name.clone()),
        currency_symbol: company
            .currency_symbol
            .clone()
            .unwrap_or_else(|| global.currency_symbol.clone()),
        tax_year_display: global.tax_year_display.clone(),
    }
}

impl From<GlobalSarsConfig> for EffectiveSarsConfig {
    fn from(global: GlobalSarsConfig) -> Self {
        Self {
            uif_percent: global.uif_percent,
            sdl_percent: global.sdl_percent,
            uif_salary_cap: global.uif_salary_cap,
            uif_monthly_cap: global.uif_monthly_cap,
            medical_primary_credit: global.medical_primary_credit,
            medical_dependant_credit: global.medical_dependant_credit,
            tax_year_start_month: global.tax_year_start_month,
            tax_year_start_day: global.tax_year_start_day,
            tax_authority_name: global.tax_authority_name,
            currency_symbol: global.currency_symbol,
            tax_year_display: global.tax_year_display,
        }
    }
}

/// A stored rate of 1 or more is a whole percentage (`1.000` meaning 1%).
fn as_fraction(rate: Decimal) -> Decimal {
    if rate >= Decimal::ONE {
        rate / Decimal::ONE_HUNDRED
    } else {
        rate
    }
}

impl EffectiveSarsConfig {
    /// UIF rate as a fraction.
    pub fn uif_rate(&self) -> Decimal {
        as_fraction(self.uif_percent)
    }

    /// SDL rate as a fraction.
    pub fn sdl_rate(&self) -> Decimal {
        as_fraction(self.sdl_percent)
    }

    /// First day of the tax year that contains `on`.
    ///
    /// # Errors
    ///
    /// Returns [`SarsConfigError::InvalidTaxYearStart`] if the configured
    /// month and day do not form a date.
    pub fn tax_year_start(
        &self,
        on: NaiveDate,
    ) -> Result<NaiveDate, SarsConfigError> {
        let (month, day) = (self.tax_year_start_month, self.tax_year_start_day);
        let year = if (on.month(), on.day()) >= (month, day) {
            on.year()
        } else {
            on.year() - 1
        };

        NaiveDate::from_ymd_opt(year, month, day)
            .ok_or(SarsConfigError::InvalidTaxYearStart { month, day })
    }

    /// The year in which the tax year containing `on` ends. PAYE tables are
    /// keyed by this year.
    ///
    /// # Errors
    ///
    /// See [`EffectiveSarsConfig::tax_year_start`].
    pub fn tax_year_ending(
        &self,
        on: NaiveDate,
    ) -> Result<i32, SarsConfigError> {
        let start = self.tax_year_start(on)?;
        if (start.month(), start.day()) == (1, 1) {
            Ok(start.year())
        } else {
            Ok(start.year() + 1)
        }
    }

    /// The tax year start as shown to users, e.g. `1 March`.
    ///
    /// # Errors
    ///
    /// Returns [`SarsConfigError::InvalidTaxYearStart`] if the month is out of range.
    pub fn tax_year_start_display(&self) -> Result<String, SarsConfigError> {
        let month = u8::try_from(self.tax_year_start_month)
            .ok()
            .and_then(|m| Month::try_from(m).ok())
            .ok_or(SarsConfigError::InvalidTaxYearStart {
                month: self.tax_year_start_month,
                day: self.tax_year_start_day,
            })?;

        Ok(format!("{} {}", self.tax_year_start_day, month.name()))
    }
}
