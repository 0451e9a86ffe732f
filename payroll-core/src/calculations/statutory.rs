//! PAYE, UIF and SDL for one pay period.
//!
//! | Step | Amount |
//! |------|--------|
//! | 1 | taxable gross = gross pay + fringe benefit |
//! | 2 | UIF = min(min(taxable, UIF salary cap) × UIF rate, UIF monthly cap) |
//! | 3 | SDL = taxable × SDL rate |
//! | 4 | PAYE before credit, from the monthly bracket table |
//! | 5 | PAYE = max(PAYE before credit − medical credit, 0) |
//!
//! PAYE-exempt employees skip steps 4 and 5 entirely. Nothing is rounded here.
//!
//! # Example
//!
//! ```
//! use rust_decimal_macros::dec;
//! use payroll_core::calculations::StatutoryCalculator;
//! use payroll_core::{EffectiveSarsConfig, GlobalSarsConfig, PayeBracket};
//!
//! let config = EffectiveSarsConfig::from(GlobalSarsConfig::default());
//! let brackets = PayeBracket::sars_2025();
//! let calculator = StatutoryCalculator::new(&config, &brackets);
//!
//! let result = calculator
//!     .calculate(dec!(10000.00), dec!(0), dec!(0), false)
//!     .unwrap();
//!
//! assert_eq!(result.paye, dec!(522.00));
//! assert_eq!(result.uif, dec!(100.00));
//! assert_eq!(result.sdl, dec!(100.00));
//! ```

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::models::{EffectiveSarsConfig, PayeBracket};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StatutoryError {
    /// The PAYE table is empty.
    #[error("no PAYE brackets provided")]
    NoPayeBrackets,

    /// The PAYE table has a gap covering this income.
    #[error("no PAYE bracket found for taxable income {0}")]
    NoMatchingBracket(Decimal),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatutoryResult {
    pub taxable_gross: Decimal,
    pub uif: Decimal,
    pub sdl: Decimal,
    /// Bracket tax before the medical credit.
    pub paye_before_credit: Decimal,
    pub paye: Decimal,
}

/// Calculator for PAYE, UIF and SDL.
///
/// Brackets should be sorted by `min_income` and the last one should have no
/// upper bound.
#[derive(Debug, Clone)]
pub struct StatutoryCalculator<'a> {
    config: &'a EffectiveSarsConfig,
    brackets: &'a [PayeBracket],
}

impl<'a> StatutoryCalculator<'a> {
    pub fn new(
        config: &'a EffectiveSarsConfig,
        brackets: &'a [PayeBracket],
    ) -> Self {
        Self { config, brackets }
    }

    /// Calculates every statutory deduction.
    ///
    /// # Errors
    ///
    /// Returns [`StatutoryError`] if PAYE is due and the bracket table is
    /// empty or has no tier for the taxable income.
    pub fn calculate(
        &self,
        gross_pay: Decimal,
        fringe_benefit: Decimal,
        medical_credit: Decimal,
        paye_exempt: bool,
    ) -> Result<StatutoryResult, StatutoryError> {
        let taxable_gross = gross_pay + fringe_benefit;
        let uif = self.uif(taxable_gross);
        let sdl = self.sdl(taxable_gross);

        let (paye_before_credit, paye) = if paye_exempt {
            debug!(taxable = %taxable_gross, "employee is PAYE exempt");
            (Decimal::ZERO, Decimal::ZERO)
        } else {
            let before_credit = self.paye_before_credit(taxable_gross)?;
            (before_credit, self.paye_after_credit(before_credit, medical_credit))
        };

        Ok(StatutoryResult {
            taxable_gross,
            uif,
            sdl,
            paye_before_credit,
            paye,
        })
    }

    /// UIF on earnings up to the salary cap, limited to the monthly cap.
    fn uif(
        &self,
        taxable_gross: Decimal,
    ) -> Decimal {
        let eligible = taxable_gross.min(self.config.uif_salary_cap);
        (eligible * self.config.uif_rate()).min(self.config.uif_monthly_cap)
    }

    /// SDL on all taxable earnings.
    fn sdl(
        &self,
        taxable_gross: Decimal,
    ) -> Decimal {
        taxable_gross * self.config.sdl_rate()
    }

    /// Base tax of the matching tier plus the marginal rate on the excess.
    fn paye_before_credit(
        &self,
        taxable_gross: Decimal,
    ) -> Result<Decimal, StatutoryError> {
        if self.brackets.is_empty() {
            return Err(StatutoryError::NoPayeBrackets);
        }
        if taxable_gross <= Decimal::ZERO {
            return Ok(Decimal::ZERO);
        }

        let bracket = self
            .brackets
            .iter()
            .find(|b| {
                taxable_gross > b.min_income
                    && b.max_income.is_none_or(|upper| taxable_gross <= upper)
            })
            .ok_or(StatutoryError::NoMatchingBracket(taxable_gross))?;

        Ok(bracket.base_tax + (taxable_gross - bracket.min_income) * bracket.rate)
    }

    /// Medical credit reduces PAYE but never below zero.
    fn paye_after_credit(
        &self,
        paye: Decimal,
        medical_credit: Decimal,
    ) -> Decimal {
        (paye - medical_credit).max(Decimal::ZERO)
    }
}
