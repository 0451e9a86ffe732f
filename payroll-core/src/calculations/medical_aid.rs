//! Medical scheme fees tax credit and the related fringe benefit.
//!
//! The monthly credit depends on how many dependants the member has:
//!
//! | Dependants | Monthly credit |
//! |------------|----------------|
//! | 0          | primary |
//! | 1          | primary × 2 |
//! | n ≥ 2      | primary × 2 + (n − 1) × dependant credit |
//!
//! A member who opts out of the SARS calculation has their employer and
//! employee contribution overrides used instead.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::models::{EffectiveSarsConfig, EmployeePayrollProfile, MedicalAidInfo};

/// The medical aid figures for one payroll run, computed once.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MedicalAidAssessment {
    pub dependants: u32,
    /// Subtracted from PAYE.
    pub tax_credit: Decimal,
    /// Added to taxable income.
    pub fringe_benefit: Decimal,
    /// Amount of the Calculated recurring deduction.
    pub deduction_amount: Decimal,
}

impl MedicalAidAssessment {
    /// No medical aid: every figure is zero.
    pub fn none() -> Self {
        Self::default()
    }
}

/// Calculator for medical aid credits, bound to a resolved configuration.
#[derive(Debug, Clone)]
pub struct MedicalAidCalculator<'a> {
    config: &'a EffectiveSarsConfig,
}

impl<'a> MedicalAidCalculator<'a> {
    pub fn new(config: &'a EffectiveSarsConfig) -> Self {
        Self { config }
    }

    /// The statutory monthly credit for `dependants` dependants.
    ///
    /// ```
    /// use rust_decimal_macros::dec;
    /// use payroll_core::calculations::MedicalAidCalculator;
    /// use payroll_core::{EffectiveSarsConfig, GlobalSarsConfig};
    ///
    /// let config = EffectiveSarsConfig::from(GlobalSarsConfig::default());
    /// let calculator = MedicalAidCalculator::new(&config);
    ///
    /// assert_eq!(calculator.monthly_credit(0), dec!(364));
    /// assert_eq!(calculator.monthly_credit(3), dec!(1220));
    /// ```
    pub fn monthly_credit(
        &self,
        dependants: u32,
    ) -> Decimal {
        let primary = self.config.medical_primary_credit;
        match dependants {
            0 => primary,
            1 => primary * Decimal::TWO,
            n => {
                primary * Decimal::TWO
                    + Decimal::from(n - 1) * self.config.medical_dependant_credit
            }
        }
    }

    /// Dependants from the medical aid record, or the profile's count when
    /// there is no record.
    pub fn dependant_count(
        &self,
        info: Option<&MedicalAidInfo>,
        profile: &EmployeePayrollProfile,
    ) -> u32 {
        info.map_or(profile.medical_aid_dependants, MedicalAidInfo::total_dependants)
    }

    /// Amount of a Calculated medical aid deduction.
    ///
    /// Opted-out members pay the sum of their contribution overrides; everyone
    /// else pays the statutory credit.
    pub fn contribution(
        &self,
        info: Option<&MedicalAidInfo>,
        dependants: u32,
    ) -> Decimal {
        match info {
            Some(info) if !info.use_sars_calculation => {
                info.employer_contribution_override.unwrap_or(Decimal::ZERO)
                    + info.employee_contribution_override.unwrap_or(Decimal::ZERO)
            }
            _ => self.monthly_credit(dependants),
        }
    }

    /// Taxable fringe benefit: the employer's share only.
    pub fn fringe_benefit(
        &self,
        info: Option<&MedicalAidInfo>,
        dependants: u32,
    ) -> Decimal {
        match info {
            None => Decimal::ZERO,
            Some(info) if info.use_sars_calculation => self.monthly_credit(dependants),
            Some(info) => info.employer_contribution_override.unwrap_or(Decimal::ZERO),
        }
    }

    /// Computes every medical aid figure for one run.
    ///
    /// Employees without an active Calculated medical aid deduction get
    /// [`MedicalAidAssessment::none`]. Otherwise the credit applied to PAYE
    /// and the deduction amount are the same figure.
    pub fn assess(
        &self,
        info: Option<&MedicalAidInfo>,
        profile: &EmployeePayrollProfile,
        has_calculated_deduction: bool,
    ) -> MedicalAidAssessment {
        if !has_calculated_deduction {
            return MedicalAidAssessment::none();
        }

        let dependants = self.dependant_count(info, profile);
        let deduction_amount = self.contribution(info, dependants);
        let assessment = MedicalAidAssessment {
            dependants,
            tax_credit: deduction_amount,
            fringe_benefit: self.fringe_benefit(info, dependants),
            deduction_amount,
        };

        debug!(
            employee_id = profile.id,
            dependants,
            credit = %assessment.tax_credit,
            fringe = %assessment.fringe_benefit,
            "medical aid assessed"
        );

        assessment
    }
}
