//! Assembly of a complete payroll entry.
//!
//! Runs gross pay, the medical aid assessment, recurring deductions and the
//! statutory calculator in order, then rounds every component to cents and
//! derives net pay from the rounded figures. The result always satisfies
//! `net_pay == gross_pay() - total_deductions()`.
//!
//! # Example
//!
//! ```
//! use chrono::NaiveDate;
//! use rust_decimal_macros::dec;
//! use payroll_core::calculations::{PayrollAssembler, PayrollInputs};
//! use payroll_core::{
//!     EffectiveSarsConfig, EmployeePayrollProfile, GlobalSarsConfig, PayPeriodInput,
//!     PayeBracket, SalaryType,
//! };
//!
//! let config = EffectiveSarsConfig::from(GlobalSarsConfig::default());
//! let brackets = PayeBracket::sars_2025();
//! let profile = EmployeePayrollProfile {
//!     id: 1,
//!     company_id: 1,
//!     employee_number: "EMP001".to_string(),
//!     full_name: "Naledi Khumalo".to_string(),
//!     start_date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
//!     salary_type: SalaryType::Monthly,
//!     salary: dec!(10000.00),
//!     piece_rate: None,
//!     ordinary_hours_per_day: Some(dec!(8)),
//!     work_days_per_month: Some(dec!(22)),
//!     overtime_multiplier: None,
//!     sunday_multiplier: None,
//!     holiday_multiplier: None,
//!     paye_exempt: false,
//!     medical_aid_dependants: 0,
//! };
//! let period = PayPeriodInput::new(
//!     1,
//!     NaiveDate::from_ymd_opt(2025, 4, 1).unwrap(),
//!     NaiveDate::from_ymd_opt(2025, 4, 30).unwrap(),
//! );
//!
//! let entry = PayrollAssembler::new(&config, &brackets)
//!     .assemble(&PayrollInputs {
//!         profile: &profile,
//!         period: &period,
//!         deductions: &[],
//!         medical_aid: None,
//!     })
//!     .unwrap();
//!
//! assert_eq!(entry.gross_pay(), dec!(10000.00));
//! assert_eq!(entry.net_pay, dec!(9278.00));
//! assert!(entry.is_balanced());
//! ```

use chrono::NaiveDate;
use thiserror::Error;
use tracing::info;

use crate::calculations::common::round_half_up;
use crate::calculations::deductions::DeductionResolver;
use crate::calculations::gross_pay::{GrossPayCalculator, PremiumRates};
use crate::calculations::medical_aid::MedicalAidCalculator;
use crate::calculations::statutory::{StatutoryCalculator, StatutoryError};
use crate::models::{
    DeductionLine, EffectiveSarsConfig, EmployeePayrollProfile, MedicalAidInfo, PayPeriodInput,
    PayeBracket, PayrollEntry, RecurringDeduction,
};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PayrollError {
    #[error("pay period belongs to employee {found}, not {expected}")]
    EmployeeMismatch { expected: i64, found: i64 },

    #[error("pay period ends {end} before it starts {start}")]
    InvalidPeriod { start: NaiveDate, end: NaiveDate },

    #[error(transparent)]
    Statutory(#[from] StatutoryError),
}

/// Everything loaded for one employee's payroll run.
#[derive(Debug, Clone, Copy)]
pub struct PayrollInputs<'a> {
    pub profile: &'a EmployeePayrollProfile,
    pub period: &'a PayPeriodInput,
    /// The employee's recurring deductions; inactive ones are ignored.
    pub deductions: &'a [RecurringDeduction],
    pub medical_aid: Option<&'a MedicalAidInfo>,
}

/// Builds payroll entries for one company configuration and PAYE table.
#[derive(Debug, Clone)]
pub struct PayrollAssembler<'a> {
    config: &'a EffectiveSarsConfig,
    brackets: &'a [PayeBracket],
    premiums: PremiumRates,
}

impl<'a> PayrollAssembler<'a> {
    /// An assembler pricing premium hours at [`PremiumRates::STATUTORY`].
    pub fn new(
        config: &'a EffectiveSarsConfig,
        brackets: &'a [PayeBracket],
    ) -> Self {
        Self {
            config,
            brackets,
            premiums: PremiumRates::STATUTORY,
        }
    }

    pub fn with_premiums(
        mut self,
        premiums: PremiumRates,
    ) -> Self {
        self.premiums = premiums;
        self
    }

    /// Calculates one payroll entry.
    ///
    /// # Errors
    ///
    /// Returns [`PayrollError`] if the period belongs to another employee,
    /// ends before it starts, or PAYE cannot be looked up.
    pub fn assemble(
        &self,
        inputs: &PayrollInputs<'_>,
    ) -> Result<PayrollEntry, PayrollError> {
        let PayrollInputs {
            profile,
            period,
            deductions,
            medical_aid,
        } = *inputs;

        if period.employee_id != profile.id {
            return Err(PayrollError::EmployeeMismatch {
                expected: profile.id,
                found: period.employee_id,
            });
        }
        if period.pay_period_end < period.pay_period_start {
            return Err(PayrollError::InvalidPeriod {
                start: period.pay_period_start,
                end: period.pay_period_end,
            });
        }

        let earnings = GrossPayCalculator::new(self.premiums).calculate(profile, period);
        let gross_pay = earnings.total();

        let has_calculated_medical = deductions
            .iter()
            .any(RecurringDeduction::is_calculated_medical_aid);
        let medical = MedicalAidCalculator::new(self.config).assess(
            medical_aid,
            profile,
            has_calculated_medical,
        );

        let recurring =
            DeductionResolver::new(gross_pay, medical.deduction_amount).resolve(deductions);

        let statutory = StatutoryCalculator::new(self.config, self.brackets).calculate(
            gross_pay,
            medical.fringe_benefit,
            medical.tax_credit,
            profile.paye_exempt,
        )?;

        let mut entry = PayrollEntry {
            employee_id: profile.id,
            pay_period_start: period.pay_period_start,
            pay_period_end: period.pay_period_end,
            month_year: period.month_year(),
            ordinary_hours: period.ordinary_hours,
            overtime_hours: period.overtime_hours,
            sunday_hours: period.sunday_hours,
            public_holiday_hours: period.public_holiday_hours,
            hourly_rate: round_half_up(earnings.hourly_rate),
            pieces_produced: period.pieces_produced,
            piece_rate: round_half_up(earnings.piece_rate),
            allowances: round_half_up(earnings.allowances),
            bonus_amount: round_half_up(earnings.bonus),
            union_fee: round_half_up(period.union_fee),
            deductions_other: round_half_up(period.deductions_other),
            ordinary_pay: round_half_up(earnings.ordinary_pay),
            overtime_pay: round_half_up(earnings.overtime_pay),
            sunday_pay: round_half_up(earnings.sunday_pay),
            holiday_pay: round_half_up(earnings.holiday_pay),
            taxable_gross: round_half_up(statutory.taxable_gross),
            paye: round_half_up(statutory.paye),
            uif: round_half_up(statutory.uif),
            sdl: round_half_up(statutory.sdl),
            medical_aid_tax_credit: round_half_up(medical.tax_credit),
            fringe_benefit_medical: round_half_up(medical.fringe_benefit),
            recurring_deductions: recurring
                .lines
                .into_iter()
                .map(|line| DeductionLine {
                    amount: round_half_up(line.amount),
                    ..line
                })
                .collect(),
            net_pay: Default::default(),
        };
        entry.net_pay = entry.gross_pay() - entry.total_deductions();

        info!(
            employee_id = entry.employee_id,
            period = %entry.month_year,
            gross = %entry.gross_pay(),
            paye = %entry.paye,
            net = %entry.net_pay,
            "payroll entry assembled"
        );

        Ok(entry)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    use super::*;
    use crate::models::{AmountType, BeneficiaryType, GlobalSarsConfig, SalaryType};

    fn config() -> EffectiveSarsConfig {
        EffectiveSarsConfig::from(GlobalSarsConfig::default())
    }

    fn date(
        y: i32,
        m: u32,
        d: u32,
    ) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn profile(
        salary_type: SalaryType,
        salary: Decimal,
    ) -> EmployeePayrollProfile {
        EmployeePayrollProfile {
            id: 1,
            company_id: 1,
            employee_number: "EMP001".to_string(),
            full_name: "Ayanda Zulu".to_string(),
            start_date: date(2024, 3, 1),
            salary_type,
            salary,
            piece_rate: None,
            ordinary_hours_per_day: Some(dec!(8)),
            work_days_per_month: Some(dec!(22)),
            overtime_multiplier: Some(dec!(1.5)),
            sunday_multiplier: Some(dec!(2.0)),
            holiday_multiplier: Some(dec!(2.5)),
            paye_exempt: false,
            medical_aid_dependants: 0,
        }
    }

    fn period() -> PayPeriodInput {
        PayPeriodInput::new(1, date(2025, 4, 1), date(2025, 4, 30))
    }

    fn deduction(
        id: i64,
        kind: BeneficiaryType,
        amount_type: AmountType,
        value: Option<Decimal>,
    ) -> RecurringDeduction {
        RecurringDeduction {
            id,
            employee_id: 1,
            beneficiary_id: id,
            beneficiary_kind: kind,
            beneficiary_name: kind.as_str().to_string(),
            amount_type,
            value,
            is_active: true,
            effective_date: None,
            end_date: None,
            notes: None,
        }
    }

    fn assemble(
        profile: &EmployeePayrollProfile,
        period: &PayPeriodInput,
        deductions: &[RecurringDeduction],
        medical_aid: Option<&MedicalAidInfo>,
    ) -> PayrollEntry {
        let config = config();
        let brackets = PayeBracket::sars_2025();
        PayrollAssembler::new(&config, &brackets)
            .assemble(&PayrollInputs {
                profile,
                period,
                deductions,
                medical_aid,
            })
            .unwrap()
    }

    // =========================================================================
    // Scenarios
    // =========================================================================

    #[test]
    fn monthly_employee_without_deductions() {
        let entry = assemble(&profile(SalaryType::Monthly, dec!(10000.00)), &period(), &[], None);

        assert_eq!(entry.gross_pay(), dec!(10000.00));
        assert_eq!(entry.taxable_gross, dec!(10000.00));
        assert_eq!(entry.paye, dec!(522.00));
        assert_eq!(entry.uif, dec!(100.00));
        assert_eq!(entry.sdl, dec!(100.00));
        assert_eq!(entry.medical_aid_tax_credit, Decimal::ZERO);
        assert_eq!(entry.net_pay, dec!(9278.00));
        assert_eq!(entry.month_year, "2025-04");
    }

    #[test]
    fn medical_info_without_calculated_deduction_gives_no_credit() {
        let info = MedicalAidInfo::new(1);

        let entry = assemble(
            &profile(SalaryType::Monthly, dec!(10000.00)),
            &period(),
            &[],
            Some(&info),
        );

        assert_eq!(entry.medical_aid_tax_credit, Decimal::ZERO);
        assert_eq!(entry.fringe_benefit_medical, Decimal::ZERO);
        assert_eq!(entry.paye, dec!(522.00));
    }

    #[test]
    fn piece_worker_gross_ignores_premium_hours() {
        let period = PayPeriodInput {
            pieces_produced: dec!(200),
            piece_rate: Some(dec!(12.50)),
            overtime_hours: dec!(15),
            ..period()
        };

        let entry = assemble(&profile(SalaryType::Piece, Decimal::ZERO), &period, &[], None);

        assert_eq!(entry.ordinary_pay, dec!(2500.00));
        assert_eq!(entry.overtime_pay, Decimal::ZERO);
        assert_eq!(entry.gross_pay(), dec!(2500.00));
        assert_eq!(entry.paye, Decimal::ZERO);
        assert_eq!(entry.uif, dec!(25.00));
        assert_eq!(entry.net_pay, dec!(2450.00));
    }

    #[test]
    fn calculated_medical_aid_with_three_dependants() {
        let info = MedicalAidInfo {
            number_of_dependants: 3,
            ..MedicalAidInfo::new(1)
        };
        let deductions = [deduction(1, BeneficiaryType::MedicalAid, AmountType::Calculated, None)];

        let entry = assemble(
            &profile(SalaryType::Monthly, dec!(20000.00)),
            &period(),
            &deductions,
            Some(&info),
        );

        // taxable = 20000 + 1220 fringe; PAYE = 2392 + 3720 × 0.31 = 3545.20
        assert_eq!(entry.medical_aid_tax_credit, dec!(1220.00));
        assert_eq!(entry.fringe_benefit_medical, dec!(1220.00));
        assert_eq!(entry.taxable_gross, dec!(21220.00));
        assert_eq!(entry.paye, dec!(2325.20));
        assert_eq!(entry.uif, dec!(177.12));
        assert_eq!(entry.sdl, dec!(212.20));
        assert_eq!(entry.recurring_deductions.len(), 1);
        assert_eq!(entry.recurring_deductions[0].amount, dec!(1220.00));
        assert_eq!(entry.net_pay, dec!(16065.48));
        assert!(entry.is_balanced());
    }

    #[test]
    fn medical_credit_larger_than_paye_floors_at_zero() {
        let info = MedicalAidInfo {
            number_of_dependants: 3,
            ..MedicalAidInfo::new(1)
        };
        let deductions = [deduction(1, BeneficiaryType::MedicalAid, AmountType::Calculated, None)];

        let entry = assemble(
            &profile(SalaryType::Monthly, dec!(6000.00)),
            &period(),
            &deductions,
            Some(&info),
        );

        assert_eq!(entry.paye, Decimal::ZERO);
        assert!(entry.is_balanced());
    }

    #[test]
    fn paye_exempt_employee_pays_no_paye() {
        let employee = EmployeePayrollProfile {
            paye_exempt: true,
            ..profile(SalaryType::Monthly, dec!(60000.00))
        };

        let entry = assemble(&employee, &period(), &[], None);

        assert_eq!(entry.paye, Decimal::ZERO);
        assert_eq!(entry.uif, dec!(177.12));
        assert_eq!(entry.sdl, dec!(600.00));
    }

    #[test]
    fn union_fee_and_other_deductions_reduce_net_pay() {
        let period = PayPeriodInput {
            union_fee: dec!(85.00),
            deductions_other: dec!(150.00),
            ..period()
        };

        let entry = assemble(&profile(SalaryType::Monthly, dec!(10000.00)), &period, &[], None);

        assert_eq!(entry.total_deductions(), dec!(957.00));
        assert_eq!(entry.net_pay, dec!(9043.00));
    }

    // =========================================================================
    // Net pay invariant
    // =========================================================================

    #[test]
    fn net_pay_balances_for_every_salary_type_and_deduction_mix() {
        let deduction_sets = [
            vec![],
            vec![deduction(1, BeneficiaryType::Union, AmountType::Fixed, Some(dec!(95.55)))],
            vec![
                deduction(1, BeneficiaryType::PensionFund, AmountType::Percentage, Some(dec!(7.25))),
                deduction(2, BeneficiaryType::MedicalAid, AmountType::Calculated, None),
                deduction(3, BeneficiaryType::GarnisheeOrder, AmountType::Fixed, Some(dec!(333.33))),
            ],
        ];
        let employees = [
            profile(SalaryType::Monthly, dec!(18333.33)),
            profile(SalaryType::Hourly, dec!(67.89)),
            profile(SalaryType::Daily, dec!(456.78)),
            EmployeePayrollProfile {
                piece_rate: Some(dec!(3.33)),
                ..profile(SalaryType::Piece, Decimal::ZERO)
            },
        ];
        let period = PayPeriodInput {
            ordinary_hours: dec!(173.33),
            overtime_hours: dec!(7.25),
            sunday_hours: dec!(5.5),
            public_holiday_hours: dec!(3.75),
            pieces_produced: dec!(1234),
            allowances: dec!(333.33),
            bonus_amount: dec!(1111.11),
            union_fee: dec!(45.45),
            deductions_other: dec!(12.34),
            ..period()
        };
        let info = MedicalAidInfo {
            number_of_dependants: 2,
            ..MedicalAidInfo::new(1)
        };

        for employee in &employees {
            for deductions in &deduction_sets {
                let entry = assemble(employee, &period, deductions, Some(&info));
                assert!(
                    entry.is_balanced(),
                    "{:?} with {} deductions does not balance",
                    employee.salary_type,
                    deductions.len()
                );
                assert_eq!(entry.net_pay, entry.net_pay.round_dp(2));
            }
        }
    }

    #[test]
    fn assembling_twice_gives_identical_entries() {
        let deductions = [deduction(1, BeneficiaryType::PensionFund, AmountType::Percentage, Some(dec!(7.5)))];
        let employee = profile(SalaryType::Monthly, dec!(23456.78));

        let first = assemble(&employee, &period(), &deductions, None);
        let second = assemble(&employee, &period(), &deductions, None);

        assert_eq!(first, second);
    }

    #[test]
    fn configured_premiums_apply_when_opted_in() {
        let config = config();
        let brackets = PayeBracket::sars_2025();
        let employee = profile(SalaryType::Hourly, dec!(100.00));
        let period = PayPeriodInput {
            ordinary_hours: dec!(100),
            public_holiday_hours: dec!(8),
            ..period()
        };

        let entry = PayrollAssembler::new(&config, &brackets)
            .with_premiums(PremiumRates::from_profile(&employee, PremiumRates::STATUTORY))
            .assemble(&PayrollInputs {
                profile: &employee,
                period: &period,
                deductions: &[],
                medical_aid: None,
            })
            .unwrap();

        assert_eq!(entry.holiday_pay, dec!(2000.00));
    }

    // =========================================================================
    // Errors
    // =========================================================================

    #[test]
    fn period_for_another_employee_is_rejected() {
        let config = config();
        let brackets = PayeBracket::sars_2025();
        let employee = profile(SalaryType::Monthly, dec!(10000.00));
        let period = PayPeriodInput::new(2, date(2025, 4, 1), date(2025, 4, 30));

        let result = PayrollAssembler::new(&config, &brackets).assemble(&PayrollInputs {
            profile: &employee,
            period: &period,
            deductions: &[],
            medical_aid: None,
        });

        assert_eq!(
            result,
            Err(PayrollError::EmployeeMismatch {
                expected: 1,
                found: 2
            })
        );
    }

    #[test]
    fn period_ending_before_start_is_rejected() {
        let config = config();
        let brackets = PayeBracket::sars_2025();
        let employee = profile(SalaryType::Monthly, dec!(10000.00));
        let period = PayPeriodInput::new(1, date(2025, 4, 30), date(2025, 4, 1));

        let result = PayrollAssembler::new(&config, &brackets).assemble(&PayrollInputs {
            profile: &employee,
            period: &period,
            deductions: &[],
            medical_aid: None,
        });

        assert_eq!(
            result,
            Err(PayrollError::InvalidPeriod {
                start: date(2025, 4, 30),
                end: date(2025, 4, 1)
            })
        );
    }

    #[test]
    fn missing_paye_table_is_reported() {
        let config = config();
        let employee = profile(SalaryType::Monthly, dec!(10000.00));

        let result = PayrollAssembler::new(&config, &[]).assemble(&PayrollInputs {
            profile: &employee,
            period: &period(),
            deductions: &[],
            medical_aid: None,
        });

        assert_eq!(
            result,
            Err(PayrollError::Statutory(StatutoryError::NoPayeBrackets))
        );
    }
}
