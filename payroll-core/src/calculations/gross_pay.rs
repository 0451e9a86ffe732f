//! Gross pay for one pay period.
//!
//! | Salary type | Ordinary pay |
//! |-------------|--------------|
//! | Monthly     | the monthly salary; recorded hours are ignored |
//! | Daily       | `ordinary_hours × salary` |
//! | Piece       | `pieces_produced × piece_rate` |
//! | Hourly      | `ordinary_hours × hourly_rate` |
//!
//! Hourly and daily employees also earn overtime, Sunday and public holiday
//! premiums at the rates carried by [`PremiumRates`]. Gross pay adds
//! allowances and the bonus on top.
//!
//! # Example
//!
//! ```
//! use chrono::NaiveDate;
//! use rust_decimal_macros::dec;
//! use payroll_core::calculations::GrossPayCalculator;
//! use payroll_core::{EmployeePayrollProfile, PayPeriodInput, SalaryType};
//!
//! let profile = EmployeePayrollProfile {
//!     id: 1,
//!     company_id: 1,
//!     employee_number: "EMP001".to_string(),
//!     full_name: "Sipho Dlamini".to_string(),
//!     start_date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
//!     salary_type: SalaryType::Hourly,
//!     salary: dec!(80.00),
//!     piece_rate: None,
//!     ordinary_hours_per_day: Some(dec!(8)),
//!     work_days_per_month: Some(dec!(22)),
//!     overtime_multiplier: None,
//!     sunday_multiplier: None,
//!     holiday_multiplier: None,
//!     paye_exempt: false,
//!     medical_aid_dependants: 0,
//! };
//! let mut period = PayPeriodInput::new(
//!     1,
//!     NaiveDate::from_ymd_opt(2025, 4, 1).unwrap(),
//!     NaiveDate::from_ymd_opt(2025, 4, 30).unwrap(),
//! );
//! period.ordinary_hours = dec!(160);
//! period.overtime_hours = dec!(10);
//!
//! let pay = GrossPayCalculator::default().calculate(&profile, &period);
//!
//! assert_eq!(pay.ordinary_pay, dec!(12800.00));
//! assert_eq!(pay.overtime_pay, dec!(1200.00));
//! assert_eq!(pay.total(), dec!(14000.00));
//! ```

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::calculations::common::nonzero_divisor;
use crate::models::{EmployeePayrollProfile, PayPeriodInput, SalaryType};

const DEFAULT_HOURS_PER_DAY: Decimal = Decimal::from_parts(8, 0, 0, false, 0);
const DEFAULT_DAYS_PER_MONTH: Decimal = Decimal::from_parts(22, 0, 0, false, 0);

/// Multipliers applied to the hourly rate for premium hours.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PremiumRates {
    pub overtime: Decimal,
    pub sunday: Decimal,
    pub public_holiday: Decimal,
}

impl PremiumRates {
    /// 1.5× overtime, 2× Sundays, 2× public holidays.
    pub const STATUTORY: PremiumRates = PremiumRates {
        overtime: Decimal::from_parts(15, 0, 0, false, 1),
        sunday: Decimal::from_parts(2, 0, 0, false, 0),
        public_holiday: Decimal::from_parts(2, 0, 0, false, 0),
    };

    /// The employee's configured multipliers, with `fallback` for any unset field.
    pub fn from_profile(
        profile: &EmployeePayrollProfile,
        fallback: PremiumRates,
    ) -> Self {
        Self {
            overtime: profile.overtime_multiplier.unwrap_or(fallback.overtime),
            sunday: profile.sunday_multiplier.unwrap_or(fallback.sunday),
            public_holiday: profile.holiday_multiplier.unwrap_or(fallback.public_holiday),
        }
    }
}

impl Default for PremiumRates {
    fn default() -> Self {
        Self::STATUTORY
    }
}

/// Earnings components for one pay period, unrounded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrossPayBreakdown {
    pub ordinary_pay: Decimal,
    pub overtime_pay: Decimal,
    pub sunday_pay: Decimal,
    pub holiday_pay: Decimal,
    pub allowances: Decimal,
    pub bonus: Decimal,
    /// Hourly rate the premiums were priced at.
    pub hourly_rate: Decimal,
    /// Piece rate used for piece work, zero otherwise.
    pub piece_rate: Decimal,
}

impl GrossPayBreakdown {
    pub fn total(&self) -> Decimal {
        self.ordinary_pay
            + self.overtime_pay
            + self.sunday_pay
            + self.holiday_pay
            + self.allowances
            + self.bonus
    }
}

/// Hourly rate implied by an employee's salary.
///
/// Monthly salaries are spread over `hours_per_day × days_per_month`, daily
/// salaries over `hours_per_day`. Unset hours and days fall back to 8 and 22;
/// a zero divisor is replaced by 1. Piece workers have no hourly rate.
pub fn implied_hourly_rate(profile: &EmployeePayrollProfile) -> Decimal {
    let hours_per_day = profile
        .ordinary_hours_per_day
        .unwrap_or(DEFAULT_HOURS_PER_DAY);
    let days_per_month = profile.work_days_per_month.unwrap_or(DEFAULT_DAYS_PER_MONTH);

    match profile.salary_type {
        SalaryType::Hourly => profile.salary,
        SalaryType::Daily => {
            profile.salary / nonzero_divisor(hours_per_day, "ordinary_hours_per_day")
        }
        SalaryType::Monthly => {
            profile.salary
                / nonzero_divisor(hours_per_day * days_per_month, "hours_per_month")
        }
        SalaryType::Piece => Decimal::ZERO,
    }
}

/// Calculator for gross pay.
#[derive(Debug, Clone, Default)]
pub struct GrossPayCalculator {
    premiums: PremiumRates,
}

impl GrossPayCalculator {
    pub fn new(premiums: PremiumRates) -> Self {
        Self { premiums }
    }

    /// Calculates every earnings component for the period.
    pub fn calculate(
        &self,
        profile: &EmployeePayrollProfile,
        period: &PayPeriodInput,
    ) -> GrossPayBreakdown {
        let hourly_rate = self.hourly_rate(profile, period);
        let piece_rate = self.piece_rate(profile, period);
        let ordinary_pay = self.ordinary_pay(profile, period, hourly_rate, piece_rate);

        let (overtime_pay, sunday_pay, holiday_pay) = if profile.salary_type.earns_premiums() {
            (
                period.overtime_hours * hourly_rate * self.premiums.overtime,
                period.sunday_hours * hourly_rate * self.premiums.sunday,
                period.public_holiday_hours * hourly_rate * self.premiums.public_holiday,
            )
        } else {
            (Decimal::ZERO, Decimal::ZERO, Decimal::ZERO)
        };

        let breakdown = GrossPayBreakdown {
            ordinary_pay,
            overtime_pay,
            sunday_pay,
            holiday_pay,
            allowances: period.allowances,
            bonus: period.bonus_amount,
            hourly_rate,
            piece_rate,
        };

        debug!(
            employee_id = profile.id,
            salary_type = profile.salary_type.as_str(),
            gross = %breakdown.total(),
            "gross pay calculated"
        );

        breakdown
    }

    /// Ordinary pay before premiums, allowances and bonus.
    fn ordinary_pay(
        &self,
        profile: &EmployeePayrollProfile,
        period: &PayPeriodInput,
        hourly_rate: Decimal,
        piece_rate: Decimal,
    ) -> Decimal {
        match profile.salary_type {
            SalaryType::Monthly => profile.salary,
            SalaryType::Daily => period.ordinary_hours * profile.salary,
            SalaryType::Piece => period.pieces_produced * piece_rate,
            SalaryType::Hourly => period.ordinary_hours * hourly_rate,
        }
    }

    /// The rate recorded on the period, or the one implied by the salary when
    /// none was recorded. Piece work has no hourly rate.
    fn hourly_rate(
        &self,
        profile: &EmployeePayrollProfile,
        period: &PayPeriodInput,
    ) -> Decimal {
        if profile.salary_type == SalaryType::Piece {
            Decimal::ZERO
        } else if period.hourly_rate > Decimal::ZERO {
            period.hourly_rate
        } else {
            implied_hourly_rate(profile)
        }
    }

    /// The period's piece rate, else the profile's, else zero.
    fn piece_rate(
        &self,
        profile: &EmployeePayrollProfile,
        period: &PayPeriodInput,
    ) -> Decimal {
        if profile.salary_type != SalaryType::Piece {
            return Decimal::ZERO;
        }
        period
            .piece_rate
            .or(profile.piece_rate)
            .unwrap_or(Decimal::ZERO)
    }
}
