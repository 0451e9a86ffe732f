use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Hours, units and once-off amounts recorded for one employee in one pay period.
///
/// A zero `hourly_rate` or a missing `piece_rate` is filled from the
/// employee's profile when gross pay is calculated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayPeriodInput {
    pub employee_id: i64,
    pub pay_period_start: NaiveDate,
    pub pay_period_end: NaiveDate,
    pub ordinary_hours: Decimal,
    pub overtime_hours: Decimal,
    pub sunday_hours: Decimal,
    pub public_holiday_hours: Decimal,
    pub hourly_rate: Decimal,
    pub allowances: Decimal,
    pub bonus_amount: Decimal,
    pub pieces_produced: Decimal,
    pub piece_rate: Option<Decimal>,
    pub union_fee: Decimal,
    pub deductions_other: Decimal,
}

impl PayPeriodInput {
    /// A period with every amount zeroed.
    pub fn new(
        employee_id: i64,
        pay_period_start: NaiveDate,
        pay_period_end: NaiveDate,
    ) -> Self {
        Self {
            employee_id,
            pay_period_start,
            pay_period_end,
            ordinary_hours: Decimal::ZERO,
            overtime_hours: Decimal::ZERO,
            sunday_hours: Decimal::ZERO,
            public_holiday_hours: Decimal::ZERO,
            hourly_rate: Decimal::ZERO,
            allowances: Decimal::ZERO,
            bonus_amount: Decimal::ZERO,
            pieces_produced: Decimal::ZERO,
            piece_rate: None,
            union_fee: Decimal::ZERO,
            deductions_other: Decimal::ZERO,
        }
    }

    /// `YYYY-MM` of the period start.
    pub fn month_year(&self) -> String {
        self.pay_period_start.format("%Y-%m").to_string()
    }
}
