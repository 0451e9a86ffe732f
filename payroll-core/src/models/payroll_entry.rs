use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{AmountType, BeneficiaryType};

/// The resolved Rand amount of one recurring deduction for one pay period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeductionLine {
    pub deduction_id: i64,
    pub beneficiary_kind: BeneficiaryType,
    pub beneficiary_name: String,
    pub amount_type: AmountType,
    pub amount: Decimal,
}

/// One employee's payroll result for one pay period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayrollEntry {
    pub employee_id: i64,
    pub pay_period_start: NaiveDate,
    pub pay_period_end: NaiveDate,
    pub month_year: String,

    // Recorded inputs
    pub ordinary_hours: Decimal,
    pub overtime_hours: Decimal,
    pub sunday_hours: Decimal,
    pub public_holiday_hours: Decimal,
    pub hourly_rate: Decimal,
    pub pieces_produced: Decimal,
    pub piece_rate: Decimal,
    pub allowances: Decimal,
    pub bonus_amount: Decimal,
    pub union_fee: Decimal,
    pub deductions_other: Decimal,

    // Earnings
    pub ordinary_pay: Decimal,
    pub overtime_pay: Decimal,
    pub sunday_pay: Decimal,
    pub holiday_pay: Decimal,

    // Statutory
    pub taxable_gross: Decimal,
    pub paye: Decimal,
    pub uif: Decimal,
    pub sdl: Decimal,
    pub medical_aid_tax_credit: Decimal,
    pub fringe_benefit_medical: Decimal,

    pub recurring_deductions: Vec<DeductionLine>,
    pub net_pay: Decimal,
}

impl PayrollEntry {
    pub fn gross_pay(&self) -> Decimal {
        self.ordinary_pay
            + self.overtime_pay
            + self.sunday_pay
            + self.holiday_pay
            + self.allowances
            + self.bonus_amount
    }

    pub fn recurring_total(&self) -> Decimal {
        self.recurring_deductions.iter().map(|line| line.amount).sum()
    }

    pub fn total_deductions(&self) -> Decimal {
        self.paye
            + self.uif
            + self.sdl
            + self.deductions_other
            + self.union_fee
            + self.recurring_total()
    }

    /// `net_pay == gross_pay - total_deductions`, exactly.
    pub fn is_balanced(&self) -> bool {
        self.net_pay == self.gross_pay() - self.total_deductions()
    }
}

/// A payroll entry as persisted, with its workflow flags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredPayrollEntry {
    pub id: i64,
    pub entry: PayrollEntry,
    pub is_verified: bool,
    pub verified_at: Option<DateTime<Utc>>,
    pub is_finalized: bool,
    pub finalized_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
