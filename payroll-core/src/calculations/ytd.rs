//! Year-to-date aggregation over finalized payroll entries.

use chrono::NaiveDate;

use crate::calculations::common::round_half_up;
use crate::models::{StoredPayrollEntry, YtdTotals};

/// Sums an employee's finalized entries for the current tax year.
///
/// Only entries whose period starts within
/// `[max(employee_start, tax_year_start), today]` are counted. Unfinalized
/// entries never contribute. Taxable income is gross pay plus the medical
/// fringe benefit. Every total is rounded to cents.
pub fn compute_ytd(
    entries: &[StoredPayrollEntry],
    employee_start: NaiveDate,
    tax_year_start: NaiveDate,
    today: NaiveDate,
) -> YtdTotals {
    let window_start = employee_start.max(tax_year_start);

    let mut totals = entries
        .iter()
        .filter(|stored| stored.is_finalized)
        .map(|stored| &stored.entry)
        .filter(|entry| {
            entry.pay_period_start >= window_start && entry.pay_period_start <= today
        })
        .fold(YtdTotals::default(), |mut totals, entry| {
            let gross = entry.gross_pay();
            totals.gross_pay += gross;
            totals.paye += entry.paye;
            totals.uif += entry.uif;
            totals.sdl += entry.sdl;
            totals.net_pay += entry.net_pay;
            totals.fringe_benefit += entry.fringe_benefit_medical;
            totals.taxable_income += gross + entry.fringe_benefit_medical;
            totals.bonus += entry.bonus_amount;
            totals.allowances += entry.allowances;
            totals
        });

    for value in [
        &mut totals.gross_pay,
        &mut totals.paye,
        &mut totals.uif,
        &mut totals.sdl,
        &mut totals.net_pay,
        &mut totals.fringe_benefit,
        &mut totals.taxable_income,
        &mut totals.bonus,
        &mut totals.allowances,
    ] {
        *value = round_half_up(*value);
    }

    totals
}
