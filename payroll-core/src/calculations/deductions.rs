//! Recurring deduction amounts for one pay period.
//!
//! `Fixed` deductions take their stored value, `Percentage` deductions take
//! that share of gross pay, and `Calculated` deductions take the medical aid
//! amount assessed for the run. Inactive records are skipped.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::models::{AmountType, BeneficiaryType, DeductionLine, RecurringDeduction};

/// Resolved recurring deductions with per-category subtotals.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeductionSummary {
    pub lines: Vec<DeductionLine>,
    pub medical_aid: Decimal,
    pub union: Decimal,
    pub other: Decimal,
    pub total: Decimal,
}

/// Calculator for recurring deductions.
#[derive(Debug, Clone)]
pub struct DeductionResolver {
    gross_pay: Decimal,
    medical_aid_amount: Decimal,
}

impl DeductionResolver {
    /// `medical_aid_amount` is the assessed Calculated deduction for this run.
    pub fn new(
        gross_pay: Decimal,
        medical_aid_amount: Decimal,
    ) -> Self {
        Self {
            gross_pay,
            medical_aid_amount,
        }
    }

    /// Resolves every active deduction and totals them.
    ///
    /// ```
    /// use rust_decimal_macros::dec;
    /// use payroll_core::calculations::DeductionResolver;
    /// use payroll_core::{AmountType, BeneficiaryType, RecurringDeduction};
    ///
    /// let pension = RecurringDeduction {
    ///     id: 1,
    ///     employee_id: 1,
    ///     beneficiary_id: 4,
    ///     beneficiary_kind: BeneficiaryType::PensionFund,
    ///     beneficiary_name: "Old Mutual".to_string(),
    ///     amount_type: AmountType::Percentage,
    ///     value: Some(dec!(7.5)),
    ///     is_active: true,
    ///     effective_date: None,
    ///     end_date: None,
    ///     notes: None,
    /// };
    ///
    /// let summary = DeductionResolver::new(dec!(20000.00), dec!(0)).resolve(&[pension]);
    ///
    /// assert_eq!(summary.total, dec!(1500.00));
    /// assert_eq!(summary.other, dec!(1500.00));
    /// ```
    pub fn resolve(
        &self,
        deductions: &[RecurringDeduction],
    ) -> DeductionSummary {
        let mut summary = DeductionSummary::default();

        for deduction in deductions.iter().filter(|d| d.is_active) {
            let amount = self.amount(deduction);

            match deduction.beneficiary_kind {
                BeneficiaryType::MedicalAid => summary.medical_aid += amount,
                BeneficiaryType::Union => summary.union += amount,
                _ => summary.other += amount,
            }
            summary.total += amount;

            summary.lines.push(DeductionLine {
                deduction_id: deduction.id,
                beneficiary_kind: deduction.beneficiary_kind,
                beneficiary_name: deduction.beneficiary_name.clone(),
                amount_type: deduction.amount_type,
                amount,
            });
        }

        summary
    }

    /// The Rand amount of a single deduction.
    fn amount(
        &self,
        deduction: &RecurringDeduction,
    ) -> Decimal {
        let value = deduction.value.unwrap_or(Decimal::ZERO);
        match deduction.amount_type {
            AmountType::Fixed => value,
            AmountType::Percentage => self.gross_pay * value / Decimal::ONE_HUNDRED,
            AmountType::Calculated => self.calculated_amount(deduction),
        }
    }

    /// Calculated deductions only have meaning for medical aid.
    fn calculated_amount(
        &self,
        deduction: &RecurringDeduction,
    ) -> Decimal {
        if deduction.beneficiary_kind == BeneficiaryType::MedicalAid {
            self.medical_aid_amount
        } else {
            warn!(
                deduction_id = deduction.id,
                beneficiary = deduction.beneficiary_kind.as_str(),
                "calculated deduction on non-medical beneficiary; using zero"
            );
            Decimal::ZERO
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;

    fn deduction(
        id: i64,
        kind: BeneficiaryType,
        amount_type: AmountType,
        value: Option<Decimal>,
    ) -> RecurringDeduction {
        RecurringDeduction {
            id,
            employee_id: 1,
            beneficiary_id: id * 10,
            beneficiary_kind: kind,
            beneficiary_name: format!("{} {}", kind.as_str(), id),
            amount_type,
            value,
            is_active: true,
            effective_date: None,
            end_date: None,
            notes: None,
        }
    }

    #[test]
    fn no_deductions_resolve_to_zero() {
        let summary = DeductionResolver::new(dec!(10000.00), Decimal::ZERO).resolve(&[]);

        assert_eq!(summary, DeductionSummary::default());
    }

    #[test]
    fn fixed_deduction_uses_stored_value() {
        let deductions = [deduction(1, BeneficiaryType::GarnisheeOrder, AmountType::Fixed, Some(dec!(450.00)))];

        let summary = DeductionResolver::new(dec!(10000.00), Decimal::ZERO).resolve(&deductions);

        assert_eq!(summary.total, dec!(450.00));
        assert_eq!(summary.lines[0].amount, dec!(450.00));
    }

    #[test]
    fn fixed_deduction_without_value_is_zero() {
        let deductions = [deduction(1, BeneficiaryType::Other, AmountType::Fixed, None)];

        let summary = DeductionResolver::new(dec!(10000.00), Decimal::ZERO).resolve(&deductions);

        assert_eq!(summary.total, Decimal::ZERO);
        assert_eq!(summary.lines.len(), 1);
    }

    #[test]
    fn percentage_deduction_is_share_of_gross() {
        let deductions = [deduction(1, BeneficiaryType::PensionFund, AmountType::Percentage, Some(dec!(7.5)))];

        let summary = DeductionResolver::new(dec!(12345.67), Decimal::ZERO).resolve(&deductions);

        assert_eq!(summary.total, dec!(925.925250));
    }

    #[test]
    fn calculated_medical_aid_uses_assessed_amount() {
        let deductions = [deduction(1, BeneficiaryType::MedicalAid, AmountType::Calculated, None)];

        let summary = DeductionResolver::new(dec!(30000.00), dec!(1220)).resolve(&deductions);

        assert_eq!(summary.medical_aid, dec!(1220));
        assert_eq!(summary.total, dec!(1220));
    }

    #[test]
    fn calculated_on_non_medical_beneficiary_is_zero() {
        let deductions = [deduction(1, BeneficiaryType::Union, AmountType::Calculated, None)];

        let summary = DeductionResolver::new(dec!(30000.00), dec!(1220)).resolve(&deductions);

        assert_eq!(summary.total, Decimal::ZERO);
        assert_eq!(summary.union, Decimal::ZERO);
    }

    #[test]
    fn inactive_deductions_are_skipped() {
        let mut inactive = deduction(2, BeneficiaryType::Union, AmountType::Fixed, Some(dec!(120.00)));
        inactive.is_active = false;
        let deductions = [
            deduction(1, BeneficiaryType::Union, AmountType::Fixed, Some(dec!(80.00))),
            inactive,
        ];

        let summary = DeductionResolver::new(dec!(10000.00), Decimal::ZERO).resolve(&deductions);

        assert_eq!(summary.total, dec!(80.00));
        assert_eq!(summary.lines.len(), 1);
        assert_eq!(summary.lines[0].deduction_id, 1);
    }

    #[test]
    fn subtotals_group_by_beneficiary_type() {
        let deductions = [
            deduction(1, BeneficiaryType::MedicalAid, AmountType::Calculated, None),
            deduction(2, BeneficiaryType::Union, AmountType::Fixed, Some(dec!(95.00))),
            deduction(3, BeneficiaryType::PensionFund, AmountType::Percentage, Some(dec!(5))),
            deduction(4, BeneficiaryType::GarnisheeOrder, AmountType::Fixed, Some(dec!(300.00))),
        ];

        let summary = DeductionResolver::new(dec!(20000.00), dec!(728)).resolve(&deductions);

        assert_eq!(summary.medical_aid, dec!(728));
        assert_eq!(summary.union, dec!(95.00));
        assert_eq!(summary.other, dec!(1300.00));
        assert_eq!(summary.total, dec!(2123.00));
        assert_eq!(
            summary.lines.iter().map(|l| l.deduction_id).collect::<Vec<_>>(),
            vec![1, 2, 3, 4]
        );
    }
}
