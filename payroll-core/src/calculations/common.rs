//! Helpers shared by the payroll calculators.

use rust_decimal::Decimal;
use tracing::warn;

/// Rounds to cents, half away from zero.
///
/// Only the assembler and YTD aggregation round; the calculators keep full
/// precision.
///
/// # Examples
///
/// ```
/// use rust_decimal_macros::dec;
/// use payroll_core::calculations::common::round_half_up;
///
/// assert_eq!(round_half_up(dec!(522.004)), dec!(522.00));
/// assert_eq!(round_half_up(dec!(0.0018)), dec!(0.00));
/// assert_eq!(round_half_up(dec!(702.005)), dec!(702.01));
/// assert_eq!(round_half_up(dec!(-10.125)), dec!(-10.13));
/// ```
pub fn round_half_up(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, rust_decimal::RoundingStrategy::MidpointAwayFromZero)
}

/// Returns `divisor`, or one when it is zero.
pub fn nonzero_divisor(
    divisor: Decimal,
    field: &'static str,
) -> Decimal {
    if divisor.is_zero() {
        warn!(field, "zero divisor; falling back to 1");
        Decimal::ONE
    } else {
        divisor
    }
}
