use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One tier of the monthly PAYE table.
///
/// `tax_year` is the calendar year in which the tax year ends, so the
/// 2024/2025 table is stored under `2025`. A tier covers incomes above
/// `min_income` up to and including `max_income`; the top tier has no
/// upper bound.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayeBracket {
    pub tax_year: i32,
    pub min_income: Decimal,
    pub max_income: Option<Decimal>,
    pub rate: Decimal,
    pub base_tax: Decimal,
}

impl PayeBracket {
    /// The 2024/2025 monthly PAYE table.
    pub fn sars_2025() -> Vec<PayeBracket> {
        let tier = |min: i64, max: Option<i64>, rate: i64, base: i64| PayeBracket {
            tax_year: 2025,
            min_income: Decimal::new(min, 0),
            max_income: max.map(|m| Decimal::new(m, 0)),
            rate: Decimal::new(rate, 2),
            base_tax: Decimal::new(base, 0),
        };

        vec![
            tier(0, Some(7_100), 0, 0),
            tier(7_100, Some(11_000), 18, 0),
            tier(11_000, Some(17_500), 26, 702),
            tier(17_500, Some(27_000), 31, 2_392),
            tier(27_000, Some(39_000), 36, 5_337),
            tier(39_000, Some(55_000), 39, 9_657),
            tier(55_000, None, 41, 15_897),
        ]
    }
}
