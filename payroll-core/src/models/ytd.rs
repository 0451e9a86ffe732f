use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Tax-year-to-date totals across finalized payroll entries.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct YtdTotals {
    pub gross_pay: Decimal,
    pub paye: Decimal,
    pub uif: Decimal,
    pub sdl: Decimal,
    pub net_pay: Decimal,
    pub fringe_benefit: Decimal,
    pub taxable_income: Decimal,
    pub bonus: Decimal,
    pub allowances: Decimal,
}

impl YtdTotals {
    /// Flat name-to-amount view, keyed the way reports label the totals.
    pub fn as_map(&self) -> BTreeMap<&'static str, Decimal> {
        BTreeMap::from([
            ("gross_pay", self.gross_pay),
            ("paye", self.paye),
            ("uif", self.uif),
            ("sdl", self.sdl),
            ("net_pay", self.net_pay),
            ("fringe_benefit", self.fringe_benefit),
            ("taxable_income", self.taxable_income),
            ("bonus", self.bonus),
            ("allowances", self.allowances),
        ])
    }
}
