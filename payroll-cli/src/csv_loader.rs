//! CSV loader for pay-period input data.
//!
//! ## CSV Format
//!
//! Headers are matched by name, so column order does not matter. Header names
//! are case-sensitive.
//!
//! | Column                 | Required | Type    | Notes                                   |
//! |------------------------|----------|---------|-----------------------------------------|
//! | `employee_id`          | yes      | integer |                                         |
//! | `pay_period_start`     | yes      | date    | `YYYY-MM-DD`                            |
//! | `pay_period_end`       | yes      | date    | `YYYY-MM-DD`, not before the start      |
//! | `ordinary_hours`       | no       | decimal | empty = 0                               |
//! | `overtime_hours`       | no       | decimal | empty = 0                               |
//! | `sunday_hours`         | no       | decimal | empty = 0                               |
//! | `public_holiday_hours` | no       | decimal | empty = 0                               |
//! | `hourly_rate`          | no       | decimal | empty or 0 = derived from the profile   |
//! | `allowances`           | no       | decimal | empty = 0                               |
//! | `bonus_amount`         | no       | decimal | empty = 0                               |
//! | `pieces_produced`      | no       | decimal | empty = 0                               |
//! | `piece_rate`           | no       | decimal | empty = the employee's piece rate       |
//! | `union_fee`            | no       | decimal | empty = 0                               |
//! | `deductions_other`     | no       | decimal | empty = 0                               |
//!
//! ### Minimal example
//!
//! ```csv
//! employee_id,pay_period_start,pay_period_end
//! 7,2024-10-01,2024-10-31
//! ```
use std::path::Path;

use chrono::NaiveDate;
use payroll_core::PayPeriodInput;
use rust_decimal::Decimal;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct CsvRow {
    employee_id: i64,
    pay_period_start: NaiveDate,
    pay_period_end: NaiveDate,
    #[serde(default)]
    ordinary_hours: Option<Decimal>,
    #[serde(default)]
    overtime_hours: Option<Decimal>,
    #[serde(default)]
    sunday_hours: Option<Decimal>,
    #[serde(default)]
    public_holiday_hours: Option<Decimal>,
    #[serde(default)]
    hourly_rate: Option<Decimal>,
    #[serde(default)]
    allowances: Option<Decimal>,
    #[serde(default)]
    bonus_amount: Option<Decimal>,
    #[serde(default)]
    pieces_produced: Option<Decimal>,
    #[serde(default)]
    piece_rate: Option<Decimal>,
    #[serde(default)]
    union_fee: Option<Decimal>,
    #[serde(default)]
    deductions_other: Option<Decimal>,
}

/// Errors that can occur while loading pay-period CSV data.
///
/// Row numbers are 1-based and do not count the header.
#[derive(Debug, thiserror::Error)]
pub enum PayPeriodCsvError {
    #[error("cannot read '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Bad structure, missing required column or a cell of the wrong type.
    #[error("CSV parse error: {0}")]
    Parse(#[from] csv::Error),

    #[error("pay period on row {row} ends {end}, before it starts {start}")]
    InvalidPeriod {
        row: usize,
        start: NaiveDate,
        end: NaiveDate,
    },

    #[error("negative {column} {value} on row {row}")]
    NegativeAmount {
        row: usize,
        column: &'static str,
        value: Decimal,
    },
}

fn amount(
    value: Option<Decimal>,
    column: &'static str,
    row: usize,
) -> Result<Decimal, PayPeriodCsvError> {
    let value = value.unwrap_or(Decimal::ZERO);
    if value < Decimal::ZERO {
        return Err(PayPeriodCsvError::NegativeAmount { row, column, value });
    }
    Ok(value)
}

fn convert_row(
    row: CsvRow,
    row_number: usize,
) -> Result<PayPeriodInput, PayPeriodCsvError> {
    if row.pay_period_end < row.pay_period_start {
        return Err(PayPeriodCsvError::InvalidPeriod {
            row: row_number,
            start: row.pay_period_start,
            end: row.pay_period_end,
        });
    }
    if let Some(rate) = row.piece_rate.filter(|r| *r < Decimal::ZERO) {
        return Err(PayPeriodCsvError::NegativeAmount {
            row: row_number,
            column: "piece_rate",
            value: rate,
        });
    }

    Ok(PayPeriodInput {
        employee_id: row.employee_id,
        pay_period_start: row.pay_period_start,
        pay_period_end: row.pay_period_end,
        ordinary_hours: amount(row.ordinary_hours, "ordinary_hours", row_number)?,
        overtime_hours: amount(row.overtime_hours, "overtime_hours", row_number)?,
        sunday_hours: amount(row.sunday_hours, "sunday_hours", row_number)?,
        public_holiday_hours: amount(row.public_holiday_hours, "public_holiday_hours", row_number)?,
        hourly_rate: amount(row.hourly_rate, "hourly_rate", row_number)?,
        allowances: amount(row.allowances, "allowances", row_number)?,
        bonus_amount: amount(row.bonus_amount, "bonus_amount", row_number)?,
        pieces_produced: amount(row.pieces_produced, "pieces_produced", row_number)?,
        piece_rate: row.piece_rate,
        union_fee: amount(row.union_fee, "union_fee", row_number)?,
        deductions_other: amount(row.deductions_other, "deductions_other", row_number)?,
    })
}

/// Parse CSV text into pay periods, in file order.
pub fn load_from_str(input: &str) -> Result<Vec<PayPeriodInput>, PayPeriodCsvError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .flexible(false)
        .from_reader(input.as_bytes());

    reader
        .deserialize::<CsvRow>()
        .enumerate()
        .map(|(idx, result)| {
            let row = result?;
            convert_row(row, idx + 1)
        })
        .collect()
}

/// Read a file from disk and delegate to [`load_from_str`].
pub fn load_from_file(path: &Path) -> Result<Vec<PayPeriodInput>, PayPeriodCsvError> {
    let contents = std::fs::read_to_string(path).map_err(|source| PayPeriodCsvError::Io {
        path: path.display().to_string(),
        source,
    })?;
    load_from_str(&contents)
}
