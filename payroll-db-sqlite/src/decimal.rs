//! Amounts are stored as normalized TEXT so no cents are lost to floating
//! point. Rows written by hand (seed files, older tools) may still hold
//! INTEGER or REAL values, and those are read too.

use std::str::FromStr;

use payroll_core::RepositoryError;
use rust_decimal::Decimal;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, TypeInfo, ValueRef};

fn column_error(
    column: &str,
    detail: impl std::fmt::Display,
) -> RepositoryError {
    RepositoryError::Database(format!("Column '{column}' not found: {detail}"))
}

fn read_error(
    column: &str,
    storage: &str,
    detail: impl std::fmt::Display,
) -> RepositoryError {
    RepositoryError::Database(format!("Failed to read {storage} amount from '{column}': {detail}"))
}

/// Parses a decimal stored as text.
pub fn parse_decimal(s: &str) -> Result<Decimal, RepositoryError> {
    Decimal::from_str(s.trim())
        .map_err(|e| RepositoryError::Database(format!("Failed to parse decimal '{s}': {e}")))
}

/// Reads `column` as an amount, `None` for NULL.
fn read_amount(
    row: &SqliteRow,
    column: &str,
) -> Result<Option<Decimal>, RepositoryError> {
    let raw = row.try_get_raw(column).map_err(|e| column_error(column, e))?;
    if raw.is_null() {
        return Ok(None);
    }

    let storage = raw.type_info().name().to_string();
    let amount = match storage.as_str() {
        "TEXT" => {
            let text: String = row.try_get(column).map_err(|e| read_error(column, &storage, e))?;
            parse_decimal(&text)?
        }
        "INTEGER" => {
            let whole: i64 = row.try_get(column).map_err(|e| read_error(column, &storage, e))?;
            Decimal::from(whole)
        }
        "REAL" => {
            let float: f64 = row.try_get(column).map_err(|e| read_error(column, &storage, e))?;
            Decimal::try_from(float).map_err(|e| read_error(column, &storage, e))?
        }
        other => {
            return Err(RepositoryError::Database(format!(
                "Unexpected type '{other}' for column '{column}'"
            )));
        }
    };
    Ok(Some(amount))
}

/// A required amount column. NULL reads as zero.
pub fn get_decimal(
    row: &SqliteRow,
    column: &str,
) -> Result<Decimal, RepositoryError> {
    Ok(read_amount(row, column)?.unwrap_or(Decimal::ZERO))
}

/// A nullable amount column, such as the open upper bound of a PAYE tier or
/// an unset company override.
pub fn get_optional_decimal(
    row: &SqliteRow,
    column: &str,
) -> Result<Option<Decimal>, RepositoryError> {
    read_amount(row, column)
}

/// Text form used for every stored amount.
pub fn decimal_to_text(d: Decimal) -> String {
    d.normalize().to_string()
}
