use std::collections::BTreeMap;
use std::io::Read;

use payroll_core::{PayeBracket, PayrollRepository, RepositoryError};
use rust_decimal::Decimal;
use serde::Deserialize;
use thiserror::Error;
use tracing::info;

/// Errors that can occur when loading PAYE tables.
#[derive(Debug, Error)]
pub enum PayeTableLoaderError {
    #[error("CSV parse error: {0}")]
    CsvParse(String),

    #[error("Invalid PAYE table for tax year {tax_year}: {reason}")]
    InvalidTable { tax_year: i32, reason: String },

    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),
}

impl From<csv::Error> for PayeTableLoaderError {
    fn from(err: csv::Error) -> Self {
        PayeTableLoaderError::CsvParse(err.to_string())
    }
}

/// A single row from a monthly PAYE table CSV file.
///
/// - `tax_year`: year in which the tax year ends (2025 for 2024/2025)
/// - `min_income`: lower bound of the monthly taxable income tier
/// - `max_income`: upper bound (empty for the top tier)
/// - `base_tax`: tax on income up to `min_income`
/// - `rate`: marginal rate as a fraction (e.g. 0.18)
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct PayeBracketRecord {
    pub tax_year: i32,
    pub min_income: Decimal,
    #[serde(deserialize_with = "deserialize_optional_decimal")]
    pub max_income: Option<Decimal>,
    pub base_tax: Decimal,
    pub rate: Decimal,
}

impl From<&PayeBracketRecord> for PayeBracket {
    fn from(record: &PayeBracketRecord) -> Self {
        PayeBracket {
            tax_year: record.tax_year,
            min_income: record.min_income,
            max_income: record.max_income,
            rate: record.rate,
            base_tax: record.base_tax,
        }
    }
}

fn deserialize_optional_decimal<'de, D>(deserializer: D) -> Result<Option<Decimal>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s: Option<String> = Option::deserialize(deserializer)?;
    match s {
        Some(s) if s.trim().is_empty() => Ok(None),
        Some(s) => s
            .trim()
            .parse::<Decimal>()
            .map(Some)
            .map_err(serde::de::Error::custom),
        None => Ok(None),
    }
}

/// Groups records by tax year, each group sorted by `min_income`.
fn group_by_year(records: &[PayeBracketRecord]) -> BTreeMap<i32, Vec<&PayeBracketRecord>> {
    let mut groups: BTreeMap<i32, Vec<&PayeBracketRecord>> = BTreeMap::new();
    for record in records {
        groups.entry(record.tax_year).or_default().push(record);
    }
    for tiers in groups.values_mut() {
        tiers.sort_by(|a, b| a.min_income.cmp(&b.min_income));
    }
    groups
}

fn invalid(
    tax_year: i32,
    reason: String,
) -> PayeTableLoaderError {
    PayeTableLoaderError::InvalidTable { tax_year, reason }
}

/// Checks one year's tiers, already sorted by `min_income`.
fn validate_year(
    tax_year: i32,
    tiers: &[&PayeBracketRecord],
) -> Result<(), PayeTableLoaderError> {
    let Some(first) = tiers.first() else {
        return Ok(());
    };
    if first.min_income != Decimal::ZERO {
        return Err(invalid(
            tax_year,
            format!("lowest tier starts at {} instead of 0", first.min_income),
        ));
    }

    for (i, tier) in tiers.iter().enumerate() {
        if tier.rate < Decimal::ZERO || tier.rate > Decimal::ONE {
            return Err(invalid(
                tax_year,
                format!("rate {} is outside 0..=1", tier.rate),
            ));
        }
        if tier.base_tax < Decimal::ZERO {
            return Err(invalid(
                tax_year,
                format!("base tax {} is negative", tier.base_tax),
            ));
        }

        let is_last = i + 1 == tiers.len();
        match (tier.max_income, is_last) {
            (None, true) => {}
            (None, false) => {
                return Err(invalid(
                    tax_year,
                    format!("only the top tier may be unbounded, not the tier from {}", tier.min_income),
                ));
            }
            (Some(_), true) => {
                return Err(invalid(tax_year, "top tier must have no upper bound".to_string()));
            }
            (Some(max), false) => {
                if max <= tier.min_income {
                    return Err(invalid(
                        tax_year,
                        format!("tier from {} ends at {}", tier.min_income, max),
                    ));
                }
                let next = tiers[i + 1];
                if next.min_income != max {
                    return Err(invalid(
                        tax_year,
                        format!("gap or overlap between {} and {}", max, next.min_income),
                    ));
                }
            }
        }
    }

    Ok(())
}

/// Loader for monthly PAYE tables from CSV files.
///
/// Works against any [`PayrollRepository`] backend.
pub struct PayeTableLoader;

impl PayeTableLoader {
    /// Parse PAYE bracket records from a CSV reader.
    pub fn parse<R: Read>(reader: R) -> Result<Vec<PayeBracketRecord>, PayeTableLoaderError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);
        let mut records = Vec::new();

        for result in csv_reader.deserialize() {
            let record: PayeBracketRecord = result?;
            records.push(record);
        }

        Ok(records)
    }

    /// Checks that every tax year forms a contiguous table starting at zero
    /// with a single unbounded top tier.
    pub fn validate(records: &[PayeBracketRecord]) -> Result<(), PayeTableLoaderError> {
        for (tax_year, tiers) in group_by_year(records) {
            validate_year(tax_year, &tiers)?;
        }
        Ok(())
    }

    /// Load records into the database, replacing any existing table for each
    /// tax year present in `records`. Returns the number of tiers inserted.
    ///
    /// Nothing is written when any year fails validation.
    pub async fn load<R: PayrollRepository + ?Sized>(
        repo: &R,
        records: &[PayeBracketRecord],
    ) -> Result<usize, PayeTableLoaderError> {
        let groups = group_by_year(records);
        for (tax_year, tiers) in &groups {
            validate_year(*tax_year, tiers)?;
        }

        let mut inserted = 0;
        for (tax_year, tiers) in groups {
            repo.delete_paye_brackets(tax_year).await?;

            for record in &tiers {
                repo.insert_paye_bracket(&PayeBracket::from(*record)).await?;
                inserted += 1;
            }

            info!(tax_year, tiers = tiers.len(), "loaded PAYE table");
        }

        Ok(inserted)
    }
}
