//! Integration tests for PAYE table loading against the SQLite backend.

use std::path::Path;

use payroll_core::{PayeBracket, PayrollRepository};
use payroll_data::{PayeTableLoader, PayeTableLoaderError};
use payroll_db_sqlite::SqliteRepository;
use pretty_assertions::assert_eq;
use rust_decimal_macros::dec;
use sqlx::sqlite::SqlitePoolOptions;

const TEST_CSV_2025: &str = include_str!("../test-data/paye_brackets_2025.csv");
const TEST_CSV_2026: &str = include_str!("../test-data/paye_brackets_2026.csv");

/// Migrations only; no seeded PAYE table.
async fn setup_test_db() -> SqliteRepository {
    let pool = SqlitePoolOptions::new()
        .connect("sqlite::memory:")
        .await
        .expect("Failed to create in-memory database");

    let repo = SqliteRepository::new_with_pool(pool).await;
    repo.run_migrations()
        .await
        .expect("Failed to run migrations");

    repo
}

async fn setup_seeded_test_db() -> SqliteRepository {
    let repo = setup_test_db().await;
    repo.run_seeds(Path::new("../payroll-db-sqlite/seeds"))
        .await
        .expect("Failed to run seeds");
    repo
}

#[tokio::test]
async fn test_load_2025_table_into_empty_database() {
    let repo = setup_test_db().await;

    let records = PayeTableLoader::parse(TEST_CSV_2025.as_bytes()).expect("Failed to parse CSV");
    let inserted = PayeTableLoader::load(&repo, &records)
        .await
        .expect("Failed to load brackets");

    assert_eq!(inserted, 7);
    assert_eq!(
        repo.get_paye_brackets(2025).await,
        Ok(PayeBracket::sars_2025())
    );
}

#[tokio::test]
async fn test_reloading_replaces_seeded_table() {
    let repo = setup_seeded_test_db().await;

    let records = PayeTableLoader::parse(TEST_CSV_2025.as_bytes()).expect("Failed to parse CSV");
    PayeTableLoader::load(&repo, &records)
        .await
        .expect("Failed to load brackets");
    PayeTableLoader::load(&repo, &records)
        .await
        .expect("Failed to reload brackets");

    let brackets = repo
        .get_paye_brackets(2025)
        .await
        .expect("Failed to get brackets");
    assert_eq!(brackets.len(), 7);
    assert_eq!(brackets[2].min_income, dec!(11000));
    assert_eq!(brackets[2].base_tax, dec!(702));
    assert_eq!(brackets[6].max_income, None);
}

#[tokio::test]
async fn test_loading_new_year_keeps_existing_years() {
    let repo = setup_seeded_test_db().await;

    let records = PayeTableLoader::parse(TEST_CSV_2026.as_bytes()).expect("Failed to parse CSV");
    let inserted = PayeTableLoader::load(&repo, &records)
        .await
        .expect("Failed to load brackets");

    assert_eq!(inserted, 7);
    assert_eq!(repo.list_paye_tax_years().await, Ok(vec![2026, 2025]));
    assert_eq!(
        repo.get_paye_brackets(2025).await,
        Ok(PayeBracket::sars_2025())
    );
}

#[tokio::test]
async fn test_invalid_table_writes_nothing() {
    let repo = setup_seeded_test_db().await;
    let csv = "tax_year,min_income,max_income,base_tax,rate
2025,0,7100,0,0
2025,7200,,0,0.18
";

    let records = PayeTableLoader::parse(csv.as_bytes()).expect("Failed to parse CSV");
    let result = PayeTableLoader::load(&repo, &records).await;

    assert!(matches!(
        result,
        Err(PayeTableLoaderError::InvalidTable { tax_year: 2025, .. })
    ));
    assert_eq!(
        repo.get_paye_brackets(2025).await,
        Ok(PayeBracket::sars_2025())
    );
}
