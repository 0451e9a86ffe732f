use std::collections::BTreeMap;
use std::fs::File;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use payroll_data::{PayeBracketRecord, PayeTableLoader};
use payroll_db_sqlite::SqliteRepository;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Loads monthly PAYE tables from CSV into the payroll database.
///
/// Columns: `tax_year` (the year the tax year ends in), `min_income`,
/// `max_income` (empty on the top tier), `base_tax`, `rate` (a fraction, so
/// 18% is `0.18`). Every year in the file replaces the stored table for that
/// year; other years are left alone.
#[derive(Parser, Debug)]
#[command(name = "paye-table-loader", version, about, long_about = None)]
struct Args {
    /// PAYE bracket CSV file
    #[arg(short, long)]
    file: PathBuf,

    /// SQLite database URL
    #[arg(short, long, default_value = "sqlite:payroll.db?mode=rwc")]
    database: String,

    /// Apply schema migrations first
    #[arg(short, long, default_value_t = false)]
    migrate: bool,

    /// Seed directory to run after migrating
    #[arg(short, long)]
    seeds: Option<PathBuf>,

    /// Validate the file and exit without touching the database
    #[arg(long, default_value_t = false)]
    check: bool,
}

/// Tier count per tax year, oldest first.
fn tiers_per_year(records: &[PayeBracketRecord]) -> BTreeMap<i32, usize> {
    let mut years = BTreeMap::new();
    for record in records {
        *years.entry(record.tax_year).or_insert(0) += 1;
    }
    years
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let path = args.file.display();

    let file = File::open(&args.file).with_context(|| format!("Failed to open: {path}"))?;
    let records =
        PayeTableLoader::parse(file).with_context(|| format!("Failed to parse CSV: {path}"))?;
    PayeTableLoader::validate(&records).with_context(|| format!("Rejected PAYE table: {path}"))?;

    for (year, tiers) in tiers_per_year(&records) {
        println!("{year}: {tiers} tiers");
    }
    if args.check {
        return Ok(());
    }

    let repo = SqliteRepository::new(&args.database)
        .await
        .with_context(|| format!("Failed to connect to database: {}", args.database))?;

    if args.migrate {
        repo.run_migrations().await.context("Failed to run migrations")?;
        info!("migrations applied");
    }
    if let Some(seeds_dir) = &args.seeds {
        repo.run_seeds(seeds_dir)
            .await
            .with_context(|| format!("Failed to run seeds from: {}", seeds_dir.display()))?;
        info!(dir = %seeds_dir.display(), "seeds applied");
    }

    let inserted = PayeTableLoader::load(&repo, &records)
        .await
        .context("Failed to load PAYE brackets into database")?;
    println!("loaded {inserted} PAYE brackets into {}", args.database);

    Ok(())
}
