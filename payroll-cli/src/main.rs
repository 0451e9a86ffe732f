use std::path::PathBuf;

use anyhow::Context;
use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use tracing::debug;

use payroll_cli::{app, csv_loader, logging};
use payroll_core::db::DbConfig;
use payroll_core::services::PayrollService;

// ─── CLI definition ──────────────────────────────────────────────────────────

/// South African payroll: gross pay, PAYE, UIF, SDL, medical aid credits and
/// recurring deductions for monthly, hourly, daily and piece-rate employees.
#[derive(Debug, Parser)]
#[command(name = "payroll", version, about)]
struct Cli {
    /// Database backend to use.
    #[arg(long, global = true, default_value = "sqlite")]
    backend: String,

    /// Database connection string.
    /// For SQLite this is a file path (e.g. `payroll.db`) or `:memory:`.
    #[arg(long, global = true, default_value = "payroll.db")]
    db: String,

    /// Log level or filter directive; overrides RUST_LOG.
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Also append log output to this file.
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Calculate and save a payroll entry for every row of a pay-period CSV.
    Run {
        /// Pay-period CSV file.
        #[arg(long)]
        inputs: PathBuf,

        /// Calculate and print without saving.
        #[arg(long, default_value_t = false)]
        dry_run: bool,
    },

    /// Finalize a saved payroll entry so it counts towards year-to-date totals.
    Finalize {
        /// Payroll entry id.
        #[arg(long)]
        entry: i64,
    },

    /// Print tax-year-to-date totals for one employee.
    Ytd {
        /// Employee id.
        #[arg(long)]
        employee: i64,

        /// Start of the tax year (YYYY-MM-DD). Defaults to the configured
        /// start of the tax year containing --as-of.
        #[arg(long)]
        tax_year_start: Option<NaiveDate>,

        /// Report date (YYYY-MM-DD). Defaults to today.
        #[arg(long)]
        as_of: Option<NaiveDate>,
    },
}

// ─── entry point ─────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    logging::init_logging(cli.log_level.as_deref())?;
    if let Some(path) = &cli.log_file {
        logging::enable_file_logging(path)?;
    }

    let db_config = DbConfig::new(cli.backend, cli.db);

    debug!("connecting to {} backend", db_config.backend);
    let registry = app::build_registry();
    let repo = registry.create(&db_config).await?;
    let currency = repo.ensure_global_sars_config().await?.currency_symbol;

    match cli.command {
        Command::Run { inputs, dry_run } => {
            let periods = csv_loader::load_from_file(&inputs)?;
            debug!(rows = periods.len(), "pay periods loaded");

            let report = app::run_batch(&*repo, &periods, !dry_run).await;
            print!("{}", app::format_batch(&report, &currency));

            if !report.failed.is_empty() {
                anyhow::bail!(
                    "{} of {} pay periods failed",
                    report.failed.len(),
                    periods.len()
                );
            }
        }
        Command::Finalize { entry } => {
            let stored = PayrollService::new(&*repo)
                .finalize_entry(entry)
                .await
                .with_context(|| format!("cannot finalize payroll entry {entry}"))?;
            print!("{}", app::format_entry(&stored, &currency));
        }
        Command::Ytd {
            employee,
            tax_year_start,
            as_of,
        } => {
            let today = as_of.unwrap_or_else(|| Local::now().date_naive());
            let totals = PayrollService::new(&*repo)
                .year_to_date(employee, tax_year_start, today)
                .await?;
            print!("{}", app::format_ytd(employee, &totals, &currency));
        }
    }

    Ok(())
}
