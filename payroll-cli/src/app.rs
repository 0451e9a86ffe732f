use std::fmt::Write as _;

use payroll_core::db::RepositoryRegistry;
use payroll_core::services::{PayrollService, PayrollServiceError};
use payroll_core::{PayPeriodInput, PayrollEntry, PayrollRepository, StoredPayrollEntry, YtdTotals};
use payroll_db_sqlite::SqliteRepositoryFactory;
use tracing::{info, warn};

/// Registry with every backend this binary ships.
pub fn build_registry() -> RepositoryRegistry {
    let mut registry = RepositoryRegistry::new();
    registry.register(Box::new(SqliteRepositoryFactory));
    registry
}

/// One calculated pay period. `entry_id` is `None` on a dry run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessedPeriod {
    pub entry_id: Option<i64>,
    pub entry: PayrollEntry,
}

/// A CSV row that could not be processed. `row` is 1-based.
#[derive(Debug, PartialEq, Eq)]
pub struct FailedPeriod {
    pub row: usize,
    pub employee_id: i64,
    pub error: PayrollServiceError,
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub processed: Vec<ProcessedPeriod>,
    pub failed: Vec<FailedPeriod>,
}

/// Calculates every period in order. With `save` each result is stored as a
/// verified entry; otherwise nothing is written.
///
/// A failing period is recorded and the batch continues.
pub async fn run_batch(
    repo: &dyn PayrollRepository,
    periods: &[PayPeriodInput],
    save: bool,
) -> BatchReport {
    let service = PayrollService::new(repo);
    let mut report = BatchReport::default();

    for (idx, period) in periods.iter().enumerate() {
        let result = if save {
            service.run_payroll(period).await.map(|stored| ProcessedPeriod {
                entry_id: Some(stored.id),
                entry: stored.entry,
            })
        } else {
            service.calculate(period).await.map(|entry| ProcessedPeriod {
                entry_id: None,
                entry,
            })
        };

        match result {
            Ok(processed) => report.processed.push(processed),
            Err(error) => {
                warn!(
                    row = idx + 1,
                    employee_id = period.employee_id,
                    %error,
                    "pay period skipped"
                );
                report.failed.push(FailedPeriod {
                    row: idx + 1,
                    employee_id: period.employee_id,
                    error,
                });
            }
        }
    }

    info!(
        processed = report.processed.len(),
        failed = report.failed.len(),
        "payroll batch complete"
    );
    report
}

/// Fixed-width payslip summary table, one line per period.
pub fn format_batch(
    report: &BatchReport,
    currency: &str,
) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:>6} {:>8} {:<7} {:>12} {:>10} {:>9} {:>9} {:>12} {:>12}",
        "entry", "employee", "period", "gross", "paye", "uif", "sdl", "deductions", "net"
    );
    for p in &report.processed {
        let e = &p.entry;
        let id = p.entry_id.map_or_else(|| "-".to_string(), |id| id.to_string());
        let _ = writeln!(
            out,
            "{:>6} {:>8} {:<7} {:>12} {:>10} {:>9} {:>9} {:>12} {:>12}",
            id,
            e.employee_id,
            e.month_year,
            format!("{currency}{:.2}", e.gross_pay()),
            format!("{:.2}", e.paye),
            format!("{:.2}", e.uif),
            format!("{:.2}", e.sdl),
            format!("{:.2}", e.total_deductions()),
            format!("{currency}{:.2}", e.net_pay),
        );
    }
    for f in &report.failed {
        let _ = writeln!(out, "row {} (employee {}): {}", f.row, f.employee_id, f.error);
    }
    out
}

/// Multi-line description of one stored entry.
pub fn format_entry(
    stored: &StoredPayrollEntry,
    currency: &str,
) -> String {
    let e = &stored.entry;
    let mut out = String::new();
    let status = if stored.is_finalized {
        "finalized"
    } else if stored.is_verified {
        "verified"
    } else {
        "draft"
    };
    let _ = writeln!(
        out,
        "entry {} employee {} period {} ({status})",
        stored.id, e.employee_id, e.month_year
    );
    let _ = writeln!(out, "  gross pay        {currency}{:.2}", e.gross_pay());
    let _ = writeln!(out, "  taxable gross    {currency}{:.2}", e.taxable_gross);
    let _ = writeln!(out, "  PAYE             {currency}{:.2}", e.paye);
    let _ = writeln!(out, "  UIF              {currency}{:.2}", e.uif);
    let _ = writeln!(out, "  SDL (employer)   {currency}{:.2}", e.sdl);
    for line in &e.recurring_deductions {
        let _ = writeln!(
            out,
            "  {:<16} {currency}{:.2}",
            line.beneficiary_name, line.amount
        );
    }
    let _ = writeln!(out, "  net pay          {currency}{:.2}", e.net_pay);
    out
}

/// The nine year-to-date totals, one per line.
pub fn format_ytd(
    employee_id: i64,
    totals: &YtdTotals,
    currency: &str,
) -> String {
    let mut out = format!("year-to-date totals for employee {employee_id}\n");
    for (name, amount) in totals.as_map() {
        let _ = writeln!(out, "  {name:<16} {currency}{amount:.2}");
    }
    out
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use payroll_core::db::DbConfig;
    use payroll_core::{
        CompanyPayrollDefaults, NewCompany, NewEmployee, RepositoryError, SalaryType,
    };
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;

    fn date(
        y: i32,
        m: u32,
        d: u32,
    ) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    async fn seeded_repo() -> (Box<dyn PayrollRepository>, i64) {
        let repo = build_registry()
            .create(&DbConfig::default())
            .await
            .expect("in-memory sqlite should open");
        let company = repo
            .create_company(NewCompany {
                name: "Umhlanga Logistics".to_string(),
                defaults: CompanyPayrollDefaults::default(),
            })
            .await
            .unwrap();
        let employee = repo
            .create_employee(NewEmployee {
                company_id: company.id,
                employee_number: "UL-100".to_string(),
                full_name: "Thandiwe Dlamini".to_string(),
                start_date: date(2021, 2, 1),
                salary_type: SalaryType::Monthly,
                salary: dec!(10000),
                piece_rate: None,
                ordinary_hours_per_day: None,
                work_days_per_month: None,
                overtime_multiplier: None,
                sunday_multiplier: None,
                holiday_multiplier: None,
                paye_exempt: None,
                medical_aid_dependants: 0,
            })
            .await
            .unwrap();
        (repo, employee.id)
    }

    #[test]
    fn registry_ships_sqlite() {
        assert_eq!(build_registry().available_backends(), vec!["sqlite"]);
    }

    #[tokio::test]
    async fn batch_saves_entries_and_records_failures() {
        let (repo, employee_id) = seeded_repo().await;
        let periods = vec![
            PayPeriodInput::new(employee_id, date(2024, 10, 1), date(2024, 10, 31)),
            PayPeriodInput::new(999, date(2024, 10, 1), date(2024, 10, 31)),
        ];

        let report = run_batch(&*repo, &periods, true).await;

        assert_eq!(report.processed.len(), 1);
        let processed = &report.processed[0];
        assert!(processed.entry_id.is_some());
        assert_eq!(processed.entry.paye, dec!(522.00));
        assert_eq!(processed.entry.net_pay, dec!(9278.00));
        assert_eq!(
            report.failed,
            vec![FailedPeriod {
                row: 2,
                employee_id: 999,
                error: PayrollServiceError::Repository(RepositoryError::NotFound),
            }]
        );
    }

    #[tokio::test]
    async fn dry_run_writes_nothing() {
        let (repo, employee_id) = seeded_repo().await;
        let periods = vec![PayPeriodInput::new(
            employee_id,
            date(2024, 10, 1),
            date(2024, 10, 31),
        )];

        let report = run_batch(&*repo, &periods, false).await;

        assert_eq!(report.processed[0].entry_id, None);
        assert_eq!(report.processed[0].entry.net_pay, dec!(9278.00));
        assert_eq!(repo.list_payroll_entries(employee_id).await, Ok(vec![]));
    }

    #[tokio::test]
    async fn format_batch_lists_entries_and_failures() {
        let (repo, employee_id) = seeded_repo().await;
        let periods = vec![
            PayPeriodInput::new(employee_id, date(2024, 10, 1), date(2024, 10, 31)),
            PayPeriodInput::new(999, date(2024, 10, 1), date(2024, 10, 31)),
        ];
        let report = run_batch(&*repo, &periods, false).await;

        let text = format_batch(&report, "R");

        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[1].contains("2024-10"));
        assert!(lines[1].contains("R10000.00"));
        assert!(lines[1].ends_with("R9278.00"));
        assert_eq!(lines[2], "row 2 (employee 999): Record not found");
    }

    #[test]
    fn format_ytd_prints_every_total() {
        let totals = YtdTotals {
            gross_pay: dec!(30000),
            paye: dec!(1566),
            net_pay: dec!(27834),
            ..YtdTotals::default()
        };

        let text = format_ytd(4, &totals, "R");

        assert_eq!(text.lines().count(), 10);
        assert!(text.contains("  gross_pay        R30000.00"));
        assert!(text.contains("  paye             R1566.00"));
        assert!(text.contains("  bonus            R0.00"));
    }
}
