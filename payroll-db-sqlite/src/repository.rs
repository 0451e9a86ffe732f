use std::path::Path;
use std::str::FromStr;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use payroll_core::{
    AmountType, Beneficiary, BeneficiaryType, Company, CompanyPayrollDefaults,
    CompanySarsOverride, DeductionLine, EmployeePayrollProfile, GlobalSarsConfig, MedicalAidInfo,
    NewBeneficiary, NewCompany, NewEmployee, NewRecurringDeduction, PayeBracket, PayrollEntry,
    PayrollRepository, RecurringDeduction, RepositoryError, SalaryType, StoredPayrollEntry,
};
use rust_decimal::Decimal;
use sqlx::sqlite::{
    SqliteArguments, SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow,
};
use sqlx::{Row, Sqlite};
use tracing::debug;

use crate::decimal::{decimal_to_text, get_decimal, get_optional_decimal};

type SqliteQuery<'q> = sqlx::query::Query<'q, Sqlite, SqliteArguments<'q>>;

/// Calculated columns of `payroll_entries`, in bind order.
const ENTRY_VALUE_COLUMNS: [&str; 23] = [
    "month_year",
    "ordinary_hours",
    "overtime_hours",
    "sunday_hours",
    "public_holiday_hours",
    "hourly_rate",
    "pieces_produced",
    "piece_rate",
    "allowances",
    "bonus_amount",
    "union_fee",
    "deductions_other",
    "ordinary_pay",
    "overtime_pay",
    "sunday_pay",
    "holiday_pay",
    "taxable_gross",
    "paye",
    "uif",
    "sdl",
    "medical_aid_tax_credit",
    "fringe_benefit_medical",
    "net_pay",
];

const RECURRING_DEDUCTION_SELECT: &str = "SELECT d.id, d.employee_id, d.beneficiary_id,
            b.kind AS beneficiary_kind, b.name AS beneficiary_name,
            d.amount_type, d.value, d.is_active, d.effective_date, d.end_date, d.notes
     FROM employee_recurring_deductions d
     JOIN beneficiaries b ON b.id = d.beneficiary_id";

pub struct SqliteRepository {
    pool: SqlitePool,
}

impl SqliteRepository {
    /// Opens `database_url`, creating the database file if it does not exist.
    /// Accepts sqlx URLs (`sqlite:payroll.db`), bare paths and `:memory:`.
    pub async fn new(database_url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(database_url)
            .with_context(|| format!("Invalid database url: {}", database_url))?
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .connect_with(options)
            .await
            .with_context(|| format!("Failed to connect to database: {}", database_url))?;
        Ok(Self { pool })
    }

    pub async fn new_with_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .context("Failed to run database migrations")?;
        Ok(())
    }

    /// Load and execute all SQL seed files from the specified directory.
    /// Files are executed in alphabetical order by filename.
    pub async fn run_seeds(
        &self,
        seeds_dir: &Path,
    ) -> Result<()> {
        let mut entries: Vec<_> = std::fs::read_dir(seeds_dir)
            .with_context(|| format!("Failed to read seeds directory '{}'", seeds_dir.display()))?
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.path().extension().is_some_and(|ext| ext == "sql"))
            .collect();

        entries.sort_by_key(|entry| entry.file_name());

        for entry in entries {
            let path = entry.path();
            let sql = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read seed file '{}'", path.display()))?;

            debug!(path = %path.display(), "running seed file");
            sqlx::raw_sql(&sql)
                .execute(&self.pool)
                .await
                .with_context(|| format!("Failed to execute seed file '{}'", path.display()))?;
        }

        Ok(())
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    async fn deduction_lines(
        &self,
        payroll_entry_id: i64,
    ) -> Result<Vec<DeductionLine>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT deduction_id, beneficiary_kind, beneficiary_name, amount_type, amount
             FROM payroll_entry_deductions
             WHERE payroll_entry_id = ?
             ORDER BY id",
        )
        .bind(payroll_entry_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;

        rows.iter().map(row_to_deduction_line).collect()
    }

    async fn stored_entry(
        &self,
        row: &SqliteRow,
    ) -> Result<StoredPayrollEntry, RepositoryError> {
        let mut stored = row_to_stored_entry(row)?;
        stored.entry.recurring_deductions = self.deduction_lines(stored.id).await?;
        Ok(stored)
    }
}

fn db_error(e: sqlx::Error) -> RepositoryError {
    RepositoryError::Database(e.to_string())
}

fn get<'r, T>(
    row: &'r SqliteRow,
    column: &str,
) -> Result<T, RepositoryError>
where
    T: sqlx::Decode<'r, Sqlite> + sqlx::Type<Sqlite>,
{
    row.try_get(column)
        .map_err(|e| RepositoryError::Database(format!("Failed to get {}: {}", column, e)))
}

fn get_u32(
    row: &SqliteRow,
    column: &str,
) -> Result<u32, RepositoryError> {
    let value: i64 = get(row, column)?;
    u32::try_from(value).map_err(|_| {
        RepositoryError::Database(format!("Value {} out of range for column '{}'", value, column))
    })
}

fn get_optional_u32(
    row: &SqliteRow,
    column: &str,
) -> Result<Option<u32>, RepositoryError> {
    let value: Option<i64> = get(row, column)?;
    value
        .map(|v| {
            u32::try_from(v).map_err(|_| {
                RepositoryError::Database(format!("Value {} out of range for column '{}'", v, column))
            })
        })
        .transpose()
}

fn get_amount_type(row: &SqliteRow) -> Result<AmountType, RepositoryError> {
    let label: String = get(row, "amount_type")?;
    AmountType::parse(&label)
        .ok_or_else(|| RepositoryError::Database(format!("Invalid amount type: {}", label)))
}

fn text(d: Decimal) -> String {
    decimal_to_text(d)
}

fn optional_text(d: Option<Decimal>) -> Option<String> {
    d.map(decimal_to_text)
}

fn row_to_global_config(row: &SqliteRow) -> Result<GlobalSarsConfig, RepositoryError> {
    Ok(GlobalSarsConfig {
        uif_percent: get_decimal(row, "uif_percent")?,
        sdl_percent: get_decimal(row, "sdl_percent")?,
        uif_salary_cap: get_decimal(row, "uif_salary_cap")?,
        uif_monthly_cap: get_decimal(row, "uif_monthly_cap")?,
        medical_primary_credit: get_decimal(row, "medical_primary_credit")?,
        medical_dependant_credit: get_decimal(row, "medical_dependant_credit")?,
        tax_year_start_month: get_u32(row, "tax_year_start_month")?,
        tax_year_start_day: get_u32(row, "tax_year_start_day")?,
        tax_authority_name: get(row, "tax_authority_name")?,
        currency_symbol: get(row, "currency_symbol")?,
        tax_year_display: get(row, "tax_year_display")?,
    })
}

fn row_to_company_override(row: &SqliteRow) -> Result<CompanySarsOverride, RepositoryError> {
    Ok(CompanySarsOverride {
        company_id: get(row, "company_id")?,
        uif_percent: get_optional_decimal(row, "uif_percent")?,
        sdl_percent: get_optional_decimal(row, "sdl_percent")?,
        uif_salary_cap: get_optional_decimal(row, "uif_salary_cap")?,
        uif_monthly_cap: get_optional_decimal(row, "uif_monthly_cap")?,
        medical_primary_credit: get_optional_decimal(row, "medical_primary_credit")?,
        medical_dependant_credit: get_optional_decimal(row, "medical_dependant_credit")?,
        tax_year_start_month: get_optional_u32(row, "tax_year_start_month")?,
        tax_year_start_day: get_optional_u32(row, "tax_year_start_day")?,
        tax_authority_name: get(row, "tax_authority_name")?,
        currency_symbol: get(row, "currency_symbol")?,
    })
}

fn row_to_company(row: &SqliteRow) -> Result<Company, RepositoryError> {
    Ok(Company {
        id: get(row, "id")?,
        name: get(row, "name")?,
        defaults: CompanyPayrollDefaults {
            overtime_multiplier: get_decimal(row, "overtime_multiplier")?,
            sunday_multiplier: get_decimal(row, "sunday_multiplier")?,
            public_holiday_multiplier: get_decimal(row, "public_holiday_multiplier")?,
            ordinary_hours_per_day: get_decimal(row, "ordinary_hours_per_day")?,
            work_days_per_month: get_decimal(row, "work_days_per_month")?,
            paye_exempt: get(row, "paye_exempt")?,
        },
    })
}

fn row_to_employee(row: &SqliteRow) -> Result<EmployeePayrollProfile, RepositoryError> {
    let salary_type: String = get(row, "salary_type")?;
    Ok(EmployeePayrollProfile {
        id: get(row, "id")?,
        company_id: get(row, "company_id")?,
        employee_number: get(row, "employee_number")?,
        full_name: get(row, "full_name")?,
        start_date: get(row, "start_date")?,
        salary_type: SalaryType::parse(&salary_type).ok_or_else(|| {
            RepositoryError::Database(format!("Invalid salary type: {}", salary_type))
        })?,
        salary: get_decimal(row, "salary")?,
        piece_rate: get_optional_decimal(row, "piece_rate")?,
        ordinary_hours_per_day: get_optional_decimal(row, "ordinary_hours_per_day")?,
        work_days_per_month: get_optional_decimal(row, "work_days_per_month")?,
        overtime_multiplier: get_optional_decimal(row, "overtime_multiplier")?,
        sunday_multiplier: get_optional_decimal(row, "sunday_multiplier")?,
        holiday_multiplier: get_optional_decimal(row, "holiday_multiplier")?,
        paye_exempt: get(row, "paye_exempt")?,
        medical_aid_dependants: get_u32(row, "medical_aid_dependants")?,
    })
}

fn row_to_medical_aid(row: &SqliteRow) -> Result<MedicalAidInfo, RepositoryError> {
    Ok(MedicalAidInfo {
        employee_id: get(row, "employee_id")?,
        scheme_name: get(row, "scheme_name")?,
        membership_number: get(row, "membership_number")?,
        number_of_dependants: get_u32(row, "number_of_dependants")?,
        additional_dependants: get_u32(row, "additional_dependants")?,
        main_member: get(row, "main_member")?,
        employer_contribution_override: get_optional_decimal(row, "employer_contribution_override")?,
        employee_contribution_override: get_optional_decimal(row, "employee_contribution_override")?,
        use_sars_calculation: get(row, "use_sars_calculation")?,
    })
}

fn row_to_beneficiary(row: &SqliteRow) -> Result<Beneficiary, RepositoryError> {
    let kind: String = get(row, "kind")?;
    Ok(Beneficiary {
        id: get(row, "id")?,
        company_id: get(row, "company_id")?,
        kind: BeneficiaryType::from_label(&kind),
        name: get(row, "name")?,
    })
}

fn row_to_recurring_deduction(row: &SqliteRow) -> Result<RecurringDeduction, RepositoryError> {
    let kind: String = get(row, "beneficiary_kind")?;
    Ok(RecurringDeduction {
        id: get(row, "id")?,
        employee_id: get(row, "employee_id")?,
        beneficiary_id: get(row, "beneficiary_id")?,
        beneficiary_kind: BeneficiaryType::from_label(&kind),
        beneficiary_name: get(row, "beneficiary_name")?,
        amount_type: get_amount_type(row)?,
        value: get_optional_decimal(row, "value")?,
        is_active: get(row, "is_active")?,
        effective_date: get(row, "effective_date")?,
        end_date: get(row, "end_date")?,
        notes: get(row, "notes")?,
    })
}

fn row_to_paye_bracket(row: &SqliteRow) -> Result<PayeBracket, RepositoryError> {
    Ok(PayeBracket {
        tax_year: get(row, "tax_year")?,
        min_income: get_decimal(row, "min_income")?,
        max_income: get_optional_decimal(row, "max_income")?,
        rate: get_decimal(row, "rate")?,
        base_tax: get_decimal(row, "base_tax")?,
    })
}

fn row_to_deduction_line(row: &SqliteRow) -> Result<DeductionLine, RepositoryError> {
    let kind: String = get(row, "beneficiary_kind")?;
    Ok(DeductionLine {
        deduction_id: get(row, "deduction_id")?,
        beneficiary_kind: BeneficiaryType::from_label(&kind),
        beneficiary_name: get(row, "beneficiary_name")?,
        amount_type: get_amount_type(row)?,
        amount: get_decimal(row, "amount")?,
    })
}

/// Maps a `payroll_entries` row; deduction lines are loaded separately.
fn row_to_stored_entry(row: &SqliteRow) -> Result<StoredPayrollEntry, RepositoryError> {
    let entry = PayrollEntry {
        employee_id: get(row, "employee_id")?,
        pay_period_start: get(row, "pay_period_start")?,
        pay_period_end: get(row, "pay_period_end")?,
        month_year: get(row, "month_year")?,
        ordinary_hours: get_decimal(row, "ordinary_hours")?,
        overtime_hours: get_decimal(row, "overtime_hours")?,
        sunday_hours: get_decimal(row, "sunday_hours")?,
        public_holiday_hours: get_decimal(row, "public_holiday_hours")?,
        hourly_rate: get_decimal(row, "hourly_rate")?,
        pieces_produced: get_decimal(row, "pieces_produced")?,
        piece_rate: get_decimal(row, "piece_rate")?,
        allowances: get_decimal(row, "allowances")?,
        bonus_amount: get_decimal(row, "bonus_amount")?,
        union_fee: get_decimal(row, "union_fee")?,
        deductions_other: get_decimal(row, "deductions_other")?,
        ordinary_pay: get_decimal(row, "ordinary_pay")?,
        overtime_pay: get_decimal(row, "overtime_pay")?,
        sunday_pay: get_decimal(row, "sunday_pay")?,
        holiday_pay: get_decimal(row, "holiday_pay")?,
        taxable_gross: get_decimal(row, "taxable_gross")?,
        paye: get_decimal(row, "paye")?,
        uif: get_decimal(row, "uif")?,
        sdl: get_decimal(row, "sdl")?,
        medical_aid_tax_credit: get_decimal(row, "medical_aid_tax_credit")?,
        fringe_benefit_medical: get_decimal(row, "fringe_benefit_medical")?,
        recurring_deductions: Vec::new(),
        net_pay: get_decimal(row, "net_pay")?,
    };

    Ok(StoredPayrollEntry {
        id: get(row, "id")?,
        entry,
        is_verified: get(row, "is_verified")?,
        verified_at: get::<Option<DateTime<Utc>>>(row, "verified_at")?,
        is_finalized: get(row, "is_finalized")?,
        finalized_at: get::<Option<DateTime<Utc>>>(row, "finalized_at")?,
        created_at: get::<DateTime<Utc>>(row, "created_at")?,
        updated_at: get::<DateTime<Utc>>(row, "updated_at")?,
    })
}

/// Binds [`ENTRY_VALUE_COLUMNS`] in order.
fn bind_entry_values<'q>(
    query: SqliteQuery<'q>,
    entry: &PayrollEntry,
) -> SqliteQuery<'q> {
    query
        .bind(entry.month_year.clone())
        .bind(text(entry.ordinary_hours))
        .bind(text(entry.overtime_hours))
        .bind(text(entry.sunday_hours))
        .bind(text(entry.public_holiday_hours))
        .bind(text(entry.hourly_rate))
        .bind(text(entry.pieces_produced))
        .bind(text(entry.piece_rate))
        .bind(text(entry.allowances))
        .bind(text(entry.bonus_amount))
        .bind(text(entry.union_fee))
        .bind(text(entry.deductions_other))
        .bind(text(entry.ordinary_pay))
        .bind(text(entry.overtime_pay))
        .bind(text(entry.sunday_pay))
        .bind(text(entry.holiday_pay))
        .bind(text(entry.taxable_gross))
        .bind(text(entry.paye))
        .bind(text(entry.uif))
        .bind(text(entry.sdl))
        .bind(text(entry.medical_aid_tax_credit))
        .bind(text(entry.fringe_benefit_medical))
        .bind(text(entry.net_pay))
}

#[async_trait]
impl PayrollRepository for SqliteRepository {
    async fn ensure_global_sars_config(&self) -> Result<GlobalSarsConfig, RepositoryError> {
        let defaults = GlobalSarsConfig::default();
        sqlx::query(
            "INSERT OR IGNORE INTO global_sars_config (
                id, uif_percent, sdl_percent, uif_salary_cap, uif_monthly_cap,
                medical_primary_credit, medical_dependant_credit,
                tax_year_start_month, tax_year_start_day,
                tax_authority_name, currency_symbol, tax_year_display
            ) VALUES (1, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(text(defaults.uif_percent))
        .bind(text(defaults.sdl_percent))
        .bind(text(defaults.uif_salary_cap))
        .bind(text(defaults.uif_monthly_cap))
        .bind(text(defaults.medical_primary_credit))
        .bind(text(defaults.medical_dependant_credit))
        .bind(i64::from(defaults.tax_year_start_month))
        .bind(i64::from(defaults.tax_year_start_day))
        .bind(defaults.tax_authority_name)
        .bind(defaults.currency_symbol)
        .bind(defaults.tax_year_display)
        .execute(&self.pool)
        .await
        .map_err(db_error)?;

        let row = sqlx::query("SELECT * FROM global_sars_config WHERE id = 1")
            .fetch_one(&self.pool)
            .await
            .map_err(db_error)?;

        row_to_global_config(&row)
    }

    async fn update_global_sars_config(
        &self,
        config: &GlobalSarsConfig,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO global_sars_config (
                id, uif_percent, sdl_percent, uif_salary_cap, uif_monthly_cap,
                medical_primary_credit, medical_dependant_credit,
                tax_year_start_month, tax_year_start_day,
                tax_authority_name, currency_symbol, tax_year_display
            ) VALUES (1, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT (id) DO UPDATE SET
                uif_percent = excluded.uif_percent,
                sdl_percent = excluded.sdl_percent,
                uif_salary_cap = excluded.uif_salary_cap,
                uif_monthly_cap = excluded.uif_monthly_cap,
                medical_primary_credit = excluded.medical_primary_credit,
                medical_dependant_credit = excluded.medical_dependant_credit,
                tax_year_start_month = excluded.tax_year_start_month,
                tax_year_start_day = excluded.tax_year_start_day,
                tax_authority_name = excluded.tax_authority_name,
                currency_symbol = excluded.currency_symbol,
                tax_year_display = excluded.tax_year_display,
                updated_at = CURRENT_TIMESTAMP",
        )
        .bind(text(config.uif_percent))
        .bind(text(config.sdl_percent))
        .bind(text(config.uif_salary_cap))
        .bind(text(config.uif_monthly_cap))
        .bind(text(config.medical_primary_credit))
        .bind(text(config.medical_dependant_credit))
        .bind(i64::from(config.tax_year_start_month))
        .bind(i64::from(config.tax_year_start_day))
        .bind(&config.tax_authority_name)
        .bind(&config.currency_symbol)
        .bind(&config.tax_year_display)
        .execute(&self.pool)
        .await
        .map_err(db_error)?;

        Ok(())
    }

    async fn get_company_sars_override(
        &self,
        company_id: i64,
    ) -> Result<Option<CompanySarsOverride>, RepositoryError> {
        let row = sqlx::query("SELECT * FROM company_sars_config WHERE company_id = ?")
            .bind(company_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error)?;

        row.as_ref().map(row_to_company_override).transpose()
    }

    async fn upsert_company_sars_override(
        &self,
        config: &CompanySarsOverride,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO company_sars_config (
                company_id, uif_percent, sdl_percent, uif_salary_cap, uif_monthly_cap,
                medical_primary_credit, medical_dependant_credit,
                tax_year_start_month, tax_year_start_day,
                tax_authority_name, currency_symbol
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT (company_id) DO UPDATE SET
                uif_percent = excluded.uif_percent,
                sdl_percent = excluded.sdl_percent,
                uif_salary_cap = excluded.uif_salary_cap,
                uif_monthly_cap = excluded.uif_monthly_cap,
                medical_primary_credit = excluded.medical_primary_credit,
                medical_dependant_credit = excluded.medical_dependant_credit,
                tax_year_start_month = excluded.tax_year_start_month,
                tax_year_start_day = excluded.tax_year_start_day,
                tax_authority_name = excluded.tax_authority_name,
                currency_symbol = excluded.currency_symbol",
        )
        .bind(config.company_id)
        .bind(optional_text(config.uif_percent))
        .bind(optional_text(config.sdl_percent))
        .bind(optional_text(config.uif_salary_cap))
        .bind(optional_text(config.uif_monthly_cap))
        .bind(optional_text(config.medical_primary_credit))
        .bind(optional_text(config.medical_dependant_credit))
        .bind(config.tax_year_start_month.map(i64::from))
        .bind(config.tax_year_start_day.map(i64::from))
        .bind(&config.tax_authority_name)
        .bind(&config.currency_symbol)
        .execute(&self.pool)
        .await
        .map_err(db_error)?;

        Ok(())
    }

    async fn create_company(
        &self,
        company: NewCompany,
    ) -> Result<Company, RepositoryError> {
        let result = sqlx::query(
            "INSERT INTO companies (
                name, overtime_multiplier, sunday_multiplier, public_holiday_multiplier,
                ordinary_hours_per_day, work_days_per_month, paye_exempt
            ) VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&company.name)
        .bind(text(company.defaults.overtime_multiplier))
        .bind(text(company.defaults.sunday_multiplier))
        .bind(text(company.defaults.public_holiday_multiplier))
        .bind(text(company.defaults.ordinary_hours_per_day))
        .bind(text(company.defaults.work_days_per_month))
        .bind(company.defaults.paye_exempt)
        .execute(&self.pool)
        .await
        .map_err(db_error)?;

        self.get_company(result.last_insert_rowid()).await
    }

    async fn get_company(
        &self,
        id: i64,
    ) -> Result<Company, RepositoryError> {
        let row = sqlx::query("SELECT * FROM companies WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error)?
            .ok_or(RepositoryError::NotFound)?;

        row_to_company(&row)
    }

    async fn create_employee(
        &self,
        employee: NewEmployee,
    ) -> Result<EmployeePayrollProfile, RepositoryError> {
        let company = self.get_company(employee.company_id).await?;
        let employee = employee.with_company_defaults(&company.defaults);

        let result = sqlx::query(
            "INSERT INTO employees (
                company_id, employee_number, full_name, start_date, salary_type, salary,
                piece_rate, ordinary_hours_per_day, work_days_per_month,
                overtime_multiplier, sunday_multiplier, holiday_multiplier,
                paye_exempt, medical_aid_dependants
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(employee.company_id)
        .bind(&employee.employee_number)
        .bind(&employee.full_name)
        .bind(employee.start_date)
        .bind(employee.salary_type.as_str())
        .bind(text(employee.salary))
        .bind(optional_text(employee.piece_rate))
        .bind(optional_text(employee.ordinary_hours_per_day))
        .bind(optional_text(employee.work_days_per_month))
        .bind(optional_text(employee.overtime_multiplier))
        .bind(optional_text(employee.sunday_multiplier))
        .bind(optional_text(employee.holiday_multiplier))
        .bind(employee.paye_exempt.unwrap_or(false))
        .bind(i64::from(employee.medical_aid_dependants))
        .execute(&self.pool)
        .await
        .map_err(db_error)?;

        self.get_employee(result.last_insert_rowid()).await
    }

    async fn get_employee(
        &self,
        id: i64,
    ) -> Result<EmployeePayrollProfile, RepositoryError> {
        let row = sqlx::query("SELECT * FROM employees WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error)?
            .ok_or(RepositoryError::NotFound)?;

        row_to_employee(&row)
    }

    async fn get_medical_aid_info(
        &self,
        employee_id: i64,
    ) -> Result<Option<MedicalAidInfo>, RepositoryError> {
        let row = sqlx::query("SELECT * FROM employee_medical_aid_info WHERE employee_id = ?")
            .bind(employee_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error)?;

        row.as_ref().map(row_to_medical_aid).transpose()
    }

    async fn upsert_medical_aid_info(
        &self,
        info: &MedicalAidInfo,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO employee_medical_aid_info (
                employee_id, scheme_name, membership_number, number_of_dependants,
                additional_dependants, main_member, employer_contribution_override,
                employee_contribution_override, use_sars_calculation
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT (employee_id) DO UPDATE SET
                scheme_name = excluded.scheme_name,
                membership_number = excluded.membership_number,
                number_of_dependants = excluded.number_of_dependants,
                additional_dependants = excluded.additional_dependants,
                main_member = excluded.main_member,
                employer_contribution_override = excluded.employer_contribution_override,
                employee_contribution_override = excluded.employee_contribution_override,
                use_sars_calculation = excluded.use_sars_calculation",
        )
        .bind(info.employee_id)
        .bind(&info.scheme_name)
        .bind(&info.membership_number)
        .bind(i64::from(info.number_of_dependants))
        .bind(i64::from(info.additional_dependants))
        .bind(info.main_member)
        .bind(optional_text(info.employer_contribution_override))
        .bind(optional_text(info.employee_contribution_override))
        .bind(info.use_sars_calculation)
        .execute(&self.pool)
        .await
        .map_err(db_error)?;

        Ok(())
    }

    async fn create_beneficiary(
        &self,
        beneficiary: NewBeneficiary,
    ) -> Result<Beneficiary, RepositoryError> {
        let result = sqlx::query("INSERT INTO beneficiaries (company_id, kind, name) VALUES (?, ?, ?)")
            .bind(beneficiary.company_id)
            .bind(beneficiary.kind.as_str())
            .bind(&beneficiary.name)
            .execute(&self.pool)
            .await
            .map_err(db_error)?;

        self.get_beneficiary(result.last_insert_rowid()).await
    }

    async fn get_beneficiary(
        &self,
        id: i64,
    ) -> Result<Beneficiary, RepositoryError> {
        let row = sqlx::query("SELECT * FROM beneficiaries WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error)?
            .ok_or(RepositoryError::NotFound)?;

        row_to_beneficiary(&row)
    }

    async fn create_recurring_deduction(
        &self,
        deduction: NewRecurringDeduction,
    ) -> Result<RecurringDeduction, RepositoryError> {
        let beneficiary = self.get_beneficiary(deduction.beneficiary_id).await?;
        deduction
            .validate(beneficiary.kind)
            .map_err(|e| RepositoryError::Validation(e.to_string()))?;

        let result = sqlx::query(
            "INSERT INTO employee_recurring_deductions (
                employee_id, beneficiary_id, amount_type, value, is_active,
                effective_date, end_date, notes
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(deduction.employee_id)
        .bind(deduction.beneficiary_id)
        .bind(deduction.amount_type.as_str())
        .bind(optional_text(deduction.value))
        .bind(deduction.is_active)
        .bind(deduction.effective_date)
        .bind(deduction.end_date)
        .bind(&deduction.notes)
        .execute(&self.pool)
        .await
        .map_err(db_error)?;

        let row = sqlx::query(&format!("{RECURRING_DEDUCTION_SELECT} WHERE d.id = ?"))
            .bind(result.last_insert_rowid())
            .fetch_one(&self.pool)
            .await
            .map_err(db_error)?;

        row_to_recurring_deduction(&row)
    }

    async fn list_active_recurring_deductions(
        &self,
        employee_id: i64,
    ) -> Result<Vec<RecurringDeduction>, RepositoryError> {
        let rows = sqlx::query(&format!(
            "{RECURRING_DEDUCTION_SELECT} WHERE d.employee_id = ? AND d.is_active = 1 ORDER BY d.id"
        ))
        .bind(employee_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;

        rows.iter().map(row_to_recurring_deduction).collect()
    }

    async fn get_paye_brackets(
        &self,
        tax_year: i32,
    ) -> Result<Vec<PayeBracket>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT tax_year, min_income, max_income, rate, base_tax
             FROM paye_brackets
             WHERE tax_year = ?
             ORDER BY CAST(min_income AS REAL)",
        )
        .bind(tax_year)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;

        rows.iter().map(row_to_paye_bracket).collect()
    }

    async fn insert_paye_bracket(
        &self,
        bracket: &PayeBracket,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO paye_brackets (tax_year, min_income, max_income, rate, base_tax)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(bracket.tax_year)
        .bind(text(bracket.min_income))
        .bind(optional_text(bracket.max_income))
        .bind(text(bracket.rate))
        .bind(text(bracket.base_tax))
        .execute(&self.pool)
        .await
        .map_err(db_error)?;

        Ok(())
    }

    async fn delete_paye_brackets(
        &self,
        tax_year: i32,
    ) -> Result<(), RepositoryError> {
        sqlx::query("DELETE FROM paye_brackets WHERE tax_year = ?")
            .bind(tax_year)
            .execute(&self.pool)
            .await
            .map_err(db_error)?;

        Ok(())
    }

    async fn list_paye_tax_years(&self) -> Result<Vec<i32>, RepositoryError> {
        let rows = sqlx::query("SELECT DISTINCT tax_year FROM paye_brackets ORDER BY tax_year DESC")
            .fetch_all(&self.pool)
            .await
            .map_err(db_error)?;

        rows.iter().map(|row| get(row, "tax_year")).collect()
    }

    async fn save_payroll_entry(
        &self,
        entry: &PayrollEntry,
    ) -> Result<StoredPayrollEntry, RepositoryError> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await.map_err(db_error)?;

        let existing = sqlx::query(
            "SELECT id, is_finalized FROM payroll_entries
             WHERE employee_id = ? AND pay_period_start = ? AND pay_period_end = ?",
        )
        .bind(entry.employee_id)
        .bind(entry.pay_period_start)
        .bind(entry.pay_period_end)
        .fetch_optional(&mut *tx)
        .await
        .map_err(db_error)?;

        let id = match existing {
            Some(row) => {
                let id: i64 = get(&row, "id")?;
                let finalized: bool = get(&row, "is_finalized")?;
                if finalized {
                    return Err(RepositoryError::Validation(format!(
                        "payroll entry {} is finalized",
                        id
                    )));
                }

                let assignments = ENTRY_VALUE_COLUMNS
                    .iter()
                    .map(|column| format!("{column} = ?"))
                    .collect::<Vec<_>>()
                    .join(", ");
                let sql = format!(
                    "UPDATE payroll_entries SET {assignments},
                        is_verified = 1, verified_at = ?, updated_at = ?
                     WHERE id = ?"
                );
                bind_entry_values(sqlx::query(&sql), entry)
                    .bind(now)
                    .bind(now)
                    .bind(id)
                    .execute(&mut *tx)
                    .await
                    .map_err(db_error)?;

                sqlx::query("DELETE FROM payroll_entry_deductions WHERE payroll_entry_id = ?")
                    .bind(id)
                    .execute(&mut *tx)
                    .await
                    .map_err(db_error)?;
                id
            }
            None => {
                let columns = ENTRY_VALUE_COLUMNS.join(", ");
                let placeholders = vec!["?"; ENTRY_VALUE_COLUMNS.len()].join(", ");
                let sql = format!(
                    "INSERT INTO payroll_entries (
                        employee_id, pay_period_start, pay_period_end, {columns},
                        is_verified, verified_at, created_at, updated_at
                    ) VALUES (?, ?, ?, {placeholders}, 1, ?, ?, ?)"
                );
                let query = sqlx::query(&sql)
                    .bind(entry.employee_id)
                    .bind(entry.pay_period_start)
                    .bind(entry.pay_period_end);
                bind_entry_values(query, entry)
                    .bind(now)
                    .bind(now)
                    .bind(now)
                    .execute(&mut *tx)
                    .await
                    .map_err(db_error)?
                    .last_insert_rowid()
            }
        };

        for line in &entry.recurring_deductions {
            sqlx::query(
                "INSERT INTO payroll_entry_deductions (
                    payroll_entry_id, deduction_id, beneficiary_kind, beneficiary_name,
                    amount_type, amount
                ) VALUES (?, ?, ?, ?, ?, ?)",
            )
            .bind(id)
            .bind(line.deduction_id)
            .bind(line.beneficiary_kind.as_str())
            .bind(&line.beneficiary_name)
            .bind(line.amount_type.as_str())
            .bind(text(line.amount))
            .execute(&mut *tx)
            .await
            .map_err(db_error)?;
        }

        tx.commit().await.map_err(db_error)?;

        self.get_payroll_entry(id).await
    }

    async fn get_payroll_entry(
        &self,
        id: i64,
    ) -> Result<StoredPayrollEntry, RepositoryError> {
        let row = sqlx::query("SELECT * FROM payroll_entries WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error)?
            .ok_or(RepositoryError::NotFound)?;

        self.stored_entry(&row).await
    }

    async fn find_payroll_entry_for_period(
        &self,
        employee_id: i64,
        pay_period_start: NaiveDate,
        pay_period_end: NaiveDate,
    ) -> Result<Option<StoredPayrollEntry>, RepositoryError> {
        let row = sqlx::query(
            "SELECT * FROM payroll_entries
             WHERE employee_id = ? AND pay_period_start = ? AND pay_period_end = ?",
        )
        .bind(employee_id)
        .bind(pay_period_start)
        .bind(pay_period_end)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)?;

        match row {
            Some(row) => Ok(Some(self.stored_entry(&row).await?)),
            None => Ok(None),
        }
    }

    async fn finalize_payroll_entry(
        &self,
        id: i64,
    ) -> Result<StoredPayrollEntry, RepositoryError> {
        let now = Utc::now();
        let result = sqlx::query(
            "UPDATE payroll_entries
             SET is_finalized = 1, finalized_at = ?, updated_at = ?
             WHERE id = ?",
        )
        .bind(now)
        .bind(now)
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(db_error)?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        self.get_payroll_entry(id).await
    }

    async fn list_payroll_entries(
        &self,
        employee_id: i64,
    ) -> Result<Vec<StoredPayrollEntry>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT * FROM payroll_entries WHERE employee_id = ? ORDER BY pay_period_start",
        )
        .bind(employee_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;

        let mut entries = Vec::with_capacity(rows.len());
        for row in &rows {
            entries.push(self.stored_entry(row).await?);
        }
        Ok(entries)
    }
}
