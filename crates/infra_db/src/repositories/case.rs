//! Case overview repository
//!
//! Row-level access to every table the case overview reads. Queries are
//! built at runtime because the three claim tables and the two adjuster
//! tables share one row shape and differ only in table and column names.
//!
//! Embedded relations are expressed as `LEFT JOIN`s whose columns are
//! prefixed `joined_insurer_`. A row whose foreign key points at a carrier
//! that is not in the joined table comes back with those columns `NULL`.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;

use crate::error::DatabaseError;

/// Physical layout of one claim table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClaimTable {
    pub table: &'static str,
    pub owner_column: &'static str,
    pub insurer_column: &'static str,
    pub insurer_table: &'static str,
}

impl ClaimTable {
    pub const FIRST_PARTY: ClaimTable = ClaimTable {
        table: "first_party_claims",
        owner_column: "client_id",
        insurer_column: "auto_insurance_id",
        insurer_table: "auto_insurance",
    };

    pub const THIRD_PARTY: ClaimTable = ClaimTable {
        table: "third_party_claims",
        owner_column: "defendant_id",
        insurer_column: "auto_insurance_id",
        insurer_table: "auto_insurance",
    };

    pub const HEALTH: ClaimTable = ClaimTable {
        table: "health_claims",
        owner_column: "client_id",
        insurer_column: "health_insurance_id",
        insurer_table: "health_insurance",
    };

    /// Name of the embedded relation, used in error reports
    pub fn relation(&self) -> String {
        format!("{}->{}", self.table, self.insurer_table)
    }

    fn select_sql(&self) -> String {
        format!(
            r#"
            SELECT
                c.id,
                c.{owner} AS owner_id,
                c.case_id,
                c.claim_number,
                c.policy_number,
                c.{insurer} AS insurer_ref,
                c.coverage_limit,
                c.amount_paid,
                c.adjuster_name,
                i.id AS joined_insurer_id,
                i.name AS joined_insurer_name,
                i.phone AS joined_insurer_phone,
                i.email AS joined_insurer_email,
                i.address AS joined_insurer_address
            FROM {table} c
            LEFT JOIN {insurer_table} i ON i.id = c.{insurer}
            WHERE c.{owner} = ANY($1)
               OR (c.{owner} IS NULL AND c.case_id = $2)
            ORDER BY c.id
            "#,
            owner = self.owner_column,
            insurer = self.insurer_column,
            table = self.table,
            insurer_table = self.insurer_table,
        )
    }
}

/// Physical layout of one adjuster table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdjusterTable {
    pub table: &'static str,
    pub insurer_column: &'static str,
}

impl AdjusterTable {
    pub const AUTO: AdjusterTable = AdjusterTable {
        table: "auto_adjusters",
        insurer_column: "auto_insurance_id",
    };

    pub const HEALTH: AdjusterTable = AdjusterTable {
        table: "health_adjusters",
        insurer_column: "health_insurance_id",
    };

    fn select_sql(&self, key_column: &str) -> String {
        format!(
            r#"
            SELECT id, first_name, last_name, phone, email,
                   {insurer} AS insurer_ref, claim_id
            FROM {table}
            WHERE {key} = ANY($1)
            ORDER BY id
            "#,
            insurer = self.insurer_column,
            table = self.table,
            key = key_column,
        )
    }
}

/// Carrier tables
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsurerTable {
    AutoComplete,
    AutoBasic,
    Health,
}

impl InsurerTable {
    pub fn name(&self) -> &'static str {
        match self {
            InsurerTable::AutoComplete => "auto_insurance_complete",
            InsurerTable::AutoBasic => "auto_insurance",
            InsurerTable::Health => "health_insurance",
        }
    }
}

/// Repository for the case overview tables
#[derive(Debug, Clone)]
pub struct CaseRepository {
    pool: PgPool,
}

impl CaseRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Retrieves a case file, `None` when no row matches
    pub async fn find_case_file(&self, case_id: i64) -> Result<Option<CaseFileRow>, DatabaseError> {
        let row = sqlx::query_as::<_, CaseFileRow>(
            r#"
            SELECT id, created_at, title, status, stage, incident_date,
                   statute_deadline, days_until_statute
            FROM casefiles
            WHERE id = $1
            "#,
        )
        .bind(case_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    /// Writes the statute countdown of a case
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::NotFound` when the case no longer exists
    pub async fn update_days_until_statute(&self, case_id: i64, days: i32) -> Result<(), DatabaseError> {
        let result = sqlx::query("UPDATE casefiles SET days_until_statute = $2 WHERE id = $1")
            .bind(case_id)
            .bind(days)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::not_found("CaseFile", case_id));
        }
        Ok(())
    }

    /// Retrieves the clients of a case ordered by `client_order`
    pub async fn clients_for_case(&self, case_id: i64) -> Result<Vec<ClientRow>, DatabaseError> {
        let rows = sqlx::query_as::<_, ClientRow>(
            r#"
            SELECT id, case_id, client_order, first_name, last_name, date_of_birth,
                   phone, email, address, injuries
            FROM clients
            WHERE case_id = $1
            ORDER BY client_order, id
            "#,
        )
        .bind(case_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Retrieves the defendants of a case with their basic auto carrier joined
    pub async fn defendants_with_insurer(&self, case_id: i64) -> Result<Vec<DefendantRow>, DatabaseError> {
        let rows = sqlx::query_as::<_, DefendantRow>(
            r#"
            SELECT
                d.id, d.case_id, d.defendant_number, d.first_name, d.last_name,
                d.auto_insurance_id AS insurer_ref, d.policy_number, d.policy_limit,
                d.liability_percentage,
                i.id AS joined_insurer_id,
                i.name AS joined_insurer_name,
                i.phone AS joined_insurer_phone,
                i.email AS joined_insurer_email,
                i.address AS joined_insurer_address
            FROM defendants d
            LEFT JOIN auto_insurance i ON i.id = d.auto_insurance_id
            WHERE d.case_id = $1
            ORDER BY d.defendant_number, d.id
            "#,
        )
        .bind(case_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Retrieves the defendants of a case without the carrier join
    pub async fn defendants_for_case(&self, case_id: i64) -> Result<Vec<DefendantRow>, DatabaseError> {
        let rows = sqlx::query_as::<_, DefendantRow>(
            r#"
            SELECT id, case_id, defendant_number, first_name, last_name,
                   auto_insurance_id AS insurer_ref, policy_number, policy_limit,
                   liability_percentage
            FROM defendants
            WHERE case_id = $1
            ORDER BY defendant_number, id
            "#,
        )
        .bind(case_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Looks up one carrier by id
    pub async fn find_insurer(&self, table: InsurerTable, id: i64) -> Result<Option<InsurerRow>, DatabaseError> {
        let sql = format!(
            "SELECT id, name, phone, email, address FROM {} WHERE id = $1",
            table.name()
        );
        let row = sqlx::query_as::<_, InsurerRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row)
    }

    /// Retrieves claims owned by any of `owner_ids`, plus owner-less rows of `case_id`
    pub async fn claims(
        &self,
        table: ClaimTable,
        owner_ids: &[i64],
        case_id: i64,
    ) -> Result<Vec<ClaimRow>, DatabaseError> {
        let sql = table.select_sql();
        let rows = sqlx::query_as::<_, ClaimRow>(&sql)
            .bind(owner_ids)
            .bind(case_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows)
    }

    /// Retrieves adjusters assigned to any of `claim_ids`
    pub async fn adjusters_by_claims(
        &self,
        table: AdjusterTable,
        claim_ids: &[i64],
    ) -> Result<Vec<AdjusterRow>, DatabaseError> {
        let sql = table.select_sql("claim_id");
        let rows = sqlx::query_as::<_, AdjusterRow>(&sql)
            .bind(claim_ids)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows)
    }

    /// Retrieves adjusters employed by any of `insurer_ids`
    pub async fn adjusters_by_insurers(
        &self,
        table: AdjusterTable,
        insurer_ids: &[i64],
    ) -> Result<Vec<AdjusterRow>, DatabaseError> {
        let sql = table.select_sql(table.insurer_column);
        let rows = sqlx::query_as::<_, AdjusterRow>(&sql)
            .bind(insurer_ids)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows)
    }

    /// Retrieves medical bills for a set of clients
    pub async fn medical_bills(&self, client_ids: &[i64]) -> Result<Vec<MedicalBillRow>, DatabaseError> {
        let rows = sqlx::query_as::<_, MedicalBillRow>(
            r#"
            SELECT id, client_id, provider_id, provider_name, service_date,
                   amount_billed, amount_paid, adjustments
            FROM medical_bills
            WHERE client_id = ANY($1)
            ORDER BY id
            "#,
        )
        .bind(client_ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Retrieves the work log of a case, newest first
    pub async fn work_logs(&self, case_id: i64) -> Result<Vec<WorkLogRow>, DatabaseError> {
        let rows = sqlx::query_as::<_, WorkLogRow>(
            r#"
            SELECT id, case_id, description, timestamp, actor
            FROM work_logs
            WHERE case_id = $1
            ORDER BY timestamp DESC, id DESC
            "#,
        )
        .bind(case_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }
}

// Row types

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CaseFileRow {
    pub id: i64,
    pub created_at: DateTime<Utc>,
    pub title: Option<String>,
    pub status: String,
    pub stage: String,
    pub incident_date: Option<NaiveDate>,
    pub statute_deadline: Option<NaiveDate>,
    pub days_until_statute: Option<i32>,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ClientRow {
    pub id: i64,
    pub case_id: i64,
    pub client_order: i32,
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: Option<NaiveDate>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub injuries: Option<String>,
}

/// Carrier columns of a `LEFT JOIN`, all `NULL` when nothing matched
///
/// Queries without the join leave these columns out entirely; `default`
/// fills them with `None`.
#[derive(Debug, Clone, Default, sqlx::FromRow)]
pub struct JoinedInsurerColumns {
    #[sqlx(default)]
    pub joined_insurer_id: Option<i64>,
    #[sqlx(default)]
    pub joined_insurer_name: Option<String>,
    #[sqlx(default)]
    pub joined_insurer_phone: Option<String>,
    #[sqlx(default)]
    pub joined_insurer_email: Option<String>,
    #[sqlx(default)]
    pub joined_insurer_address: Option<String>,
}

impl JoinedInsurerColumns {
    /// The joined carrier, if the join matched a row
    pub fn into_row(self) -> Option<InsurerRow> {
        let id = self.joined_insurer_id?;
        Some(InsurerRow {
            id,
            name: self.joined_insurer_name.unwrap_or_default(),
            phone: self.joined_insurer_phone,
            email: self.joined_insurer_email,
            address: self.joined_insurer_address,
        })
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct DefendantRow {
    pub id: i64,
    pub case_id: i64,
    pub defendant_number: i32,
    pub first_name: String,
    pub last_name: String,
    pub insurer_ref: Option<i64>,
    pub policy_number: Option<String>,
    pub policy_limit: Option<Decimal>,
    pub liability_percentage: Option<Decimal>,
    #[sqlx(flatten)]
    pub joined: JoinedInsurerColumns,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct InsurerRow {
    pub id: i64,
    pub name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ClaimRow {
    pub id: i64,
    pub owner_id: Option<i64>,
    pub case_id: Option<i64>,
    pub claim_number: Option<String>,
    pub policy_number: Option<String>,
    pub insurer_ref: Option<i64>,
    pub coverage_limit: Option<Decimal>,
    pub amount_paid: Option<Decimal>,
    pub adjuster_name: Option<String>,
    #[sqlx(flatten)]
    pub joined: JoinedInsurerColumns,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AdjusterRow {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub insurer_ref: Option<i64>,
    pub claim_id: Option<i64>,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct MedicalBillRow {
    pub id: i64,
    pub client_id: i64,
    pub provider_id: Option<i64>,
    pub provider_name: Option<String>,
    pub service_date: Option<NaiveDate>,
    pub amount_billed: Decimal,
    pub amount_paid: Decimal,
    pub adjustments: Decimal,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct WorkLogRow {
    pub id: i64,
    pub case_id: i64,
    pub description: String,
    pub timestamp: DateTime<Utc>,
    pub actor: Option<String>,
}
