//! Database Test Utilities
//!
//! Starts a PostgreSQL container with the case overview schema and loads
//! the same `MockTables` scenarios the in-memory store uses, so adapter
//! tests and domain tests share fixtures.

use std::sync::Arc;
use std::time::Duration;

use domain_case::ports::mock::MockTables;
use domain_case::Claim;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use testcontainers::{runners::AsyncRunner, ContainerAsync, ImageExt};
use testcontainers_modules::postgres::Postgres;
use tokio::sync::OnceCell;

const POSTGRES_TAG: &str = "16-alpine";
const POSTGRES_USER: &str = "test_user";
const POSTGRES_PASSWORD: &str = "test_password";
const POSTGRES_DB: &str = "cases_test";

type TestResult<T> = Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// Configuration for test database
#[derive(Debug, Clone)]
pub struct TestDatabaseConfig {
    pub user: String,
    pub password: String,
    pub database: String,
    pub host: String,
    pub port: u16,
}

impl Default for TestDatabaseConfig {
    fn default() -> Self {
        Self {
            user: POSTGRES_USER.to_string(),
            password: POSTGRES_PASSWORD.to_string(),
            database: POSTGRES_DB.to_string(),
            host: "localhost".to_string(),
            port: 5432,
        }
    }
}

impl TestDatabaseConfig {
    /// Creates the database connection URL
    pub fn connection_url(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}/{}",
            self.user, self.password, self.host, self.port, self.database
        )
    }
}

/// A PostgreSQL test container with the schema applied
pub struct TestDatabase {
    _container: ContainerAsync<Postgres>,
    pub config: TestDatabaseConfig,
    pub pool: PgPool,
}

impl TestDatabase {
    /// Starts a new PostgreSQL container for testing
    ///
    /// # Errors
    ///
    /// Returns an error if the container fails to start or the schema fails
    /// to apply
    pub async fn new() -> TestResult<Self> {
        let container = Postgres::default()
            .with_db_name(POSTGRES_DB)
            .with_user(POSTGRES_USER)
            .with_password(POSTGRES_PASSWORD)
            .with_tag(POSTGRES_TAG)
            .start()
            .await?;

        let config = TestDatabaseConfig {
            host: container.get_host().await?.to_string(),
            port: container.get_host_port_ipv4(5432).await?,
            ..Default::default()
        };

        let pool = PgPoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(30))
            .connect(&config.connection_url())
            .await?;

        let test_db = Self {
            _container: container,
            config,
            pool,
        };
        test_db.init_schema().await?;
        Ok(test_db)
    }

    async fn init_schema(&self) -> TestResult<()> {
        let schema = include_str!("../../../migrations/20250101_000001_case_overview_schema.sql");
        sqlx::raw_sql(schema).execute(&self.pool).await?;
        Ok(())
    }

    /// Returns a reference to the connection pool
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Clears all data from the database while preserving the schema
    pub async fn clear_data(&self) -> TestResult<()> {
        sqlx::raw_sql(
            "TRUNCATE TABLE work_logs, medical_bills, health_adjusters, auto_adjusters, \
             health_claims, third_party_claims, first_party_claims, defendants, clients, \
             health_insurance, auto_insurance_complete, auto_insurance, casefiles CASCADE",
        )
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Inserts every row of an in-memory scenario
    ///
    /// Embedded carriers on defendants and claims are ignored; only the
    /// foreign keys are written, as the store would hold them.
    pub async fn seed(&self, tables: &MockTables) -> TestResult<()> {
        let pool = &self.pool;

        for case in tables.case_files.values() {
            sqlx::query(
                "INSERT INTO casefiles (id, created_at, title, status, stage, incident_date, statute_deadline, days_until_statute) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
            )
            .bind(case.id.get())
            .bind(case.created_at)
            .bind(&case.title)
            .bind(&case.status)
            .bind(&case.stage)
            .bind(case.incident_date)
            .bind(case.statute_deadline)
            .bind(case.days_until_statute.map(|d| d as i32))
            .execute(pool)
            .await?;
        }

        let carriers = [
            ("auto_insurance", &tables.auto_insurance),
            ("auto_insurance_complete", &tables.auto_insurance_complete),
            ("health_insurance", &tables.health_insurance),
        ];
        for (table, rows) in carriers {
            for insurer in rows.values() {
                sqlx::query(&format!(
                    "INSERT INTO {} (id, name, phone, email, address) VALUES ($1, $2, $3, $4, $5)",
                    table
                ))
                .bind(insurer.id.get())
                .bind(&insurer.name)
                .bind(&insurer.phone)
                .bind(&insurer.email)
                .bind(&insurer.address)
                .execute(pool)
                .await?;
            }
        }

        for client in &tables.clients {
            sqlx::query(
                "INSERT INTO clients (id, case_id, client_order, first_name, last_name, date_of_birth, phone, email, address, injuries) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)",
            )
            .bind(client.id.get())
            .bind(client.case_id.get())
            .bind(client.client_order)
            .bind(&client.first_name)
            .bind(&client.last_name)
            .bind(client.date_of_birth)
            .bind(&client.phone)
            .bind(&client.email)
            .bind(&client.address)
            .bind(&client.injuries)
            .execute(pool)
            .await?;
        }

        for defendant in &tables.defendants {
            sqlx::query(
                "INSERT INTO defendants (id, case_id, defendant_number, first_name, last_name, auto_insurance_id, policy_number, policy_limit, liability_percentage) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
            )
            .bind(defendant.id.get())
            .bind(defendant.case_id.get())
            .bind(defendant.defendant_number)
            .bind(&defendant.first_name)
            .bind(&defendant.last_name)
            .bind(defendant.insurer_ref.map(|i| i.get()))
            .bind(&defendant.policy_number)
            .bind(defendant.policy_limit)
            .bind(defendant.liability_percentage)
            .execute(pool)
            .await?;
        }

        for claim in &tables.first_party_claims {
            insert_claim(pool, "first_party_claims", "client_id", "auto_insurance_id", claim).await?;
        }
        for claim in &tables.third_party_claims {
            insert_claim(pool, "third_party_claims", "defendant_id", "auto_insurance_id", claim).await?;
        }
        for claim in &tables.health_claims {
            insert_claim(pool, "health_claims", "client_id", "health_insurance_id", claim).await?;
        }

        let adjusters = [
            ("auto_adjusters", "auto_insurance_id", &tables.auto_adjusters),
            ("health_adjusters", "health_insurance_id", &tables.health_adjusters),
        ];
        for (table, insurer_column, rows) in adjusters {
            for adjuster in rows {
                sqlx::query(&format!(
                    "INSERT INTO {} (id, first_name, last_name, phone, email, {}, claim_id) \
                     VALUES ($1, $2, $3, $4, $5, $6, $7)",
                    table, insurer_column
                ))
                .bind(adjuster.id.get())
                .bind(&adjuster.first_name)
                .bind(&adjuster.last_name)
                .bind(&adjuster.phone)
                .bind(&adjuster.email)
                .bind(adjuster.insurer_ref.map(|i| i.get()))
                .bind(adjuster.claim_ref.map(|c| c.get()))
                .execute(pool)
                .await?;
            }
        }

        for bill in &tables.medical_bills {
            sqlx::query(
                "INSERT INTO medical_bills (id, client_id, provider_id, provider_name, service_date, amount_billed, amount_paid, adjustments) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
            )
            .bind(bill.id.get())
            .bind(bill.client_id.get())
            .bind(bill.provider_id.map(|p| p.get()))
            .bind(&bill.provider_name)
            .bind(bill.service_date)
            .bind(bill.amount_billed)
            .bind(bill.amount_paid)
            .bind(bill.adjustments)
            .execute(pool)
            .await?;
        }

        for entry in &tables.work_logs {
            sqlx::query(
                "INSERT INTO work_logs (id, case_id, description, timestamp, actor) VALUES ($1, $2, $3, $4, $5)",
            )
            .bind(entry.id.get())
            .bind(entry.case_id.get())
            .bind(&entry.description)
            .bind(entry.timestamp)
            .bind(&entry.actor)
            .execute(pool)
            .await?;
        }

        Ok(())
    }
}

async fn insert_claim<O: Copy + Into<i64>>(
    pool: &PgPool,
    table: &str,
    owner_column: &str,
    insurer_column: &str,
    claim: &Claim<O>,
) -> TestResult<()> {
    sqlx::query(&format!(
        "INSERT INTO {} (id, {}, case_id, claim_number, policy_number, {}, coverage_limit, amount_paid, adjuster_name) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
        table, owner_column, insurer_column
    ))
    .bind(claim.id.get())
    .bind(claim.owner.map(Into::<i64>::into))
    .bind(claim.case_id.map(|c| c.get()))
    .bind(&claim.claim_number)
    .bind(&claim.policy_number)
    .bind(claim.insurer_ref.map(|i| i.get()))
    .bind(claim.coverage_limit)
    .bind(claim.amount_paid)
    .bind(&claim.adjuster_name)
    .execute(pool)
    .await?;
    Ok(())
}

/// Global test database for shared integration tests
static SHARED_TEST_DB: OnceCell<Arc<TestDatabase>> = OnceCell::const_new();

/// Gets or creates a shared test database instance
///
/// # Panics
///
/// Panics if the database fails to initialize
pub async fn get_shared_test_database() -> Arc<TestDatabase> {
    SHARED_TEST_DB
        .get_or_init(|| async {
            Arc::new(
                TestDatabase::new()
                    .await
                    .expect("Failed to create shared test database"),
            )
        })
        .await
        .clone()
}

/// Creates an isolated test database for a single test
pub async fn create_isolated_test_database() -> TestResult<TestDatabase> {
    TestDatabase::new().await
}
