//! Connection pool lifecycle.
//!
//! `DatabaseService` is created once before the first request is served and shared (cloned)
//! by every handler and by the query gateway. Closing it drains the pool at shutdown.
//!
//! The relational schema is owned by whoever operates the database. The DDL below mirrors that
//! contract and is only applied on explicit request (`preflight --apply-schema`, tests).

use crate::infra::config::DatabaseConfig;
use sqlx::postgres::PgPoolOptions;
use sqlx::{Executor, PgPool};

/// Tables the API reads and writes.
pub const MANAGED_TABLES: &[&str] = &["Department", "Employee", "SalaryStructure"];

/// PostgreSQL DDL for the managed tables.
///
/// Deleting a department clears `Employee.DepartmentID`; deleting an employee that still has
/// salary history is refused (SQLSTATE 23503, surfaced as a conflict).
pub const SCHEMA_DDL: &str = r#"
CREATE TABLE IF NOT EXISTS "Department" (
    "DepartmentID" SERIAL PRIMARY KEY,
    "DepartmentName" TEXT NOT NULL CHECK ("DepartmentName" <> ''),
    "ManagerID" INTEGER
);

CREATE TABLE IF NOT EXISTS "Employee" (
    "EmployeeID" SERIAL PRIMARY KEY,
    "FirstName" TEXT NOT NULL,
    "LastName" TEXT NOT NULL,
    "Email" TEXT NOT NULL UNIQUE CHECK ("Email" <> ''),
    "Phone" TEXT,
    "DateOfJoining" DATE,
    "DepartmentID" INTEGER REFERENCES "Department" ("DepartmentID") ON DELETE SET NULL,
    "Position" TEXT
);

CREATE TABLE IF NOT EXISTS "SalaryStructure" (
    "SalaryStructureID" SERIAL PRIMARY KEY,
    "EmployeeID" INTEGER NOT NULL REFERENCES "Employee" ("EmployeeID") ON DELETE RESTRICT,
    "BasicSalary" NUMERIC(12, 2) NOT NULL CHECK ("BasicSalary" >= 0),
    "Allowances" NUMERIC(12, 2) NOT NULL CHECK ("Allowances" >= 0),
    "EffectiveFrom" DATE NOT NULL,
    "EffectiveTo" DATE
);

CREATE INDEX IF NOT EXISTS "SalaryStructure_EmployeeID_EffectiveFrom_idx"
    ON "SalaryStructure" ("EmployeeID", "EffectiveFrom" DESC);
"#;

/// Serializes concurrent schema bootstraps (parallel test binaries, several preflight runs).
const SCHEMA_LOCK_ID: i64 = 7_310_001;

/// Owns the process-wide PostgreSQL pool.
#[derive(Clone)]
pub struct DatabaseService {
    pool: PgPool,
}

impl DatabaseService {
    /// Connects to the database described by `config`.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, anyhow::Error> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(config.acquire_timeout)
            .test_before_acquire(true)
            .connect(&config.url)
            .await?;

        tracing::info!(
            max_connections = config.max_connections,
            "database pool initialized"
        );
        Ok(Self { pool })
    }

    /// Wraps an existing pool (tests, embedding).
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Creates the managed tables if they are missing.
    pub async fn apply_schema(&self) -> Result<(), anyhow::Error> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("SELECT pg_advisory_xact_lock($1)")
            .bind(SCHEMA_LOCK_ID)
            .execute(&mut *tx)
            .await?;
        // Multi-statement text goes through the simple query protocol.
        (&mut *tx).execute(SCHEMA_DDL).await?;
        tx.commit().await?;
        tracing::info!("schema applied");
        Ok(())
    }

    /// Returns the managed tables that do not exist in the current schema.
    pub async fn missing_tables(&self) -> Result<Vec<String>, anyhow::Error> {
        let mut missing = Vec::new();
        for table in MANAGED_TABLES {
            let exists: bool = sqlx::query_scalar(
                "SELECT EXISTS (
                    SELECT 1 FROM information_schema.tables
                    WHERE table_schema = current_schema() AND table_name = $1
                )",
            )
            .bind(*table)
            .fetch_one(&self.pool)
            .await?;
            if !exists {
                missing.push(table.to_string());
            }
        }
        Ok(missing)
    }

    /// Closes every connection. Requests still holding a connection finish first.
    pub async fn close(&self) {
        self.pool.close().await;
        tracing::info!("database pool closed");
    }
}
