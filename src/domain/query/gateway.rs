//! The Statement Gateway: runs one admitted ad-hoc statement and returns its rows.
//!
//! Every statement runs inside `BEGIN; SET TRANSACTION READ ONLY; ...; ROLLBACK`, with a
//! transaction-local `statement_timeout` so the store itself aborts long statements. The
//! text is sent through the extended protocol, which the server refuses for anything but a
//! single command. Queries are opened as a cursor and fetched up to the row cap, so the
//! server stops producing rows once the cap is reached.
//!
//! Rolling back does not undo session-level advisory locks; they are released before the
//! connection goes back to the pool. A client-side deadline slightly longer than the
//! statement timeout covers an unresponsive server; when it fires (or the session cannot
//! be reset) the connection is detached from the pool and dropped instead of being reused.

use super::policy::{Admitted, QueryPolicy};
use super::rowset::{row_to_json, Rowset};
use crate::error::{classify_sqlstate, AppError, SqlStateClass};
use crate::infra::config::GatewayConfig;
use futures::TryStreamExt;
use sqlx::{Connection, PgConnection, PgPool};
use std::time::{Duration, Instant};

/// Extra time granted to the store to report its own timeout before the client gives up.
const CLIENT_DEADLINE_GRACE: Duration = Duration::from_millis(500);

/// Statements that can be declared as a cursor.
const CURSOR_KEYWORDS: &[&str] = &["SELECT", "WITH", "VALUES", "TABLE"];

const CURSOR_NAME: &str = "gateway_rows";

#[derive(Clone)]
pub struct StatementGateway {
    pool: PgPool,
    policy: QueryPolicy,
    max_rows: usize,
    timeout: Duration,
}

/// Store errors seen by the gateway. Data exceptions (bad casts, division by zero) are a
/// property of the submitted text, so they are reported as syntax errors. Cursors refuse
/// data-modifying `WITH` clauses with 0A000, which is a policy matter here.
fn gateway_error(err: sqlx::Error) -> AppError {
    if let sqlx::Error::Database(db_err) = &err {
        if let Some(code) = db_err.code() {
            if code == "0A000" {
                return AppError::PolicyViolation {
                    message: "statement is not permitted".to_string(),
                    detail: Some(db_err.message().to_string()),
                };
            }
            if classify_sqlstate(&code) == SqlStateClass::DataException {
                return AppError::Syntax {
                    code: code.into_owned(),
                    detail: db_err.message().to_string(),
                };
            }
        }
    }
    AppError::from(err)
}

/// Declares the statement as a cursor and fetches one row past the cap.
async fn fetch_through_cursor(
    conn: &mut PgConnection,
    statement: &str,
    max_rows: usize,
) -> Result<Rowset, AppError> {
    let declare = format!("DECLARE {} NO SCROLL CURSOR FOR\n{}", CURSOR_NAME, statement);
    sqlx::query(&declare)
        .persistent(false)
        .execute(&mut *conn)
        .await
        .map_err(gateway_error)?;

    let fetch = format!("FETCH FORWARD {} FROM {}", max_rows.saturating_add(1), CURSOR_NAME);
    let rows = sqlx::query(&fetch)
        .persistent(false)
        .fetch_all(&mut *conn)
        .await
        .map_err(gateway_error)?;

    let mut rowset = Rowset {
        rows: Vec::with_capacity(rows.len().min(max_rows)),
        truncated: rows.len() > max_rows,
    };
    for row in rows.iter().take(max_rows) {
        rowset.rows.push(row_to_json(row).map_err(AppError::from)?);
    }
    Ok(rowset)
}

/// Runs statements that cannot be a cursor (`SHOW`, other configured keywords).
async fn fetch_direct(
    conn: &mut PgConnection,
    statement: &str,
    max_rows: usize,
) -> Result<Rowset, AppError> {
    let mut rowset = Rowset::default();
    let mut stream = sqlx::query(statement).persistent(false).fetch(&mut *conn);
    while let Some(row) = stream.try_next().await.map_err(gateway_error)? {
        if rowset.rows.len() == max_rows {
            rowset.truncated = true;
            break;
        }
        rowset.rows.push(row_to_json(&row).map_err(AppError::from)?);
    }
    Ok(rowset)
}

async fn run_read_only(
    conn: &mut PgConnection,
    admitted: Admitted<'_>,
    max_rows: usize,
    timeout: Duration,
) -> Result<Rowset, AppError> {
    let mut tx = conn.begin().await.map_err(gateway_error)?;

    sqlx::query("SET TRANSACTION READ ONLY")
        .execute(&mut *tx)
        .await
        .map_err(gateway_error)?;
    sqlx::query("SELECT set_config('statement_timeout', $1, true)")
        .bind(format!("{}ms", timeout.as_millis()))
        .execute(&mut *tx)
        .await
        .map_err(gateway_error)?;

    let fetched = if CURSOR_KEYWORDS.contains(&admitted.keyword) {
        fetch_through_cursor(&mut tx, admitted.statement, max_rows).await
    } else {
        fetch_direct(&mut tx, admitted.statement, max_rows).await
    };

    // Never commit, whatever the outcome.
    let rolled_back = tx.rollback().await;
    let rowset = fetched?;
    rolled_back.map_err(gateway_error)?;
    Ok(rowset)
}

/// Drops session state a rolled-back transaction leaves behind.
async fn reset_session(conn: &mut PgConnection) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT pg_advisory_unlock_all()")
        .execute(conn)
        .await?;
    Ok(())
}

impl StatementGateway {
    pub fn new(pool: PgPool, config: &GatewayConfig) -> Self {
        Self {
            pool,
            policy: QueryPolicy::new(config),
            max_rows: config.max_rows,
            timeout: config.timeout,
        }
    }

    pub fn policy(&self) -> &QueryPolicy {
        &self.policy
    }

    /// Validates and runs `statement_text`, returning at most `max_rows` rows.
    pub async fn execute(&self, statement_text: &str) -> Result<Rowset, AppError> {
        let admitted = self.policy.check(statement_text)?;
        let started = Instant::now();

        let mut conn = self.pool.acquire().await.map_err(AppError::from)?;
        let deadline = self.timeout + CLIENT_DEADLINE_GRACE;
        let outcome = tokio::time::timeout(
            deadline,
            run_read_only(&mut conn, admitted, self.max_rows, self.timeout),
        )
        .await;

        let result = match outcome {
            Ok(result) => {
                if let Err(e) = reset_session(&mut conn).await {
                    tracing::warn!(error = %e, "session reset failed; discarding connection");
                    drop(conn.detach());
                }
                result
            }
            Err(_) => {
                // The connection may still be inside the statement; keep it out of the pool.
                drop(conn.detach());
                Err(AppError::Timeout {
                    detail: format!("no response within {} ms", deadline.as_millis()),
                })
            }
        };

        let elapsed_ms = started.elapsed().as_millis() as u64;
        match &result {
            Ok(rowset) => tracing::info!(
                keyword = admitted.keyword,
                rows = rowset.rows.len(),
                truncated = rowset.truncated,
                elapsed_ms,
                "ad-hoc query executed"
            ),
            Err(e) => tracing::warn!(
                keyword = admitted.keyword,
                kind = e.kind(),
                elapsed_ms,
                detail = e.detail().unwrap_or_default(),
                "ad-hoc query failed"
            ),
        }
        result
    }
}
