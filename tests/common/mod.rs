//! Shared harness: serves the router on an ephemeral port against `DATABASE_URL`.
//!
//! Tests return early (and pass) when `DATABASE_URL` is not set.

#![allow(dead_code)]

use reqwest::StatusCode;
use salary_management_api::infra::logging::init_tracing;
use salary_management_api::transport::http::{create_router, AppState};
use salary_management_api::{DatabaseConfig, DatabaseService, GatewayConfig};
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::task::JoinHandle;

pub struct TestServer {
    pub base_url: String,
    pub client: reqwest::Client,
    pub db: DatabaseService,
    handle: JoinHandle<()>,
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

pub async fn start_server(gateway: GatewayConfig) -> anyhow::Result<Option<TestServer>> {
    dotenv::dotenv().ok();
    if std::env::var("DATABASE_URL").is_err() {
        eprintln!("DATABASE_URL not set; skipping");
        return Ok(None);
    }
    init_tracing();

    let mut db_config = DatabaseConfig::from_env()?;
    db_config.max_connections = 3;
    let db = DatabaseService::connect(&db_config).await?;
    db.apply_schema().await?;

    let router = create_router(AppState::new(db.clone(), &gateway));

    // Ephemeral port, so a running api_server does not conflict.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let port = listener.local_addr()?.port();
    let handle = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, router).await {
            eprintln!("test server stopped: {}", e);
        }
    });

    Ok(Some(TestServer {
        base_url: format!("http://127.0.0.1:{}", port),
        client: reqwest::Client::new(),
        db,
        handle,
    }))
}

/// Distinct per call and per process, for unique emails and names in a shared database.
pub fn unique_suffix() -> String {
    static COUNTER: AtomicU64 = AtomicU64::new(0);
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or_default();
    format!(
        "{}-{}-{}",
        std::process::id(),
        nanos,
        COUNTER.fetch_add(1, Ordering::Relaxed)
    )
}

impl TestServer {
    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn finish(resp: reqwest::Response) -> anyhow::Result<(StatusCode, Value)> {
        let status = resp.status();
        let body = resp.json::<Value>().await?;
        Ok((status, body))
    }

    pub async fn get(&self, path: &str) -> anyhow::Result<(StatusCode, Value)> {
        Self::finish(self.client.get(self.url(path)).send().await?).await
    }

    pub async fn post(&self, path: &str, body: &Value) -> anyhow::Result<(StatusCode, Value)> {
        Self::finish(self.client.post(self.url(path)).json(body).send().await?).await
    }

    pub async fn put(&self, path: &str, body: &Value) -> anyhow::Result<(StatusCode, Value)> {
        Self::finish(self.client.put(self.url(path)).json(body).send().await?).await
    }

    pub async fn delete(&self, path: &str) -> anyhow::Result<(StatusCode, Value)> {
        Self::finish(self.client.delete(self.url(path)).send().await?).await
    }

    pub async fn query(&self, sql: &str) -> anyhow::Result<(StatusCode, Value)> {
        self.post("/query", &serde_json::json!({ "query": sql })).await
    }

    /// Creates a department and returns its id.
    pub async fn create_department(&self, name: &str) -> anyhow::Result<i64> {
        let (status, body) = self
            .post("/department", &serde_json::json!({ "DepartmentName": name }))
            .await?;
        anyhow::ensure!(status == StatusCode::CREATED, "create department: {} {}", status, body);
        body["departmentId"]
            .as_i64()
            .ok_or_else(|| anyhow::anyhow!("missing departmentId in {}", body))
    }

    /// Creates an employee with a unique email and returns its id.
    pub async fn create_employee(&self, department_id: Option<i64>) -> anyhow::Result<i64> {
        let (status, body) = self
            .post(
                "/add-employee",
                &serde_json::json!({
                    "FirstName": "Ada",
                    "LastName": "Lovelace",
                    "Email": format!("ada-{}@example.com", unique_suffix()),
                    "Phone": "555-0100",
                    "DateOfJoining": "2024-01-15",
                    "Position": "Engineer",
                    "DepartmentID": department_id,
                }),
            )
            .await?;
        anyhow::ensure!(status == StatusCode::OK, "create employee: {} {}", status, body);
        body["insertId"]
            .as_i64()
            .ok_or_else(|| anyhow::anyhow!("missing insertId in {}", body))
    }
}
