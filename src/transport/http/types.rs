use crate::app::database_service::DatabaseService;
use crate::domain::model::SalaryStructure;
use crate::domain::query::{JsonRow, StatementGateway};
use crate::infra::config::GatewayConfig;
use crate::storage::{DepartmentStore, EmployeeStore, SalaryStore};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Shared by every handler. All fields are cheap clones around the same pool.
#[derive(Clone)]
pub struct AppState {
    pub db_service: DatabaseService,
    pub gateway: StatementGateway,
    pub employees: EmployeeStore,
    pub departments: DepartmentStore,
    pub salaries: SalaryStore,
}

impl AppState {
    pub fn new(db_service: DatabaseService, gateway_config: &GatewayConfig) -> Self {
        let pool = db_service.pool().clone();
        Self {
            gateway: StatementGateway::new(pool.clone(), gateway_config),
            employees: EmployeeStore::new(pool.clone()),
            departments: DepartmentStore::new(pool.clone()),
            salaries: SalaryStore::new(pool),
            db_service,
        }
    }
}

#[derive(Deserialize, Debug, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct QueryRequest {
    /// A single read-only SQL statement.
    #[serde(default)]
    #[schema(example = "SELECT * FROM \"Employee\"")]
    pub query: String,
}

#[derive(Serialize, Debug, ToSchema)]
pub struct QueryResponse {
    #[schema(value_type = Vec<Object>)]
    pub results: Vec<JsonRow>,
    /// True when rows beyond the configured cap were dropped.
    pub truncated: bool,
}

#[derive(Serialize, Debug, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Serialize, Debug, ToSchema)]
pub struct EmployeeCreatedResponse {
    pub message: String,
    #[serde(rename = "insertId")]
    pub insert_id: i32,
}

#[derive(Serialize, Debug, ToSchema)]
pub struct DepartmentCreatedResponse {
    pub message: String,
    #[serde(rename = "departmentId")]
    pub department_id: i32,
}

#[derive(Serialize, Debug, ToSchema)]
pub struct SalaryCreatedResponse {
    pub message: String,
    #[serde(rename = "salaryStructureId")]
    pub salary_structure_id: i32,
}

#[derive(Serialize, Debug, ToSchema)]
pub struct SalaryResponse {
    pub salary: SalaryStructure,
}

#[derive(Serialize, Debug, ToSchema)]
pub struct HealthResponse {
    pub status: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
