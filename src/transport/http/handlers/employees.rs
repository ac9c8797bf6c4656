use crate::domain::model::{EmployeePayload, EmployeeWithDepartment};
use crate::error::AppError;
use crate::transport::http::handlers::common::{json_body, logged, path_id};
use crate::transport::http::types::{AppState, EmployeeCreatedResponse, MessageResponse};
use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::Json;

const EXPECTED: &str = "{\"FirstName\", \"LastName\", \"Email\", \"Phone\"?, \"DateOfJoining\"?, \"DepartmentID\"?, \"Position\"?}";

#[utoipa::path(
    get,
    path = "/employees",
    responses(
        (status = 200, description = "All employees with their department name", body = [EmployeeWithDepartment]),
        (status = 500, description = "Internal server error", body = ErrorBody)
    )
)]
pub async fn list_employees_handler(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let rows = state
        .employees
        .list()
        .await
        .map_err(|e| logged("list_employees", None, e))?;
    Ok(Json(rows))
}

#[utoipa::path(
    post,
    path = "/add-employee",
    request_body = EmployeePayload,
    responses(
        (status = 200, description = "Employee created", body = EmployeeCreatedResponse),
        (status = 400, description = "Missing or invalid fields", body = ErrorBody),
        (status = 409, description = "Duplicate email or unknown department", body = ErrorBody),
        (status = 500, description = "Internal server error", body = ErrorBody)
    )
)]
pub async fn add_employee_handler(
    State(state): State<AppState>,
    request: Result<Json<EmployeePayload>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let input = json_body(request, EXPECTED)
        .and_then(|payload| payload.validate())
        .map_err(|e| logged("add_employee", None, e))?;

    let id = state
        .employees
        .create(&input)
        .await
        .map_err(|e| logged("add_employee", None, e))?;

    tracing::info!(employee_id = id, "employee added");
    Ok(Json(EmployeeCreatedResponse {
        message: "Employee added".to_string(),
        insert_id: id,
    }))
}

#[utoipa::path(
    put,
    path = "/employee/{id}",
    params(("id" = i32, Path, description = "Employee id")),
    request_body = EmployeePayload,
    responses(
        (status = 200, description = "Employee updated", body = MessageResponse),
        (status = 400, description = "Missing or invalid fields", body = ErrorBody),
        (status = 404, description = "Employee not found", body = ErrorBody),
        (status = 409, description = "Duplicate email or unknown department", body = ErrorBody),
        (status = 500, description = "Internal server error", body = ErrorBody)
    )
)]
pub async fn update_employee_handler(
    State(state): State<AppState>,
    path: Result<Path<i32>, PathRejection>,
    request: Result<Json<EmployeePayload>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let id = path_id(path, "id").map_err(|e| logged("update_employee", None, e))?;
    let input = json_body(request, EXPECTED)
        .and_then(|payload| payload.validate())
        .map_err(|e| logged("update_employee", Some(id), e))?;

    state
        .employees
        .update(id, &input)
        .await
        .map_err(|e| logged("update_employee", Some(id), e))?;

    tracing::info!(employee_id = id, "employee updated");
    Ok(Json(MessageResponse::new("Employee updated")))
}

#[utoipa::path(
    delete,
    path = "/employee/{id}",
    params(("id" = i32, Path, description = "Employee id")),
    responses(
        (status = 200, description = "Employee deleted", body = MessageResponse),
        (status = 404, description = "Employee not found", body = ErrorBody),
        (status = 409, description = "Employee still has salary records", body = ErrorBody),
        (status = 500, description = "Internal server error", body = ErrorBody)
    )
)]
pub async fn delete_employee_handler(
    State(state): State<AppState>,
    path: Result<Path<i32>, PathRejection>,
) -> Result<impl IntoResponse, AppError> {
    let id = path_id(path, "id").map_err(|e| logged("delete_employee", None, e))?;

    state
        .employees
        .delete(id)
        .await
        .map_err(|e| logged("delete_employee", Some(id), e))?;

    tracing::info!(employee_id = id, "employee deleted");
    Ok(Json(MessageResponse::new("Employee deleted")))
}
