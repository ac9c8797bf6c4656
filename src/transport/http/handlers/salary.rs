use crate::domain::model::{SalaryCreatePayload, SalaryUpdatePayload};
use crate::error::AppError;
use crate::transport::http::handlers::common::{json_body, logged, path_id};
use crate::transport::http::types::{
    AppState, MessageResponse, SalaryCreatedResponse, SalaryResponse,
};
use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;

#[utoipa::path(
    get,
    path = "/salary/{employeeId}",
    params(("employeeId" = i32, Path, description = "Employee id")),
    responses(
        (status = 200, description = "Current salary (latest EffectiveFrom)", body = SalaryResponse),
        (status = 404, description = "No salary record for this employee", body = ErrorBody),
        (status = 500, description = "Internal server error", body = ErrorBody)
    )
)]
pub async fn get_salary_handler(
    State(state): State<AppState>,
    path: Result<Path<i32>, PathRejection>,
) -> Result<impl IntoResponse, AppError> {
    let employee_id = path_id(path, "employeeId").map_err(|e| logged("get_salary", None, e))?;

    let salary = state
        .salaries
        .latest_for_employee(employee_id)
        .await
        .and_then(|row| {
            row.ok_or_else(|| AppError::NotFound("No salary record found".to_string()))
        })
        .map_err(|e| logged("get_salary", Some(employee_id), e))?;

    Ok(Json(SalaryResponse { salary }))
}

#[utoipa::path(
    post,
    path = "/salary",
    request_body = SalaryCreatePayload,
    responses(
        (status = 201, description = "Salary record created", body = SalaryCreatedResponse),
        (status = 400, description = "Missing or invalid fields", body = ErrorBody),
        (status = 409, description = "Unknown employee", body = ErrorBody),
        (status = 500, description = "Internal server error", body = ErrorBody)
    )
)]
pub async fn create_salary_handler(
    State(state): State<AppState>,
    request: Result<Json<SalaryCreatePayload>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let input = json_body(
        request,
        "{\"EmployeeID\", \"BasicSalary\", \"Allowances\", \"EffectiveFrom\", \"EffectiveTo\"?}",
    )
    .and_then(|payload| payload.validate())
    .map_err(|e| logged("create_salary", None, e))?;

    let id = state
        .salaries
        .create(&input)
        .await
        .map_err(|e| logged("create_salary", Some(input.employee_id), e))?;

    tracing::info!(salary_structure_id = id, employee_id = input.employee_id, "salary record added");
    Ok((
        StatusCode::CREATED,
        Json(SalaryCreatedResponse {
            message: "Salary record added".to_string(),
            salary_structure_id: id,
        }),
    ))
}

#[utoipa::path(
    put,
    path = "/salary/{id}",
    params(("id" = i32, Path, description = "Salary record id")),
    request_body = SalaryUpdatePayload,
    responses(
        (status = 200, description = "Salary record updated", body = MessageResponse),
        (status = 400, description = "Missing or invalid fields", body = ErrorBody),
        (status = 404, description = "Salary record not found", body = ErrorBody),
        (status = 500, description = "Internal server error", body = ErrorBody)
    )
)]
pub async fn update_salary_handler(
    State(state): State<AppState>,
    path: Result<Path<i32>, PathRejection>,
    request: Result<Json<SalaryUpdatePayload>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let id = path_id(path, "id").map_err(|e| logged("update_salary", None, e))?;
    let terms = json_body(
        request,
        "{\"BasicSalary\", \"Allowances\", \"EffectiveFrom\", \"EffectiveTo\"?}",
    )
    .and_then(|payload| payload.validate())
    .map_err(|e| logged("update_salary", Some(id), e))?;

    state
        .salaries
        .update(id, &terms)
        .await
        .map_err(|e| logged("update_salary", Some(id), e))?;

    tracing::info!(salary_structure_id = id, "salary record updated");
    Ok(Json(MessageResponse::new("Salary updated")))
}

#[utoipa::path(
    delete,
    path = "/salary/{id}",
    params(("id" = i32, Path, description = "Salary record id")),
    responses(
        (status = 200, description = "Salary record deleted", body = MessageResponse),
        (status = 404, description = "Salary record not found", body = ErrorBody),
        (status = 500, description = "Internal server error", body = ErrorBody)
    )
)]
pub async fn delete_salary_handler(
    State(state): State<AppState>,
    path: Result<Path<i32>, PathRejection>,
) -> Result<impl IntoResponse, AppError> {
    let id = path_id(path, "id").map_err(|e| logged("delete_salary", None, e))?;

    state
        .salaries
        .delete(id)
        .await
        .map_err(|e| logged("delete_salary", Some(id), e))?;

    tracing::info!(salary_structure_id = id, "salary record deleted");
    Ok(Json(MessageResponse::new("Salary deleted")))
}
