use crate::domain::model::{Department, DepartmentPayload};
use crate::error::AppError;
use crate::transport::http::handlers::common::{json_body, logged, path_id};
use crate::transport::http::types::{AppState, DepartmentCreatedResponse, MessageResponse};
use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;

const EXPECTED: &str = "{\"DepartmentName\", \"ManagerID\"?}";

#[utoipa::path(
    get,
    path = "/departments",
    responses(
        (status = 200, description = "All departments", body = [Department]),
        (status = 500, description = "Internal server error", body = ErrorBody)
    )
)]
pub async fn list_departments_handler(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let rows = state
        .departments
        .list()
        .await
        .map_err(|e| logged("list_departments", None, e))?;
    Ok(Json(rows))
}

#[utoipa::path(
    post,
    path = "/department",
    request_body = DepartmentPayload,
    responses(
        (status = 201, description = "Department created", body = DepartmentCreatedResponse),
        (status = 400, description = "Missing or invalid fields", body = ErrorBody),
        (status = 500, description = "Internal server error", body = ErrorBody)
    )
)]
pub async fn create_department_handler(
    State(state): State<AppState>,
    request: Result<Json<DepartmentPayload>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let input = json_body(request, EXPECTED)
        .and_then(|payload| payload.validate())
        .map_err(|e| logged("create_department", None, e))?;

    let id = state
        .departments
        .create(&input)
        .await
        .map_err(|e| logged("create_department", None, e))?;

    tracing::info!(department_id = id, "department added");
    Ok((
        StatusCode::CREATED,
        Json(DepartmentCreatedResponse {
            message: "Department added".to_string(),
            department_id: id,
        }),
    ))
}

#[utoipa::path(
    put,
    path = "/department/{id}",
    params(("id" = i32, Path, description = "Department id")),
    request_body = DepartmentPayload,
    responses(
        (status = 200, description = "Department updated", body = MessageResponse),
        (status = 400, description = "Missing or invalid fields", body = ErrorBody),
        (status = 404, description = "Department not found", body = ErrorBody),
        (status = 500, description = "Internal server error", body = ErrorBody)
    )
)]
pub async fn update_department_handler(
    State(state): State<AppState>,
    path: Result<Path<i32>, PathRejection>,
    request: Result<Json<DepartmentPayload>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let id = path_id(path, "id").map_err(|e| logged("update_department", None, e))?;
    let input = json_body(request, EXPECTED)
        .and_then(|payload| payload.validate())
        .map_err(|e| logged("update_department", Some(id), e))?;

    state
        .departments
        .update(id, &input)
        .await
        .map_err(|e| logged("update_department", Some(id), e))?;

    tracing::info!(department_id = id, "department updated");
    Ok(Json(MessageResponse::new("Department updated")))
}

#[utoipa::path(
    delete,
    path = "/department/{id}",
    params(("id" = i32, Path, description = "Department id")),
    responses(
        (status = 200, description = "Department deleted", body = MessageResponse),
        (status = 404, description = "Department not found", body = ErrorBody),
        (status = 500, description = "Internal server error", body = ErrorBody)
    )
)]
pub async fn delete_department_handler(
    State(state): State<AppState>,
    path: Result<Path<i32>, PathRejection>,
) -> Result<impl IntoResponse, AppError> {
    let id = path_id(path, "id").map_err(|e| logged("delete_department", None, e))?;

    state
        .departments
        .delete(id)
        .await
        .map_err(|e| logged("delete_department", Some(id), e))?;

    tracing::info!(department_id = id, "department deleted");
    Ok(Json(MessageResponse::new("Department deleted")))
}
