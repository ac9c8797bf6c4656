use crate::error::{AppError, AppResult};
use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::Path;
use axum::Json;

/// Unwraps a JSON body, turning extractor rejections (bad syntax, wrong types, unknown
/// fields) into a validation error.
pub fn json_body<T>(request: Result<Json<T>, JsonRejection>, expected: &str) -> AppResult<T> {
    match request {
        Ok(Json(body)) => Ok(body),
        Err(e) => Err(AppError::Validation(format!(
            "Invalid JSON body: {} (expected: {})",
            e.body_text(),
            expected
        ))),
    }
}

pub fn path_id(path: Result<Path<i32>, PathRejection>, name: &str) -> AppResult<i32> {
    match path {
        Ok(Path(id)) => Ok(id),
        Err(_) => Err(AppError::Validation(format!("{} must be an integer", name))),
    }
}

/// Logs a failed operation with its identity and error kind, then hands the error back.
pub fn logged(operation: &'static str, id: Option<i32>, err: AppError) -> AppError {
    let detail = err.detail().unwrap_or_default();
    if err.is_server_error() {
        tracing::error!(operation, id, kind = err.kind(), error = %err, detail, "request failed");
    } else {
        tracing::warn!(operation, id, kind = err.kind(), error = %err, detail, "request rejected");
    }
    err
}
