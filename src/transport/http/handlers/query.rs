use crate::error::AppError;
use crate::transport::http::handlers::common::{json_body, logged};
use crate::transport::http::types::{AppState, QueryRequest, QueryResponse};
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;

#[utoipa::path(
    post,
    path = "/query",
    request_body = QueryRequest,
    responses(
        (status = 200, description = "Rows returned by the statement (always rolled back)", body = QueryResponse),
        (status = 400, description = "Empty, overlong or malformed statement", body = ErrorBody),
        (status = 403, description = "Statement kind is not allowed", body = ErrorBody),
        (status = 504, description = "Statement exceeded the time limit", body = ErrorBody),
        (status = 500, description = "Database unavailable", body = ErrorBody)
    )
)]
pub async fn query_handler(
    State(state): State<AppState>,
    request: Result<Json<QueryRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let request =
        json_body(request, "{\"query\": \"SELECT ...\"}").map_err(|e| logged("query", None, e))?;

    let rowset = state
        .gateway
        .execute(&request.query)
        .await
        .map_err(|e| logged("query", None, e))?;

    Ok(Json(QueryResponse {
        results: rowset.rows,
        truncated: rowset.truncated,
    }))
}
