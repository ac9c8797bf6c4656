//! Error taxonomy shared by the CRUD handlers and the query gateway.
//!
//! Store failures are classified by SQLSTATE and turned into one of the variants below.
//! The raw database message is kept in `detail` for logs; it only reaches the client in
//! debug builds (the `details` field of the JSON body).

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;

#[derive(Debug, Error)]
pub enum AppError {
    /// Client input is missing or malformed.
    #[error("{0}")]
    Validation(String),
    /// The ad-hoc statement is not allowed to run.
    #[error("{message}")]
    PolicyViolation { message: String, detail: Option<String> },
    /// The store rejected the statement text.
    #[error("statement rejected by the database (SQLSTATE {code})")]
    Syntax { code: String, detail: String },
    #[error("{0}")]
    NotFound(String),
    /// Foreign-key, unique, not-null or check violation.
    #[error("{message}")]
    Conflict { message: String, detail: String },
    #[error("statement exceeded the configured time limit")]
    Timeout { detail: String },
    #[error("database unavailable")]
    Connection { detail: String },
    #[error("internal database error")]
    Internal { detail: String },
}

/// Coarse classification of a SQLSTATE code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SqlStateClass {
    /// 57014: statement_timeout fired (or the statement was cancelled).
    Canceled,
    /// 25006 / 42501: the session may not perform this statement.
    Forbidden,
    /// Class 42 apart from 42501.
    Syntax,
    /// Class 22.
    DataException,
    /// Class 23.
    IntegrityViolation,
    /// Classes 08, 53, 57P0x.
    Unavailable,
    Other,
}

pub fn classify_sqlstate(code: &str) -> SqlStateClass {
    match code {
        "57014" => SqlStateClass::Canceled,
        "25006" | "42501" => SqlStateClass::Forbidden,
        c if c.starts_with("57P") => SqlStateClass::Unavailable,
        c if c.starts_with("42") => SqlStateClass::Syntax,
        c if c.starts_with("22") => SqlStateClass::DataException,
        c if c.starts_with("23") => SqlStateClass::IntegrityViolation,
        c if c.starts_with("08") || c.starts_with("53") => SqlStateClass::Unavailable,
        _ => SqlStateClass::Other,
    }
}

/// Client-facing message for an integrity violation.
pub fn conflict_message(code: &str) -> &'static str {
    match code {
        "23503" => "referenced record does not exist or is still referenced",
        "23505" => "a record with the same unique value already exists",
        "23502" => "a required value is missing",
        "23514" => "a value violates a check constraint",
        _ => "the change conflicts with existing data",
    }
}

impl AppError {
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "ValidationError",
            AppError::PolicyViolation { .. } => "PolicyViolation",
            AppError::Syntax { .. } => "SyntaxError",
            AppError::NotFound(_) => "NotFound",
            AppError::Conflict { .. } => "ConflictError",
            AppError::Timeout { .. } => "TimeoutError",
            AppError::Connection { .. } => "ConnectionError",
            AppError::Internal { .. } => "InternalError",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) | AppError::Syntax { .. } => StatusCode::BAD_REQUEST,
            AppError::PolicyViolation { .. } => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict { .. } => StatusCode::CONFLICT,
            AppError::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
            AppError::Connection { .. } | AppError::Internal { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Raw store text, if any. Never part of `Display`.
    pub fn detail(&self) -> Option<&str> {
        match self {
            AppError::PolicyViolation { detail, .. } => detail.as_deref(),
            AppError::Syntax { detail, .. }
            | AppError::Conflict { detail, .. }
            | AppError::Timeout { detail }
            | AppError::Connection { detail }
            | AppError::Internal { detail } => Some(detail.as_str()),
            AppError::Validation(_) | AppError::NotFound(_) => None,
        }
    }

    pub fn is_server_error(&self) -> bool {
        self.status().is_server_error()
    }

    pub fn policy(message: impl Into<String>) -> Self {
        AppError::PolicyViolation {
            message: message.into(),
            detail: None,
        }
    }

    fn from_database(db_err: &dyn sqlx::error::DatabaseError) -> Self {
        let code = db_err.code().map(|c| c.into_owned()).unwrap_or_default();
        let detail = db_err.message().to_string();
        match classify_sqlstate(&code) {
            SqlStateClass::Canceled => AppError::Timeout { detail },
            SqlStateClass::Forbidden => AppError::PolicyViolation {
                message: "statement is not permitted".to_string(),
                detail: Some(detail),
            },
            SqlStateClass::Syntax => AppError::Syntax { code, detail },
            SqlStateClass::DataException => {
                AppError::Validation(format!("value rejected by the database (SQLSTATE {})", code))
            }
            SqlStateClass::IntegrityViolation => AppError::Conflict {
                message: conflict_message(&code).to_string(),
                detail,
            },
            SqlStateClass::Unavailable => AppError::Connection { detail },
            SqlStateClass::Other => AppError::Internal { detail },
        }
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::Database(db_err) => AppError::from_database(db_err.as_ref()),
            sqlx::Error::RowNotFound => AppError::NotFound("record not found".to_string()),
            sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::WorkerCrashed
            | sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::Protocol(_) => AppError::Connection {
                detail: err.to_string(),
            },
            _ => AppError::Internal {
                detail: err.to_string(),
            },
        }
    }
}

/// JSON body of every failed request.
#[derive(Serialize, Debug, ToSchema)]
pub struct ErrorBody {
    pub error: String,
    pub kind: String,
    /// Raw store message; only present in debug builds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let details = if cfg!(debug_assertions) {
            self.detail().map(str::to_string)
        } else {
            None
        };
        let body = ErrorBody {
            error: self.to_string(),
            kind: self.kind().to_string(),
            details,
        };
        (self.status(), Json(body)).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sqlstate_classes() {
        assert_eq!(classify_sqlstate("57014"), SqlStateClass::Canceled);
        assert_eq!(classify_sqlstate("25006"), SqlStateClass::Forbidden);
        assert_eq!(classify_sqlstate("42501"), SqlStateClass::Forbidden);
        assert_eq!(classify_sqlstate("42601"), SqlStateClass::Syntax);
        assert_eq!(classify_sqlstate("42P01"), SqlStateClass::Syntax);
        assert_eq!(classify_sqlstate("22007"), SqlStateClass::DataException);
        assert_eq!(classify_sqlstate("23503"), SqlStateClass::IntegrityViolation);
        assert_eq!(classify_sqlstate("08006"), SqlStateClass::Unavailable);
        assert_eq!(classify_sqlstate("57P01"), SqlStateClass::Unavailable);
        assert_eq!(classify_sqlstate("XX000"), SqlStateClass::Other);
    }

    #[test]
    fn status_mapping_follows_taxonomy() {
        assert_eq!(AppError::Validation("x".into()).status(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::policy("no").status(), StatusCode::FORBIDDEN);
        assert_eq!(AppError::NotFound("x".into()).status(), StatusCode::NOT_FOUND);
        assert_eq!(
            AppError::Timeout { detail: String::new() }.status(),
            StatusCode::GATEWAY_TIMEOUT
        );
        assert_eq!(
            AppError::Conflict { message: "c".into(), detail: String::new() }.status(),
            StatusCode::CONFLICT
        );
        assert!(AppError::Connection { detail: String::new() }.is_server_error());
    }

    #[test]
    fn display_never_contains_store_text() {
        let err = AppError::Syntax {
            code: "42P01".into(),
            detail: "relation \"secret_table\" does not exist".into(),
        };
        assert!(!err.to_string().contains("secret_table"));
        assert_eq!(err.kind(), "SyntaxError");
        assert!(err.detail().unwrap().contains("secret_table"));
    }

    #[test]
    fn pool_timeout_is_a_connection_error() {
        let err: AppError = sqlx::Error::PoolTimedOut.into();
        assert_eq!(err.kind(), "ConnectionError");
    }
}
