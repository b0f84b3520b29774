use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use casting_core::error::CoreError;
use casting_core::repoint::RepairReport;
use casting_core::store::StoreError;
use serde_json::json;

/// Application-level error type for HTTP handlers.
///
/// Wraps [`CoreError`] for domain errors and adds HTTP-specific variants.
/// Implements [`IntoResponse`] to produce consistent JSON error responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A domain-level error from `casting_core`.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A database error from sqlx.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A bad request with a human-readable message.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// An internal error with a human-readable message.
    #[error("Internal error: {0}")]
    InternalError(String),

    /// A repair run stopped part-way. The report says what was applied.
    #[error("Repair stopped after a failed mapping")]
    PartialRepair(Box<RepairReport>),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        AppError::Core(CoreError::Store(err))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            // --- CoreError variants ---
            AppError::Core(core) => match core {
                CoreError::NotFound { entity, id } => (
                    StatusCode::NOT_FOUND,
                    "NOT_FOUND",
                    format!("{entity} with id {id} not found"),
                ),
                CoreError::Validation(msg) => {
                    (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone())
                }
                CoreError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg.clone()),
                CoreError::Internal(msg) => {
                    tracing::error!(error = %msg, "Internal core error");
                    internal()
                }
                CoreError::Store(err) => classify_store_error(err),
            },

            // --- Database errors ---
            AppError::Database(err) => classify_sqlx_error(err),

            // --- HTTP-specific errors ---
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),
            AppError::InternalError(msg) => {
                tracing::error!(error = %msg, "Internal error");
                internal()
            }
            AppError::PartialRepair(report) => {
                let message = report
                    .failure()
                    .map(|o| {
                        format!(
                            "Repair stopped at mapping {} -> {}; earlier mappings were applied",
                            o.old_role_id, o.new_role_id
                        )
                    })
                    .unwrap_or_else(|| "Repair did not complete".to_string());
                let body = json!({
                    "error": message,
                    "code": "PARTIAL_REPAIR",
                    "data": report,
                });
                return (StatusCode::INTERNAL_SERVER_ERROR, axum::Json(body)).into_response();
            }
        };

        let body = json!({
            "error": message,
            "code": code,
        });

        (status, axum::Json(body)).into_response()
    }
}

fn internal() -> (StatusCode, &'static str, String) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "INTERNAL_ERROR",
        "An internal error occurred".to_string(),
    )
}

/// Constraint name on submissions that makes `(user_id, role_id)` unique.
pub const UQ_SUBMISSIONS_USER_ROLE: &str = "uq_submissions_user_role";

/// User-facing message for a duplicate submission.
pub const DUPLICATE_SUBMISSION_MESSAGE: &str = "You have already submitted to this role";

/// Message for a unique violation, friendlier for constraints users can hit.
fn constraint_message(constraint: &str) -> String {
    match constraint {
        UQ_SUBMISSIONS_USER_ROLE => DUPLICATE_SUBMISSION_MESSAGE.to_string(),
        other => format!("Duplicate value violates unique constraint: {other}"),
    }
}

/// Classify a store boundary error. Constraint violations are the only kind
/// a user can act on; everything else is sanitized.
fn classify_store_error(err: &StoreError) -> (StatusCode, &'static str, String) {
    match err {
        StoreError::Constraint { constraint, .. } => (
            StatusCode::CONFLICT,
            "CONFLICT",
            constraint_message(constraint),
        ),
        other => {
            tracing::error!(error = %other, "Store error");
            internal()
        }
    }
}

/// Classify a sqlx error into an HTTP status, error code, and message.
///
/// - `RowNotFound` maps to 404.
/// - Unique constraint violations (constraint name starting with `uq_`) map to 409.
/// - Everything else maps to 500 with a sanitized message.
fn classify_sqlx_error(err: &sqlx::Error) -> (StatusCode, &'static str, String) {
    match err {
        sqlx::Error::RowNotFound => (
            StatusCode::NOT_FOUND,
            "NOT_FOUND",
            "Resource not found".to_string(),
        ),
        sqlx::Error::Database(db_err) => {
            // PostgreSQL unique constraint violation: error code 23505
            if db_err.code().as_deref() == Some("23505") {
                let constraint = db_err.constraint().unwrap_or("unknown");
                if constraint.starts_with("uq_") {
                    return (StatusCode::CONFLICT, "CONFLICT", constraint_message(constraint));
                }
            }
            tracing::error!(error = %db_err, "Database error");
            internal()
        }
        other => {
            tracing::error!(error = %other, "Database error");
            internal()
        }
    }
}
