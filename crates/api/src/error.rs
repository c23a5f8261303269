use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use wtstat_core::quota::Rejection;
use wtstat_engine::EngineError;

/// Application-level error type for HTTP handlers.
///
/// Implements [`IntoResponse`] to produce `{ "error", "code" }` JSON bodies.
/// Storage failures are logged and answered with a generic message.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error("Bad request: {0}")]
    BadRequest(String),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

fn internal(detail: &dyn std::fmt::Display) -> (StatusCode, &'static str, String) {
    tracing::error!(error = %detail, "Internal error");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "INTERNAL_ERROR",
        "An internal error occurred".to_string(),
    )
}

/// Status and code for a pre-submission rejection. The message is the
/// user-facing text.
fn classify_rejection(rejection: &Rejection) -> (StatusCode, &'static str, String) {
    let (status, code) = match rejection {
        Rejection::InvalidNickname | Rejection::NoBoundNickname => {
            (StatusCode::BAD_REQUEST, "VALIDATION_ERROR")
        }
        Rejection::QueriesDisabled => (StatusCode::UNPROCESSABLE_ENTITY, "QUERIES_DISABLED"),
        Rejection::TooSoonToRefresh => (StatusCode::UNPROCESSABLE_ENTITY, "TOO_SOON"),
        Rejection::GroupLimit { .. } | Rejection::UserLimit { .. } => {
            (StatusCode::UNPROCESSABLE_ENTITY, "QUOTA_EXCEEDED")
        }
    };
    (status, code, rejection.message())
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::Engine(engine) => match engine {
                EngineError::Rejected(rejection) => classify_rejection(rejection),
                EngineError::MissionNotFound(id) => (
                    StatusCode::NOT_FOUND,
                    "NOT_FOUND",
                    format!("Mission {id} not found"),
                ),
                EngineError::AlreadyFinalized(id) => (
                    StatusCode::CONFLICT,
                    "CONFLICT",
                    format!("Mission {id} is already finalized"),
                ),
                EngineError::Store(err) => internal(err),
                EngineError::Transition(err) => internal(err),
            },

            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),
        };

        let body = json!({
            "error": message,
            "code": code,
        });

        (status, axum::Json(body)).into_response()
    }
}
