use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;
use tracing::error;

use flashweb_infra::UserStoreError;

use crate::app::services::ServiceError;

pub fn service_error_to_response(err: ServiceError) -> axum::response::Response {
    match err {
        ServiceError::Invalid(e) => {
            json_error(StatusCode::BAD_REQUEST, "validation_error", e.to_string())
        }
        ServiceError::Store(UserStoreError::DuplicateUsername(name)) => json_error(
            StatusCode::CONFLICT,
            "duplicate_username",
            format!("username '{name}' is taken"),
        ),
        ServiceError::Store(UserStoreError::Invalid(msg)) => {
            json_error(StatusCode::BAD_REQUEST, "validation_error", msg)
        }
        other => {
            error!(error = %other, "request failed");
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "internal_error", "internal error")
        }
    }
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}
