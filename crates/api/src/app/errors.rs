use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;
use tracing::error;

use storegate_auth::AuthError;

/// Single mapping from [`AuthError`] to status and reason code.
///
/// Bodies only ever carry generic text; details stay in the logs.
pub fn auth_error_to_response(err: AuthError) -> axum::response::Response {
    match err {
        AuthError::NotAuthenticated => {
            json_error(StatusCode::UNAUTHORIZED, "not_authenticated", "authentication required")
        }
        AuthError::Token(_) => json_error(StatusCode::UNAUTHORIZED, "invalid_session", "invalid session"),
        AuthError::SessionRecordMissing => {
            json_error(StatusCode::FORBIDDEN, "session_not_found", "session not found")
        }
        AuthError::SessionExpiredInStore => {
            json_error(StatusCode::UNAUTHORIZED, "session_expired", "session expired")
        }
        AuthError::Forbidden => json_error(StatusCode::FORBIDDEN, "forbidden", "insufficient role"),
        AuthError::InvalidCredentials => {
            json_error(StatusCode::UNAUTHORIZED, "invalid_credentials", "invalid username or password")
        }
        AuthError::Validation(msg) => json_error(StatusCode::BAD_REQUEST, "validation_error", msg),
        AuthError::Conflict(_) => json_error(StatusCode::CONFLICT, "conflict", "username already taken"),
        AuthError::NotFound => json_error(StatusCode::NOT_FOUND, "not_found", "not found"),
        err @ (AuthError::Store(_)
        | AuthError::Hashing(_)
        | AuthError::Timeout
        | AuthError::Config(_)) => {
            error!(error = %err, "request failed on infrastructure error");
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "internal_error", "internal server error")
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
