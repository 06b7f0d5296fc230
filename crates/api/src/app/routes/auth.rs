//! Register, login and logout.

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Extension},
    http::{header, StatusCode},
    response::{AppendHeaders, IntoResponse, Response},
    Json,
};

use storegate_auth::RegisterRequest;

use crate::app::dto::{LoginRequest, LoginResponse, MessageResponse};
use crate::app::{errors, services::AppServices};
use crate::context::CurrentUser;

fn bad_body(rejection: JsonRejection) -> Response {
    errors::json_error(
        StatusCode::BAD_REQUEST,
        "validation_error",
        format!("invalid request body: {}", rejection.body_text()),
    )
}

pub async fn register(
    Extension(services): Extension<Arc<AppServices>>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Response {
    let Json(req) = match payload {
        Ok(p) => p,
        Err(rejection) => return bad_body(rejection),
    };

    match services.auth.register(req).await {
        Ok(_) => (
            StatusCode::CREATED,
            Json(MessageResponse { msg: "user registered" }),
        )
            .into_response(),
        Err(e) => errors::auth_error_to_response(e),
    }
}

pub async fn login(
    Extension(services): Extension<Arc<AppServices>>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Response {
    let Json(req) = match payload {
        Ok(p) => p,
        Err(rejection) => return bad_body(rejection),
    };

    match services.auth.login(&req.username, &req.password).await {
        Ok(outcome) => (
            StatusCode::OK,
            AppendHeaders([(header::SET_COOKIE, outcome.set_cookie)]),
            Json(LoginResponse {
                msg: "login successful",
                role: outcome.identity.role,
                expires_in: outcome.expires_in,
            }),
        )
            .into_response(),
        Err(e) => errors::auth_error_to_response(e),
    }
}

pub async fn logout(
    Extension(services): Extension<Arc<AppServices>>,
    CurrentUser(identity): CurrentUser,
) -> Response {
    match services.auth.logout(Some(&identity)).await {
        Ok(outcome) => (
            StatusCode::OK,
            AppendHeaders([(header::SET_COOKIE, outcome.clear_cookie)]),
            Json(MessageResponse { msg: "logged out" }),
        )
            .into_response(),
        Err(e) => errors::auth_error_to_response(e),
    }
}
