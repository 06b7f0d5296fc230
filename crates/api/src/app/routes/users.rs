//! Role-gated data endpoints.

use std::sync::Arc;

use axum::{
    extract::Extension,
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;

use crate::app::dto::{SessionAuditResponse, UserListResponse};
use crate::app::{errors, services::AppServices};
use crate::context::CurrentUser;

/// The caller's own summary.
pub async fn user_data(
    Extension(services): Extension<Arc<AppServices>>,
    CurrentUser(identity): CurrentUser,
) -> Response {
    match services.auth.user_summary(identity.id).await {
        Ok(summary) => Json(summary).into_response(),
        Err(e) => errors::auth_error_to_response(e),
    }
}

pub async fn admin_data(Extension(services): Extension<Arc<AppServices>>) -> Response {
    match services.auth.list_users().await {
        Ok(users) => Json(UserListResponse {
            total: users.len(),
            users,
        })
        .into_response(),
        Err(e) => errors::auth_error_to_response(e),
    }
}

/// Session audit: who holds a live session, without exposing session ids.
pub async fn superadmin_data(Extension(services): Extension<Arc<AppServices>>) -> Response {
    match services.auth.list_users().await {
        Ok(users) => Json(SessionAuditResponse::from_summaries(users, Utc::now())).into_response(),
        Err(e) => errors::auth_error_to_response(e),
    }
}
