//! Route-level role gate.
//!
//! Runs after [`authenticate`](crate::middleware::authenticate) and checks
//! the attached identity against the route's allowed roles.

use axum::{extract::State, middleware::Next, response::Response};

use storegate_auth::{AuthError, Identity, RoleGuard};
use tracing::debug;

use crate::app::errors;

pub async fn require_roles(
    State(guard): State<RoleGuard>,
    req: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Response {
    match guard.check(req.extensions().get::<Identity>()) {
        Ok(()) => next.run(req).await,
        Err(err) => {
            debug!(error = %err, path = %req.uri().path(), "authorization denied");
            errors::auth_error_to_response(AuthError::from(err))
        }
    }
}
