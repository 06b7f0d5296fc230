use axum::{
    async_trait,
    extract::FromRequestParts,
    http::request::Parts,
    response::Response,
};

use storegate_auth::{AuthError, Identity};

use crate::app::errors;

/// The authenticated caller, as attached by the authentication middleware.
///
/// Extracting it on a route that is not behind the middleware yields 401.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentUser(pub Identity);

#[async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Identity>()
            .cloned()
            .map(CurrentUser)
            .ok_or_else(|| errors::auth_error_to_response(AuthError::NotAuthenticated))
    }
}
