use axum::{
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};

use storegate_auth::{authorize, Role};

use crate::{authz, middleware::{self, AuthState}};

pub mod auth;
pub mod system;
pub mod users;

/// Router for everything under `/api`.
///
/// Role gates run inside the authentication layer, so every protected
/// handler sees an [`Identity`](storegate_auth::Identity) that passed its gate.
pub fn router(auth_state: AuthState) -> Router {
    let public = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login));

    let user = Router::new()
        .route("/user/data", get(users::user_data))
        .route_layer(from_fn_with_state(
            authorize([Role::User, Role::Admin, Role::Superadmin]),
            authz::require_roles,
        ));

    let admin = Router::new()
        .route("/admin/data", get(users::admin_data))
        .route_layer(from_fn_with_state(
            authorize([Role::Admin, Role::Superadmin]),
            authz::require_roles,
        ));

    let superadmin = Router::new()
        .route("/superadmin/data", get(users::superadmin_data))
        .route_layer(from_fn_with_state(
            authorize([Role::Superadmin]),
            authz::require_roles,
        ));

    let protected = Router::new()
        .route("/logout", post(auth::logout))
        .merge(user)
        .merge(admin)
        .merge(superadmin)
        .route_layer(from_fn_with_state(auth_state, middleware::authenticate));

    public.merge(protected)
}
