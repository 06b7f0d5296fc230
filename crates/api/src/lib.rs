//! HTTP API: cookie session authentication, role gates, and the auth routes.

pub mod app;
pub mod authz;
pub mod config;
pub mod context;
pub mod middleware;
