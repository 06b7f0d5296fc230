//! Infrastructure layer: storage adapters behind the `storegate-auth` contracts.

pub mod user_store;

pub use user_store::postgres::PostgresUserStore;
