//! User/session store adapters.
//!
//! The in-memory store lives next to the contracts in `storegate-auth`; this
//! module holds the ones that need a real database.

pub mod postgres;
