//! `storegate-core` — identifiers, value objects and the domain error model.
//!
//! Nothing in here touches storage, HTTP or cryptography.

pub mod error;
pub mod id;
pub mod value_object;

pub use error::{DomainError, DomainResult};
pub use id::{SessionId, UserId};
pub use value_object::Username;
