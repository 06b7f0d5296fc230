use thiserror::Error;

use storegate_core::DomainError;

use crate::authorize::AuthzError;
use crate::claims::TokenError;
use crate::store::StoreError;

/// Every way an authentication or session operation can end unsuccessfully.
///
/// Everything except [`AuthError::is_internal`] variants is an expected,
/// client-attributable outcome.
#[derive(Debug, Error, Clone)]
pub enum AuthError {
    /// No session cookie was presented.
    #[error("not authenticated")]
    NotAuthenticated,

    #[error("invalid session token: {0}")]
    Token(#[from] TokenError),

    /// Token is valid but the user has no live session with that id.
    #[error("session not found")]
    SessionRecordMissing,

    #[error("session expired in store")]
    SessionExpiredInStore,

    #[error("forbidden")]
    Forbidden,

    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("not found")]
    NotFound,

    #[error("store failure: {0}")]
    Store(String),

    #[error("password hashing failure: {0}")]
    Hashing(String),

    #[error("store call timed out")]
    Timeout,

    /// A configured value cannot be applied (for example, an expiry past the calendar's range).
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl AuthError {
    /// Infrastructure faults: logged with detail, answered generically.
    pub fn is_internal(&self) -> bool {
        matches!(
            self,
            AuthError::Store(_) | AuthError::Hashing(_) | AuthError::Timeout | AuthError::Config(_)
        )
    }
}

impl From<StoreError> for AuthError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::NotFound => AuthError::NotFound,
            StoreError::Conflict(msg) => AuthError::Conflict(msg),
            StoreError::Storage(msg) => AuthError::Store(msg),
        }
    }
}

impl From<DomainError> for AuthError {
    fn from(value: DomainError) -> Self {
        match value {
            DomainError::Validation(msg) | DomainError::InvalidId(msg) => AuthError::Validation(msg),
        }
    }
}

impl From<AuthzError> for AuthError {
    fn from(value: AuthzError) -> Self {
        match value {
            AuthzError::NotAuthenticated => AuthError::NotAuthenticated,
            AuthzError::Forbidden(_) => AuthError::Forbidden,
        }
    }
}
