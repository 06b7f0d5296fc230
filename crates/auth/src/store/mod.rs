//! Persistence contracts for credentials and sessions.
//!
//! The core never owns a storage engine; it reads and writes user rows
//! through these traits. Implementations must apply the session id/expiry
//! pair in a single atomic write.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;

use storegate_core::{SessionId, UserId, Username};

use crate::Role;

mod memory;

pub use memory::InMemoryUserStore;

/// A user row as needed for login.
#[derive(Clone)]
pub struct CredentialRecord {
    pub id: UserId,
    pub username: String,
    pub password_hash: String,
    pub role: Role,
    pub session_id: Option<SessionId>,
    pub session_expiry: Option<DateTime<Utc>>,
}

impl core::fmt::Debug for CredentialRecord {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("CredentialRecord")
            .field("id", &self.id)
            .field("username", &self.username)
            .field("role", &self.role)
            .field("session_expiry", &self.session_expiry)
            .finish_non_exhaustive()
    }
}

/// A user row whose live session matched a presented session id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionRecord {
    pub id: UserId,
    pub username: String,
    pub role: Role,
    pub session_id: SessionId,
    pub session_expiry: Option<DateTime<Utc>>,
}

/// Non-sensitive view of a user row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserSummary {
    pub id: UserId,
    pub username: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub session_expiry: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum StoreError {
    #[error("record not found")]
    NotFound,
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("storage error: {0}")]
    Storage(String),
}

/// Session persistence contract used by login, logout and every
/// authenticated request.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn find_credential_by_username(
        &self,
        username: &str,
    ) -> Result<Option<CredentialRecord>, StoreError>;

    /// Returns the row only if its current session id equals `session_id`.
    async fn find_active_session(
        &self,
        user_id: UserId,
        session_id: &SessionId,
    ) -> Result<Option<SessionRecord>, StoreError>;

    /// Set session id and expiry together. `NotFound` if the user is unknown.
    async fn set_session(
        &self,
        user_id: UserId,
        session_id: &SessionId,
        expiry: DateTime<Utc>,
    ) -> Result<(), StoreError>;

    /// Clear session id and expiry together.
    async fn clear_session(&self, user_id: UserId) -> Result<(), StoreError>;
}

/// User account management used by registration and the data endpoints.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Insert a new user. `Conflict` if the username is taken.
    async fn create_user(
        &self,
        username: &Username,
        password_hash: &str,
        role: Role,
    ) -> Result<UserId, StoreError>;

    async fn find_user(&self, user_id: UserId) -> Result<Option<UserSummary>, StoreError>;

    /// All users, ordered by id.
    async fn list_users(&self) -> Result<Vec<UserSummary>, StoreError>;
}

/// Run one store call under `limit`; an elapsed timer becomes
/// [`AuthError::Timeout`](crate::AuthError::Timeout).
pub(crate) async fn bounded<T, F>(limit: std::time::Duration, call: F) -> Result<T, crate::AuthError>
where
    F: std::future::Future<Output = Result<T, StoreError>>,
{
    match tokio::time::timeout(limit, call).await {
        Ok(result) => result.map_err(Into::into),
        Err(_) => Err(crate::AuthError::Timeout),
    }
}
