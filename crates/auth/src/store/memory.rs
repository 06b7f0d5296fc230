//! In-memory user store for tests/dev.

use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use storegate_core::{SessionId, UserId, Username};

use super::{CredentialRecord, SessionRecord, SessionStore, StoreError, UserDirectory, UserSummary};
use crate::Role;

#[derive(Debug, Clone)]
struct UserRow {
    username: String,
    password_hash: String,
    role: Role,
    created_at: DateTime<Utc>,
    // Kept as one Option so id and expiry can only change together.
    session: Option<(SessionId, DateTime<Utc>)>,
}

impl UserRow {
    fn summary(&self, id: UserId) -> UserSummary {
        UserSummary {
            id,
            username: self.username.clone(),
            role: self.role,
            created_at: self.created_at,
            session_expiry: self.session.as_ref().map(|(_, exp)| *exp),
        }
    }
}

#[derive(Debug, Default)]
struct Inner {
    next_id: i64,
    users: BTreeMap<UserId, UserRow>,
}

#[derive(Debug, Default)]
pub struct InMemoryUserStore {
    inner: RwLock<Inner>,
}

fn poisoned<T>(_: T) -> StoreError {
    StoreError::Storage("in-memory store lock poisoned".to_string())
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn arc() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Current session id of a user, for inspection in tests and tooling.
    pub fn session_of(&self, user_id: UserId) -> Option<(SessionId, DateTime<Utc>)> {
        let inner = self.inner.read().ok()?;
        inner.users.get(&user_id)?.session.clone()
    }

    /// Overwrite a user's session expiry without touching the session id.
    pub fn force_session_expiry(&self, user_id: UserId, expiry: DateTime<Utc>) -> Result<(), StoreError> {
        let mut inner = self.inner.write().map_err(poisoned)?;
        let row = inner.users.get_mut(&user_id).ok_or(StoreError::NotFound)?;
        if let Some((_, exp)) = row.session.as_mut() {
            *exp = expiry;
        }
        Ok(())
    }
}

#[async_trait]
impl SessionStore for InMemoryUserStore {
    async fn find_credential_by_username(
        &self,
        username: &str,
    ) -> Result<Option<CredentialRecord>, StoreError> {
        let inner = self.inner.read().map_err(poisoned)?;
        Ok(inner
            .users
            .iter()
            .find(|(_, row)| row.username == username)
            .map(|(id, row)| CredentialRecord {
                id: *id,
                username: row.username.clone(),
                password_hash: row.password_hash.clone(),
                role: row.role,
                session_id: row.session.as_ref().map(|(sid, _)| sid.clone()),
                session_expiry: row.session.as_ref().map(|(_, exp)| *exp),
            }))
    }

    async fn find_active_session(
        &self,
        user_id: UserId,
        session_id: &SessionId,
    ) -> Result<Option<SessionRecord>, StoreError> {
        let inner = self.inner.read().map_err(poisoned)?;
        let Some(row) = inner.users.get(&user_id) else {
            return Ok(None);
        };
        Ok(match &row.session {
            Some((sid, exp)) if sid == session_id => Some(SessionRecord {
                id: user_id,
                username: row.username.clone(),
                role: row.role,
                session_id: sid.clone(),
                session_expiry: Some(*exp),
            }),
            _ => None,
        })
    }

    async fn set_session(
        &self,
        user_id: UserId,
        session_id: &SessionId,
        expiry: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let mut inner = self.inner.write().map_err(poisoned)?;
        let row = inner.users.get_mut(&user_id).ok_or(StoreError::NotFound)?;
        row.session = Some((session_id.clone(), expiry));
        Ok(())
    }

    async fn clear_session(&self, user_id: UserId) -> Result<(), StoreError> {
        let mut inner = self.inner.write().map_err(poisoned)?;
        if let Some(row) = inner.users.get_mut(&user_id) {
            row.session = None;
        }
        Ok(())
    }
}

#[async_trait]
impl UserDirectory for InMemoryUserStore {
    async fn create_user(
        &self,
        username: &Username,
        password_hash: &str,
        role: Role,
    ) -> Result<UserId, StoreError> {
        let mut inner = self.inner.write().map_err(poisoned)?;
        if inner.users.values().any(|row| row.username == username.as_str()) {
            return Err(StoreError::Conflict(format!("username '{username}' already exists")));
        }
        inner.next_id += 1;
        let id = UserId::new(inner.next_id);
        inner.users.insert(
            id,
            UserRow {
                username: username.as_str().to_string(),
                password_hash: password_hash.to_string(),
                role,
                created_at: Utc::now(),
                session: None,
            },
        );
        Ok(id)
    }

    async fn find_user(&self, user_id: UserId) -> Result<Option<UserSummary>, StoreError> {
        let inner = self.inner.read().map_err(poisoned)?;
        Ok(inner.users.get(&user_id).map(|row| row.summary(user_id)))
    }

    async fn list_users(&self) -> Result<Vec<UserSummary>, StoreError> {
        let inner = self.inner.read().map_err(poisoned)?;
        Ok(inner.users.iter().map(|(id, row)| row.summary(*id)).collect())
    }
}
