//! Postgres-backed user and session store.
//!
//! ## Atomicity
//!
//! `session_id` and `session_expiry` are only ever written by one `UPDATE`
//! statement each for set and clear, and the table carries a `CHECK` that
//! forbids one being NULL without the other. A cancelled request therefore
//! leaves either the old pair or the new pair, never a mix.
//!
//! ## Error Mapping
//!
//! | SQLx Error | PostgreSQL Error Code | StoreError |
//! |------------|----------------------|------------|
//! | Database (unique violation) | `23505` | `Conflict` |
//! | Database (other) | any | `Storage` |
//! | PoolClosed / PoolTimedOut / Io / other | N/A | `Storage` |

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use tracing::instrument;

use storegate_auth::{
    CredentialRecord, Role, SessionRecord, SessionStore, StoreError, UserDirectory, UserSummary,
};
use storegate_core::{SessionId, UserId, Username};

/// DDL for the `users` table, applied by [`PostgresUserStore::ensure_schema`].
pub const USERS_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    id             BIGSERIAL PRIMARY KEY,
    username       TEXT NOT NULL UNIQUE,
    password_hash  TEXT NOT NULL,
    role           TEXT NOT NULL DEFAULT 'user'
                   CHECK (role IN ('user', 'admin', 'superadmin')),
    session_id     TEXT NULL,
    session_expiry TIMESTAMPTZ NULL,
    created_at     TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT users_session_pair CHECK ((session_id IS NULL) = (session_expiry IS NULL))
)
"#;

#[derive(Debug, Clone)]
pub struct PostgresUserStore {
    pool: Arc<PgPool>,
}

impl PostgresUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    /// Create the `users` table if it does not exist yet.
    pub async fn ensure_schema(&self) -> Result<(), StoreError> {
        sqlx::query(USERS_SCHEMA)
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("ensure_schema", e))?;
        Ok(())
    }
}

#[async_trait]
impl SessionStore for PostgresUserStore {
    #[instrument(skip(self))]
    async fn find_credential_by_username(
        &self,
        username: &str,
    ) -> Result<Option<CredentialRecord>, StoreError> {
        let row = sqlx::query(
            "SELECT id, username, password_hash, role, session_id, session_expiry \
             FROM users WHERE username = $1 LIMIT 1",
        )
        .bind(username)
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("find_credential_by_username", e))?;

        row.map(|row| -> Result<CredentialRecord, StoreError> {
            let session_id: Option<String> = row.try_get("session_id").map_err(decode_error)?;
            Ok(CredentialRecord {
                id: UserId::new(row.try_get("id").map_err(decode_error)?),
                username: row.try_get("username").map_err(decode_error)?,
                password_hash: row.try_get("password_hash").map_err(decode_error)?,
                role: role_column(&row)?,
                session_id: session_id.and_then(|s| s.parse::<SessionId>().ok()),
                session_expiry: row.try_get("session_expiry").map_err(decode_error)?,
            })
        })
        .transpose()
    }

    #[instrument(skip(self, session_id), fields(user_id = user_id.get()))]
    async fn find_active_session(
        &self,
        user_id: UserId,
        session_id: &SessionId,
    ) -> Result<Option<SessionRecord>, StoreError> {
        let row = sqlx::query(
            "SELECT id, username, role, session_expiry \
             FROM users WHERE id = $1 AND session_id = $2 LIMIT 1",
        )
        .bind(user_id.get())
        .bind(session_id.as_str())
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("find_active_session", e))?;

        row.map(|row| -> Result<SessionRecord, StoreError> {
            Ok(SessionRecord {
                id: UserId::new(row.try_get("id").map_err(decode_error)?),
                username: row.try_get("username").map_err(decode_error)?,
                role: role_column(&row)?,
                session_id: session_id.clone(),
                session_expiry: row.try_get("session_expiry").map_err(decode_error)?,
            })
        })
        .transpose()
    }

    #[instrument(skip(self, session_id), fields(user_id = user_id.get()))]
    async fn set_session(
        &self,
        user_id: UserId,
        session_id: &SessionId,
        expiry: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let result = sqlx::query("UPDATE users SET session_id = $1, session_expiry = $2 WHERE id = $3")
            .bind(session_id.as_str())
            .bind(expiry)
            .bind(user_id.get())
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("set_session", e))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    #[instrument(skip(self), fields(user_id = user_id.get()))]
    async fn clear_session(&self, user_id: UserId) -> Result<(), StoreError> {
        sqlx::query("UPDATE users SET session_id = NULL, session_expiry = NULL WHERE id = $1")
            .bind(user_id.get())
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("clear_session", e))?;
        Ok(())
    }
}

#[async_trait]
impl UserDirectory for PostgresUserStore {
    #[instrument(skip(self, password_hash))]
    async fn create_user(
        &self,
        username: &Username,
        password_hash: &str,
        role: Role,
    ) -> Result<UserId, StoreError> {
        let row = sqlx::query(
            "INSERT INTO users (username, password_hash, role) VALUES ($1, $2, $3) RETURNING id",
        )
        .bind(username.as_str())
        .bind(password_hash)
        .bind(role.as_str())
        .fetch_one(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("create_user", e))?;

        Ok(UserId::new(row.try_get("id").map_err(decode_error)?))
    }

    #[instrument(skip(self), fields(user_id = user_id.get()))]
    async fn find_user(&self, user_id: UserId) -> Result<Option<UserSummary>, StoreError> {
        let row = sqlx::query(
            "SELECT id, username, role, created_at, session_expiry FROM users WHERE id = $1 LIMIT 1",
        )
        .bind(user_id.get())
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("find_user", e))?;

        row.as_ref().map(summary_from_row).transpose()
    }

    #[instrument(skip(self))]
    async fn list_users(&self) -> Result<Vec<UserSummary>, StoreError> {
        let rows = sqlx::query(
            "SELECT id, username, role, created_at, session_expiry FROM users ORDER BY id ASC",
        )
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_users", e))?;

        rows.iter().map(summary_from_row).collect()
    }
}

fn summary_from_row(row: &PgRow) -> Result<UserSummary, StoreError> {
    Ok(UserSummary {
        id: UserId::new(row.try_get("id").map_err(decode_error)?),
        username: row.try_get("username").map_err(decode_error)?,
        role: role_column(row)?,
        created_at: row.try_get("created_at").map_err(decode_error)?,
        session_expiry: row.try_get("session_expiry").map_err(decode_error)?,
    })
}

fn role_column(row: &PgRow) -> Result<Role, StoreError> {
    let raw: String = row.try_get("role").map_err(decode_error)?;
    raw.parse::<Role>()
        .map_err(|e| StoreError::Storage(format!("bad role column: {e}")))
}

fn decode_error(err: sqlx::Error) -> StoreError {
    StoreError::Storage(format!("row decode failed: {err}"))
}

/// Map SQLx errors to store errors.
fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => {
            let msg = format!("database error in {}: {}", operation, db_err.message());
            match db_err.code().as_deref() {
                // Unique violation (duplicate username)
                Some("23505") => StoreError::Conflict(msg),
                _ => StoreError::Storage(msg),
            }
        }
        sqlx::Error::PoolClosed => {
            StoreError::Storage(format!("connection pool closed in {}", operation))
        }
        sqlx::Error::PoolTimedOut => {
            StoreError::Storage(format!("connection pool timed out in {}", operation))
        }
        _ => StoreError::Storage(format!("sqlx error in {}: {}", operation, err)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_keeps_session_pair_consistent() {
        assert!(USERS_SCHEMA.contains("users_session_pair"));
        assert!(USERS_SCHEMA.contains("username       TEXT NOT NULL UNIQUE"));
    }

    #[test]
    fn pool_errors_map_to_storage() {
        assert!(matches!(
            map_sqlx_error("op", sqlx::Error::PoolClosed),
            StoreError::Storage(msg) if msg.contains("op")
        ));
        assert!(matches!(
            map_sqlx_error("op", sqlx::Error::RowNotFound),
            StoreError::Storage(_)
        ));
    }
}
