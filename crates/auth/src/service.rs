//! Session lifecycle: register, login, logout.

use std::sync::Arc;

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use serde::Deserialize;
use tokio::sync::OnceCell;
use tracing::{info, instrument, warn};

use storegate_core::{SessionId, UserId, Username};

use crate::config::AuthConfig;
use crate::cookie::{self, CookieAttributes};
use crate::error::AuthError;
use crate::password::PasswordHasher;
use crate::principal::Identity;
use crate::store::{bounded, SessionStore, UserDirectory, UserSummary};
use crate::token::TokenService;
use crate::Role;

pub const PASSWORD_MIN_CHARS: usize = 8;
pub const PASSWORD_MAX_CHARS: usize = 128;

/// Hashed once per service and verified against on unknown usernames.
const DECOY_PASSWORD: &str = "storegate-decoy-password";

#[derive(Debug, Clone, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub role: Option<String>,
}

/// Result of a successful login.
#[derive(Debug, Clone)]
pub struct LoginOutcome {
    pub identity: Identity,
    /// Signed session token (cookie value).
    pub token: String,
    /// Complete `Set-Cookie` header value.
    pub set_cookie: String,
    pub expires_at: DateTime<Utc>,
    pub expires_in: i64,
}

#[derive(Debug, Clone)]
pub struct LogoutOutcome {
    /// `Set-Cookie` header value that clears the session cookie.
    pub clear_cookie: String,
}

/// Orchestrates credentials, session records and token issuance.
#[derive(Clone)]
pub struct AuthService {
    sessions: Arc<dyn SessionStore>,
    users: Arc<dyn UserDirectory>,
    hasher: Arc<dyn PasswordHasher>,
    tokens: TokenService,
    config: AuthConfig,
    decoy_hash: Arc<OnceCell<String>>,
}

impl AuthService {
    pub fn new(
        sessions: Arc<dyn SessionStore>,
        users: Arc<dyn UserDirectory>,
        hasher: Arc<dyn PasswordHasher>,
        tokens: TokenService,
        config: AuthConfig,
    ) -> Self {
        Self {
            sessions,
            users,
            hasher,
            tokens,
            config,
            decoy_hash: Arc::new(OnceCell::new()),
        }
    }

    #[instrument(skip(self, request), fields(username = %request.username))]
    pub async fn register(&self, request: RegisterRequest) -> Result<Identity, AuthError> {
        let username = Username::parse(&request.username)?;
        let role = match request.role.as_deref() {
            None => Role::User,
            Some(raw) => raw.parse::<Role>()?,
        };
        let chars = request.password.chars().count();
        if !(PASSWORD_MIN_CHARS..=PASSWORD_MAX_CHARS).contains(&chars) {
            return Err(AuthError::Validation(format!(
                "password must be {PASSWORD_MIN_CHARS}..={PASSWORD_MAX_CHARS} characters"
            )));
        }

        let hash = self.hasher.hash(&request.password).await?;
        let id = bounded(
            self.config.store_timeout,
            self.users.create_user(&username, &hash, role),
        )
        .await?;

        info!(user_id = id.get(), role = %role, "user registered");
        Ok(Identity {
            id,
            username: username.into(),
            role,
        })
    }

    pub async fn login(&self, username: &str, password: &str) -> Result<LoginOutcome, AuthError> {
        self.login_at(username, password, Utc::now()).await
    }

    /// Verify credentials, persist a fresh session, then issue its token.
    ///
    /// The session row is written before any token exists: if the write fails
    /// the caller gets an error and no cookie.
    #[instrument(skip(self, password, now))]
    pub async fn login_at(
        &self,
        username: &str,
        password: &str,
        now: DateTime<Utc>,
    ) -> Result<LoginOutcome, AuthError> {
        if username.trim().is_empty() || password.is_empty() {
            return Err(AuthError::Validation("username and password are required".into()));
        }

        let Some(record) = bounded(
            self.config.store_timeout,
            self.sessions.find_credential_by_username(username.trim()),
        )
        .await?
        else {
            self.verify_decoy(password).await?;
            warn!("login for unknown username");
            return Err(AuthError::InvalidCredentials);
        };

        if !self.hasher.verify(password, &record.password_hash).await? {
            warn!(user_id = record.id.get(), "login with wrong password");
            return Err(AuthError::InvalidCredentials);
        }

        let ttl = self.config.session_ttl_secs;
        let session_id = SessionId::generate();
        let expires_at = ChronoDuration::try_seconds(ttl)
            .and_then(|lifetime| now.checked_add_signed(lifetime))
            .ok_or_else(|| AuthError::Config(format!("session TTL {ttl}s overflows the expiry")))?;

        bounded(
            self.config.store_timeout,
            self.sessions.set_session(record.id, &session_id, expires_at),
        )
        .await?;

        let token = self.tokens.issue_at(record.id, &session_id, ttl, now.timestamp());
        let attrs = CookieAttributes {
            max_age: Some(ttl),
            ..self.config.cookie_attributes()
        };
        let set_cookie = cookie::build_set_cookie(&self.config.cookie_name, &token, &attrs);

        info!(user_id = record.id.get(), "session opened");
        Ok(LoginOutcome {
            identity: Identity {
                id: record.id,
                username: record.username,
                role: record.role,
            },
            token,
            set_cookie,
            expires_at,
            expires_in: ttl,
        })
    }

    /// Drop the caller's live session. Every token issued for it stops
    /// authenticating immediately.
    #[instrument(skip(self, identity), fields(user_id = identity.map(|i| i.id.get())))]
    pub async fn logout(&self, identity: Option<&Identity>) -> Result<LogoutOutcome, AuthError> {
        let identity = identity.ok_or(AuthError::NotAuthenticated)?;
        bounded(self.config.store_timeout, self.sessions.clear_session(identity.id)).await?;

        info!("session closed");
        Ok(LogoutOutcome {
            clear_cookie: cookie::build_clear_cookie(
                &self.config.cookie_name,
                &self.config.cookie_attributes(),
            ),
        })
    }
}

impl AuthService {
    /// Run one password verification that cannot succeed, so an unknown
    /// username costs the same as a wrong password.
    async fn verify_decoy(&self, password: &str) -> Result<(), AuthError> {
        let decoy = self
            .decoy_hash
            .get_or_try_init(|| self.hasher.hash(DECOY_PASSWORD))
            .await?;
        self.hasher.verify(password, decoy).await?;
        Ok(())
    }

    /// Non-sensitive view of one user.
    pub async fn user_summary(&self, user_id: UserId) -> Result<UserSummary, AuthError> {
        bounded(self.config.store_timeout, self.users.find_user(user_id))
            .await?
            .ok_or(AuthError::NotFound)
    }

    pub async fn list_users(&self) -> Result<Vec<UserSummary>, AuthError> {
        bounded(self.config.store_timeout, self.users.list_users()).await
    }
}

impl core::fmt::Debug for AuthService {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("AuthService")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
