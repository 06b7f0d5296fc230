//! Request authentication: cookie → token → live session → identity.
//!
//! ```text
//! NoCookie ─────────────► NotAuthenticated        401
//! TokenInvalid ─────────► Token(..)               401
//! SessionRecordMissing ─► SessionRecordMissing    403
//! SessionExpiredInStore ► SessionExpiredInStore   401
//! Authenticated ────────► Identity
//! ```
//!
//! A token is honoured only while both its own expiry and the store's
//! session expiry are in the future; either lapsing ends the session.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{debug, instrument};

use crate::config::AuthConfig;
use crate::cookie;
use crate::error::AuthError;
use crate::principal::Identity;
use crate::store::{bounded, SessionStore};
use crate::token::TokenService;

#[derive(Clone)]
pub struct Authenticator {
    store: Arc<dyn SessionStore>,
    tokens: TokenService,
    cookie_name: String,
    leeway_secs: i64,
    store_timeout: Duration,
}

impl Authenticator {
    pub fn new(store: Arc<dyn SessionStore>, tokens: TokenService, config: &AuthConfig) -> Self {
        Self {
            store,
            tokens,
            cookie_name: config.cookie_name.clone(),
            leeway_secs: config.leeway_secs,
            store_timeout: config.store_timeout,
        }
    }

    /// Resolve a raw `Cookie` header to the caller's identity.
    pub async fn authenticate(&self, cookie_header: Option<&str>) -> Result<Identity, AuthError> {
        self.authenticate_at(cookie_header, Utc::now()).await
    }

    #[instrument(level = "debug", skip_all, fields(user_id = tracing::field::Empty))]
    pub async fn authenticate_at(
        &self,
        cookie_header: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<Identity, AuthError> {
        let jar = cookie::parse(cookie_header.unwrap_or_default());
        let token = match jar.get(&self.cookie_name) {
            Some(token) if !token.is_empty() => token,
            _ => return Err(AuthError::NotAuthenticated),
        };

        let claims = self.tokens.verify_at(token, now.timestamp()).map_err(|e| {
            debug!(cause = e.kind(), "session token rejected");
            AuthError::Token(e)
        })?;
        tracing::Span::current().record("user_id", claims.sub.get());

        let record = bounded(
            self.store_timeout,
            self.store.find_active_session(claims.sub, &claims.sid),
        )
        .await?
        .ok_or_else(|| {
            debug!("no live session matches token");
            AuthError::SessionRecordMissing
        })?;

        let expired = match record.session_expiry {
            Some(expiry) => expiry.timestamp().saturating_add(self.leeway_secs) < now.timestamp(),
            None => true,
        };
        if expired {
            debug!("session expired in store");
            return Err(AuthError::SessionExpiredInStore);
        }

        Ok(Identity {
            id: record.id,
            username: record.username,
            role: record.role,
        })
    }
}

impl core::fmt::Debug for Authenticator {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Authenticator")
            .field("cookie_name", &self.cookie_name)
            .field("leeway_secs", &self.leeway_secs)
            .field("store_timeout", &self.store_timeout)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::Duration as ChronoDuration;

    use storegate_core::{SessionId, UserId, Username};

    use crate::claims::TokenError;
    use crate::config::SigningSecret;
    use crate::signer::Signer;
    use crate::store::{CredentialRecord, InMemoryUserStore, SessionRecord, StoreError, UserDirectory};
    use crate::Role;

    fn config() -> AuthConfig {
        AuthConfig::new(SigningSecret::new(b"test-secret".to_vec()).unwrap())
    }

    fn tokens(cfg: &AuthConfig) -> TokenService {
        TokenService::new(Signer::new(cfg.secret.clone()), cfg.leeway_secs)
    }

    struct Fixture {
        store: Arc<InMemoryUserStore>,
        auth: Authenticator,
        tokens: TokenService,
        user: UserId,
        sid: SessionId,
    }

    async fn fixture(session_ttl: ChronoDuration) -> Fixture {
        let cfg = config();
        let store = InMemoryUserStore::arc();
        let user = store
            .create_user(&Username::parse("alice").unwrap(), "hash", Role::User)
            .await
            .unwrap();
        let sid = SessionId::generate();
        store.set_session(user, &sid, Utc::now() + session_ttl).await.unwrap();
        let auth = Authenticator::new(store.clone(), tokens(&cfg), &cfg);
        Fixture {
            store,
            auth,
            tokens: tokens(&cfg),
            user,
            sid,
        }
    }

    #[tokio::test]
    async fn missing_cookie_is_not_authenticated() {
        let f = fixture(ChronoDuration::hours(1)).await;
        assert!(matches!(f.auth.authenticate(None).await, Err(AuthError::NotAuthenticated)));
        assert!(matches!(
            f.auth.authenticate(Some("other=1")).await,
            Err(AuthError::NotAuthenticated)
        ));
        assert!(matches!(
            f.auth.authenticate(Some("session=")).await,
            Err(AuthError::NotAuthenticated)
        ));
    }

    #[tokio::test]
    async fn valid_cookie_resolves_identity() {
        let f = fixture(ChronoDuration::hours(1)).await;
        let token = f.tokens.issue(f.user, &f.sid, 3600);
        let header = format!("theme=dark; session={token}");
        let identity = f.auth.authenticate(Some(&header)).await.unwrap();
        assert_eq!(identity.id, f.user);
        assert_eq!(identity.username, "alice");
        assert_eq!(identity.role, Role::User);
    }

    #[tokio::test]
    async fn garbage_token_is_invalid_session() {
        let f = fixture(ChronoDuration::hours(1)).await;
        let res = f.auth.authenticate(Some("session=abc")).await;
        assert!(matches!(res, Err(AuthError::Token(TokenError::MalformedToken))));
    }

    #[tokio::test]
    async fn replaced_session_id_is_session_record_missing() {
        let f = fixture(ChronoDuration::hours(1)).await;
        let token = f.tokens.issue(f.user, &f.sid, 3600);
        f.store
            .set_session(f.user, &SessionId::generate(), Utc::now() + ChronoDuration::hours(1))
            .await
            .unwrap();
        let res = f.auth.authenticate(Some(&format!("session={token}"))).await;
        assert!(matches!(res, Err(AuthError::SessionRecordMissing)));
    }

    #[tokio::test]
    async fn cleared_session_is_session_record_missing() {
        let f = fixture(ChronoDuration::hours(1)).await;
        let token = f.tokens.issue(f.user, &f.sid, 3600);
        f.store.clear_session(f.user).await.unwrap();
        let res = f.auth.authenticate(Some(&format!("session={token}"))).await;
        assert!(matches!(res, Err(AuthError::SessionRecordMissing)));
    }

    #[tokio::test]
    async fn store_expiry_is_checked_independently_of_token() {
        let f = fixture(ChronoDuration::hours(1)).await;
        let token = f.tokens.issue(f.user, &f.sid, 3600);
        f.store
            .force_session_expiry(f.user, Utc::now() - ChronoDuration::seconds(60))
            .unwrap();
        let res = f.auth.authenticate(Some(&format!("session={token}"))).await;
        assert!(matches!(res, Err(AuthError::SessionExpiredInStore)));
    }

    #[tokio::test]
    async fn store_expiry_within_leeway_is_accepted() {
        let f = fixture(ChronoDuration::hours(1)).await;
        let token = f.tokens.issue(f.user, &f.sid, 3600);
        f.store
            .force_session_expiry(f.user, Utc::now() - ChronoDuration::seconds(5))
            .unwrap();
        assert!(f.auth.authenticate(Some(&format!("session={token}"))).await.is_ok());
    }

    #[tokio::test]
    async fn expired_token_is_rejected_even_with_live_store_session() {
        let f = fixture(ChronoDuration::hours(5)).await;
        let token = f.tokens.issue(f.user, &f.sid, 60);
        let later = Utc::now() + ChronoDuration::seconds(60 + 11 + 5);
        let res = f.auth.authenticate_at(Some(&format!("session={token}")), later).await;
        assert!(matches!(res, Err(AuthError::Token(TokenError::Expired))));
    }

    struct FailingStore;

    #[async_trait]
    impl SessionStore for FailingStore {
        async fn find_credential_by_username(&self, _: &str) -> Result<Option<CredentialRecord>, StoreError> {
            Err(StoreError::Storage("connection refused".into()))
        }
        async fn find_active_session(
            &self,
            _: UserId,
            _: &SessionId,
        ) -> Result<Option<SessionRecord>, StoreError> {
            Err(StoreError::Storage("connection refused".into()))
        }
        async fn set_session(&self, _: UserId, _: &SessionId, _: DateTime<Utc>) -> Result<(), StoreError> {
            Err(StoreError::Storage("connection refused".into()))
        }
        async fn clear_session(&self, _: UserId) -> Result<(), StoreError> {
            Err(StoreError::Storage("connection refused".into()))
        }
    }

    struct HangingStore;

    #[async_trait]
    impl SessionStore for HangingStore {
        async fn find_credential_by_username(&self, _: &str) -> Result<Option<CredentialRecord>, StoreError> {
            std::future::pending().await
        }
        async fn find_active_session(
            &self,
            _: UserId,
            _: &SessionId,
        ) -> Result<Option<SessionRecord>, StoreError> {
            std::future::pending().await
        }
        async fn set_session(&self, _: UserId, _: &SessionId, _: DateTime<Utc>) -> Result<(), StoreError> {
            std::future::pending().await
        }
        async fn clear_session(&self, _: UserId) -> Result<(), StoreError> {
            std::future::pending().await
        }
    }

    #[tokio::test]
    async fn store_failure_is_internal() {
        let cfg = config();
        let auth = Authenticator::new(Arc::new(FailingStore), tokens(&cfg), &cfg);
        let token = tokens(&cfg).issue(UserId::new(1), &SessionId::generate(), 3600);
        let err = auth.authenticate(Some(&format!("session={token}"))).await.unwrap_err();
        assert!(err.is_internal());
    }

    #[tokio::test]
    async fn hanging_store_times_out() {
        let mut cfg = config();
        cfg.store_timeout = std::time::Duration::from_millis(20);
        let auth = Authenticator::new(Arc::new(HangingStore), tokens(&cfg), &cfg);
        let token = tokens(&cfg).issue(UserId::new(1), &SessionId::generate(), 3600);
        let err = auth.authenticate(Some(&format!("session={token}"))).await.unwrap_err();
        assert!(matches!(err, AuthError::Timeout));
    }
}
