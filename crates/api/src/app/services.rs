//! Service wiring: one store backs both the session and user contracts.

use std::sync::Arc;

use storegate_auth::{
    AuthConfig, AuthService, Authenticator, BcryptHasher, SessionStore, Signer, TokenService,
    UserDirectory,
};

#[derive(Debug, Clone)]
pub struct AppServices {
    pub auth: AuthService,
    pub authenticator: Authenticator,
}

pub fn build_services<S>(config: AuthConfig, store: Arc<S>) -> AppServices
where
    S: SessionStore + UserDirectory + 'static,
{
    let tokens = TokenService::new(Signer::new(config.secret.clone()), config.leeway_secs);
    let sessions: Arc<dyn SessionStore> = store.clone();
    let users: Arc<dyn UserDirectory> = store;

    let authenticator = Authenticator::new(sessions.clone(), tokens.clone(), &config);
    let hasher = Arc::new(BcryptHasher::new(config.bcrypt_cost));
    let auth = AuthService::new(sessions, users, hasher, tokens, config);

    AppServices { auth, authenticator }
}
