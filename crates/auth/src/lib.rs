//! `storegate-auth` — session authentication and role authorization.
//!
//! This crate is decoupled from HTTP frameworks and storage engines: it talks
//! to persistence through the [`SessionStore`] / [`UserDirectory`] contracts
//! and takes raw header values as input.

pub mod authenticator;
pub mod authorize;
pub mod claims;
pub mod codec;
pub mod config;
pub mod cookie;
pub mod error;
pub mod password;
pub mod principal;
pub mod roles;
pub mod service;
pub mod signer;
pub mod store;
pub mod token;

pub use authenticator::Authenticator;
pub use authorize::{authorize, AuthzError, RoleGuard};
pub use claims::{SessionClaims, TokenError};
pub use config::{AuthConfig, SigningSecret};
pub use cookie::{CookieAttributes, SameSite};
pub use error::AuthError;
pub use password::{BcryptHasher, PasswordHasher};
pub use principal::Identity;
pub use roles::Role;
pub use service::{AuthService, LoginOutcome, LogoutOutcome, RegisterRequest};
pub use signer::Signer;
pub use store::{
    CredentialRecord, InMemoryUserStore, SessionRecord, SessionStore, StoreError, UserDirectory,
    UserSummary,
};
pub use token::TokenService;
