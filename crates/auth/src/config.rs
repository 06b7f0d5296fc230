//! Authentication configuration.
//!
//! Built once at process start and handed to constructors; nothing in this
//! crate reads the environment on its own.

use std::sync::Arc;
use std::time::Duration;

use storegate_core::DomainError;

use crate::cookie::{CookieAttributes, SameSite};

/// Shortest session lifetime a token may carry, in seconds.
pub const MIN_SESSION_TTL_SECS: i64 = 60;

/// Longest configurable session lifetime (one year), in seconds.
pub const MAX_SESSION_TTL_SECS: i64 = 365 * 24 * 60 * 60;

/// Largest accepted clock-skew tolerance (one day), in seconds.
const MAX_LEEWAY_SECS: i64 = 24 * 60 * 60;

const BCRYPT_MIN_COST: u32 = 4;
const BCRYPT_MAX_COST: u32 = 31;

/// HMAC key material. Cheap to clone, never printed.
#[derive(Clone)]
pub struct SigningSecret(Arc<[u8]>);

impl SigningSecret {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Result<Self, DomainError> {
        let bytes = bytes.into();
        if bytes.is_empty() {
            return Err(DomainError::validation("signing secret cannot be empty"));
        }
        Ok(Self(bytes.into()))
    }

    pub fn expose(&self) -> &[u8] {
        &self.0
    }
}

impl core::fmt::Debug for SigningSecret {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str("SigningSecret([REDACTED])")
    }
}

#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub secret: SigningSecret,
    pub cookie_name: String,
    /// Lifetime of a new session, in seconds.
    pub session_ttl_secs: i64,
    /// Clock-skew tolerance applied to token and store expiry checks.
    pub leeway_secs: i64,
    /// Mark the session cookie `Secure` (HTTPS deployments).
    pub cookie_secure: bool,
    pub bcrypt_cost: u32,
    /// Upper bound for a single store round trip.
    pub store_timeout: Duration,
}

impl AuthConfig {
    pub const DEFAULT_COOKIE_NAME: &'static str = "session";
    pub const DEFAULT_SESSION_TTL_SECS: i64 = 3600;
    pub const DEFAULT_LEEWAY_SECS: i64 = 10;
    pub const DEFAULT_BCRYPT_COST: u32 = 12;
    pub const DEFAULT_STORE_TIMEOUT: Duration = Duration::from_secs(5);

    /// Configuration with defaults for everything but the secret.
    pub fn new(secret: SigningSecret) -> Self {
        Self {
            secret,
            cookie_name: Self::DEFAULT_COOKIE_NAME.to_string(),
            session_ttl_secs: Self::DEFAULT_SESSION_TTL_SECS,
            leeway_secs: Self::DEFAULT_LEEWAY_SECS,
            cookie_secure: false,
            bcrypt_cost: Self::DEFAULT_BCRYPT_COST,
            store_timeout: Self::DEFAULT_STORE_TIMEOUT,
        }
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        if self.cookie_name.is_empty()
            || self
                .cookie_name
                .chars()
                .any(|c| c.is_control() || c.is_whitespace() || ";=,".contains(c))
        {
            return Err(DomainError::validation("cookie name is not a valid cookie token"));
        }
        if !(1..=MAX_SESSION_TTL_SECS).contains(&self.session_ttl_secs) {
            return Err(DomainError::validation(format!(
                "session TTL must be within 1..={MAX_SESSION_TTL_SECS} seconds"
            )));
        }
        if !(0..=MAX_LEEWAY_SECS).contains(&self.leeway_secs) {
            return Err(DomainError::validation(format!(
                "leeway must be within 0..={MAX_LEEWAY_SECS} seconds"
            )));
        }
        if !(BCRYPT_MIN_COST..=BCRYPT_MAX_COST).contains(&self.bcrypt_cost) {
            return Err(DomainError::validation(format!(
                "bcrypt cost must be within {BCRYPT_MIN_COST}..={BCRYPT_MAX_COST}"
            )));
        }
        if self.store_timeout.is_zero() {
            return Err(DomainError::validation("store timeout must be non-zero"));
        }
        Ok(())
    }

    /// Attributes of the session cookie (HttpOnly, SameSite=Strict, Path=/).
    pub fn cookie_attributes(&self) -> CookieAttributes {
        CookieAttributes {
            http_only: true,
            same_site: SameSite::Strict,
            path: "/".to_string(),
            secure: self.cookie_secure,
            max_age: None,
        }
    }
}
