//! Process configuration read from the environment at startup.

use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;
use tracing::warn;

use storegate_auth::{AuthConfig, SigningSecret};
use storegate_core::DomainError;

const DEV_SECRET: &str = "dev-secret";
const DEFAULT_BIND_ADDR: &str = "127.0.0.1:5000";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{key} has an invalid value {value:?}: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },

    #[error(transparent)]
    Domain(#[from] DomainError),
}

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub auth: AuthConfig,
    /// Postgres connection string; `None` selects the in-memory store.
    pub database_url: Option<String>,
    pub bind_addr: SocketAddr,
}

impl ApiConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. Empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let secret = get("AUTH_SECRET").unwrap_or_else(|| {
            warn!("AUTH_SECRET not set; using insecure dev default");
            DEV_SECRET.to_string()
        });
        let mut auth = AuthConfig::new(SigningSecret::new(secret.into_bytes())?);

        if let Some(name) = get("SESSION_COOKIE_NAME") {
            auth.cookie_name = name;
        }
        if let Some(ttl) = parse_var(&get, "SESSION_TTL_SECONDS")? {
            auth.session_ttl_secs = ttl;
        }
        if let Some(leeway) = parse_var(&get, "SESSION_LEEWAY_SEC")? {
            auth.leeway_secs = leeway;
        }
        if let Some(secure) = parse_var(&get, "COOKIE_SECURE")? {
            auth.cookie_secure = secure;
        }
        if let Some(cost) = parse_var(&get, "BCRYPT_COST")? {
            auth.bcrypt_cost = cost;
        }
        if let Some(ms) = parse_var::<u64>(&get, "STORE_TIMEOUT_MS")? {
            auth.store_timeout = Duration::from_millis(ms);
        }
        auth.validate()?;

        let bind_addr = match parse_var(&get, "BIND_ADDR")? {
            Some(addr) => addr,
            None => SocketAddr::from_str(DEFAULT_BIND_ADDR).map_err(|e| ConfigError::Invalid {
                key: "BIND_ADDR",
                value: DEFAULT_BIND_ADDR.to_string(),
                reason: e.to_string(),
            })?,
        };

        Ok(Self {
            auth,
            database_url: get("DATABASE_URL"),
            bind_addr,
        })
    }
}

fn parse_var<T>(
    get: &impl Fn(&str) -> Option<String>,
    key: &'static str,
) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    get(key)
        .map(|raw| {
            raw.trim().parse::<T>().map_err(|e| ConfigError::Invalid {
                key,
                reason: e.to_string(),
                value: raw,
            })
        })
        .transpose()
}
