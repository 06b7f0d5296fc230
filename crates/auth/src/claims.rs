use serde::{Deserialize, Serialize};
use thiserror::Error;

use storegate_core::{SessionId, UserId};

/// Fixed token header. Only one algorithm is ever issued or accepted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenHeader {
    pub alg: String,
    pub typ: String,
}

impl TokenHeader {
    pub fn hs256() -> Self {
        Self {
            alg: "HS256".to_string(),
            typ: "JWT".to_string(),
        }
    }
}

/// Claims carried by a session token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Subject: the user this token speaks for.
    pub sub: UserId,

    /// Session id; must match the user's live session record.
    pub sid: SessionId,

    /// Issued-at, Unix seconds.
    pub iat: i64,

    /// Expiry, Unix seconds.
    pub exp: i64,
}

/// Why a token was rejected.
///
/// All variants collapse to the same outward "invalid session" response; the
/// distinction exists for diagnostics.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("token is not made of three segments")]
    MalformedToken,

    #[error("token signature does not match")]
    BadSignature,

    #[error("token payload is malformed: {0}")]
    MalformedPayload(String),

    #[error("token payload has no numeric expiry")]
    MissingExpiry,

    #[error("token has expired")]
    Expired,
}

impl TokenError {
    /// Stable short name, for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            TokenError::MalformedToken => "malformed_token",
            TokenError::BadSignature => "bad_signature",
            TokenError::MalformedPayload(_) => "malformed_payload",
            TokenError::MissingExpiry => "missing_expiry",
            TokenError::Expired => "expired",
        }
    }
}
