//! Value objects: defined entirely by their attribute values.

use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};

/// Longest accepted username, in characters.
pub const USERNAME_MAX_CHARS: usize = 64;

/// A validated username handle.
///
/// Construction trims surrounding whitespace and rejects empty handles, handles
/// longer than [`USERNAME_MAX_CHARS`] and handles containing control characters.
/// Uniqueness is enforced by the store, not here.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Username(String);

impl Username {
    pub fn parse(raw: &str) -> DomainResult<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(DomainError::validation("username cannot be empty"));
        }
        if trimmed.chars().count() > USERNAME_MAX_CHARS {
            return Err(DomainError::validation(format!(
                "username cannot exceed {USERNAME_MAX_CHARS} characters"
            )));
        }
        if trimmed.chars().any(char::is_control) {
            return Err(DomainError::validation("username contains control characters"));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for Username {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Username {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Username> for String {
    fn from(value: Username) -> Self {
        value.0
    }
}
