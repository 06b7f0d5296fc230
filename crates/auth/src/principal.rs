use serde::{Deserialize, Serialize};

use storegate_core::UserId;

use crate::Role;

/// The authenticated caller of one request.
///
/// A minimal, non-sensitive projection of the user record: built fresh by the
/// [`Authenticator`](crate::Authenticator) on every request and dropped with it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: UserId,
    pub username: String,
    pub role: Role,
}
