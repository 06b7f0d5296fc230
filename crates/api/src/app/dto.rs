use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use storegate_auth::{Role, UserSummary};
use storegate_core::UserId;

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

// -------------------------
// Response DTOs
// -------------------------

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub msg: &'static str,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub msg: &'static str,
    pub role: Role,
    pub expires_in: i64,
}

#[derive(Debug, Serialize)]
pub struct UserListResponse {
    pub total: usize,
    pub users: Vec<UserSummary>,
}

/// One row of the superadmin audit view. Session ids are never exposed.
#[derive(Debug, Serialize)]
pub struct SessionAuditEntry {
    pub id: UserId,
    pub username: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub session_active: bool,
    pub session_expiry: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
pub struct SessionAuditResponse {
    pub total: usize,
    pub active_sessions: usize,
    pub users: Vec<SessionAuditEntry>,
}

impl SessionAuditResponse {
    pub fn from_summaries(summaries: Vec<UserSummary>, now: DateTime<Utc>) -> Self {
        let users: Vec<SessionAuditEntry> = summaries
            .into_iter()
            .map(|s| SessionAuditEntry {
                session_active: s.session_expiry.is_some_and(|exp| exp > now),
                id: s.id,
                username: s.username,
                role: s.role,
                created_at: s.created_at,
                session_expiry: s.session_expiry,
            })
            .collect();
        let active_sessions = users.iter().filter(|u| u.session_active).count();

        Self {
            total: users.len(),
            active_sessions,
            users,
        }
    }
}
