use std::collections::BTreeSet;

use thiserror::Error;

use crate::{Identity, Role};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthzError {
    /// The guard ran without an authenticated identity.
    #[error("not authenticated")]
    NotAuthenticated,

    #[error("forbidden: role '{0}' is not allowed")]
    Forbidden(Role),
}

/// Role gate for one route.
///
/// An empty set admits any authenticated identity. Otherwise the identity's
/// role must be a member of the set.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RoleGuard {
    required: BTreeSet<Role>,
}

impl RoleGuard {
    pub fn new(required: impl IntoIterator<Item = Role>) -> Self {
        Self {
            required: required.into_iter().collect(),
        }
    }

    /// A guard that admits any authenticated identity.
    pub fn any_authenticated() -> Self {
        Self::default()
    }

    pub fn check(&self, identity: Option<&Identity>) -> Result<(), AuthzError> {
        let identity = identity.ok_or(AuthzError::NotAuthenticated)?;
        if self.required.is_empty() || self.required.contains(&identity.role) {
            Ok(())
        } else {
            Err(AuthzError::Forbidden(identity.role))
        }
    }
}

/// Build a [`RoleGuard`] for the given role set.
///
/// - No IO
/// - No panics
/// - Exact membership, no hierarchy
pub fn authorize(required: impl IntoIterator<Item = Role>) -> RoleGuard {
    RoleGuard::new(required)
}

#[cfg(test)]
mod tests {
    use super::*;
    use storegate_core::UserId;

    fn identity(role: Role) -> Identity {
        Identity {
            id: UserId::new(1),
            username: "alice".to_string(),
            role,
        }
    }

    #[test]
    fn missing_identity_is_not_authenticated() {
        let guard = authorize([Role::User]);
        assert_eq!(guard.check(None), Err(AuthzError::NotAuthenticated));
        assert_eq!(RoleGuard::any_authenticated().check(None), Err(AuthzError::NotAuthenticated));
    }

    #[test]
    fn empty_role_set_admits_everyone_authenticated() {
        let guard = RoleGuard::any_authenticated();
        for role in Role::ALL {
            assert!(guard.check(Some(&identity(role))).is_ok());
        }
    }

    #[test]
    fn user_is_rejected_from_admin_routes() {
        let guard = authorize([Role::Admin, Role::Superadmin]);
        assert_eq!(
            guard.check(Some(&identity(Role::User))),
            Err(AuthzError::Forbidden(Role::User))
        );
        assert!(guard.check(Some(&identity(Role::Admin))).is_ok());
        assert!(guard.check(Some(&identity(Role::Superadmin))).is_ok());
    }

    #[test]
    fn superadmin_does_not_imply_admin() {
        let guard = authorize([Role::Admin]);
        assert_eq!(
            guard.check(Some(&identity(Role::Superadmin))),
            Err(AuthzError::Forbidden(Role::Superadmin))
        );
    }
}
