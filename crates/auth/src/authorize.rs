//! Role-based access decisions.
//!
//! Pure policy: no IO, no clock, no transport types.

use thiserror::Error;

use tablebook_core::IdentityError;

use crate::Role;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthzError {
    #[error("forbidden: role '{required}' required")]
    Forbidden { required: String },
}

impl From<AuthzError> for IdentityError {
    fn from(_: AuthzError) -> Self {
        IdentityError::Forbidden
    }
}

/// Allow the request only if `actual` is exactly `required`.
///
/// There is no role hierarchy: an admin-only operation admits "admin" and
/// nothing else.
pub fn require_role(actual: &Role, required: &Role) -> Result<(), AuthzError> {
    if actual == required {
        Ok(())
    } else {
        Err(AuthzError::Forbidden {
            required: required.as_str().to_string(),
        })
    }
}

pub fn require_admin(actual: &Role) -> Result<(), AuthzError> {
    require_role(actual, &Role::ADMIN)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admin_passes_admin_gate() {
        assert_eq!(require_admin(&Role::ADMIN), Ok(()));
        assert_eq!(require_admin(&Role::from_tag("admin")), Ok(()));
    }

    #[test]
    fn other_roles_are_forbidden() {
        for role in [Role::USER, Role::from_tag("manager"), Role::from_tag("ADMIN")] {
            assert_eq!(
                require_admin(&role),
                Err(AuthzError::Forbidden {
                    required: "admin".to_string()
                })
            );
        }
    }

    #[test]
    fn denial_folds_into_forbidden() {
        let err = require_admin(&Role::USER).unwrap_err();
        assert_eq!(IdentityError::from(err), IdentityError::Forbidden);
    }

    #[test]
    fn arbitrary_role_gate() {
        let owner = Role::from_tag("owner");
        assert!(require_role(&owner, &owner).is_ok());
        assert!(require_role(&Role::ADMIN, &owner).is_err());
    }
}
