use tablebook_auth::{Claims, Role};
use tablebook_core::UserId;

/// Principal context for a request (authenticated identity + role).
///
/// Inserted into request extensions by the auth middleware; handlers behind
/// it can rely on its presence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrincipalContext {
    user_id: UserId,
    login: String,
    role: Role,
}

impl PrincipalContext {
    pub fn new(user_id: UserId, login: impl Into<String>, role: Role) -> Self {
        Self {
            user_id,
            login: login.into(),
            role,
        }
    }

    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    pub fn login(&self) -> &str {
        &self.login
    }

    pub fn role(&self) -> &Role {
        &self.role
    }
}

impl From<Claims> for PrincipalContext {
    fn from(claims: Claims) -> Self {
        Self::new(claims.user_id, claims.login, claims.role)
    }
}
