//! Principal records as held by the credential store.

use serde::Serialize;

use tablebook_core::UserId;

use crate::Role;

/// A stored principal.
///
/// `password_hash` is a PHC-formatted digest; the plaintext never reaches this
/// type. It is excluded from serialization and redacted from `Debug` output.
#[derive(Clone, PartialEq, Eq, Serialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub login: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: Role,
}

impl core::fmt::Debug for User {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("User")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("login", &self.login)
            .field("password_hash", &"<redacted>")
            .field("role", &self.role)
            .finish()
    }
}

/// Insert shape for a principal; the store assigns the id.
#[derive(Clone, PartialEq, Eq)]
pub struct NewUser {
    pub name: String,
    pub login: String,
    pub password_hash: String,
    pub role: Role,
}

impl NewUser {
    pub fn into_user(self, id: UserId) -> User {
        User {
            id,
            name: self.name,
            login: self.login,
            password_hash: self.password_hash,
            role: self.role,
        }
    }
}

impl core::fmt::Debug for NewUser {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("NewUser")
            .field("name", &self.name)
            .field("login", &self.login)
            .field("password_hash", &"<redacted>")
            .field("role", &self.role)
            .finish()
    }
}

/// Partial update of a stored principal.
///
/// `None` leaves the stored value untouched; `Some` overwrites it. There is no
/// way to express "clear this field": every field of a principal is required.
#[derive(Clone, PartialEq, Eq)]
pub struct UserPatch {
    pub id: UserId,
    pub name: Option<String>,
    pub login: Option<String>,
    pub password_hash: Option<String>,
    pub role: Option<Role>,
}

impl UserPatch {
    pub fn new(id: UserId) -> Self {
        Self {
            id,
            name: None,
            login: None,
            password_hash: None,
            role: None,
        }
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn login(mut self, login: impl Into<String>) -> Self {
        self.login = Some(login.into());
        self
    }

    pub fn password_hash(mut self, hash: impl Into<String>) -> Self {
        self.password_hash = Some(hash.into());
        self
    }

    pub fn role(mut self, role: Role) -> Self {
        self.role = Some(role);
        self
    }

    /// True when the patch would not change anything.
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.login.is_none()
            && self.password_hash.is_none()
            && self.role.is_none()
    }

    /// Apply the patch to a stored record in place.
    pub fn apply_to(&self, user: &mut User) {
        if let Some(name) = &self.name {
            user.name = name.clone();
        }
        if let Some(login) = &self.login {
            user.login = login.clone();
        }
        if let Some(hash) = &self.password_hash {
            user.password_hash = hash.clone();
        }
        if let Some(role) = &self.role {
            user.role = role.clone();
        }
    }
}

impl core::fmt::Debug for UserPatch {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("UserPatch")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("login", &self.login)
            .field("password_hash", &self.password_hash.as_ref().map(|_| "<redacted>"))
            .field("role", &self.role)
            .finish()
    }
}
