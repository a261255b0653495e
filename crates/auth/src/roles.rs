use std::borrow::Cow;

use serde::{Deserialize, Serialize};

/// Role tag attached to a principal and embedded in its session tokens.
///
/// Roles are free-form strings; only [`Role::ADMIN`] carries meaning inside
/// the identity layer. An empty tag is normalised to [`Role::USER`] at every
/// boundary that accepts caller input.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Role(Cow<'static, str>);

impl Role {
    pub const USER: Role = Role(Cow::Borrowed("user"));
    pub const ADMIN: Role = Role(Cow::Borrowed("admin"));

    /// Build a role from caller input, mapping blank tags to the default.
    pub fn from_tag(tag: &str) -> Self {
        let tag = tag.trim();
        if tag.is_empty() {
            Self::USER
        } else {
            Self(Cow::Owned(tag.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_admin(&self) -> bool {
        self.as_str() == Self::ADMIN.as_str()
    }
}

impl Default for Role {
    fn default() -> Self {
        Self::USER
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}
