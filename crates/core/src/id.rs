//! Strongly-typed identifiers used across the identity layer.

use core::str::FromStr;
use serde::{Deserialize, Serialize};

use crate::error::IdentityError;

/// Identifier of a principal.
///
/// Assigned by the credential store on insert and never changed afterwards.
/// Callers must treat it as opaque: it is increasing in practice but not
/// guaranteed to be gap-free.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(u64);

impl UserId {
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    pub const fn get(self) -> u64 {
        self.0
    }
}

impl core::fmt::Display for UserId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

impl From<u64> for UserId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl From<UserId> for u64 {
    fn from(value: UserId) -> Self {
        value.0
    }
}

impl FromStr for UserId {
    type Err = IdentityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = s
            .trim()
            .parse::<u64>()
            .map_err(|e| IdentityError::validation(format!("UserId: {e}")))?;
        if value == 0 {
            return Err(IdentityError::validation("UserId: must be non-zero"));
        }
        Ok(Self(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_positive_integers() {
        let id: UserId = "42".parse().unwrap();
        assert_eq!(id.get(), 42);
        assert_eq!(id.to_string(), "42");
    }

    #[test]
    fn rejects_zero_and_garbage() {
        assert!(matches!("0".parse::<UserId>(), Err(IdentityError::Validation(_))));
        assert!(matches!("abc".parse::<UserId>(), Err(IdentityError::Validation(_))));
        assert!(matches!("-1".parse::<UserId>(), Err(IdentityError::Validation(_))));
    }

    #[test]
    fn serializes_as_bare_number() {
        let json = serde_json::to_string(&UserId::new(7)).unwrap();
        assert_eq!(json, "7");
        let back: UserId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, UserId::new(7));
    }
}
