//! One-way password hashing (Argon2id, PHC string digests).

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, SaltString};
use argon2::{Algorithm, Argon2, Params, PasswordHasher as _, PasswordVerifier as _, Version};
use thiserror::Error;

/// Memory cost in KiB for interactive logins.
pub const DEFAULT_MEMORY_KIB: u32 = 19 * 1024;
/// Number of passes over memory.
pub const DEFAULT_ITERATIONS: u32 = 2;
/// Degree of parallelism.
pub const DEFAULT_PARALLELISM: u32 = 1;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PasswordError {
    #[error("invalid hashing parameters: {0}")]
    InvalidParams(String),

    #[error("password hashing failed: {0}")]
    Hashing(String),
}

/// Salted, deliberately slow password hasher.
///
/// The salt and cost parameters are embedded in the digest, so `verify` keeps
/// working for digests produced under a different cost.
#[derive(Clone)]
pub struct PasswordHasher {
    argon2: Argon2<'static>,
}

impl PasswordHasher {
    /// Hasher with the production work factor.
    pub fn new() -> Self {
        // The default constants are always within argon2's accepted ranges.
        let params = Params::new(
            DEFAULT_MEMORY_KIB,
            DEFAULT_ITERATIONS,
            DEFAULT_PARALLELISM,
            None,
        )
        .unwrap_or_default();
        Self {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
        }
    }

    /// Hasher with an explicit work factor.
    pub fn with_cost(
        memory_kib: u32,
        iterations: u32,
        parallelism: u32,
    ) -> Result<Self, PasswordError> {
        let params = Params::new(memory_kib, iterations, parallelism, None)
            .map_err(|e| PasswordError::InvalidParams(e.to_string()))?;
        Ok(Self {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
        })
    }

    /// Hash a plaintext into a PHC string with a fresh random salt.
    pub fn hash(&self, plaintext: &str) -> Result<String, PasswordError> {
        let salt = SaltString::generate(&mut OsRng);
        let digest = self
            .argon2
            .hash_password(plaintext.as_bytes(), &salt)
            .map_err(|e| PasswordError::Hashing(e.to_string()))?;
        Ok(digest.to_string())
    }

    /// Check a plaintext against a stored digest.
    ///
    /// A corrupt digest and a wrong password both yield `false`.
    pub fn verify(&self, digest: &str, plaintext: &str) -> bool {
        let parsed = match PasswordHash::new(digest) {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::warn!(error = %e, "stored password digest is not a valid PHC string");
                return false;
            }
        };
        self.argon2
            .verify_password(plaintext.as_bytes(), &parsed)
            .is_ok()
    }
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Debug for PasswordHasher {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("PasswordHasher").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn cheap() -> PasswordHasher {
        PasswordHasher::with_cost(256, 1, 1).unwrap()
    }

    #[test]
    fn hash_then_verify_round_trips() {
        let hasher = cheap();
        let digest = hasher.hash("secret12").unwrap();

        assert!(digest.starts_with("$argon2id$"));
        assert!(hasher.verify(&digest, "secret12"));
        assert!(!hasher.verify(&digest, "secret13"));
    }

    #[test]
    fn same_plaintext_gets_distinct_salts() {
        let hasher = cheap();
        let a = hasher.hash("secret12").unwrap();
        let b = hasher.hash("secret12").unwrap();

        assert_ne!(a, b);
        assert!(hasher.verify(&a, "secret12"));
        assert!(hasher.verify(&b, "secret12"));
    }

    #[test]
    fn corrupt_digest_is_a_plain_mismatch() {
        let hasher = cheap();
        assert!(!hasher.verify("not-a-phc-string", "secret12"));
        assert!(!hasher.verify("", ""));
    }

    #[test]
    fn digest_from_other_cost_still_verifies() {
        let digest = cheap().hash("secret12").unwrap();
        let other = PasswordHasher::with_cost(512, 2, 1).unwrap();
        assert!(other.verify(&digest, "secret12"));
    }

    #[test]
    fn rejects_out_of_range_params() {
        assert!(matches!(
            PasswordHasher::with_cost(1, 1, 1),
            Err(PasswordError::InvalidParams(_))
        ));
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 24,
            ..ProptestConfig::default()
        })]

        /// Property: a digest verifies its own plaintext and nothing else.
        #[test]
        fn verify_accepts_only_the_hashed_plaintext(
            x in ".{0,40}",
            y in ".{0,40}",
        ) {
            let hasher = cheap();
            let digest = hasher.hash(&x).unwrap();

            prop_assert!(hasher.verify(&digest, &x));
            if x != y {
                prop_assert!(!hasher.verify(&digest, &y));
            }
        }
    }
}
