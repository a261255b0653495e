//! `tablebook-auth` — credentials, session tokens and role checks.
//!
//! This crate is intentionally decoupled from HTTP and storage.

pub mod authorize;
pub mod claims;
pub mod password;
pub mod roles;
pub mod token;
pub mod user;

pub use authorize::{AuthzError, require_admin, require_role};
pub use claims::{Claims, validate_claims};
pub use password::{PasswordError, PasswordHasher};
pub use roles::Role;
pub use token::{DEFAULT_TOKEN_TTL_SECS, TokenError, TokenService, TokenVerifier, default_ttl};
pub use user::{NewUser, User, UserPatch};
