//! `tablebook-core` — identity-layer foundation types.
//!
//! Shared by every other crate in the workspace; contains no IO.

pub mod error;
pub mod id;

pub use error::{IdentityError, IdentityResult};
pub use id::UserId;
