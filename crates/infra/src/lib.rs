//! Infrastructure layer: credential storage and the identity use cases built on it.

pub mod identity_service;
pub mod user_store;

pub use identity_service::{IdentityService, MIN_PASSWORD_LENGTH, RegisterUser, UpdateUser};
pub use user_store::{InMemoryUserStore, PostgresUserStore, UserStore, UserStoreError};
