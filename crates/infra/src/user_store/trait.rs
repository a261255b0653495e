use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use tablebook_auth::{NewUser, User, UserPatch};
use tablebook_core::UserId;

/// Store-level failures.
///
/// `NotFound` and `AlreadyExists` are part of the contract; the remaining
/// variants are operational faults carrying the name of the failing operation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum UserStoreError {
    #[error("user not found")]
    NotFound,

    #[error("login already taken")]
    AlreadyExists,

    #[error("store operation '{operation}' timed out")]
    Timeout { operation: &'static str },

    #[error("store operation '{operation}' failed: {message}")]
    Backend {
        operation: &'static str,
        message: String,
    },
}

impl UserStoreError {
    pub fn backend(operation: &'static str, message: impl Into<String>) -> Self {
        Self::Backend {
            operation,
            message: message.into(),
        }
    }
}

/// Persistence for principals.
///
/// Implementations must guarantee that at most one principal holds a given
/// login at any observable instant, including under concurrent `create` and
/// `update` calls.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Insert a principal and return its newly assigned id.
    async fn create(&self, user: NewUser) -> Result<UserId, UserStoreError>;

    async fn get_by_id(&self, id: UserId) -> Result<User, UserStoreError>;

    async fn get_by_login(&self, login: &str) -> Result<User, UserStoreError>;

    /// All principals ordered by id. An empty store yields an empty vec.
    async fn list(&self) -> Result<Vec<User>, UserStoreError>;

    /// Apply a partial update; `None` fields are left untouched.
    async fn update(&self, patch: UserPatch) -> Result<(), UserStoreError>;

    /// Remove a principal. Removing an absent id succeeds.
    async fn delete(&self, id: UserId) -> Result<(), UserStoreError>;
}

#[async_trait]
impl<S> UserStore for Arc<S>
where
    S: UserStore + ?Sized,
{
    async fn create(&self, user: NewUser) -> Result<UserId, UserStoreError> {
        (**self).create(user).await
    }

    async fn get_by_id(&self, id: UserId) -> Result<User, UserStoreError> {
        (**self).get_by_id(id).await
    }

    async fn get_by_login(&self, login: &str) -> Result<User, UserStoreError> {
        (**self).get_by_login(login).await
    }

    async fn list(&self) -> Result<Vec<User>, UserStoreError> {
        (**self).list().await
    }

    async fn update(&self, patch: UserPatch) -> Result<(), UserStoreError> {
        (**self).update(patch).await
    }

    async fn delete(&self, id: UserId) -> Result<(), UserStoreError> {
        (**self).delete(id).await
    }
}
