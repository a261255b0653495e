use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use tablebook_auth::{NewUser, User, UserPatch};
use tablebook_core::UserId;

use super::r#trait::{UserStore, UserStoreError};

#[derive(Debug)]
struct Inner {
    users: HashMap<UserId, User>,
    next_id: u64,
}

/// In-memory credential store for tests and local runs.
///
/// A single reader/writer lock guards the whole table. Writers run the login
/// uniqueness scan while holding the exclusive lock, so racing creates on the
/// same login are serialized and exactly one wins. The lock is never held
/// across an `.await`.
#[derive(Debug)]
pub struct InMemoryUserStore {
    inner: RwLock<Inner>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Inner {
                users: HashMap::new(),
                next_id: 1,
            }),
        }
    }

    pub fn len(&self) -> Result<usize, UserStoreError> {
        let inner = self.inner.read().map_err(|_| poisoned("len"))?;
        Ok(inner.users.len())
    }

    pub fn is_empty(&self) -> Result<bool, UserStoreError> {
        Ok(self.len()? == 0)
    }
}

impl Default for InMemoryUserStore {
    fn default() -> Self {
        Self::new()
    }
}

fn poisoned(operation: &'static str) -> UserStoreError {
    UserStoreError::backend(operation, "store lock poisoned")
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn create(&self, user: NewUser) -> Result<UserId, UserStoreError> {
        let mut inner = self.inner.write().map_err(|_| poisoned("create"))?;

        if inner.users.values().any(|u| u.login == user.login) {
            return Err(UserStoreError::AlreadyExists);
        }

        let id = UserId::new(inner.next_id);
        inner.next_id += 1;
        inner.users.insert(id, user.into_user(id));
        Ok(id)
    }

    async fn get_by_id(&self, id: UserId) -> Result<User, UserStoreError> {
        let inner = self.inner.read().map_err(|_| poisoned("get_by_id"))?;
        inner.users.get(&id).cloned().ok_or(UserStoreError::NotFound)
    }

    async fn get_by_login(&self, login: &str) -> Result<User, UserStoreError> {
        let inner = self.inner.read().map_err(|_| poisoned("get_by_login"))?;
        inner
            .users
            .values()
            .find(|u| u.login == login)
            .cloned()
            .ok_or(UserStoreError::NotFound)
    }

    async fn list(&self) -> Result<Vec<User>, UserStoreError> {
        let inner = self.inner.read().map_err(|_| poisoned("list"))?;
        let mut users: Vec<User> = inner.users.values().cloned().collect();
        users.sort_by_key(|u| u.id);
        Ok(users)
    }

    async fn update(&self, patch: UserPatch) -> Result<(), UserStoreError> {
        let mut inner = self.inner.write().map_err(|_| poisoned("update"))?;

        if !inner.users.contains_key(&patch.id) {
            return Err(UserStoreError::NotFound);
        }
        if let Some(login) = &patch.login {
            let taken = inner
                .users
                .values()
                .any(|u| u.id != patch.id && &u.login == login);
            if taken {
                return Err(UserStoreError::AlreadyExists);
            }
        }

        if let Some(user) = inner.users.get_mut(&patch.id) {
            patch.apply_to(user);
        }
        Ok(())
    }

    async fn delete(&self, id: UserId) -> Result<(), UserStoreError> {
        let mut inner = self.inner.write().map_err(|_| poisoned("delete"))?;
        inner.users.remove(&id);
        Ok(())
    }
}
