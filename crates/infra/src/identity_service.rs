//! Identity use cases: registration, login and account management.
//!
//! The service composes a [`UserStore`], a [`PasswordHasher`] and a
//! [`TokenService`]. It owns input validation and the translation of store
//! failures into [`IdentityError`]; it contains no IO of its own.
//!
//! Hashing and verification are CPU-bound by design, so both run on tokio's
//! blocking pool instead of the async workers.

use std::sync::Arc;

use tracing::instrument;

use tablebook_auth::{NewUser, PasswordHasher, Role, TokenService, User, UserPatch};
use tablebook_core::{IdentityError, IdentityResult, UserId};

use crate::user_store::{UserStore, UserStoreError};

/// Shortest accepted password, in characters.
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Plaintext verified against when a login does not exist, so both failure
/// paths pay for one hash verification.
const DUMMY_PASSWORD: &str = "tablebook-dummy-password";

impl From<UserStoreError> for IdentityError {
    fn from(err: UserStoreError) -> Self {
        match err {
            UserStoreError::NotFound => IdentityError::NotFound,
            UserStoreError::AlreadyExists => IdentityError::AlreadyExists,
            UserStoreError::Timeout { operation } => {
                IdentityError::internal(format!("store {operation} timed out"))
            }
            UserStoreError::Backend { operation, message } => {
                IdentityError::internal(format!("store {operation} failed: {message}"))
            }
        }
    }
}

/// Registration request. The password is plaintext and never leaves the service.
#[derive(Clone)]
pub struct RegisterUser {
    pub name: String,
    pub login: String,
    pub password: String,
}

impl core::fmt::Debug for RegisterUser {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("RegisterUser")
            .field("name", &self.name)
            .field("login", &self.login)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Partial account update. `None` leaves a field untouched.
#[derive(Clone, Default)]
pub struct UpdateUser {
    pub name: Option<String>,
    pub login: Option<String>,
    pub password: Option<String>,
    pub role: Option<String>,
}

impl UpdateUser {
    fn is_empty(&self) -> bool {
        self.name.is_none() && self.login.is_none() && self.password.is_none() && self.role.is_none()
    }
}

impl core::fmt::Debug for UpdateUser {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("UpdateUser")
            .field("name", &self.name)
            .field("login", &self.login)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("role", &self.role)
            .finish()
    }
}

pub struct IdentityService<S> {
    store: S,
    hasher: PasswordHasher,
    tokens: Arc<TokenService>,
    dummy_digest: String,
}

impl<S> IdentityService<S>
where
    S: UserStore,
{
    pub fn new(store: S, hasher: PasswordHasher, tokens: Arc<TokenService>) -> IdentityResult<Self> {
        let dummy_digest = hasher
            .hash(DUMMY_PASSWORD)
            .map_err(|e| IdentityError::internal(e.to_string()))?;
        Ok(Self {
            store,
            hasher,
            tokens,
            dummy_digest,
        })
    }

    pub fn tokens(&self) -> &Arc<TokenService> {
        &self.tokens
    }

    /// Register a principal with the default role.
    #[instrument(skip(self, req), fields(login = %req.login), err)]
    pub async fn register(&self, req: RegisterUser) -> IdentityResult<UserId> {
        self.register_with_role(req, Role::USER).await
    }

    /// Register a principal with an explicit role.
    ///
    /// Reachable only through admin endpoints and the startup admin seed.
    #[instrument(skip(self, req), fields(login = %req.login, role = %role), err)]
    pub async fn register_with_role(&self, req: RegisterUser, role: Role) -> IdentityResult<UserId> {
        require_non_blank("name", &req.name)?;
        require_non_blank("login", &req.login)?;
        validate_password(&req.password)?;

        let password_hash = self.hash(req.password).await?;
        let id = self
            .store
            .create(NewUser {
                name: req.name,
                login: req.login,
                password_hash,
                role,
            })
            .await?;

        tracing::info!(user_id = %id, "user registered");
        Ok(id)
    }

    /// Exchange a login and password for a session token.
    ///
    /// An unknown login yields `NotFound` and a mismatch `WrongPassword`; both
    /// paths spend one hash verification. Callers facing the network must not
    /// let the two be told apart.
    #[instrument(skip(self, password), err(level = "info"))]
    pub async fn login(&self, login: &str, password: &str) -> IdentityResult<String> {
        require_non_blank("login", login)?;
        if password.is_empty() {
            return Err(IdentityError::validation("password must not be empty"));
        }

        let user = match self.store.get_by_login(login).await {
            Ok(user) => user,
            Err(UserStoreError::NotFound) => {
                self.verify(self.dummy_digest.clone(), password.to_string()).await?;
                return Err(IdentityError::NotFound);
            }
            Err(e) => return Err(e.into()),
        };

        if !self.verify(user.password_hash.clone(), password.to_string()).await? {
            return Err(IdentityError::WrongPassword);
        }

        let token = self
            .tokens
            .issue(&user)
            .map_err(|e| IdentityError::internal(e.to_string()))?;
        tracing::info!(user_id = %user.id, "login succeeded");
        Ok(token)
    }

    #[instrument(skip(self), err(level = "debug"))]
    pub async fn get_user(&self, id: UserId) -> IdentityResult<User> {
        Ok(self.store.get_by_id(id).await?)
    }

    #[instrument(skip(self), err(level = "debug"))]
    pub async fn get_user_by_login(&self, login: &str) -> IdentityResult<User> {
        require_non_blank("login", login)?;
        Ok(self.store.get_by_login(login).await?)
    }

    #[instrument(skip(self), err)]
    pub async fn list_users(&self) -> IdentityResult<Vec<User>> {
        Ok(self.store.list().await?)
    }

    /// Apply a partial update and return the stored result.
    ///
    /// Supplied name and login must be non-blank; a blank role falls back to
    /// the default; a new password is validated and hashed.
    #[instrument(skip(self, req), err)]
    pub async fn update_user(&self, id: UserId, req: UpdateUser) -> IdentityResult<User> {
        if req.is_empty() {
            return Err(IdentityError::validation("at least one field must be supplied"));
        }

        let mut patch = UserPatch::new(id);
        if let Some(name) = req.name {
            require_non_blank("name", &name)?;
            patch = patch.name(name);
        }
        if let Some(login) = req.login {
            require_non_blank("login", &login)?;
            patch = patch.login(login);
        }
        if let Some(role) = req.role {
            patch = patch.role(Role::from_tag(&role));
        }
        if let Some(password) = req.password {
            validate_password(&password)?;
            patch = patch.password_hash(self.hash(password).await?);
        }

        self.store.update(patch).await?;
        tracing::info!(user_id = %id, "user updated");
        Ok(self.store.get_by_id(id).await?)
    }

    /// Remove a principal. Removing an absent id succeeds.
    #[instrument(skip(self), err)]
    pub async fn delete_user(&self, id: UserId) -> IdentityResult<()> {
        self.store.delete(id).await?;
        tracing::info!(user_id = %id, "user deleted");
        Ok(())
    }

    async fn hash(&self, password: String) -> IdentityResult<String> {
        let hasher = self.hasher.clone();
        tokio::task::spawn_blocking(move || hasher.hash(&password))
            .await
            .map_err(|e| IdentityError::internal(format!("hashing task failed: {e}")))?
            .map_err(|e| IdentityError::internal(e.to_string()))
    }

    async fn verify(&self, digest: String, password: String) -> IdentityResult<bool> {
        let hasher = self.hasher.clone();
        tokio::task::spawn_blocking(move || hasher.verify(&digest, &password))
            .await
            .map_err(|e| IdentityError::internal(format!("verification task failed: {e}")))
    }
}

impl<S> core::fmt::Debug for IdentityService<S> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("IdentityService").finish_non_exhaustive()
    }
}

fn require_non_blank(field: &str, value: &str) -> IdentityResult<()> {
    if value.trim().is_empty() {
        return Err(IdentityError::validation(format!("{field} must not be empty")));
    }
    Ok(())
}

fn validate_password(password: &str) -> IdentityResult<()> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(IdentityError::validation(format!(
            "password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }
    Ok(())
}
