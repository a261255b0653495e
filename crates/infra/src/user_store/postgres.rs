//! Postgres-backed credential store.
//!
//! ## Error Mapping
//!
//! | SQLx Error | PostgreSQL Error Code | UserStoreError | Scenario |
//! |------------|----------------------|----------------|----------|
//! | Database (unique violation) | `23505` | `AlreadyExists` | Login collision on insert or update |
//! | Database (other) | Any other | `Backend` | Constraint or syntax faults |
//! | PoolClosed / Io / Tls / other | N/A | `Backend` | Connection failures |
//! | (elapsed) | N/A | `Timeout` | Query exceeded the configured bound |
//!
//! The `UNIQUE` constraint on `login` is the final authority for uniqueness;
//! the pre-checks inside `update` only produce a cleaner error in the common case.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Row};
use tracing::instrument;

use tablebook_auth::{NewUser, Role, User, UserPatch};
use tablebook_core::UserId;

use super::r#trait::{UserStore, UserStoreError};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    id       BIGSERIAL PRIMARY KEY,
    name     TEXT NOT NULL,
    login    TEXT NOT NULL UNIQUE,
    hashpass TEXT NOT NULL,
    role     TEXT NOT NULL DEFAULT 'user'
)
"#;

/// Durable credential store over a `PgPool`.
///
/// Every call is bounded by `query_timeout`; an elapsed call is dropped, which
/// cancels the in-flight query and returns its connection to the pool.
#[derive(Debug, Clone)]
pub struct PostgresUserStore {
    pool: PgPool,
    query_timeout: Duration,
}

impl PostgresUserStore {
    pub fn new(pool: PgPool, query_timeout: Duration) -> Self {
        Self {
            pool,
            query_timeout,
        }
    }

    /// Open a pool against `database_url`.
    pub async fn connect(
        database_url: &str,
        query_timeout: Duration,
    ) -> Result<Self, UserStoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .acquire_timeout(query_timeout)
            .connect(database_url)
            .await
            .map_err(|e| map_sqlx_error("connect", e))?;
        Ok(Self::new(pool, query_timeout))
    }

    /// Create the `users` table if it does not exist yet.
    #[instrument(skip(self), err)]
    pub async fn ensure_schema(&self) -> Result<(), UserStoreError> {
        self.bounded("ensure_schema", async {
            sqlx::query(SCHEMA)
                .execute(&self.pool)
                .await
                .map_err(|e| map_sqlx_error("ensure_schema", e))?;
            Ok(())
        })
        .await
    }

    async fn bounded<T, F>(&self, operation: &'static str, fut: F) -> Result<T, UserStoreError>
    where
        F: Future<Output = Result<T, UserStoreError>>,
    {
        match tokio::time::timeout(self.query_timeout, fut).await {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!(
                    operation,
                    timeout_ms = self.query_timeout.as_millis() as u64,
                    "store query timed out"
                );
                Err(UserStoreError::Timeout { operation })
            }
        }
    }

    async fn fetch_one_where(
        &self,
        operation: &'static str,
        sql: &'static str,
        bind: Key<'_>,
    ) -> Result<User, UserStoreError> {
        let query = sqlx::query(sql);
        let query = match bind {
            Key::Id(id) => query.bind(id),
            Key::Login(login) => query.bind(login),
        };
        let row = query
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error(operation, e))?
            .ok_or(UserStoreError::NotFound)?;
        user_from_row(operation, &row)
    }

    async fn update_in_tx(&self, id: i64, patch: &UserPatch) -> Result<(), UserStoreError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_transaction", e))?;

        let exists: Option<i64> = sqlx::query_scalar("SELECT id FROM users WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("update", e))?;
        if exists.is_none() {
            // Dropping the transaction rolls it back.
            return Err(UserStoreError::NotFound);
        }

        if let Some(login) = patch.login.as_deref() {
            let taken: Option<i64> =
                sqlx::query_scalar("SELECT id FROM users WHERE login = $1 AND id <> $2")
                    .bind(login)
                    .bind(id)
                    .fetch_optional(&mut *tx)
                    .await
                    .map_err(|e| map_sqlx_error("update", e))?;
            if taken.is_some() {
                return Err(UserStoreError::AlreadyExists);
            }
        }

        sqlx::query(
            r#"
            UPDATE users SET
                name     = COALESCE($2, name),
                login    = COALESCE($3, login),
                hashpass = COALESCE($4, hashpass),
                role     = COALESCE($5, role)
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(patch.name.as_deref())
        .bind(patch.login.as_deref())
        .bind(patch.password_hash.as_deref())
        .bind(patch.role.as_ref().map(Role::as_str))
        .execute(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("update", e))?;

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", e))
    }
}

enum Key<'a> {
    Id(i64),
    Login(&'a str),
}

/// Ids above `i64::MAX` cannot be stored in a `BIGSERIAL` column.
fn db_id(id: UserId) -> Option<i64> {
    i64::try_from(id.get()).ok()
}

#[async_trait]
impl UserStore for PostgresUserStore {
    #[instrument(skip(self, user), fields(login = %user.login), err)]
    async fn create(&self, user: NewUser) -> Result<UserId, UserStoreError> {
        self.bounded("create", async {
            let id: i64 = sqlx::query_scalar(
                "INSERT INTO users (name, login, hashpass, role) VALUES ($1, $2, $3, $4) RETURNING id",
            )
            .bind(&user.name)
            .bind(&user.login)
            .bind(&user.password_hash)
            .bind(user.role.as_str())
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("create", e))?;

            u64::try_from(id)
                .map(UserId::new)
                .map_err(|_| UserStoreError::backend("create", format!("negative id {id} returned")))
        })
        .await
    }

    #[instrument(skip(self), fields(user_id = %id), err)]
    async fn get_by_id(&self, id: UserId) -> Result<User, UserStoreError> {
        let Some(id) = db_id(id) else {
            return Err(UserStoreError::NotFound);
        };
        self.bounded(
            "get_by_id",
            self.fetch_one_where(
                "get_by_id",
                "SELECT id, name, login, hashpass, role FROM users WHERE id = $1",
                Key::Id(id),
            ),
        )
        .await
    }

    #[instrument(skip(self), err)]
    async fn get_by_login(&self, login: &str) -> Result<User, UserStoreError> {
        self.bounded(
            "get_by_login",
            self.fetch_one_where(
                "get_by_login",
                "SELECT id, name, login, hashpass, role FROM users WHERE login = $1",
                Key::Login(login),
            ),
        )
        .await
    }

    #[instrument(skip(self), err)]
    async fn list(&self) -> Result<Vec<User>, UserStoreError> {
        self.bounded("list", async {
            let rows = sqlx::query("SELECT id, name, login, hashpass, role FROM users ORDER BY id ASC")
                .fetch_all(&self.pool)
                .await
                .map_err(|e| map_sqlx_error("list", e))?;

            rows.iter()
                .map(|row| user_from_row("list", row))
                .collect::<Result<Vec<_>, _>>()
        })
        .await
    }

    #[instrument(skip(self, patch), fields(user_id = %patch.id), err)]
    async fn update(&self, patch: UserPatch) -> Result<(), UserStoreError> {
        let Some(id) = db_id(patch.id) else {
            return Err(UserStoreError::NotFound);
        };
        if patch.is_empty() {
            // Nothing to write, but absent ids still report NotFound.
            return self.get_by_id(patch.id).await.map(|_| ());
        }
        self.bounded("update", self.update_in_tx(id, &patch)).await
    }

    #[instrument(skip(self), fields(user_id = %id), err)]
    async fn delete(&self, id: UserId) -> Result<(), UserStoreError> {
        let Some(id) = db_id(id) else {
            return Ok(());
        };
        self.bounded("delete", async {
            sqlx::query("DELETE FROM users WHERE id = $1")
                .bind(id)
                .execute(&self.pool)
                .await
                .map_err(|e| map_sqlx_error("delete", e))?;
            Ok(())
        })
        .await
    }
}

fn user_from_row(operation: &'static str, row: &PgRow) -> Result<User, UserStoreError> {
    let decode = |e: sqlx::Error| UserStoreError::backend(operation, format!("row decode failed: {e}"));

    let id: i64 = row.try_get("id").map_err(decode)?;
    let id = u64::try_from(id)
        .map_err(|_| UserStoreError::backend(operation, format!("negative id {id} in users table")))?;
    let role: String = row.try_get("role").map_err(decode)?;

    Ok(User {
        id: UserId::new(id),
        name: row.try_get("name").map_err(decode)?,
        login: row.try_get("login").map_err(decode)?,
        password_hash: row.try_get("hashpass").map_err(decode)?,
        role: Role::from_tag(&role),
    })
}

/// Map SQLx errors to `UserStoreError`.
fn map_sqlx_error(operation: &'static str, err: sqlx::Error) -> UserStoreError {
    match err {
        sqlx::Error::Database(db_err) => {
            if db_err.code().as_deref() == Some("23505") {
                UserStoreError::AlreadyExists
            } else {
                UserStoreError::backend(operation, format!("database error: {}", db_err.message()))
            }
        }
        sqlx::Error::PoolClosed => UserStoreError::backend(operation, "connection pool closed"),
        sqlx::Error::PoolTimedOut => UserStoreError::Timeout { operation },
        other => UserStoreError::backend(operation, other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    //! These tests need a live database and are skipped unless
    //! `TABLEBOOK_TEST_DATABASE_URL` is set.

    use super::*;
    use std::sync::atomic::{AtomicU64, Ordering};

    async fn store() -> Option<PostgresUserStore> {
        let url = std::env::var("TABLEBOOK_TEST_DATABASE_URL").ok()?;
        let store = PostgresUserStore::connect(&url, Duration::from_secs(5))
            .await
            .unwrap();
        store.ensure_schema().await.unwrap();
        Some(store)
    }

    /// Logins unique across test runs sharing one database.
    fn unique_login(prefix: &str) -> String {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        let nanos = chrono::Utc::now().timestamp_nanos_opt().unwrap_or_default();
        format!("{prefix}-{nanos}-{}", COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    fn new_user(login: &str) -> NewUser {
        NewUser {
            name: "Test".to_string(),
            login: login.to_string(),
            password_hash: "$argon2id$v=19$m=256,t=1,p=1$c2FsdA$aGFzaA".to_string(),
            role: Role::USER,
        }
    }

    #[tokio::test]
    async fn create_get_and_duplicate() {
        let Some(store) = store().await else { return };
        let login = unique_login("alice");

        let id = store.create(new_user(&login)).await.unwrap();
        let by_id = store.get_by_id(id).await.unwrap();
        let by_login = store.get_by_login(&login).await.unwrap();
        assert_eq!(by_id, by_login);
        assert_eq!(by_id.role, Role::USER);

        assert_eq!(
            store.create(new_user(&login)).await,
            Err(UserStoreError::AlreadyExists)
        );

        store.delete(id).await.unwrap();
        store.delete(id).await.unwrap();
        assert_eq!(store.get_by_id(id).await, Err(UserStoreError::NotFound));
    }

    #[tokio::test]
    async fn partial_update_and_login_collision() {
        let Some(store) = store().await else { return };
        let alice_login = unique_login("alice");
        let bob_login = unique_login("bob");

        let alice = store.create(new_user(&alice_login)).await.unwrap();
        let bob = store.create(new_user(&bob_login)).await.unwrap();

        store.update(UserPatch::new(alice).name("Alice")).await.unwrap();
        let updated = store.get_by_id(alice).await.unwrap();
        assert_eq!(updated.name, "Alice");
        assert_eq!(updated.login, alice_login);

        let before = store.get_by_id(bob).await.unwrap();
        assert_eq!(
            store
                .update(UserPatch::new(bob).login(alice_login.clone()).name("Bobby"))
                .await,
            Err(UserStoreError::AlreadyExists)
        );
        assert_eq!(store.get_by_id(bob).await.unwrap(), before);

        store
            .update(UserPatch::new(alice).login(alice_login.clone()))
            .await
            .unwrap();

        store.delete(alice).await.unwrap();
        store.delete(bob).await.unwrap();
    }

    #[tokio::test]
    async fn out_of_range_id_is_not_found() {
        let Some(store) = store().await else { return };
        let huge = UserId::new(u64::MAX);
        assert_eq!(store.get_by_id(huge).await, Err(UserStoreError::NotFound));
        assert_eq!(
            store.update(UserPatch::new(huge).name("x")).await,
            Err(UserStoreError::NotFound)
        );
        store.delete(huge).await.unwrap();
    }
}
