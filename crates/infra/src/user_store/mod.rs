//! Credential store boundary.
//!
//! The identity service talks to principals only through [`UserStore`]; the
//! in-memory backend serves tests and local runs, the Postgres backend is the
//! durable one.

pub mod in_memory;
pub mod postgres;
pub mod r#trait;

pub use in_memory::InMemoryUserStore;
pub use postgres::PostgresUserStore;
pub use r#trait::{UserStore, UserStoreError};
