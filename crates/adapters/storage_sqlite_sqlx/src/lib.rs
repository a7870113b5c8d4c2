//! # habridge-adapter-storage-sqlite-sqlx
//!
//! `SQLite` persistence adapter using [sqlx](https://docs.rs/sqlx).
//!
//! ## Responsibilities
//! - Implement the `EntityRepository` port defined in `habridge-app::ports::storage`
//! - Manage `SQLite` connection pool lifecycle
//! - Run database migrations (using sqlx embedded migrations)
//! - Map between domain types and database rows
//!
//! ## Dependency rule
//! Depends on `habridge-app` (for port traits) and `habridge-domain` (for domain types).
//! The `app` and `domain` crates must never reference this adapter.

mod entity_repo;
mod error;
mod pool;

pub use entity_repo::SqliteEntityRepository;
pub use error::StorageError;
pub use pool::{Config, Database};
