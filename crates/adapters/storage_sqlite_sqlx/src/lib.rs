//! # twilight-adapter-storage-sqlite-sqlx
//!
//! `SQLite` persistence adapter using [sqlx](https://docs.rs/sqlx).
//!
//! ## Responsibilities
//! - Implement the [`FiringLedger`](twilight_app::ports::FiringLedger) port
//! - Manage `SQLite` connection pool lifecycle
//! - Run database migrations (using sqlx embedded migrations)
//!
//! ## Dependency rule
//! Depends on `twilight-app` (for port traits) and `twilight-domain` (for domain types).
//! The `app` and `domain` crates must never reference this adapter.

pub mod error;
pub mod ledger;
pub mod pool;

pub use error::StorageError;
pub use ledger::SqliteFiringLedger;
pub use pool::{Config, Database};
