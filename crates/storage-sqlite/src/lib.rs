//! SQLite storage implementation for pricefeed.
//!
//! This crate provides all database-related functionality using Diesel ORM with SQLite.
//! It implements the `SnapshotStore` trait defined in `pricefeed-core` and contains:
//! - Database connection pooling and the single-writer actor
//! - Diesel migrations
//! - The ordered key/value layout backing the snapshot log and latest index
//!
//! ```text
//!   core (SnapshotStore trait)
//!              │
//!              ▼
//!   storage-sqlite (this crate)
//!              │
//!              ▼
//!   entries(entry_key, payload)  ── snapshot:<ts> … │ latest:<symbol> …
//! ```

pub mod db;
pub mod errors;
pub mod schema;
pub mod snapshots;

// Re-export database utilities
pub use db::{create_pool, get_connection, init, run_migrations, DbConnection, DbPool, WriteHandle};

// Re-export storage errors and conversion helpers
pub use errors::{IntoCore, StorageError};

pub use snapshots::SqliteSnapshotStore;

// Re-export from pricefeed-core for convenience
pub use pricefeed_core::errors::{DatabaseError, Error, Result};
