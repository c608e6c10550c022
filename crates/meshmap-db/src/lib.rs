//! # meshmap-db
//!
//! The node ledger: the durable dedup record of every flood message id
//! this node has seen, plus the annotations, obstacles and peers learned
//! from those messages. Backed by a single SQLite database.
//!
//! ## Schema
//!
//! - WAL mode
//! - All timestamps are Unix epoch seconds
//! - Schema version stored in `PRAGMA user_version`
//!
//! Rows are append-only. Nothing in the workspace deletes seen ids,
//! annotations or obstacles, so the ledger grows for the lifetime of the
//! node.

pub mod ledger;
pub mod migrations;
pub mod queries;
pub mod schema;

pub use ledger::{Ledger, LedgerCounts};

use rusqlite::Connection;
use std::path::Path;

/// Current schema version.
pub const SCHEMA_VERSION: u32 = migrations::MIGRATIONS.len() as u32;

/// Ledger error types.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("migration failed: {0}")]
    Migration(String),

    #[error("ledger lock poisoned")]
    Poisoned,
}

pub type Result<T> = std::result::Result<T, LedgerError>;

/// Open or create a ledger database at the given path.
///
/// Configures pragmas and runs any pending migrations.
pub fn open(path: &Path) -> Result<Connection> {
    prepare(Connection::open(path)?)
}

/// Open a private in-memory database. Nothing survives the connection.
pub fn open_memory() -> Result<Connection> {
    prepare(Connection::open_in_memory()?)
}

fn prepare(conn: Connection) -> Result<Connection> {
    conn.execute_batch(
        "PRAGMA journal_mode = WAL;
         PRAGMA busy_timeout = 5000;
         PRAGMA synchronous = NORMAL;",
    )?;
    migrations::run(&conn)?;
    Ok(conn)
}
