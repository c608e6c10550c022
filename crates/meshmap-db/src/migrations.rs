//! Ledger migration system.
//!
//! Schema version stored in `PRAGMA user_version`. Version `n` is reached
//! by applying `MIGRATIONS[n - 1]`. Migrations are forward-only and each
//! runs in its own transaction.

use rusqlite::Connection;

use crate::{schema, LedgerError, Result, SCHEMA_VERSION};

/// Ordered migration scripts. Append, never edit.
pub(crate) const MIGRATIONS: &[&str] = &[schema::SCHEMA_V1];

/// Bring the database up to [`SCHEMA_VERSION`].
pub fn run(conn: &Connection) -> Result<()> {
    let current: u32 = conn.pragma_query_value(None, "user_version", |row| row.get(0))?;

    if current > SCHEMA_VERSION {
        return Err(LedgerError::Migration(format!(
            "ledger version {current} is newer than supported {SCHEMA_VERSION}"
        )));
    }

    for (version, script) in (1u32..).zip(MIGRATIONS).skip(current as usize) {
        tracing::info!(version, "Applying ledger migration");
        conn.execute_batch(&format!(
            "BEGIN;\n{script}\nPRAGMA user_version = {version};\nCOMMIT;"
        ))
        .map_err(|e| LedgerError::Migration(format!("v{version}: {e}")))?;
    }

    Ok(())
}
