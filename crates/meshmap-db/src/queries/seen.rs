//! Seen-message queries used for flood deduplication.

use rusqlite::Connection;

use crate::Result;

/// Record a message id as seen. Re-inserting an existing id is a no-op.
///
/// Returns `true` if the id was not previously recorded. The check and the
/// insert are one statement, so concurrent callers cannot both observe
/// the same id as new.
pub fn mark(conn: &Connection, msg_id: &str, timestamp: u64) -> Result<bool> {
    let inserted = conn.execute(
        "INSERT OR IGNORE INTO messages_seen (msg_id, timestamp) VALUES (?1, ?2)",
        rusqlite::params![msg_id, timestamp as i64],
    )?;
    Ok(inserted == 1)
}

/// Whether a message id has been recorded.
pub fn contains(conn: &Connection, msg_id: &str) -> Result<bool> {
    let mut stmt = conn.prepare_cached("SELECT 1 FROM messages_seen WHERE msg_id = ?1")?;
    Ok(stmt.exists([msg_id])?)
}

/// Number of recorded message ids.
pub fn count(conn: &Connection) -> Result<u64> {
    let n: i64 = conn.query_row("SELECT COUNT(*) FROM messages_seen", [], |row| row.get(0))?;
    Ok(n as u64)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_db() -> Connection {
        crate::open_memory().expect("open test db")
    }

    #[test]
    fn test_mark_and_contains() {
        let conn = test_db();
        assert!(!contains(&conn, "m1").expect("contains"));
        assert!(mark(&conn, "m1", 100).expect("mark"));
        assert!(contains(&conn, "m1").expect("contains"));
    }

    #[test]
    fn test_mark_is_idempotent() {
        let conn = test_db();
        assert!(mark(&conn, "m1", 100).expect("first mark"));
        assert!(!mark(&conn, "m1", 200).expect("second mark"));
        assert!(!mark(&conn, "m1", 100).expect("third mark"));
        assert_eq!(count(&conn).expect("count"), 1);

        let ts: i64 = conn
            .query_row(
                "SELECT timestamp FROM messages_seen WHERE msg_id = 'm1'",
                [],
                |row| row.get(0),
            )
            .expect("query");
        assert_eq!(ts, 100, "first timestamp is kept");
    }
}
