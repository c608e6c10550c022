//! Peer query functions.

use meshmap_types::Peer;
use rusqlite::Connection;

use crate::Result;

/// Insert or update a peer's `last_seen`. The latest write wins.
pub fn upsert(conn: &Connection, peer_id: &str, last_seen: u64) -> Result<()> {
    conn.execute(
        "INSERT INTO peers (peer_id, last_seen) VALUES (?1, ?2)
         ON CONFLICT(peer_id) DO UPDATE SET last_seen = excluded.last_seen",
        rusqlite::params![peer_id, last_seen as i64],
    )?;
    Ok(())
}

/// List all known peers.
pub fn list(conn: &Connection) -> Result<Vec<Peer>> {
    let mut stmt = conn.prepare("SELECT peer_id, last_seen FROM peers ORDER BY peer_id")?;

    let rows = stmt
        .query_map([], |row| {
            Ok(Peer {
                peer_id: row.get(0)?,
                last_seen: row.get::<_, i64>(1)? as u64,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(rows)
}

/// Number of known peers.
pub fn count(conn: &Connection) -> Result<u64> {
    let n: i64 = conn.query_row("SELECT COUNT(*) FROM peers", [], |row| row.get(0))?;
    Ok(n as u64)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_db() -> Connection {
        crate::open_memory().expect("open test db")
    }

    #[test]
    fn test_upsert_latest_wins() {
        let conn = test_db();
        upsert(&conn, "node-a", 100).expect("upsert");
        upsert(&conn, "node-a", 50).expect("upsert");

        let peers = list(&conn).expect("list");
        assert_eq!(
            peers,
            vec![Peer {
                peer_id: "node-a".into(),
                last_seen: 50
            }]
        );
    }

    #[test]
    fn test_list_sorted_by_id() {
        let conn = test_db();
        upsert(&conn, "node-c", 1).expect("upsert");
        upsert(&conn, "node-a", 2).expect("upsert");

        let ids: Vec<String> = list(&conn).expect("list").into_iter().map(|p| p.peer_id).collect();
        assert_eq!(ids, vec!["node-a", "node-c"]);
        assert_eq!(count(&conn).expect("count"), 2);
    }
}
