//! Annotation query functions.

use meshmap_types::Annotation;
use rusqlite::{Connection, Row};

use crate::Result;

/// Insert an annotation. An existing row with the same id is left as is.
///
/// Returns `true` if a row was written.
pub fn insert(conn: &Connection, a: &Annotation) -> Result<bool> {
    let inserted = conn.execute(
        "INSERT OR IGNORE INTO annotations (id, peer_id, timestamp, lat, lon, data)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        rusqlite::params![a.id, a.peer_id, a.timestamp as i64, a.lat, a.lon, a.data],
    )?;
    Ok(inserted == 1)
}

/// List all annotations in insertion order.
pub fn list(conn: &Connection) -> Result<Vec<Annotation>> {
    let mut stmt = conn.prepare(
        "SELECT id, peer_id, timestamp, lat, lon, data
         FROM annotations ORDER BY rowid",
    )?;

    let rows = stmt
        .query_map([], from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(rows)
}

/// Number of stored annotations.
pub fn count(conn: &Connection) -> Result<u64> {
    let n: i64 = conn.query_row("SELECT COUNT(*) FROM annotations", [], |row| row.get(0))?;
    Ok(n as u64)
}

fn from_row(row: &Row<'_>) -> rusqlite::Result<Annotation> {
    Ok(Annotation {
        id: row.get(0)?,
        peer_id: row.get(1)?,
        timestamp: row.get::<_, i64>(2)? as u64,
        lat: row.get(3)?,
        lon: row.get(4)?,
        data: row.get(5)?,
    })
}
