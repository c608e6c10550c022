//! Obstacle query functions.

use meshmap_types::Obstacle;
use rusqlite::{Connection, Row};

use crate::Result;

/// Insert an obstacle. An existing row with the same id is left as is.
///
/// Returns `true` if a row was written.
pub fn insert(conn: &Connection, o: &Obstacle) -> Result<bool> {
    let inserted = conn.execute(
        "INSERT OR IGNORE INTO obstacles (id, peer_id, timestamp, lat, lon, radius, data)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        rusqlite::params![
            o.id,
            o.peer_id,
            o.timestamp as i64,
            o.lat,
            o.lon,
            o.radius,
            o.data,
        ],
    )?;
    Ok(inserted == 1)
}

/// List all obstacles in insertion order.
pub fn list(conn: &Connection) -> Result<Vec<Obstacle>> {
    let mut stmt = conn.prepare(
        "SELECT id, peer_id, timestamp, lat, lon, radius, data
         FROM obstacles ORDER BY rowid",
    )?;

    let rows = stmt
        .query_map([], from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(rows)
}

/// Number of stored obstacles.
pub fn count(conn: &Connection) -> Result<u64> {
    let n: i64 = conn.query_row("SELECT COUNT(*) FROM obstacles", [], |row| row.get(0))?;
    Ok(n as u64)
}

fn from_row(row: &Row<'_>) -> rusqlite::Result<Obstacle> {
    Ok(Obstacle {
        id: row.get(0)?,
        peer_id: row.get(1)?,
        timestamp: row.get::<_, i64>(2)? as u64,
        lat: row.get(3)?,
        lon: row.get(4)?,
        radius: row.get(5)?,
        data: row.get(6)?,
    })
}
