//! Shared, lock-guarded ledger handle.
//!
//! A [`Ledger`] owns one SQLite connection behind a single mutex. Every
//! operation is a short synchronous statement executed while holding that
//! lock, so the listener task and any number of request handlers can share
//! one `Arc<Ledger>`.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use meshmap_types::{Annotation, Obstacle, Peer};
use rusqlite::Connection;

use crate::queries::{annotations, obstacles, peers, seen};
use crate::{LedgerError, Result};

/// Row counts per table.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LedgerCounts {
    pub seen: u64,
    pub annotations: u64,
    pub obstacles: u64,
    pub peers: u64,
}

/// The node ledger.
pub struct Ledger {
    conn: Mutex<Connection>,
}

impl Ledger {
    /// Open or create the ledger database at `path`.
    pub fn open(path: &Path) -> Result<Self> {
        tracing::info!(path = %path.display(), "Opening ledger");
        Ok(Self::from_connection(crate::open(path)?))
    }

    /// Open a fresh in-memory ledger.
    pub fn open_memory() -> Result<Self> {
        Ok(Self::from_connection(crate::open_memory()?))
    }

    /// Wrap an already migrated connection.
    pub fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| LedgerError::Poisoned)
    }

    /// Whether `msg_id` has been seen.
    pub fn has_seen(&self, msg_id: &str) -> Result<bool> {
        let conn = self.lock()?;
        let found = seen::contains(&conn, msg_id)?;
        tracing::trace!(msg_id, found, "Seen lookup");
        Ok(found)
    }

    /// Record `msg_id` as seen. Duplicate ids are ignored.
    pub fn mark_seen(&self, msg_id: &str, timestamp: u64) -> Result<()> {
        let conn = self.lock()?;
        seen::mark(&conn, msg_id, timestamp)?;
        Ok(())
    }

    /// Atomically record `msg_id` as seen.
    ///
    /// Returns `true` if this call recorded it, `false` if it was already
    /// present. Two concurrent deliveries of one message cannot both get
    /// `true`.
    pub fn check_and_mark(&self, msg_id: &str, timestamp: u64) -> Result<bool> {
        let conn = self.lock()?;
        let fresh = seen::mark(&conn, msg_id, timestamp)?;
        tracing::trace!(msg_id, fresh, "Seen check-and-mark");
        Ok(fresh)
    }

    /// Insert an annotation. First write for a given id wins.
    pub fn insert_annotation(&self, annotation: &Annotation) -> Result<bool> {
        let conn = self.lock()?;
        let inserted = annotations::insert(&conn, annotation)?;
        if inserted {
            tracing::debug!(
                id = %annotation.id,
                lat = annotation.lat,
                lon = annotation.lon,
                "Stored annotation"
            );
        }
        Ok(inserted)
    }

    /// Insert an obstacle. First write for a given id wins.
    pub fn insert_obstacle(&self, obstacle: &Obstacle) -> Result<bool> {
        let conn = self.lock()?;
        let inserted = obstacles::insert(&conn, obstacle)?;
        if inserted {
            tracing::debug!(
                id = %obstacle.id,
                lat = obstacle.lat,
                lon = obstacle.lon,
                radius = obstacle.radius,
                "Stored obstacle"
            );
        }
        Ok(inserted)
    }

    pub fn list_annotations(&self) -> Result<Vec<Annotation>> {
        let conn = self.lock()?;
        let rows = annotations::list(&conn)?;
        tracing::trace!(count = rows.len(), "Fetched annotations");
        Ok(rows)
    }

    pub fn list_obstacles(&self) -> Result<Vec<Obstacle>> {
        let conn = self.lock()?;
        let rows = obstacles::list(&conn)?;
        tracing::trace!(count = rows.len(), "Fetched obstacles");
        Ok(rows)
    }

    /// Insert or refresh a peer's `last_seen`.
    pub fn upsert_peer(&self, peer_id: &str, last_seen: u64) -> Result<()> {
        let conn = self.lock()?;
        peers::upsert(&conn, peer_id, last_seen)
    }

    pub fn list_peers(&self) -> Result<Vec<Peer>> {
        let conn = self.lock()?;
        peers::list(&conn)
    }

    /// Row counts for diagnostics.
    pub fn counts(&self) -> Result<LedgerCounts> {
        let conn = self.lock()?;
        Ok(LedgerCounts {
            seen: seen::count(&conn)?,
            annotations: annotations::count(&conn)?,
            obstacles: obstacles::count(&conn)?,
            peers: peers::count(&conn)?,
        })
    }
}
