//! SQL schema definitions.

/// Complete schema for the v1 ledger.
pub const SCHEMA_V1: &str = r#"
-- ============================================================
-- Flood deduplication
-- ============================================================

CREATE TABLE IF NOT EXISTS messages_seen (
    msg_id TEXT PRIMARY KEY,
    timestamp INTEGER NOT NULL
);

-- ============================================================
-- Map entities
-- ============================================================

CREATE TABLE IF NOT EXISTS annotations (
    id TEXT PRIMARY KEY,
    peer_id TEXT NOT NULL,
    timestamp INTEGER NOT NULL,
    lat REAL NOT NULL,
    lon REAL NOT NULL,
    data TEXT NOT NULL DEFAULT ''
);

CREATE TABLE IF NOT EXISTS obstacles (
    id TEXT PRIMARY KEY,
    peer_id TEXT NOT NULL,
    timestamp INTEGER NOT NULL,
    lat REAL NOT NULL,
    lon REAL NOT NULL,
    radius REAL NOT NULL DEFAULT 1.0,
    data TEXT NOT NULL DEFAULT ''
);

-- ============================================================
-- Peers
-- ============================================================

CREATE TABLE IF NOT EXISTS peers (
    peer_id TEXT PRIMARY KEY,
    last_seen INTEGER NOT NULL
);
"#;
