//! Ledger query functions organized by table.
//!
//! Every function takes a borrowed [`rusqlite::Connection`]; locking is the
//! caller's concern (see [`crate::Ledger`]).

pub mod annotations;
pub mod obstacles;
pub mod peers;
pub mod seen;
