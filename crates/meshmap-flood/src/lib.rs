//! # meshmap-flood
//!
//! Store-and-forward flooding for map annotations and obstacle reports.
//!
//! Each node re-broadcasts every message it has not seen before, with the
//! hop budget (`ttl`) decremented by one, until the budget runs out. Loop
//! suppression relies entirely on the ledger's seen-id table: a message id
//! is recorded the first time it is created or received, and any later
//! copy is dropped.
//!
//! - [`hop`]: the pure TTL transition
//! - [`forwarder`]: broadcast and receive
//! - [`listener`]: the background polling loop

pub mod forwarder;
pub mod hop;
pub mod listener;

pub use forwarder::{Applied, Delivery, FloodConfig, Forwarder, ReceiveOutcome};
pub use hop::{next_hop, Hop};
pub use listener::run_listener;

use meshmap_db::LedgerError;
use meshmap_transport::TransportError;

/// Flood protocol errors.
///
/// Only ledger failures and local encode/receive failures surface here;
/// bad inbound frames are reported through [`ReceiveOutcome`] and send
/// failures are logged.
#[derive(Debug, thiserror::Error)]
pub enum FloodError {
    #[error("ledger error: {0}")]
    Ledger(#[from] LedgerError),

    #[error("transport error: {0}")]
    Transport(#[from] TransportError),
}

pub type Result<T> = std::result::Result<T, FloodError>;
