//! Background listener loop.
//!
//! Polls the transport forever. Frames are drained back to back; after an
//! empty poll or a failed iteration the loop sleeps for `poll_interval`.
//! No failure inside an iteration ends the loop; only the shutdown signal
//! does, and it is checked after every frame as well as while sleeping.

use std::sync::Arc;
use std::time::Duration;

use meshmap_transport::Transport;
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::TryRecvError;
use tracing::{error, info};

use crate::forwarder::Forwarder;

/// Run the listener until `shutdown` fires (or its sender is dropped).
///
/// Returns the number of non-idle frames handled.
pub async fn run_listener<T: Transport>(
    forwarder: Arc<Forwarder<T>>,
    poll_interval: Duration,
    mut shutdown: broadcast::Receiver<()>,
) -> u64 {
    info!(interval_ms = poll_interval.as_millis() as u64, "Mesh listener started");
    let mut handled = 0u64;

    loop {
        let idle = match forwarder.poll_once() {
            Ok(outcome) if outcome.is_idle() => true,
            Ok(_) => {
                handled += 1;
                false
            }
            Err(e) => {
                error!(error = %e, "Mesh listener iteration failed");
                true
            }
        };

        if idle {
            tokio::select! {
                _ = tokio::time::sleep(poll_interval) => {}
                _ = shutdown.recv() => break,
            }
        } else {
            match shutdown.try_recv() {
                Err(TryRecvError::Empty) => tokio::task::yield_now().await,
                _ => break,
            }
        }
    }

    info!(handled, "Mesh listener stopped");
    handled
}
