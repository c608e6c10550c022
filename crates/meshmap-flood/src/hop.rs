//! TTL transition for flooded messages.

/// What happens to a message after it has been applied at this node.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Hop {
    /// Re-broadcast with this (already decremented) ttl.
    Forward(u32),
    /// The message ends here.
    Terminal,
}

/// `ttl_in -> ttl_in - 1` while `ttl_in > 1`; terminal otherwise.
///
/// Applies to every message type, including ones this node does not
/// understand.
pub fn next_hop(ttl: u32) -> Hop {
    if ttl > 1 {
        Hop::Forward(ttl - 1)
    } else {
        Hop::Terminal
    }
}
