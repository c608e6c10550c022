//! Shared fixtures: in-memory nodes, multi-medium relays and a
//! deterministic pump that drains every node until the mesh is quiet.

#![allow(dead_code)]

use std::sync::Arc;

use meshmap_db::Ledger;
use meshmap_flood::{FloodConfig, Forwarder};
use meshmap_transport::{LoopbackTransport, Transport};
use meshmap_types::{AnnotationPayload, ObstaclePayload, Payload};

/// One mesh node: its own ledger and forwarder.
pub struct Node {
    pub name: String,
    pub ledger: Arc<Ledger>,
    pub forwarder: Arc<Forwarder<Box<dyn Transport>>>,
}

impl Node {
    pub fn new(name: &str, transport: Box<dyn Transport>, max_ttl: u32) -> Self {
        let ledger = Arc::new(Ledger::open_memory().expect("ledger"));
        Self::with_ledger(name, ledger, transport, max_ttl)
    }

    pub fn with_ledger(
        name: &str,
        ledger: Arc<Ledger>,
        transport: Box<dyn Transport>,
        max_ttl: u32,
    ) -> Self {
        let forwarder = Arc::new(Forwarder::new(
            ledger.clone(),
            transport,
            FloodConfig::new(name).with_max_ttl(max_ttl),
        ));
        Self {
            name: name.to_string(),
            ledger,
            forwarder,
        }
    }

    pub fn annotation_count(&self) -> usize {
        self.ledger.list_annotations().expect("list").len()
    }
}

/// A node radio that sits on several media at once. Sends go out on all of
/// them; receives take the first waiting frame.
pub struct Bridge(pub Vec<LoopbackTransport>);

impl Transport for Bridge {
    fn send(&self, frame: &[u8]) -> meshmap_transport::Result<()> {
        for link in &self.0 {
            link.send(frame)?;
        }
        Ok(())
    }

    fn receive(&self) -> meshmap_transport::Result<Option<Vec<u8>>> {
        for link in &self.0 {
            if let Some(frame) = link.receive()? {
                return Ok(Some(frame));
            }
        }
        Ok(None)
    }
}

/// Poll every node until a full round handles nothing. Returns the number
/// of frames handled.
pub fn pump(nodes: &[Node]) -> usize {
    let mut handled = 0;
    loop {
        let mut progressed = false;
        for node in nodes {
            while !node.forwarder.poll_once().expect("poll").is_idle() {
                handled += 1;
                progressed = true;
            }
        }
        if !progressed {
            return handled;
        }
    }
}

pub fn annotation(lat: f64, lon: f64, data: &str) -> Payload {
    Payload::Annotation(AnnotationPayload {
        lat,
        lon,
        data: Some(data.to_string()),
    })
}

pub fn obstacle(lat: f64, lon: f64, radius: f64) -> Payload {
    Payload::Obstacle(ObstaclePayload {
        lat,
        lon,
        radius: Some(radius),
        data: None,
    })
}
