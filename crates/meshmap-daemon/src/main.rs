//! meshmapd: the offline mesh map daemon.
//!
//! Single OS process running a Tokio async runtime. One background task
//! polls the radio link and floods map messages; local clients talk to the
//! daemon via JSON-RPC over a Unix socket.

mod commands;
mod config;
mod rpc;

use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use meshmap_db::Ledger;
use meshmap_flood::{run_listener, FloodConfig, Forwarder};
use meshmap_routing::Pathfinder;
use meshmap_transport::{LoopbackMedium, Transport, UdpTransport};
use tokio::sync::broadcast;
use tracing::{error, info, warn};

use crate::config::{DaemonConfig, RadioConfig, RadioKind};
use crate::rpc::RpcServer;

/// Handles shared by the listener task and every RPC call.
pub struct DaemonState {
    /// Dedup and map store.
    pub ledger: Arc<Ledger>,
    /// Flood forwarder on the configured radio link.
    pub forwarder: Arc<Forwarder<Box<dyn Transport>>>,
    /// Route planner over the ledger's obstacles.
    pub pathfinder: Arc<Pathfinder>,
    pub config: DaemonConfig,
    /// Fired once to stop the listener and the RPC loop.
    pub shutdown_tx: broadcast::Sender<()>,
    /// Keeps the in-process medium alive for `radio.kind = "loopback"`.
    _medium: Option<LoopbackMedium>,
}

impl DaemonState {
    pub fn new(
        config: DaemonConfig,
        ledger: Arc<Ledger>,
        link: Link,
        shutdown_tx: broadcast::Sender<()>,
    ) -> anyhow::Result<Self> {
        let flood = FloodConfig::new(config.resolve_peer_id()).with_max_ttl(config.mesh.max_ttl);
        let forwarder = Arc::new(Forwarder::new(ledger.clone(), link.transport, flood));
        let pathfinder = Arc::new(Pathfinder::new(ledger.clone(), config.routing.grid())?);
        Ok(Self {
            ledger,
            forwarder,
            pathfinder,
            config,
            shutdown_tx,
            _medium: link.medium,
        })
    }

    pub fn peer_id(&self) -> &str {
        &self.forwarder.config().peer_id
    }
}

/// An opened radio link.
pub struct Link {
    pub transport: Box<dyn Transport>,
    pub medium: Option<LoopbackMedium>,
}

/// Open the configured link. Failure here is fatal for the daemon.
async fn open_link(radio: &RadioConfig) -> anyhow::Result<Link> {
    match radio.kind {
        RadioKind::Udp => {
            let udp = UdpTransport::bind(radio.udp())
                .await
                .context("radio link failed to initialize")?;
            Ok(Link {
                transport: Box::new(udp),
                medium: None,
            })
        }
        RadioKind::Loopback => {
            warn!("Radio kind is loopback; no other node will hear this one");
            let medium = LoopbackMedium::new();
            Ok(Link {
                transport: Box::new(medium.attach()),
                medium: Some(medium),
            })
        }
    }
}

fn init_tracing(log_level: &str) -> anyhow::Result<()> {
    let filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive(format!("meshmap={log_level}").parse()?);
    tracing_subscriber::fmt().with_env_filter(filter).init();
    Ok(())
}

fn open_ledger(data_dir: &Path) -> anyhow::Result<Arc<Ledger>> {
    std::fs::create_dir_all(data_dir)
        .with_context(|| format!("cannot create data dir {}", data_dir.display()))?;
    let db_path = data_dir.join("meshmap.db");
    let ledger = Ledger::open(&db_path)
        .with_context(|| format!("cannot open ledger at {}", db_path.display()))?;
    let counts = ledger.counts()?;
    info!(
        path = %db_path.display(),
        seen = counts.seen,
        annotations = counts.annotations,
        obstacles = counts.obstacles,
        peers = counts.peers,
        "Ledger opened"
    );
    Ok(Arc::new(ledger))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = DaemonConfig::load()?;
    init_tracing(&config.advanced.log_level)?;
    config.validate()?;
    info!(version = env!("CARGO_PKG_VERSION"), "meshmapd starting");

    let ledger = open_ledger(&config.data_dir())?;
    let link = open_link(&config.radio).await?;

    let (shutdown_tx, _) = broadcast::channel(1);
    let state = Arc::new(DaemonState::new(config, ledger, link, shutdown_tx.clone())?);
    info!(peer_id = %state.peer_id(), max_ttl = state.config.mesh.max_ttl, "Mesh identity");

    let listener = tokio::spawn(run_listener(
        Arc::clone(&state.forwarder),
        state.config.radio.poll_interval(),
        shutdown_tx.subscribe(),
    ));

    let socket_path = state.config.socket_path();
    let server = RpcServer::new(Arc::clone(&state), socket_path.clone());
    let mut stop = shutdown_tx.subscribe();
    tokio::select! {
        served = server.run() => {
            if let Err(e) = served {
                error!(error = %e, "RPC server stopped");
            }
        }
        _ = stop.recv() => info!("Shutdown requested over RPC"),
        _ = tokio::signal::ctrl_c() => info!("Interrupted"),
    }

    // Listener exits once it sees the broadcast; it may already be gone.
    let _ = shutdown_tx.send(());
    match listener.await {
        Ok(handled) => info!(handled, "Mesh listener stopped"),
        Err(e) => error!(error = %e, "Mesh listener panicked"),
    }
    if let Err(e) = std::fs::remove_file(&socket_path) {
        warn!(path = %socket_path.display(), error = %e, "Socket not removed");
    }
    info!("meshmapd stopped");
    Ok(())
}

/// State over an in-memory ledger and a loopback medium, plus a second
/// endpoint on the same medium that sees every broadcast.
#[cfg(test)]
pub(crate) fn test_state() -> (Arc<DaemonState>, meshmap_transport::LoopbackTransport) {
    let mut config = DaemonConfig::default();
    config.node.peer_id = "node-test".into();
    config.mesh.max_ttl = 3;
    config.radio.kind = RadioKind::Loopback;
    config.routing.grid_width = 180;
    config.routing.grid_height = 360;

    let ledger = Arc::new(Ledger::open_memory().expect("ledger"));
    let medium = LoopbackMedium::new();
    let observer = medium.attach();
    let link = Link {
        transport: Box::new(medium.attach()),
        medium: Some(medium),
    };
    let (shutdown_tx, _) = broadcast::channel(1);
    let state = DaemonState::new(config, ledger, link, shutdown_tx).expect("state");
    (Arc::new(state), observer)
}
