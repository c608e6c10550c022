//! Configuration file management.
//!
//! `config.toml` lives in the data directory. Every field has a default, so
//! a missing file or a partial file is fine.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::bail;
use meshmap_routing::RoutingConfig;
use meshmap_transport::udp::{DEFAULT_MAX_DATAGRAM, DEFAULT_PORT, MAX_UDP_PAYLOAD};
use meshmap_transport::UdpConfig;
use meshmap_types::{generate_peer_id, PeerId, DEFAULT_MAX_TTL};
use serde::{Deserialize, Serialize};

/// Environment variable overriding the data directory.
pub const DATA_DIR_ENV: &str = "MESHMAP_DATA_DIR";

/// Complete daemon configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DaemonConfig {
    /// Node identity and storage.
    #[serde(default)]
    pub node: NodeConfig,
    /// Flood protocol settings.
    #[serde(default)]
    pub mesh: MeshConfig,
    /// Radio link settings.
    #[serde(default)]
    pub radio: RadioConfig,
    /// Path planning grid.
    #[serde(default)]
    pub routing: RoutingSection,
    /// JSON-RPC socket.
    #[serde(default)]
    pub rpc: RpcConfig,
    /// Advanced settings.
    #[serde(default)]
    pub advanced: AdvancedConfig,
}

/// Node configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NodeConfig {
    /// Peer id stamped on outgoing messages. Empty = random per start.
    #[serde(default)]
    pub peer_id: String,
    /// Data directory. Empty = platform default.
    #[serde(default)]
    pub data_dir: String,
}

/// Flood protocol configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeshConfig {
    /// Hop budget given to locally created messages.
    #[serde(default = "default_max_ttl")]
    pub max_ttl: u32,
}

/// Which link carries mesh frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RadioKind {
    /// UDP broadcast on the local network segment.
    Udp,
    /// In-process medium with no other nodes. Useful for local testing.
    Loopback,
}

/// Radio link configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RadioConfig {
    #[serde(default = "default_radio_kind")]
    pub kind: RadioKind,
    #[serde(default = "default_bind_addr")]
    pub bind_addr: SocketAddr,
    #[serde(default = "default_broadcast_addr")]
    pub broadcast_addr: SocketAddr,
    /// Listener sleep between empty polls.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    /// Largest frame sent or accepted. Every node on a segment must use the
    /// same value.
    #[serde(default = "default_max_datagram")]
    pub max_datagram: usize,
}

/// Path planning grid configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutingSection {
    #[serde(default = "default_grid_size")]
    pub grid_width: usize,
    #[serde(default = "default_grid_size")]
    pub grid_height: usize,
    #[serde(default = "default_cell_cost")]
    pub default_cost: f64,
}

/// RPC configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RpcConfig {
    /// Unix socket path. Empty = `$data_dir/meshmap.sock`.
    #[serde(default)]
    pub socket_path: String,
}

/// Advanced configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdvancedConfig {
    /// Log level: "trace" | "debug" | "info" | "warn" | "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

// Default value functions

fn default_max_ttl() -> u32 {
    DEFAULT_MAX_TTL
}

fn default_radio_kind() -> RadioKind {
    RadioKind::Udp
}

fn default_bind_addr() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], DEFAULT_PORT))
}

fn default_broadcast_addr() -> SocketAddr {
    SocketAddr::from(([255, 255, 255, 255], DEFAULT_PORT))
}

fn default_poll_interval_ms() -> u64 {
    10
}

fn default_max_datagram() -> usize {
    DEFAULT_MAX_DATAGRAM
}

fn default_grid_size() -> usize {
    100
}

fn default_cell_cost() -> f64 {
    1.0
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for MeshConfig {
    fn default() -> Self {
        Self {
            max_ttl: default_max_ttl(),
        }
    }
}

impl Default for RadioConfig {
    fn default() -> Self {
        Self {
            kind: default_radio_kind(),
            bind_addr: default_bind_addr(),
            broadcast_addr: default_broadcast_addr(),
            poll_interval_ms: default_poll_interval_ms(),
            max_datagram: default_max_datagram(),
        }
    }
}

impl Default for RoutingSection {
    fn default() -> Self {
        Self {
            grid_width: default_grid_size(),
            grid_height: default_grid_size(),
            default_cost: default_cell_cost(),
        }
    }
}

impl Default for AdvancedConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

impl RadioConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn udp(&self) -> UdpConfig {
        UdpConfig {
            bind_addr: self.bind_addr,
            broadcast_addr: self.broadcast_addr,
            max_datagram: self.max_datagram,
        }
    }
}

impl RoutingSection {
    pub fn grid(&self) -> RoutingConfig {
        RoutingConfig {
            width: self.grid_width,
            height: self.grid_height,
            default_cost: self.default_cost,
        }
    }
}

impl DaemonConfig {
    /// Load configuration from the default config file location.
    ///
    /// Falls back to defaults if file does not exist.
    pub fn load() -> anyhow::Result<Self> {
        Self::load_from(&Self::config_path())
    }

    /// Load configuration from `path`, or defaults if it does not exist.
    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: DaemonConfig = toml::from_str(&content)?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Reject values the daemon cannot run with.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.mesh.max_ttl < 1 {
            bail!("mesh.max_ttl must be at least 1");
        }
        if self.radio.max_datagram == 0 || self.radio.max_datagram > MAX_UDP_PAYLOAD {
            bail!("radio.max_datagram must be between 1 and {MAX_UDP_PAYLOAD}");
        }
        self.routing.grid().validate()?;
        Ok(())
    }

    /// Configured peer id, or a freshly generated one.
    pub fn resolve_peer_id(&self) -> PeerId {
        if self.node.peer_id.is_empty() {
            generate_peer_id()
        } else {
            self.node.peer_id.clone()
        }
    }

    /// Get the data directory path.
    pub fn data_dir(&self) -> PathBuf {
        if self.node.data_dir.is_empty() {
            Self::default_data_dir()
        } else {
            PathBuf::from(&self.node.data_dir)
        }
    }

    /// Get the RPC socket path.
    pub fn socket_path(&self) -> PathBuf {
        if self.rpc.socket_path.is_empty() {
            self.data_dir().join("meshmap.sock")
        } else {
            PathBuf::from(&self.rpc.socket_path)
        }
    }

    /// Get the config file path.
    fn config_path() -> PathBuf {
        Self::default_data_dir().join("config.toml")
    }

    /// Platform-specific default data directory.
    fn default_data_dir() -> PathBuf {
        if let Ok(dir) = std::env::var(DATA_DIR_ENV) {
            return PathBuf::from(dir);
        }
        #[cfg(target_os = "macos")]
        {
            dirs_fallback("Library/Application Support/MeshMap")
        }
        #[cfg(not(target_os = "macos"))]
        {
            dirs_fallback(".meshmap")
        }
    }
}

/// Fallback home directory resolution.
fn dirs_fallback(subpath: &str) -> PathBuf {
    std::env::var("HOME")
        .map(|h| PathBuf::from(h).join(subpath))
        .unwrap_or_else(|_| PathBuf::from("/tmp/meshmap"))
}
