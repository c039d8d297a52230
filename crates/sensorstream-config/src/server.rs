//! HTTP service settings

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// HTTP query and live-tail service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address
    pub host: String,

    /// Listen port
    pub port: u16,

    /// Directory served for non-API paths
    pub static_dir: PathBuf,

    /// Live-tail cadence when the client does not ask for one
    pub default_cadence_ms: u64,

    /// Lower bound applied to client-requested cadences
    pub min_cadence_ms: u64,

    /// Interval between keep-alive comments on idle live-tail streams
    pub keep_alive_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            static_dir: PathBuf::from("public"),
            default_cadence_ms: 100,
            min_cadence_ms: 1,
            keep_alive_secs: 15,
        }
    }
}

impl ServerConfig {
    /// `host:port` string suitable for `TcpListener::bind`
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn default_cadence(&self) -> Duration {
        Duration::from_millis(self.default_cadence_ms)
    }

    pub fn min_cadence(&self) -> Duration {
        Duration::from_millis(self.min_cadence_ms.max(1))
    }

    pub fn keep_alive(&self) -> Duration {
        Duration::from_secs(self.keep_alive_secs.max(1))
    }
}
