//! Shared handler state

use std::sync::Arc;
use std::time::{Duration, Instant};

use sensorstream_config::ServerConfig;
use sensorstream_streaming::{StoreReader, SubscriptionHub};

/// Live-tail transport settings
#[derive(Debug, Clone, Copy)]
pub struct StreamSettings {
    pub default_cadence: Duration,
    pub min_cadence: Duration,
    pub keep_alive: Duration,
}

impl Default for StreamSettings {
    fn default() -> Self {
        Self::from(&ServerConfig::default())
    }
}

impl From<&ServerConfig> for StreamSettings {
    fn from(config: &ServerConfig) -> Self {
        Self {
            default_cadence: config.default_cadence(),
            min_cadence: config.min_cadence(),
            keep_alive: config.keep_alive(),
        }
    }
}

/// State handed to every route
#[derive(Clone)]
pub struct AppState {
    pub reader: StoreReader,
    pub hub: Arc<SubscriptionHub>,
    pub stream: StreamSettings,
    pub started: Instant,
}

impl AppState {
    pub fn new(reader: StoreReader, hub: Arc<SubscriptionHub>, stream: StreamSettings) -> Self {
        Self {
            reader,
            hub,
            stream,
            started: Instant::now(),
        }
    }

    pub fn uptime_secs(&self) -> u64 {
        self.started.elapsed().as_secs()
    }
}
