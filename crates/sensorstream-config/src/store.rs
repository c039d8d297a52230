//! Sample store and ingestion settings

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Sample store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Maximum number of retained samples; oldest are evicted first
    pub capacity: usize,

    /// Nominal ingestion interval in milliseconds
    pub tick_interval_ms: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            capacity: 1_000_000,
            tick_interval_ms: 1,
        }
    }
}

impl StoreConfig {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }
}
