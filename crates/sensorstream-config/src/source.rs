//! Sample source settings

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// CSV sample source configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// Path to the delimited sample file
    pub path: PathBuf,

    /// Skip the first non-blank line as a header row
    pub has_headers: bool,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("sensor_data.csv"),
            has_headers: false,
        }
    }
}
