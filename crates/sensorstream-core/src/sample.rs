//! Sample type

use serde::{Deserialize, Serialize};

/// One timestamped vector of measurements
///
/// `time` is the ingestion time in milliseconds since the Unix epoch, assigned
/// when the sample is appended to the store. Any timestamp carried by the
/// source data is discarded before a `Sample` is built.
///
/// Samples are immutable once created. The store hands them out as
/// `Arc<Sample>` so range queries and live-tail deliveries share one
/// allocation per sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    /// Ingestion time, milliseconds since epoch
    pub time: i64,

    /// Channel measurements (width fixed per deployment)
    pub values: Vec<f64>,
}

impl Sample {
    pub fn new(time: i64, values: Vec<f64>) -> Self {
        Self { time, values }
    }

    /// Number of channels in this sample
    pub fn channel_count(&self) -> usize {
        self.values.len()
    }
}
