//! Bounded in-memory sensor time-series buffer.
//!
//! Samples are appended by a single fixed-cadence writer and stamped with
//! their ingestion time. The store keeps the most recent `capacity` samples
//! and answers inclusive time-range queries. Live-tail subscribers each
//! receive the newest sample on their own cadence.
//!
//! ## Meta-Crate
//!
//! Re-exports the sensorstream sub-crates:
//!
//! - `sensorstream-core` - samples, clocks, CSV sample source
//! - `sensorstream-streaming` - store, tick scheduler, subscription fan-out
//! - `sensorstream-config` - layered configuration
//! - `sensorstream-server` - HTTP query and live-tail service
//!
//! ## Basic Usage
//!
//! ```rust
//! # #[cfg(feature = "streaming")]
//! # {
//! use sensorstream::{Sample, SampleStore};
//!
//! let mut store = SampleStore::new(3);
//! for (time, value) in [(100, 1.0), (105, 2.0), (105, 3.0), (110, 4.0)] {
//!     store.append(Sample::new(time, vec![value]));
//! }
//!
//! // Oldest sample was evicted
//! assert_eq!(store.len(), 3);
//! let window = store.query(Some(105), Some(105));
//! assert_eq!(window.len(), 2);
//! assert_eq!(store.latest().unwrap().time, 110);
//! # }
//! ```

pub use sensorstream_core as core;

#[cfg(feature = "streaming")]
pub use sensorstream_streaming as streaming;

#[cfg(feature = "config")]
pub use sensorstream_config as config;

#[cfg(feature = "server")]
pub use sensorstream_server as server;

// Re-export commonly used types at crate root for convenience
pub use sensorstream_core::{
    Clock, CsvOptions, CycleSource, Sample, SampleSource, SourceError, SystemClock,
};

#[cfg(feature = "streaming")]
pub use sensorstream_streaming::{
    LiveTail, SampleStore, SchedulerConfig, StoreReader, StoreStats, SubscriberHandle,
    SubscriptionHub, TickScheduler,
};

#[cfg(feature = "config")]
pub use sensorstream_config::Settings;

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
