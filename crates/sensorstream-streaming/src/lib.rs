//! Bounded time-series buffer with range queries and live tail
//!
//! - [`ring_buffer`]: the single-writer, multi-reader sample store
//! - [`scheduler`]: fixed-cadence ingestion from a sample source
//! - [`fanout`]: independent live-tail subscribers over the store's latest sample

pub mod fanout;
pub mod ring_buffer;
pub mod scheduler;

// Re-export commonly used types
pub use fanout::{LiveTail, SubscriberHandle, SubscriberId, SubscriberState, SubscriptionHub};
pub use ring_buffer::{
    DEFAULT_CAPACITY, RingBuffer, RingBufferMetrics, SampleStore, StoreReader, StoreStats,
};
pub use scheduler::{DEFAULT_TICK_INTERVAL, SchedulerConfig, SchedulerHandle, TickScheduler};
