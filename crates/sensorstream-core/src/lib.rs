//! Core sample types for sensorstream
//!
//! Everything the buffer needs to know about the data it holds:
//!
//! - [`Sample`]: one ingestion-time stamped vector of measurements
//! - [`Clock`]: wall-clock source used to stamp samples at append time
//! - [`SampleSource`]: one record per tick, cycling forever over a pre-loaded set
//! - [`load_csv_rows`]: the CSV loader feeding [`CycleSource`]

pub mod errors;
pub mod sample;
pub mod source;
pub mod timestamp;

// Test utilities (only available in test builds or with test-utils feature)
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

// Re-export commonly used types
pub use errors::SourceError;
pub use sample::Sample;
pub use source::{CsvOptions, CycleSource, SampleSource, load_csv_rows};
pub use timestamp::{Clock, MonotonicStamp, SystemClock};
