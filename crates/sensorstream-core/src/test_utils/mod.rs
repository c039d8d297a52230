//! Test utilities shared across the workspace
//!
//! Builders for samples and sources, plus a manually driven [`Clock`].

use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};

use crate::sample::Sample;
use crate::source::CycleSource;
use crate::timestamp::Clock;

/// 2024-01-01 00:00:00 UTC in milliseconds
pub const BASE_TIME_MS: i64 = 1_704_067_200_000;

/// Single-channel sample
pub fn sample(time: i64, value: f64) -> Sample {
    Sample::new(time, vec![value])
}

/// `count` single-channel samples, `step_ms` apart, value equal to the index
pub fn sample_series(start: i64, step_ms: i64, count: usize) -> Vec<Sample> {
    (0..count)
        .map(|i| sample(start + i as i64 * step_ms, i as f64))
        .collect()
}

/// Cycle over single-channel rows `[1.0], [2.0], ..., [rows]`
pub fn counting_source(rows: usize) -> CycleSource {
    CycleSource::new((1..=rows).map(|i| vec![i as f64]).collect())
        .expect("counting_source needs at least one row")
}

/// Clock that only moves when told to
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Arc<AtomicI64>,
}

impl ManualClock {
    pub fn new(start: i64) -> Self {
        Self {
            now: Arc::new(AtomicI64::new(start)),
        }
    }

    pub fn set(&self, millis: i64) {
        self.now.store(millis, Ordering::SeqCst);
    }

    pub fn advance(&self, millis: i64) {
        self.now.fetch_add(millis, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_millis(&self) -> i64 {
        self.now.load(Ordering::SeqCst)
    }
}
