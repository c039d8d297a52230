//! Fixed-cadence ingestion
//!
//! The tick scheduler pulls one row from its [`SampleSource`] per tick,
//! stamps it with the current wall-clock time and appends it to the store.
//! It owns the store's only write handle and the source's cycle position.
//!
//! Timer drift is absorbed rather than corrected: a late tick is delayed, it
//! never triggers a burst of catch-up appends, and stamps reflect the actual
//! append time.

use std::time::Duration;

use sensorstream_core::{Clock, MonotonicStamp, Sample, SampleSource};
use tokio::task::{JoinError, JoinHandle};
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::ring_buffer::{SampleStore, StoreReader};

/// Default nominal tick interval (1 kHz)
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_millis(1);

/// Scheduler configuration
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Nominal interval between ticks (clamped to at least 1 ms)
    pub tick_interval: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            tick_interval: DEFAULT_TICK_INTERVAL,
        }
    }
}

/// Drives a sample source into the store at a fixed cadence
pub struct TickScheduler<S, C> {
    source: S,
    store: SampleStore,
    stamp: MonotonicStamp<C>,
    config: SchedulerConfig,
}

impl<S, C> TickScheduler<S, C>
where
    S: SampleSource + 'static,
    C: Clock + 'static,
{
    pub fn new(source: S, store: SampleStore, clock: C, config: SchedulerConfig) -> Self {
        Self {
            source,
            store,
            stamp: MonotonicStamp::new(clock),
            config,
        }
    }

    /// Read handle onto the store this scheduler writes
    pub fn reader(&self) -> StoreReader {
        self.store.reader()
    }

    /// One ingestion cycle: next source row, stamped now, appended
    ///
    /// Returns the stamp assigned to the appended sample.
    pub fn tick(&mut self) -> i64 {
        let values = self.source.next_values();
        let time = self.stamp.next();
        self.store.append(Sample::new(time, values));
        time
    }

    /// Run the tick loop on the tokio runtime until `shutdown` is cancelled
    pub fn spawn(self, shutdown: CancellationToken) -> SchedulerHandle {
        let join = tokio::spawn(self.run(shutdown.clone()));
        SchedulerHandle { join, shutdown }
    }

    async fn run(mut self, shutdown: CancellationToken) -> u64 {
        let tick_interval = self.config.tick_interval.max(Duration::from_millis(1));
        let mut interval = tokio::time::interval(tick_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        tracing::info!(
            tick_interval_ms = tick_interval.as_secs_f64() * 1_000.0,
            channels = self.source.channel_count(),
            capacity = self.store.reader().capacity(),
            "tick scheduler started"
        );

        let mut ticks: u64 = 0;
        loop {
            tokio::select! {
                biased;
                () = shutdown.cancelled() => break,
                _ = interval.tick() => {
                    // Append is synchronous: cancellation can only land between ticks
                    self.tick();
                    ticks += 1;
                }
            }
        }

        tracing::info!(ticks, last_stamp = ?self.stamp.last(), "tick scheduler stopped");
        ticks
    }
}

/// Handle to a running tick scheduler
#[derive(Debug)]
pub struct SchedulerHandle {
    join: JoinHandle<u64>,
    shutdown: CancellationToken,
}

impl SchedulerHandle {
    /// Request shutdown; the loop exits before its next tick
    pub fn stop(&self) {
        self.shutdown.cancel();
    }

    /// Wait for the loop to exit, returning the number of ticks performed
    pub async fn join(self) -> Result<u64, JoinError> {
        self.join.await
    }

    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }

    /// Get the shutdown token (for external coordination)
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }
}
