//! Live-tail subscription fan-out
//!
//! Each subscriber gets its own delivery task that reads the store's latest
//! sample once per cadence and publishes it on a `watch` channel. Delivery is
//! at-most-latest: a consumer that falls behind sees only the newest sample,
//! never a backlog. An empty store skips the tick. An unchanged latest sample
//! is delivered again on the next tick.
//!
//! Lifecycle per subscriber is `Active` → `Closed`. A subscriber closes when
//! it is unsubscribed (idempotent), when its [`LiveTail`] is dropped, or when
//! the hub shuts down. Closing cancels the delivery task's token, so the task
//! exits without waiting for its next tick.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use futures::Stream;
use parking_lot::Mutex;
use sensorstream_core::Sample;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::ring_buffer::StoreReader;

/// Shortest accepted delivery cadence
pub const MIN_CADENCE: Duration = Duration::from_millis(1);

type Registry = Mutex<HashMap<SubscriberId, Duration>>;
type LatestSlot = Option<Arc<Sample>>;

/// Opaque subscriber identifier, unique per hub
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriberId(u64);

impl fmt::Display for SubscriberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub-{}", self.0)
    }
}

/// Subscriber lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscriberState {
    Active,
    Closed,
}

/// Registry of live-tail subscribers over one store
#[derive(Debug)]
pub struct SubscriptionHub {
    reader: StoreReader,
    registry: Arc<Registry>,
    next_id: AtomicU64,
    shutdown: CancellationToken,
}

/// Control handle for one subscriber
#[derive(Debug, Clone)]
pub struct SubscriberHandle {
    id: SubscriberId,
    cadence: Duration,
    token: CancellationToken,
    registry: Weak<Registry>,
}

/// Receiving end of a subscription
///
/// Dropping it unsubscribes, which is how a transport disconnect is
/// propagated to the hub.
#[derive(Debug)]
pub struct LiveTail {
    handle: SubscriberHandle,
    updates: watch::Receiver<LatestSlot>,
}

impl SubscriptionHub {
    pub fn new(reader: StoreReader) -> Self {
        Self::with_shutdown(reader, CancellationToken::new())
    }

    /// Hub whose subscribers all close once `shutdown` is cancelled
    ///
    /// Lets a process-wide token end live tails as soon as shutdown starts,
    /// before anything waits on their transports.
    pub fn with_shutdown(reader: StoreReader, shutdown: CancellationToken) -> Self {
        Self {
            reader,
            registry: Arc::new(Mutex::new(HashMap::new())),
            next_id: AtomicU64::new(1),
            shutdown,
        }
    }

    /// Register a subscriber delivering every `cadence`
    ///
    /// Delivery starts immediately; the first sample arrives within one
    /// cadence period once the store holds data. Cadences shorter than
    /// [`MIN_CADENCE`] are raised to it. Must be called from within a tokio
    /// runtime.
    pub fn subscribe(&self, cadence: Duration) -> (SubscriberHandle, LiveTail) {
        let cadence = cadence.max(MIN_CADENCE);
        let id = SubscriberId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let token = self.shutdown.child_token();
        let (updates_tx, updates_rx) = watch::channel(None);

        let active = {
            let mut registry = self.registry.lock();
            registry.insert(id, cadence);
            registry.len()
        };

        let handle = SubscriberHandle {
            id,
            cadence,
            token,
            registry: Arc::downgrade(&self.registry),
        };

        tokio::spawn(deliver(self.reader.clone(), handle.clone(), updates_tx));

        tracing::debug!(%id, cadence_ms = cadence.as_millis() as u64, active, "subscriber opened");

        let tail = LiveTail {
            handle: handle.clone(),
            updates: updates_rx,
        };
        (handle, tail)
    }

    /// Stop delivery to `handle` and release its resources; idempotent
    pub fn unsubscribe(&self, handle: &SubscriberHandle) {
        handle.unsubscribe();
    }

    /// Number of open subscribers
    pub fn active_count(&self) -> usize {
        self.registry.lock().len()
    }

    /// Cadences of open subscribers, by id
    pub fn subscribers(&self) -> Vec<(SubscriberId, Duration)> {
        let mut subscribers: Vec<_> = self
            .registry
            .lock()
            .iter()
            .map(|(id, cadence)| (*id, *cadence))
            .collect();
        subscribers.sort_unstable_by_key(|(id, _)| *id);
        subscribers
    }

    /// Close every subscriber; later subscriptions start closed
    pub fn shutdown(&self) {
        self.shutdown.cancel();
        let closed = {
            let mut registry = self.registry.lock();
            let closed = registry.len();
            registry.clear();
            closed
        };
        tracing::info!(closed, "subscription hub shut down");
    }
}

impl SubscriberHandle {
    pub fn id(&self) -> SubscriberId {
        self.id
    }

    pub fn cadence(&self) -> Duration {
        self.cadence
    }

    pub fn state(&self) -> SubscriberState {
        if self.token.is_cancelled() {
            SubscriberState::Closed
        } else {
            SubscriberState::Active
        }
    }

    /// Stop delivery and release resources; idempotent
    pub fn unsubscribe(&self) {
        self.token.cancel();
        if let Some(registry) = self.registry.upgrade()
            && registry.lock().remove(&self.id).is_some()
        {
            tracing::debug!(id = %self.id, "subscriber closed");
        }
    }
}

impl LiveTail {
    /// Next delivered sample; `None` once the subscriber is closed
    pub async fn recv(&mut self) -> Option<Arc<Sample>> {
        loop {
            tokio::select! {
                biased;
                () = self.handle.token.cancelled() => return None,
                changed = self.updates.changed() => {
                    changed.ok()?;
                    if let Some(sample) = self.updates.borrow_and_update().clone() {
                        return Some(sample);
                    }
                }
            }
        }
    }

    pub fn handle(&self) -> &SubscriberHandle {
        &self.handle
    }

    /// Adapt into a stream of samples that ends when the subscriber closes
    pub fn into_stream(self) -> impl Stream<Item = Arc<Sample>> + Send + 'static {
        futures::stream::unfold(self, |mut tail| async move {
            let sample = tail.recv().await?;
            Some((sample, tail))
        })
    }
}

impl Drop for LiveTail {
    fn drop(&mut self) {
        self.handle.unsubscribe();
    }
}

/// Per-subscriber delivery loop
async fn deliver(reader: StoreReader, handle: SubscriberHandle, updates: watch::Sender<LatestSlot>) {
    let mut interval = tokio::time::interval(handle.cadence);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let mut delivered: u64 = 0;
    loop {
        tokio::select! {
            biased;
            () = handle.token.cancelled() => break,
            () = updates.closed() => break,
            _ = interval.tick() => {
                let Some(sample) = reader.latest() else {
                    continue;
                };
                if updates.send(Some(sample)).is_err() {
                    break;
                }
                delivered += 1;
            }
        }
    }

    // Receiver gone without an explicit unsubscribe still releases the slot
    handle.unsubscribe();
    tracing::debug!(id = %handle.id, delivered, "live tail delivery stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ring_buffer::SampleStore;
    use crate::scheduler::{SchedulerConfig, TickScheduler};
    use sensorstream_core::Clock;
    use sensorstream_core::test_utils::{BASE_TIME_MS, counting_source, sample};

    /// Wall clock that follows tokio's (pausable) clock
    struct RuntimeClock {
        origin: tokio::time::Instant,
    }

    impl Clock for RuntimeClock {
        fn now_millis(&self) -> i64 {
            BASE_TIME_MS + self.origin.elapsed().as_millis() as i64
        }
    }

    fn collect(mut tail: LiveTail) -> tokio::task::JoinHandle<Vec<i64>> {
        tokio::spawn(async move {
            let mut times = Vec::new();
            while let Some(sample) = tail.recv().await {
                times.push(sample.time);
            }
            times
        })
    }

    #[tokio::test(start_paused = true)]
    async fn test_subscribers_run_at_independent_cadences() {
        let clock = RuntimeClock {
            origin: tokio::time::Instant::now(),
        };
        let scheduler = TickScheduler::new(
            counting_source(3),
            SampleStore::new(10_000),
            clock,
            SchedulerConfig::default(),
        );
        let hub = SubscriptionHub::new(scheduler.reader());
        let producer = scheduler.spawn(CancellationToken::new());

        let (_fast_handle, fast) = hub.subscribe(Duration::from_millis(10));
        let (_slow_handle, slow) = hub.subscribe(Duration::from_millis(100));
        let fast = collect(fast);
        let slow = collect(slow);

        tokio::time::sleep(Duration::from_millis(1_000)).await;
        hub.shutdown();
        producer.stop();

        let fast = fast.await.unwrap();
        let slow = slow.await.unwrap();
        producer.join().await.unwrap();

        assert!(fast.windows(2).all(|w| w[0] <= w[1]));
        assert!(slow.windows(2).all(|w| w[0] <= w[1]));
        assert!(!slow.is_empty());

        let ratio = fast.len() as f64 / slow.len() as f64;
        assert!(
            (8.0..=12.0).contains(&ratio),
            "fast={} slow={} ratio={ratio}",
            fast.len(),
            slow.len()
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_store_skips_delivery() {
        let store = SampleStore::new(4);
        let hub = SubscriptionHub::new(store.reader());
        let (handle, mut tail) = hub.subscribe(Duration::from_millis(5));

        let waited = tokio::time::timeout(Duration::from_millis(100), tail.recv()).await;
        assert!(waited.is_err(), "nothing should be delivered from an empty store");
        assert_eq!(handle.state(), SubscriberState::Active);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unchanged_latest_is_redelivered() {
        let mut store = SampleStore::new(4);
        store.append(sample(42, 1.0));
        let hub = SubscriptionHub::new(store.reader());
        let (_handle, mut tail) = hub.subscribe(Duration::from_millis(10));

        for _ in 0..3 {
            let sample = tail.recv().await.unwrap();
            assert_eq!(sample.time, 42);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_consumer_sees_only_newest() {
        let mut store = SampleStore::new(64);
        let hub = SubscriptionHub::new(store.reader());
        let (_handle, mut tail) = hub.subscribe(Duration::from_millis(1));

        store.append(sample(1, 1.0));
        // Let several deliveries land without consuming them
        tokio::time::sleep(Duration::from_millis(5)).await;
        store.append(sample(2, 2.0));
        tokio::time::sleep(Duration::from_millis(5)).await;

        let sample = tail.recv().await.unwrap();
        assert_eq!(sample.time, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unsubscribe_is_idempotent() {
        let mut store = SampleStore::new(4);
        store.append(sample(1, 1.0));
        let hub = SubscriptionHub::new(store.reader());
        let (handle, mut tail) = hub.subscribe(Duration::from_millis(10));
        assert_eq!(hub.active_count(), 1);
        assert_eq!(handle.state(), SubscriberState::Active);

        hub.unsubscribe(&handle);
        hub.unsubscribe(&handle);
        handle.unsubscribe();

        assert_eq!(handle.state(), SubscriberState::Closed);
        assert_eq!(hub.active_count(), 0);
        assert!(tail.recv().await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropping_tail_unsubscribes() {
        let store = SampleStore::new(4);
        let hub = SubscriptionHub::new(store.reader());
        let (handle, tail) = hub.subscribe(Duration::from_millis(10));
        let (other, _other_tail) = hub.subscribe(Duration::from_millis(10));
        assert_eq!(hub.active_count(), 2);

        drop(tail);
        assert_eq!(handle.state(), SubscriberState::Closed);
        assert_eq!(hub.active_count(), 1);
        assert_eq!(hub.subscribers()[0].0, other.id());
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_closes_everyone() {
        let mut store = SampleStore::new(4);
        store.append(sample(1, 1.0));
        let hub = SubscriptionHub::new(store.reader());
        let (a, mut tail_a) = hub.subscribe(Duration::from_millis(10));
        let (b, _tail_b) = hub.subscribe(Duration::from_millis(50));

        hub.shutdown();
        assert_eq!(hub.active_count(), 0);
        assert_eq!(a.state(), SubscriberState::Closed);
        assert_eq!(b.state(), SubscriberState::Closed);
        assert!(tail_a.recv().await.is_none());

        let (late, _late_tail) = hub.subscribe(Duration::from_millis(10));
        assert_eq!(late.state(), SubscriberState::Closed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_external_shutdown_token_closes_subscribers() {
        let mut store = SampleStore::new(4);
        store.append(sample(1, 1.0));
        let shutdown = CancellationToken::new();
        let hub = SubscriptionHub::with_shutdown(store.reader(), shutdown.child_token());
        let (handle, mut tail) = hub.subscribe(Duration::from_millis(10));
        assert!(tail.recv().await.is_some());

        shutdown.cancel();
        assert_eq!(handle.state(), SubscriberState::Closed);
        assert!(tail.recv().await.is_none());

        // Delivery task releases its registry slot on the way out
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(hub.active_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_cadence_is_clamped() {
        let store = SampleStore::new(4);
        let hub = SubscriptionHub::new(store.reader());
        let (handle, _tail) = hub.subscribe(Duration::ZERO);
        assert_eq!(handle.cadence(), MIN_CADENCE);
        assert_ne!(handle.id(), hub.subscribe(Duration::ZERO).0.id());
    }

    #[tokio::test(start_paused = true)]
    async fn test_into_stream_ends_on_close() {
        use futures::StreamExt;

        let mut store = SampleStore::new(4);
        store.append(sample(7, 7.0));
        let hub = SubscriptionHub::new(store.reader());
        let (handle, tail) = hub.subscribe(Duration::from_millis(10));
        let mut stream = Box::pin(tail.into_stream());

        assert_eq!(stream.next().await.unwrap().time, 7);
        handle.unsubscribe();
        assert!(stream.next().await.is_none());
    }
}
