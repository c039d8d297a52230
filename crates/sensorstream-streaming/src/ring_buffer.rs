//! Fixed-capacity sample store
//!
//! Bounded history of ingested samples, ordered by insertion. When full, the
//! oldest sample is evicted to make room; there is no "buffer full" error.
//!
//! Design:
//! - [`RingBuffer`]: index-based circular buffer, O(1) push with eviction
//! - [`SampleStore`]: the single write handle (not `Clone`, `append` takes `&mut self`)
//! - [`StoreReader`]: cloneable read handle for queries and live tail
//! - Thread-safe via `parking_lot::RwLock`; readers share the lock, the
//!   writer's critical section is one slot write
//! - Samples are stored as `Arc<Sample>` so query snapshots copy pointers only

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;
use sensorstream_core::Sample;
use serde::Serialize;

/// Default maximum number of retained samples
pub const DEFAULT_CAPACITY: usize = 1_000_000;

/// Fixed-capacity circular buffer that evicts its oldest item when full
///
/// Slots grow up to `capacity`, after which `head` marks the oldest item and
/// each push overwrites it. Logical index 0 is always the oldest item.
#[derive(Debug)]
pub struct RingBuffer<T> {
    slots: Vec<T>,
    head: usize,
    capacity: usize,
    metrics: Arc<RingBufferMetrics>,
}

/// Counters for ring buffer operations
#[derive(Debug, Default)]
pub struct RingBufferMetrics {
    /// Number of items pushed
    pub total_appended: AtomicU64,
    /// Number of items evicted to make room
    pub total_evicted: AtomicU64,
    /// Maximum depth observed
    pub max_depth: AtomicU64,
}

impl<T> RingBuffer<T> {
    /// Create a ring buffer holding at most `capacity` items (minimum 1)
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            // Grow on demand; a 10^6 store should not commit memory up front
            slots: Vec::with_capacity(capacity.min(4096)),
            head: 0,
            capacity,
            metrics: Arc::new(RingBufferMetrics::default()),
        }
    }

    /// Push an item, returning the evicted oldest item if the buffer was full
    pub fn push(&mut self, item: T) -> Option<T> {
        let evicted = if self.slots.len() < self.capacity {
            self.slots.push(item);
            None
        } else {
            let old = std::mem::replace(&mut self.slots[self.head], item);
            self.head = (self.head + 1) % self.capacity;
            self.metrics.total_evicted.fetch_add(1, Ordering::Relaxed);
            Some(old)
        };

        self.metrics.total_appended.fetch_add(1, Ordering::Relaxed);
        let _ = self
            .metrics
            .max_depth
            .fetch_max(self.slots.len() as u64, Ordering::Relaxed);

        evicted
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Item at logical index `index` (0 = oldest)
    pub fn get(&self, index: usize) -> Option<&T> {
        if index >= self.slots.len() {
            return None;
        }
        Some(&self.slots[(self.head + index) % self.slots.len()])
    }

    /// Oldest item
    pub fn front(&self) -> Option<&T> {
        self.get(0)
    }

    /// Newest item
    pub fn back(&self) -> Option<&T> {
        self.slots.len().checked_sub(1).and_then(|last| self.get(last))
    }

    /// Contents as two slices, oldest first
    pub fn as_slices(&self) -> (&[T], &[T]) {
        let (newer, older) = self.slots.split_at(self.head);
        (older, newer)
    }

    /// Iterate oldest to newest
    pub fn iter(&self) -> std::iter::Chain<std::slice::Iter<'_, T>, std::slice::Iter<'_, T>> {
        self.iter_from(0)
    }

    /// Iterate oldest to newest, starting at logical index `start`
    pub fn iter_from(
        &self,
        start: usize,
    ) -> std::iter::Chain<std::slice::Iter<'_, T>, std::slice::Iter<'_, T>> {
        let (first, second) = self.as_slices();
        if start <= first.len() {
            first[start..].iter().chain(second.iter())
        } else {
            let offset = (start - first.len()).min(second.len());
            first[first.len()..].iter().chain(second[offset..].iter())
        }
    }

    /// Logical index of the first item for which `pred` is false
    ///
    /// The buffer must be partitioned by `pred` (all `true` items before all
    /// `false` items), as with [`slice::partition_point`].
    pub fn partition_point<P>(&self, mut pred: P) -> usize
    where
        P: FnMut(&T) -> bool,
    {
        let (first, second) = self.as_slices();
        match first.last() {
            Some(last) if !pred(last) => first.partition_point(pred),
            _ => first.len() + second.partition_point(pred),
        }
    }

    /// Get metrics reference
    pub fn metrics(&self) -> Arc<RingBufferMetrics> {
        Arc::clone(&self.metrics)
    }
}

#[derive(Debug)]
struct Shared {
    ring: RwLock<RingBuffer<Arc<Sample>>>,
    metrics: Arc<RingBufferMetrics>,
}

/// Write handle to the sample store
///
/// There is exactly one of these per store. It is owned by the tick
/// scheduler; everything else reads through a [`StoreReader`].
#[derive(Debug)]
pub struct SampleStore {
    shared: Arc<Shared>,
}

/// Read handle to the sample store
#[derive(Debug, Clone)]
pub struct StoreReader {
    shared: Arc<Shared>,
}

/// Point-in-time view of the store
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoreStats {
    pub capacity: usize,
    pub len: usize,
    pub first_time: Option<i64>,
    pub last_time: Option<i64>,
    pub total_appended: u64,
    pub total_evicted: u64,
}

impl SampleStore {
    /// Create a store retaining at most `capacity` samples (minimum 1)
    pub fn new(capacity: usize) -> Self {
        let ring = RingBuffer::new(capacity);
        let metrics = ring.metrics();
        Self {
            shared: Arc::new(Shared {
                ring: RwLock::new(ring),
                metrics,
            }),
        }
    }

    /// New read handle onto this store
    pub fn reader(&self) -> StoreReader {
        StoreReader {
            shared: Arc::clone(&self.shared),
        }
    }

    /// Append a sample at the tail, evicting the oldest if over capacity
    ///
    /// `sample.time` must not be earlier than the previously appended
    /// sample's time; range queries rely on the store being sorted.
    /// Returns the evicted sample, if any.
    pub fn append(&mut self, sample: Sample) -> Option<Arc<Sample>> {
        let sample = Arc::new(sample);
        let mut ring = self.shared.ring.write();
        debug_assert!(
            ring.back().is_none_or(|last| last.time <= sample.time),
            "samples must be appended in non-decreasing time order"
        );
        ring.push(sample)
    }

    /// See [`StoreReader::query`]
    pub fn query(&self, start: Option<i64>, end: Option<i64>) -> Vec<Arc<Sample>> {
        self.reader().query(start, end)
    }

    /// See [`StoreReader::latest`]
    pub fn latest(&self) -> Option<Arc<Sample>> {
        self.reader().latest()
    }

    pub fn len(&self) -> usize {
        self.reader().len()
    }

    pub fn is_empty(&self) -> bool {
        self.reader().is_empty()
    }
}

impl StoreReader {
    /// Samples with `start <= time <= end`, in insertion order
    ///
    /// Missing bounds are unbounded; no bounds returns the full retained
    /// window. Returns an empty vector when nothing matches, including when
    /// `start > end`. The result is a consistent snapshot taken under one
    /// read lock.
    pub fn query(&self, start: Option<i64>, end: Option<i64>) -> Vec<Arc<Sample>> {
        if let (Some(start), Some(end)) = (start, end)
            && start > end
        {
            return Vec::new();
        }

        let ring = self.shared.ring.read();
        let from = match start {
            Some(start) => ring.partition_point(|s| s.time < start),
            None => 0,
        };

        ring.iter_from(from)
            .take_while(|s| end.is_none_or(|end| s.time <= end))
            .cloned()
            .collect()
    }

    /// Most recently appended sample, if any
    pub fn latest(&self) -> Option<Arc<Sample>> {
        self.shared.ring.read().back().cloned()
    }

    pub fn len(&self) -> usize {
        self.shared.ring.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.shared.ring.read().is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.shared.ring.read().capacity()
    }

    /// Shared counters, readable without taking the store lock
    pub fn metrics(&self) -> Arc<RingBufferMetrics> {
        Arc::clone(&self.shared.metrics)
    }

    /// Snapshot of size, time span and counters
    pub fn stats(&self) -> StoreStats {
        let ring = self.shared.ring.read();
        StoreStats {
            capacity: ring.capacity(),
            len: ring.len(),
            first_time: ring.front().map(|s| s.time),
            last_time: ring.back().map(|s| s.time),
            total_appended: self.shared.metrics.total_appended.load(Ordering::Relaxed),
            total_evicted: self.shared.metrics.total_evicted.load(Ordering::Relaxed),
        }
    }
}
