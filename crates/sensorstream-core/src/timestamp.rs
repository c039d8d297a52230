//! Ingestion-time stamping
//!
//! Samples are stamped with the wall-clock time at which they are appended,
//! never with a time embedded in the source data. [`MonotonicStamp`] keeps the
//! stamped sequence non-decreasing when the wall clock steps backwards, which
//! the store's range search relies on.

/// Source of wall-clock time in milliseconds since the Unix epoch
pub trait Clock: Send + Sync {
    fn now_millis(&self) -> i64;
}

/// System wall clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        chrono::Utc::now().timestamp_millis()
    }
}

impl<C: Clock + ?Sized> Clock for std::sync::Arc<C> {
    fn now_millis(&self) -> i64 {
        (**self).now_millis()
    }
}

/// Non-decreasing stamp generator over a [`Clock`]
///
/// Returns the clock reading, or the previous stamp if the clock went
/// backwards. Two stamps may be equal (several ticks within one millisecond).
#[derive(Debug)]
pub struct MonotonicStamp<C> {
    clock: C,
    last: Option<i64>,
}

impl<C: Clock> MonotonicStamp<C> {
    pub fn new(clock: C) -> Self {
        Self { clock, last: None }
    }

    /// Next stamp, never earlier than the previous one
    pub fn next(&mut self) -> i64 {
        let now = self.clock.now_millis();
        let stamp = match self.last {
            Some(last) if now < last => {
                tracing::debug!(now, last, "wall clock stepped backwards, holding stamp");
                last
            }
            _ => now,
        };
        self.last = Some(stamp);
        stamp
    }

    /// Last stamp handed out
    pub fn last(&self) -> Option<i64> {
        self.last
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::ManualClock;

    #[test]
    fn test_system_clock_is_plausible() {
        // 2020-01-01 in milliseconds
        assert!(SystemClock.now_millis() > 1_577_836_800_000);
    }

    #[test]
    fn test_monotonic_stamp_follows_clock() {
        let clock = ManualClock::new(1_000);
        let mut stamp = MonotonicStamp::new(clock.clone());
        assert_eq!(stamp.next(), 1_000);
        clock.advance(5);
        assert_eq!(stamp.next(), 1_005);
        assert_eq!(stamp.next(), 1_005);
        assert_eq!(stamp.last(), Some(1_005));
    }

    #[test]
    fn test_monotonic_stamp_holds_on_backwards_step() {
        let clock = ManualClock::new(2_000);
        let mut stamp = MonotonicStamp::new(clock.clone());
        assert_eq!(stamp.next(), 2_000);

        clock.set(1_500);
        assert_eq!(stamp.next(), 2_000);

        clock.set(2_010);
        assert_eq!(stamp.next(), 2_010);
    }
}
