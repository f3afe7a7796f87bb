//! Clock-derived task ids.

use crate::models::TaskId;
use crate::current_timestamp_millis;
use std::sync::atomic::{AtomicU64, Ordering};

/// Hands out strictly increasing millisecond values.
///
/// Each value is the current clock reading, bumped past the previous value
/// when the clock has not advanced (or went backwards).
#[derive(Debug, Default)]
pub struct MonotonicIdGenerator {
    last: AtomicU64,
}

impl MonotonicIdGenerator {
    /// Creates a generator that has not issued anything yet.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            last: AtomicU64::new(0),
        }
    }

    /// Returns the next value given a clock reading of `now`.
    pub fn next_after(&self, now: u64) -> u64 {
        let mut issued = now;
        // fetch_update only fails if the closure returns None
        let _ = self
            .last
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| {
                issued = now.max(last.saturating_add(1));
                Some(issued)
            });
        issued
    }

    /// Returns the next id from the system clock.
    pub fn next_id(&self) -> TaskId {
        TaskId::new(self.next_after(current_timestamp_millis()).to_string())
    }
}

static GLOBAL_GENERATOR: MonotonicIdGenerator = MonotonicIdGenerator::new();

/// Returns a fresh task id, unique within this process.
#[must_use]
pub fn next_task_id() -> TaskId {
    GLOBAL_GENERATOR.next_id()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_follows_clock_when_it_advances() {
        let generator = MonotonicIdGenerator::new();
        assert_eq!(generator.next_after(100), 100);
        assert_eq!(generator.next_after(250), 250);
    }

    #[test]
    fn test_bumps_within_same_millisecond() {
        let generator = MonotonicIdGenerator::new();
        assert_eq!(generator.next_after(100), 100);
        assert_eq!(generator.next_after(100), 101);
        assert_eq!(generator.next_after(100), 102);
    }

    #[test]
    fn test_never_goes_backwards() {
        let generator = MonotonicIdGenerator::new();
        assert_eq!(generator.next_after(500), 500);
        assert_eq!(generator.next_after(10), 501);
    }

    #[test]
    fn test_global_ids_are_unique_and_numeric() {
        let ids: Vec<TaskId> = (0..1000).map(|_| next_task_id()).collect();
        let unique: HashSet<&TaskId> = ids.iter().collect();
        assert_eq!(unique.len(), ids.len());
        assert!(ids.iter().all(|id| id.as_timestamp_millis().is_some()));
    }

    #[test]
    fn test_concurrent_ids_are_unique() {
        let handles: Vec<_> = (0..4)
            .map(|_| std::thread::spawn(|| (0..500).map(|_| next_task_id()).collect::<Vec<_>>()))
            .collect();
        let mut seen = HashSet::new();
        for handle in handles {
            for id in handle.join().unwrap() {
                assert!(seen.insert(id));
            }
        }
        assert_eq!(seen.len(), 2000);
    }
}
