//! Per-client message identifiers.

use std::sync::atomic::{AtomicI64, Ordering};

use crate::now_millis;

/// Hands out millisecond-timestamp ids that never repeat on one client.
///
/// Ids stay plain epoch milliseconds on the wire; when two messages are
/// created within the same millisecond (or the clock steps backwards) the
/// next id is bumped past the previous one.
#[derive(Debug, Default)]
pub struct MessageIdGenerator {
    last: AtomicI64,
}

impl MessageIdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Next id based on the current wall clock.
    pub fn next_id(&self) -> i64 {
        self.next_at(now_millis())
    }

    /// Next id given an explicit clock reading.
    pub fn next_at(&self, now: i64) -> i64 {
        let mut assigned = now;
        let _ = self
            .last
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| {
                assigned = now.max(last + 1);
                Some(assigned)
            });
        assigned
    }
}
