//! Resubmission throttle
//!
//! Explicit rate-limiter component with an injected clock, replacing the
//! module-level last-submission dictionary the API layer used to keep.
//! Stale entries are evicted on the check path, so the map is bounded by
//! the set of keys seen within the eviction window.

use std::collections::HashMap;

use chrono::Utc;
use parking_lot::Mutex;

/// Entries idle for this many minimum intervals are dropped
const EVICT_AFTER_INTERVALS: i64 = 10;

pub trait Clock: Send + Sync {
    fn now_ms(&self) -> i64;
}

/// Wall-clock implementation used in production
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> i64 {
        Utc::now().timestamp_millis()
    }
}

pub struct SubmissionThrottle<C: Clock = SystemClock> {
    min_interval_ms: i64,
    last_seen: Mutex<HashMap<String, i64>>,
    clock: C,
}

impl SubmissionThrottle<SystemClock> {
    pub fn new(min_interval_ms: i64) -> Self {
        Self::with_clock(min_interval_ms, SystemClock)
    }
}

impl<C: Clock> SubmissionThrottle<C> {
    pub fn with_clock(min_interval_ms: i64, clock: C) -> Self {
        Self {
            min_interval_ms: min_interval_ms.max(0),
            last_seen: Mutex::new(HashMap::new()),
            clock,
        }
    }

    /// Returns `true` and records the attempt if `key` is outside its
    /// minimum interval; returns `false` without updating the timestamp
    /// otherwise, so a burst cannot keep extending its own window.
    pub fn check(&self, key: &str) -> bool {
        let now = self.clock.now_ms();
        let mut last_seen = self.last_seen.lock();

        last_seen.retain(|_, &mut at| now - at < self.min_interval_ms * EVICT_AFTER_INTERVALS);

        match last_seen.get(key) {
            Some(&at) if now - at < self.min_interval_ms => false,
            _ => {
                last_seen.insert(key.to_string(), now);
                true
            }
        }
    }

    /// Number of keys currently tracked (post-eviction as of the last check)
    pub fn tracked(&self) -> usize {
        self.last_seen.lock().len()
    }
}
