/*!
Time sources.

Every epoch, window, expiry and decay computation reads an injected clock so
the runtime can be driven by synthetic time in tests.
*/

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Source of wall-clock time in Unix milliseconds
pub trait Clock: Send + Sync {
    /// Current Unix timestamp in milliseconds
    fn now_ms(&self) -> u64;
}

/// System clock backed by `SystemTime`
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        let elapsed = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or(Duration::ZERO);
        elapsed.as_millis().min(u128::from(u64::MAX)) as u64
    }
}

/// Manually driven clock for deterministic tests.
///
/// Clones share the same underlying instant, so a test can hold one handle
/// and advance time under a runtime that owns another.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Arc<AtomicU64>,
}

impl ManualClock {
    /// Create a clock frozen at `start_ms`
    pub fn new(start_ms: u64) -> Self {
        Self {
            now: Arc::new(AtomicU64::new(start_ms)),
        }
    }

    /// Move time forward
    pub fn advance(&self, by: Duration) {
        let by = by.as_millis().min(u128::from(u64::MAX)) as u64;
        self.now.fetch_add(by, Ordering::SeqCst);
    }

    /// Jump to an absolute instant (may move backwards)
    pub fn set(&self, now_ms: u64) {
        self.now.store(now_ms, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u64 {
        self.now.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manual_clock_shared() {
        let clock = ManualClock::new(1_000);
        let handle = clock.clone();

        handle.advance(Duration::from_secs(2));
        assert_eq!(clock.now_ms(), 3_000);

        clock.set(500);
        assert_eq!(handle.now_ms(), 500);
    }

    #[test]
    fn test_system_clock_is_after_2020() {
        assert!(SystemClock.now_ms() > 1_577_836_800_000);
    }
}
