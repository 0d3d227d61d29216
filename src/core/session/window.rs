/*!
Validity windows and epoch arithmetic.
*/

/// Half-open validity interval `[not_before, not_after)`, Unix milliseconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde-support", derive(serde::Serialize, serde::Deserialize))]
pub struct ValidityWindow {
    pub not_before_ms: u64,
    pub not_after_ms: u64,
}

impl ValidityWindow {
    /// A window of `lifetime_ms` starting at `not_before_ms`
    pub fn starting_at(not_before_ms: u64, lifetime_ms: u64) -> Self {
        Self {
            not_before_ms,
            not_after_ms: not_before_ms.saturating_add(lifetime_ms),
        }
    }

    pub fn contains(&self, now_ms: u64) -> bool {
        now_ms >= self.not_before_ms && now_ms < self.not_after_ms
    }

    /// Whether the window has run out at `now_ms`
    pub fn is_exhausted(&self, now_ms: u64) -> bool {
        now_ms >= self.not_after_ms
    }

    pub fn remaining_ms(&self, now_ms: u64) -> u64 {
        self.not_after_ms.saturating_sub(now_ms)
    }

    pub fn duration_ms(&self) -> u64 {
        self.not_after_ms - self.not_before_ms
    }
}

/// Maps wall-clock time to session-relative epochs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde-support", derive(serde::Serialize, serde::Deserialize))]
pub struct EpochClock {
    origin_ms: u64,
    window_ms: u64,
}

impl EpochClock {
    /// Epoch 0 starts at `origin_ms`. `window_ms` is clamped to at least 1.
    pub fn new(origin_ms: u64, window_ms: u64) -> Self {
        Self {
            origin_ms,
            window_ms: window_ms.max(1),
        }
    }

    pub fn origin_ms(&self) -> u64 {
        self.origin_ms
    }

    pub fn window_ms(&self) -> u64 {
        self.window_ms
    }

    /// `floor((now - origin) / window)`; times before the origin map to 0
    pub fn epoch_at(&self, now_ms: u64) -> u64 {
        now_ms.saturating_sub(self.origin_ms) / self.window_ms
    }

    /// First millisecond of `epoch`
    pub fn epoch_start(&self, epoch: u64) -> u64 {
        self.origin_ms
            .saturating_add(epoch.saturating_mul(self.window_ms))
    }

    /// Whether `presented` is within `tolerance` epochs of `current`
    pub fn within_skew(presented: u64, current: u64, tolerance: u64) -> bool {
        presented.abs_diff(current) <= tolerance
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_bounds() {
        let window = ValidityWindow::starting_at(1_000, 500);
        assert!(!window.contains(999));
        assert!(window.contains(1_000));
        assert!(window.contains(1_499));
        assert!(!window.contains(1_500));
        assert!(window.is_exhausted(1_500));
        assert_eq!(window.remaining_ms(1_200), 300);
        assert_eq!(window.duration_ms(), 500);
    }

    #[test]
    fn test_epoch_arithmetic() {
        let clock = EpochClock::new(10_000, 5_000);
        assert_eq!(clock.epoch_at(9_000), 0);
        assert_eq!(clock.epoch_at(10_000), 0);
        assert_eq!(clock.epoch_at(14_999), 0);
        assert_eq!(clock.epoch_at(15_000), 1);
        assert_eq!(clock.epoch_start(3), 25_000);
        assert_eq!(clock.epoch_at(clock.epoch_start(42)), 42);
    }

    #[test]
    fn test_skew() {
        assert!(EpochClock::within_skew(5, 5, 1));
        assert!(EpochClock::within_skew(4, 5, 1));
        assert!(EpochClock::within_skew(6, 5, 1));
        assert!(!EpochClock::within_skew(3, 5, 1));
        assert!(!EpochClock::within_skew(7, 5, 1));
        assert!(EpochClock::within_skew(0, 0, 0));
    }
}
