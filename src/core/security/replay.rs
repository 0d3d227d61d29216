/*!
Anti-replay sequencer.

Each session keeps a ledger with the highest accepted `(epoch, sequence)`
pair. A signal is fresh when it is lexicographically greater than that
watermark. With a non-zero reorder tolerance, a signal slightly behind the
watermark in the same epoch is also admitted once, tracked by a 64-bit
bitmap of recently seen offsets.
*/

use crate::core::constants::sizes;

/// Outcome of presenting `(epoch, sequence)` to the ledger
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// New watermark; `gap` sequence numbers were skipped
    Advanced { gap: u64 },
    /// Behind the watermark but inside the reorder window and unseen
    Reordered,
    /// Already accepted, or too far behind
    Rejected,
}

impl Admission {
    pub fn is_accepted(&self) -> bool {
        !matches!(self, Admission::Rejected)
    }
}

/// Per-session replay ledger
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplayLedger {
    high: Option<(u64, u64)>,
    // bit i set => sequence (high.1 - 1 - i) was accepted in high.0
    window: u64,
    tolerance: u32,
    violations: u32,
}

impl ReplayLedger {
    /// A ledger admitting up to `tolerance` sequence numbers of reordering
    pub fn new(tolerance: u32) -> Self {
        Self {
            high: None,
            window: 0,
            tolerance: tolerance.min(sizes::REPLAY_WINDOW_BITS),
            violations: 0,
        }
    }

    /// Highest accepted `(epoch, sequence)`
    pub fn high_watermark(&self) -> Option<(u64, u64)> {
        self.high
    }

    /// Replay rejections recorded so far
    pub fn violations(&self) -> u32 {
        self.violations
    }

    /// Classify without recording anything
    pub fn check(&self, epoch: u64, sequence: u64) -> Admission {
        let Some((high_epoch, high_seq)) = self.high else {
            return Admission::Advanced { gap: sequence };
        };

        if (epoch, sequence) > (high_epoch, high_seq) {
            let gap = sequence.saturating_sub(high_seq).saturating_sub(1);
            return Admission::Advanced { gap };
        }

        if epoch != high_epoch || sequence == high_seq {
            return Admission::Rejected;
        }

        let offset = high_seq - sequence;
        if offset > u64::from(self.tolerance) {
            return Admission::Rejected;
        }
        if self.window & (1u64 << (offset - 1)) != 0 {
            return Admission::Rejected;
        }
        Admission::Reordered
    }

    /// Classify and, when admitted, record
    pub fn admit(&mut self, epoch: u64, sequence: u64) -> Admission {
        let admission = self.check(epoch, sequence);
        match admission {
            Admission::Advanced { .. } => self.advance(epoch, sequence),
            Admission::Reordered => {
                if let Some((_, high_seq)) = self.high {
                    self.window |= 1u64 << (high_seq - sequence - 1);
                }
            }
            Admission::Rejected => {
                self.violations = self.violations.saturating_add(1);
            }
        }
        admission
    }

    /// `true` when `(epoch, sequence)` is admitted
    pub fn accept(&mut self, epoch: u64, sequence: u64) -> bool {
        self.admit(epoch, sequence).is_accepted()
    }

    fn advance(&mut self, epoch: u64, sequence: u64) {
        self.window = match self.high {
            Some((high_epoch, high_seq)) if high_epoch == epoch => {
                let shift = sequence - high_seq;
                let shifted = u32::try_from(shift)
                    .ok()
                    .and_then(|s| self.window.checked_shl(s))
                    .unwrap_or(0);
                let previous = u32::try_from(shift - 1)
                    .ok()
                    .and_then(|s| 1u64.checked_shl(s))
                    .unwrap_or(0);
                shifted | previous
            }
            _ => 0,
        };
        self.high = Some((epoch, sequence));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strict_ordering() {
        let mut ledger = ReplayLedger::new(0);
        assert_eq!(ledger.admit(0, 0), Admission::Advanced { gap: 0 });
        assert_eq!(ledger.admit(0, 0), Admission::Rejected);
        assert_eq!(ledger.admit(0, 1), Admission::Advanced { gap: 0 });
        assert_eq!(ledger.admit(1, 2), Admission::Advanced { gap: 0 });
        assert_eq!(ledger.admit(0, 5), Admission::Rejected);
        assert_eq!(ledger.admit(1, 1), Admission::Rejected);
        assert_eq!(ledger.violations(), 3);
        assert_eq!(ledger.high_watermark(), Some((1, 2)));
    }

    #[test]
    fn test_gap_reporting() {
        let mut ledger = ReplayLedger::new(0);
        assert_eq!(ledger.admit(0, 10), Admission::Advanced { gap: 10 });
        assert_eq!(ledger.admit(0, 50), Admission::Advanced { gap: 39 });
        assert_eq!(ledger.admit(1, 51), Admission::Advanced { gap: 0 });
    }

    #[test]
    fn test_reorder_window() {
        let mut ledger = ReplayLedger::new(4);
        assert!(ledger.accept(0, 0));
        assert!(ledger.accept(0, 5));
        // 1 and 4 arrive late
        assert_eq!(ledger.admit(0, 4), Admission::Reordered);
        assert_eq!(ledger.admit(0, 1), Admission::Reordered);
        // but only once
        assert_eq!(ledger.admit(0, 4), Admission::Rejected);
        // 0 was accepted before the jump
        assert_eq!(ledger.admit(0, 0), Admission::Rejected);
        assert!(ledger.accept(0, 3));
        assert!(ledger.accept(0, 2));
        assert_eq!(ledger.violations(), 2);
    }

    #[test]
    fn test_reorder_window_limits() {
        let mut ledger = ReplayLedger::new(2);
        assert!(ledger.accept(0, 10));
        assert!(!ledger.accept(0, 7));
        assert!(ledger.accept(0, 8));

        // tolerance never crosses an epoch boundary
        assert!(ledger.accept(1, 11));
        assert!(!ledger.accept(0, 9));
    }

    #[test]
    fn test_full_width_window() {
        let mut ledger = ReplayLedger::new(64);
        assert!(ledger.accept(0, 0));
        assert!(ledger.accept(0, 64));
        assert_eq!(ledger.admit(0, 0), Admission::Rejected);
        assert_eq!(ledger.admit(0, 1), Admission::Reordered);

        assert!(ledger.accept(0, 1_000));
        assert_eq!(ledger.admit(0, 936), Admission::Reordered);
        assert_eq!(ledger.admit(0, 935), Admission::Rejected);
    }

    #[test]
    fn test_check_does_not_mutate() {
        let ledger = ReplayLedger::new(0);
        assert_eq!(ledger.check(0, 3), Admission::Advanced { gap: 3 });
        assert_eq!(ledger.high_watermark(), None);
        assert_eq!(ledger.violations(), 0);
    }
}
