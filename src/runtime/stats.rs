/*!
Runtime counters.
*/

use std::sync::atomic::{AtomicU64, Ordering};

use crate::core::error::RejectReason;

const REASONS: [RejectReason; 8] = [
    RejectReason::UnknownSession,
    RejectReason::MalformedSignal,
    RejectReason::EpochOutOfRange,
    RejectReason::SignatureMismatch,
    RejectReason::ReplayRejected,
    RejectReason::SessionRevoked,
    RejectReason::SessionExpired,
    RejectReason::AnomalyThresholdBreached,
];

fn reason_index(reason: RejectReason) -> usize {
    match reason {
        RejectReason::UnknownSession => 0,
        RejectReason::MalformedSignal => 1,
        RejectReason::EpochOutOfRange => 2,
        RejectReason::SignatureMismatch => 3,
        RejectReason::ReplayRejected => 4,
        RejectReason::SessionRevoked => 5,
        RejectReason::SessionExpired => 6,
        RejectReason::AnomalyThresholdBreached => 7,
    }
}

/// Lock-free counters updated on every operation
#[derive(Debug, Default)]
pub struct RuntimeStats {
    issued: AtomicU64,
    accepted: AtomicU64,
    rejected: [AtomicU64; 8],
    refreshed: AtomicU64,
    revoked: AtomicU64,
    expired: AtomicU64,
    purged: AtomicU64,
}

/// Point-in-time copy of [`RuntimeStats`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde-support", derive(serde::Serialize, serde::Deserialize))]
pub struct StatsSnapshot {
    pub issued: u64,
    pub accepted: u64,
    pub rejected: u64,
    pub refreshed: u64,
    pub revoked: u64,
    pub expired: u64,
    pub purged: u64,
}

impl RuntimeStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_issued(&self) {
        self.issued.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_accepted(&self) {
        self.accepted.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_rejected(&self, reason: RejectReason) {
        self.rejected[reason_index(reason)].fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_refreshed(&self) {
        self.refreshed.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_revoked(&self) {
        self.revoked.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_expired(&self, count: u64) {
        self.expired.fetch_add(count, Ordering::Relaxed);
    }

    pub(crate) fn record_purged(&self, count: u64) {
        self.purged.fetch_add(count, Ordering::Relaxed);
    }

    /// Rejections for one reason
    pub fn rejections(&self, reason: RejectReason) -> u64 {
        self.rejected[reason_index(reason)].load(Ordering::Relaxed)
    }

    /// Rejections per reason, in declaration order
    pub fn rejections_by_reason(&self) -> Vec<(RejectReason, u64)> {
        REASONS
            .iter()
            .map(|reason| (*reason, self.rejections(*reason)))
            .collect()
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            issued: self.issued.load(Ordering::Relaxed),
            accepted: self.accepted.load(Ordering::Relaxed),
            rejected: self.rejected.iter().map(|c| c.load(Ordering::Relaxed)).sum(),
            refreshed: self.refreshed.load(Ordering::Relaxed),
            revoked: self.revoked.load(Ordering::Relaxed),
            expired: self.expired.load(Ordering::Relaxed),
            purged: self.purged.load(Ordering::Relaxed),
        }
    }
}
