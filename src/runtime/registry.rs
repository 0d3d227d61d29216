/*!
Sharded session registry.

Sessions live in a `DashMap` keyed by session id, each behind its own
`parking_lot::Mutex`. Lookups clone the `Arc` and release the shard guard
before locking the session, so the only cross-session contention is the
shard lock taken for the map operation itself.
*/

use std::sync::Arc;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use parking_lot::Mutex;

use crate::core::error::{Error, Result};
use crate::core::session::SignalSession;
use crate::core::signal::SessionId;

/// Shared handle to one session
pub type SessionHandle = Arc<Mutex<SignalSession>>;

/// What a sweep pass did
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// Sessions inspected
    pub inspected: usize,
    /// Sessions found expired during this pass
    pub expired: usize,
    /// Terminal sessions removed
    pub purged: usize,
    /// Sessions skipped because a caller held the lock
    pub busy: usize,
}

/// Concurrent map of live and tombstoned sessions
pub struct SessionRegistry {
    sessions: DashMap<SessionId, SessionHandle>,
}

impl SessionRegistry {
    /// `shards` must be a power of two greater than one
    pub fn new(shards: usize) -> Self {
        Self {
            sessions: DashMap::with_capacity_and_shard_amount(0, shards),
        }
    }

    /// Register a new session
    pub fn insert(&self, session: SignalSession) -> Result<SessionHandle> {
        let id = *session.id();
        let handle = Arc::new(Mutex::new(session));
        match self.sessions.entry(id) {
            Entry::Occupied(_) => {
                Err(Error::Internal(format!("session id collision: {}", id)))
            }
            Entry::Vacant(slot) => {
                slot.insert(Arc::clone(&handle));
                Ok(handle)
            }
        }
    }

    /// Look up a session; the shard guard is released before returning
    pub fn get(&self, id: &SessionId) -> Option<SessionHandle> {
        self.sessions.get(id).map(|entry| Arc::clone(entry.value()))
    }

    /// Remove a session outright
    pub fn remove(&self, id: &SessionId) -> Option<SessionHandle> {
        self.sessions.remove(id).map(|(_, handle)| handle)
    }

    pub fn contains(&self, id: &SessionId) -> bool {
        self.sessions.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Snapshot of the current handles
    pub fn handles(&self) -> Vec<SessionHandle> {
        self.sessions
            .iter()
            .map(|entry| Arc::clone(entry.value()))
            .collect()
    }

    /// Expire lapsed sessions and drop tombstones older than `retention_ms`.
    ///
    /// Sessions whose lock is held are skipped; the next pass gets them.
    pub fn sweep(&self, now_ms: u64, retention_ms: u64) -> SweepReport {
        let mut report = SweepReport::default();
        self.sessions.retain(|_, handle| {
            report.inspected += 1;
            let Some(mut session) = handle.try_lock() else {
                report.busy += 1;
                return true;
            };
            if session.check_expiry(now_ms) {
                report.expired += 1;
            }
            if session.is_purgeable(now_ms, retention_ms) {
                report.purged += 1;
                return false;
            }
            true
        });
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::RuntimeConfig;
    use crate::core::fingerprint::{AttributeKind, FingerprintVector, TrustLevel};
    use crate::core::memory::SecretBytes;
    use crate::core::session::{Establishment, RevocationReason, SessionPolicy, SessionState};

    fn session(now_ms: u64, policy: &SessionPolicy) -> SignalSession {
        let secret = SecretBytes::from_slice(&[1u8; 32]);
        SignalSession::establish(
            Establishment {
                session_id: SessionId::generate(),
                principal: "bob".into(),
                client_public_key: Vec::new(),
                shared_secret: &secret,
                fingerprint: FingerprintVector::from_attributes([(AttributeKind::MachineId, "m")]),
                trust: TrustLevel::Full,
                now_ms,
            },
            policy,
        )
        .unwrap()
    }

    #[test]
    fn test_insert_get_remove() {
        let policy = SessionPolicy::from_config(&RuntimeConfig::default());
        let registry = SessionRegistry::new(8);
        let handle = registry.insert(session(0, &policy)).unwrap();
        let id = *handle.lock().id();

        assert!(registry.contains(&id));
        assert_eq!(registry.len(), 1);
        assert!(Arc::ptr_eq(&registry.get(&id).unwrap(), &handle));

        assert!(registry.remove(&id).is_some());
        assert!(registry.get(&id).is_none());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_sweep_expires_then_purges() {
        let config = RuntimeConfig::default();
        let policy = SessionPolicy::from_config(&config);
        let registry = SessionRegistry::new(8);
        let lifetime = config.session_lifetime_ms();
        let retention = 1_000;

        let live = registry.insert(session(0, &policy)).unwrap();
        let revoked = registry.insert(session(0, &policy)).unwrap();
        revoked.lock().revoke(RevocationReason::Requested, 10);

        let report = registry.sweep(500, retention);
        assert_eq!(report.inspected, 2);
        assert_eq!(report.purged, 0);

        let report = registry.sweep(1_010, retention);
        assert_eq!(report.purged, 1);
        assert_eq!(registry.len(), 1);

        let report = registry.sweep(lifetime, retention);
        assert_eq!(report.expired, 1);
        assert_eq!(report.purged, 0);
        assert_eq!(live.lock().state(), SessionState::Expired);

        let report = registry.sweep(lifetime + retention, retention);
        assert_eq!(report.purged, 1);
        assert!(registry.is_empty());
    }

    #[test]
    fn test_sweep_skips_locked_sessions() {
        let policy = SessionPolicy::from_config(&RuntimeConfig::default());
        let registry = SessionRegistry::new(8);
        let handle = registry.insert(session(0, &policy)).unwrap();
        handle.lock().revoke(RevocationReason::Requested, 0);

        let guard = handle.lock();
        let report = registry.sweep(u64::MAX, 0);
        assert_eq!(report.busy, 1);
        assert_eq!(registry.len(), 1);
        drop(guard);

        assert_eq!(registry.sweep(u64::MAX, 0).purged, 1);
    }
}
