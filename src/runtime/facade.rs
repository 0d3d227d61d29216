/*!
The signal runtime.

`SignalRuntime` is the only surface the OAuth compatibility layer talks to:
`issue`, `validate`, `refresh` and `revoke`, plus export and housekeeping.
It is cheap to clone; clones share one registry, one signing identity and
one clock.
*/

use std::sync::{Arc, Weak};
use std::time::Duration;

use log::{debug, info, warn};

use super::builder::SignalRuntimeBuilder;
use super::registry::{SessionHandle, SessionRegistry, SweepReport};
use super::stats::{RuntimeStats, StatsSnapshot};
use super::sweeper::SweeperHandle;
use crate::core::clock::Clock;
use crate::core::config::{RuntimeConfig, duration_ms};
use crate::core::constants::VERSION;
use crate::core::crypto::{CryptoConfig, CryptoSuite};
use crate::core::error::{Error, RejectReason, Result};
use crate::core::fingerprint::{FingerprintProvider, FingerprintVector, TrustLevel, assess_trust};
use crate::core::session::binding::MAX_PRINCIPAL_BYTES;
use crate::core::session::{
    BindingRecord, Establishment, RefreshGrant, RevocationReason, SessionGrant, SessionPolicy,
    SessionRecord, SessionState, SignalSession, Verdict, hash_public_key,
};
use crate::core::signal::{SessionId, Signal, SignalDigest};

pub(crate) struct RuntimeInner {
    config: RuntimeConfig,
    policy: SessionPolicy,
    retention_ms: u64,
    suite: CryptoSuite,
    clock: Arc<dyn Clock>,
    registry: SessionRegistry,
    stats: RuntimeStats,
}

impl RuntimeInner {
    fn sweep(&self) -> SweepReport {
        let report = self.registry.sweep(self.clock.now_ms(), self.retention_ms);
        self.stats.record_expired(report.expired as u64);
        self.stats.record_purged(report.purged as u64);
        if report.expired > 0 || report.purged > 0 {
            info!(
                target: "signal_runtime::sweep",
                "expired {} and purged {} of {} sessions",
                report.expired,
                report.purged,
                report.inspected
            );
        }
        report
    }

    /// Lazy expiry under the session lock, counted once per session
    fn expire_if_due(&self, session: &mut SignalSession, now_ms: u64) {
        if session.check_expiry(now_ms) {
            self.stats.record_expired(1);
            debug!(target: "signal_runtime::sweep", "session {} expired", session.id());
        }
    }

    fn note_revocation(&self, session: &SignalSession, was_terminal: bool) {
        if was_terminal || session.state() != SessionState::Revoked {
            return;
        }
        self.stats.record_revoked();
        if let Some(reason) = session.revocation_reason() {
            warn!(
                target: "signal_runtime::revoke",
                "session {} revoked: {}",
                session.id(),
                reason
            );
        }
    }
}

/// Issues, validates, refreshes and revokes hardware-bound sessions
#[derive(Clone)]
pub struct SignalRuntime {
    inner: Arc<RuntimeInner>,
}

impl SignalRuntime {
    /// Runtime with `config`, the system clock and a fresh signing identity
    pub fn new(config: RuntimeConfig) -> Result<Self> {
        SignalRuntimeBuilder::new().with_config(config).build()
    }

    /// Start a builder
    pub fn builder() -> SignalRuntimeBuilder {
        SignalRuntimeBuilder::new()
    }

    /// Assemble from validated parts
    pub(crate) fn from_parts(config: RuntimeConfig, suite: CryptoSuite, clock: Arc<dyn Clock>) -> Self {
        Self {
            inner: Arc::new(RuntimeInner {
                policy: SessionPolicy::from_config(&config),
                retention_ms: duration_ms(config.tombstone_retention),
                registry: SessionRegistry::new(config.registry_shards),
                stats: RuntimeStats::new(),
                config,
                suite,
                clock,
            }),
        }
    }

    /// Negotiate a shared secret with the client, bind its fingerprint and
    /// register a new `Active` session.
    ///
    /// Fails with [`Error::InsufficientHardwareSignal`] when the fingerprint
    /// has too few attributes and degraded mode is off, and with
    /// [`Error::KeyAgreement`] when the client public key is unusable.
    pub fn issue(
        &self,
        principal: &str,
        client_public_key: &[u8],
        fingerprint: &FingerprintVector,
    ) -> Result<SessionGrant> {
        let inner = &self.inner;
        if principal.len() > MAX_PRINCIPAL_BYTES {
            return Err(Error::InvalidFormat(format!(
                "principal longer than {} bytes",
                MAX_PRINCIPAL_BYTES
            )));
        }

        let trust = assess_trust(
            fingerprint,
            inner.config.min_fingerprint_attributes,
            inner.config.degraded_mode_allowed,
        )
        .inspect_err(|e| warn!(target: "signal_runtime::issue", "issuance refused: {}", e))?;
        if trust == TrustLevel::Degraded {
            warn!(
                target: "signal_runtime::issue",
                "issuing degraded session with {} of {} attributes",
                fingerprint.attribute_count(),
                inner.config.min_fingerprint_attributes
            );
        }

        let negotiated = inner
            .suite
            .negotiate(client_public_key)
            .inspect_err(|e| warn!(target: "signal_runtime::issue", "issuance refused: {}", e))?;

        let now_ms = inner.clock.now_ms();
        let session_id = SessionId::generate();
        let session = SignalSession::establish(
            Establishment {
                session_id,
                principal: principal.to_string(),
                client_public_key: client_public_key.to_vec(),
                shared_secret: &negotiated.shared_secret,
                fingerprint: fingerprint.clone(),
                trust,
                now_ms,
            },
            &inner.policy,
        )?;

        let algorithms = inner.suite.config();
        let binding = BindingRecord {
            version: VERSION,
            session_id,
            principal: principal.to_string(),
            fingerprint: *session.fingerprint_binding(),
            client_key_hash: hash_public_key(client_public_key),
            key_agreement: algorithms.key_agreement,
            signature: algorithms.signature,
            trust,
            issued_at_ms: now_ms,
            window: session.window(),
            window_size_ms: inner.policy.window_ms,
        };
        let binding_signature = inner.suite.sign(&binding.to_bytes())?;

        inner.registry.insert(session)?;
        inner.stats.record_issued();
        info!(
            target: "signal_runtime::issue",
            "issued session {} ({} trust, {}/{})",
            session_id,
            trust.as_str(),
            algorithms.key_agreement_name(),
            algorithms.signature_name()
        );

        Ok(SessionGrant {
            session_id,
            kem_ciphertext: negotiated.ciphertext,
            binding,
            binding_signature,
            server_verify_key: inner.suite.verify_key().to_vec(),
        })
    }

    /// Collect the fingerprint from `provider`, then [`issue`](Self::issue)
    pub fn issue_collected(
        &self,
        principal: &str,
        client_public_key: &[u8],
        provider: &FingerprintProvider,
    ) -> Result<SessionGrant> {
        let fingerprint = provider.collect()?;
        self.issue(principal, client_public_key, &fingerprint)
    }

    /// Check a presented signal
    pub fn validate(&self, session_id: &SessionId, signal: &Signal) -> Verdict {
        self.validate_with(session_id, signal, None)
    }

    /// Check a presented signal together with a fresh fingerprint
    /// observation, which is scored for drift against the bound one
    pub fn validate_observed(
        &self,
        session_id: &SessionId,
        signal: &Signal,
        observed: &FingerprintVector,
    ) -> Verdict {
        self.validate_with(session_id, signal, Some(observed))
    }

    /// Check a signal given as untyped wire fields.
    ///
    /// Anything that does not parse is `MalformedSignal`; no session state is
    /// touched in that case.
    pub fn validate_raw(
        &self,
        session_id: &str,
        epoch: i64,
        sequence: i64,
        digest: &[u8],
        issued_at_ms: i64,
    ) -> Verdict {
        let Some(id) = SessionId::from_hex(session_id) else {
            warn!(
                target: "signal_runtime::validate",
                "rejected signal with unparseable session id: {}",
                RejectReason::MalformedSignal.code()
            );
            self.inner.stats.record_rejected(RejectReason::MalformedSignal);
            return Verdict::Reject(RejectReason::MalformedSignal);
        };

        let parsed = (|| {
            Some(Signal {
                epoch: u64::try_from(epoch).ok()?,
                sequence: u64::try_from(sequence).ok()?,
                digest: SignalDigest::from_slice(digest)?,
                issued_at_ms: u64::try_from(issued_at_ms).ok()?,
            })
        })();

        match parsed {
            Some(signal) => self.validate(&id, &signal),
            None => self.rejected(&id, RejectReason::MalformedSignal),
        }
    }

    fn validate_with(
        &self,
        session_id: &SessionId,
        signal: &Signal,
        observed: Option<&FingerprintVector>,
    ) -> Verdict {
        let inner = &self.inner;
        let Some(handle) = inner.registry.get(session_id) else {
            return self.rejected(session_id, RejectReason::UnknownSession);
        };

        let verdict = {
            let mut session = handle.lock();
            let now_ms = inner.clock.now_ms();
            let was_terminal = session.state().is_terminal();
            inner.expire_if_due(&mut session, now_ms);
            let verdict = session.validate(signal, observed, now_ms, &inner.policy);
            inner.note_revocation(&session, was_terminal);
            verdict
        };

        match verdict {
            Verdict::Accept(acceptance) => {
                inner.stats.record_accepted();
                debug!(
                    target: "signal_runtime::validate",
                    "session {} accepted ({}, {}) score {:.3}",
                    session_id,
                    acceptance.epoch,
                    acceptance.sequence,
                    acceptance.anomaly_score
                );
                verdict
            }
            Verdict::Reject(reason) => self.rejected(session_id, reason),
        }
    }

    fn rejected(&self, session_id: &SessionId, reason: RejectReason) -> Verdict {
        self.inner.stats.record_rejected(reason);
        warn!(
            target: "signal_runtime::validate",
            "session {} rejected: {}",
            session_id,
            reason.code()
        );
        Verdict::Reject(reason)
    }

    /// Start a new validity window and ratchet the signal key.
    ///
    /// The device applies the returned grant to stay in step. The anomaly
    /// score carries over unchanged.
    pub fn refresh(&self, session_id: &SessionId) -> Result<RefreshGrant> {
        self.refresh_with(session_id, None)
    }

    /// Refresh with a fresh fingerprint observation; excessive drift revokes
    /// the session instead
    pub fn refresh_observed(
        &self,
        session_id: &SessionId,
        observed: &FingerprintVector,
    ) -> Result<RefreshGrant> {
        self.refresh_with(session_id, Some(observed))
    }

    fn refresh_with(
        &self,
        session_id: &SessionId,
        observed: Option<&FingerprintVector>,
    ) -> Result<RefreshGrant> {
        let inner = &self.inner;
        let handle = self.handle(session_id)?;

        let result = {
            let mut session = handle.lock();
            let now_ms = inner.clock.now_ms();
            let was_terminal = session.state().is_terminal();
            inner.expire_if_due(&mut session, now_ms);
            let result = session.refresh(observed, now_ms, &inner.policy);
            inner.note_revocation(&session, was_terminal);
            result
        };

        match &result {
            Ok(grant) => {
                inner.stats.record_refreshed();
                info!(
                    target: "signal_runtime::refresh",
                    "session {} refreshed to generation {}",
                    session_id,
                    grant.generation
                );
            }
            Err(e) => warn!(
                target: "signal_runtime::refresh",
                "session {} refresh refused: {}",
                session_id,
                e
            ),
        }
        result
    }

    /// Revoke a session. Every validation that starts after this returns
    /// sees `SessionRevoked`.
    ///
    /// Returns `false` when the session was already terminal.
    pub fn revoke(&self, session_id: &SessionId, reason: RevocationReason) -> Result<bool> {
        let handle = self.handle(session_id)?;
        let revoked = {
            let mut session = handle.lock();
            let now_ms = self.inner.clock.now_ms();
            self.inner.expire_if_due(&mut session, now_ms);
            session.revoke(reason.clone(), now_ms)
        };
        if revoked {
            self.inner.stats.record_revoked();
            info!(
                target: "signal_runtime::revoke",
                "session {} revoked: {}",
                session_id,
                reason
            );
        }
        Ok(revoked)
    }

    /// Auditable snapshot of one session
    pub fn export(&self, session_id: &SessionId) -> Result<SessionRecord> {
        let handle = self.handle(session_id)?;
        let mut session = handle.lock();
        let now_ms = self.inner.clock.now_ms();
        self.inner.expire_if_due(&mut session, now_ms);
        Ok(session.record(now_ms, &self.inner.policy))
    }

    /// Snapshots of every registered session, tombstones included
    pub fn records(&self) -> Vec<SessionRecord> {
        let now_ms = self.inner.clock.now_ms();
        self.inner
            .registry
            .handles()
            .into_iter()
            .map(|handle| handle.lock().record(now_ms, &self.inner.policy))
            .collect()
    }

    /// State of a session, if registered
    pub fn state(&self, session_id: &SessionId) -> Option<SessionState> {
        self.inner
            .registry
            .get(session_id)
            .map(|handle| handle.lock().state())
    }

    /// Expire lapsed sessions and purge tombstones past retention
    pub fn sweep(&self) -> SweepReport {
        self.inner.sweep()
    }

    /// Run [`sweep`](Self::sweep) every `interval` on a background thread.
    ///
    /// The thread holds only a weak reference and exits once the last
    /// runtime clone is dropped.
    pub fn spawn_sweeper(&self, interval: Duration) -> Result<SweeperHandle> {
        let weak: Weak<RuntimeInner> = Arc::downgrade(&self.inner);
        SweeperHandle::spawn(interval, move || match weak.upgrade() {
            Some(inner) => {
                inner.sweep();
                true
            }
            None => false,
        })
    }

    /// Registered sessions, tombstones included
    pub fn session_count(&self) -> usize {
        self.inner.registry.len()
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.inner.stats.snapshot()
    }

    /// Rejections recorded for one reason
    pub fn rejections(&self, reason: RejectReason) -> u64 {
        self.inner.stats.rejections(reason)
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.inner.config
    }

    /// Algorithms the runtime negotiates and signs with
    pub fn crypto_config(&self) -> CryptoConfig {
        self.inner.suite.config()
    }

    /// Public key devices verify binding records against
    pub fn verify_key(&self) -> &[u8] {
        self.inner.suite.verify_key()
    }

    /// Current time on the runtime clock
    pub fn now_ms(&self) -> u64 {
        self.inner.clock.now_ms()
    }

    fn handle(&self, session_id: &SessionId) -> Result<SessionHandle> {
        self.inner
            .registry
            .get(session_id)
            .ok_or(Error::UnknownSession)
    }
}

impl std::fmt::Debug for SignalRuntime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignalRuntime")
            .field("suite", &self.inner.suite)
            .field("sessions", &self.inner.registry.len())
            .finish_non_exhaustive()
    }
}
