/*!
Per-session signal state.

`SignalSession` owns everything about one session: the signal key, the
bound fingerprint, the validity window, the replay ledger and the anomaly
score. It is not synchronized; the registry wraps each one in its own lock
so a session's check-then-commit sequence is atomic with respect to other
calls for the same session.
*/

use log::{debug, warn};

use super::grant::RefreshGrant;
use super::record::SessionRecord;
use super::state::{RevocationReason, SessionState, StateManager};
use super::verdict::{Acceptance, Verdict};
use super::window::{EpochClock, ValidityWindow};
use crate::core::config::RuntimeConfig;
use crate::core::error::{Error, RejectReason, Result};
use crate::core::fingerprint::{FingerprintBinding, FingerprintVector, TrustLevel};
use crate::core::memory::SecretBytes;
use crate::core::security::anomaly::{AnomalyDetector, AnomalyEvent, AnomalyScore};
use crate::core::security::replay::{Admission, ReplayLedger};
use crate::core::signal::digest;
use crate::core::signal::{SessionId, Signal, SignalKey};

/// The knobs a session needs from the runtime configuration
#[derive(Debug, Clone)]
pub struct SessionPolicy {
    pub window_ms: u64,
    pub epoch_skew_tolerance: u64,
    pub replay_tolerance_count: u32,
    pub max_replay_violations: u32,
    pub session_lifetime_ms: u64,
    pub detector: AnomalyDetector,
}

impl SessionPolicy {
    pub fn from_config(config: &RuntimeConfig) -> Self {
        Self {
            window_ms: config.window_size_ms(),
            epoch_skew_tolerance: config.epoch_skew_tolerance,
            replay_tolerance_count: config.replay_tolerance_count,
            max_replay_violations: config.max_replay_violations,
            session_lifetime_ms: config.session_lifetime_ms(),
            detector: AnomalyDetector::new(config.anomaly),
        }
    }
}

/// Inputs to [`SignalSession::establish`]
pub struct Establishment<'a> {
    pub session_id: SessionId,
    pub principal: String,
    pub client_public_key: Vec<u8>,
    pub shared_secret: &'a SecretBytes,
    pub fingerprint: FingerprintVector,
    pub trust: TrustLevel,
    pub now_ms: u64,
}

/// Server-side state of one session
pub struct SignalSession {
    id: SessionId,
    principal: String,
    client_public_key: Vec<u8>,
    key: SignalKey,
    generation: u32,
    fingerprint: FingerprintVector,
    binding: FingerprintBinding,
    trust: TrustLevel,
    issued_at_ms: u64,
    epochs: EpochClock,
    window: ValidityWindow,
    state: StateManager,
    ledger: ReplayLedger,
    anomaly: AnomalyScore,
    burst: (u64, u32),
    last_arrival_ms: Option<u64>,
    accepted: u64,
    revocation: Option<RevocationReason>,
    terminated_at_ms: Option<u64>,
}

impl SignalSession {
    /// Derive the signal key, bind the fingerprint and enter `Active`
    pub fn establish(params: Establishment<'_>, policy: &SessionPolicy) -> Result<Self> {
        let key = digest::derive_signal_key(params.shared_secret, &params.session_id)?;
        let binding = params.fingerprint.binding();

        let mut session = Self {
            id: params.session_id,
            principal: params.principal,
            client_public_key: params.client_public_key,
            key,
            generation: 0,
            fingerprint: params.fingerprint,
            binding,
            trust: params.trust,
            issued_at_ms: params.now_ms,
            epochs: EpochClock::new(params.now_ms, policy.window_ms),
            window: ValidityWindow::starting_at(params.now_ms, policy.session_lifetime_ms),
            state: StateManager::new(),
            ledger: ReplayLedger::new(policy.replay_tolerance_count),
            anomaly: AnomalyScore::new(params.now_ms),
            burst: (0, 0),
            last_arrival_ms: None,
            accepted: 0,
            revocation: None,
            terminated_at_ms: None,
        };
        session.state.transition_to_active()?;
        Ok(session)
    }

    pub fn id(&self) -> &SessionId {
        &self.id
    }

    pub fn principal(&self) -> &str {
        &self.principal
    }

    pub fn client_public_key(&self) -> &[u8] {
        &self.client_public_key
    }

    pub fn state(&self) -> SessionState {
        self.state.state()
    }

    pub fn trust(&self) -> TrustLevel {
        self.trust
    }

    pub fn window(&self) -> ValidityWindow {
        self.window
    }

    pub fn epoch_clock(&self) -> EpochClock {
        self.epochs
    }

    pub fn generation(&self) -> u32 {
        self.generation
    }

    pub fn fingerprint_binding(&self) -> &FingerprintBinding {
        &self.binding
    }

    pub fn revocation_reason(&self) -> Option<&RevocationReason> {
        self.revocation.as_ref()
    }

    /// Anomaly score decayed to `now_ms`
    pub fn anomaly_score(&self, now_ms: u64, policy: &SessionPolicy) -> f64 {
        policy.detector.current(&self.anomaly, now_ms)
    }

    /// Transition to `Expired` if the window has run out. Returns `true` on transition.
    pub fn check_expiry(&mut self, now_ms: u64) -> bool {
        if self.state.is_terminal() || !self.window.is_exhausted(now_ms) {
            return false;
        }
        self.terminate(None, self.window.not_after_ms)
    }

    /// The rejection every call gets once the session is terminal
    fn terminal_rejection(&mut self, now_ms: u64) -> Option<RejectReason> {
        self.check_expiry(now_ms);
        match self.state.state() {
            SessionState::Revoked => Some(RejectReason::SessionRevoked),
            SessionState::Expired => Some(RejectReason::SessionExpired),
            _ => None,
        }
    }

    /// Check a presented signal and update the session.
    ///
    /// Order: terminal state and expiry, epoch skew, digest, replay ledger,
    /// then anomaly events for the accepted signal. `observed` is a fresh
    /// fingerprint observation for drift scoring, if the caller has one.
    pub fn validate(
        &mut self,
        signal: &Signal,
        observed: Option<&FingerprintVector>,
        now_ms: u64,
        policy: &SessionPolicy,
    ) -> Verdict {
        if let Some(reason) = self.terminal_rejection(now_ms) {
            return Verdict::Reject(reason);
        }
        if !self.state.can_validate() {
            return Verdict::Reject(RejectReason::MalformedSignal);
        }

        let current = self.epochs.epoch_at(now_ms);
        if !EpochClock::within_skew(signal.epoch, current, policy.epoch_skew_tolerance) {
            return self.reject_scored(
                AnomalyEvent::EpochOutOfRange,
                RejectReason::EpochOutOfRange,
                now_ms,
                policy,
            );
        }

        if !digest::verify(&self.key, signal.epoch, signal.sequence, &self.binding, &signal.digest) {
            return self.reject_scored(
                AnomalyEvent::DigestMismatch,
                RejectReason::SignatureMismatch,
                now_ms,
                policy,
            );
        }

        let mut events = Vec::with_capacity(4);
        match self.ledger.admit(signal.epoch, signal.sequence) {
            Admission::Rejected => {
                let verdict = self.reject_scored(
                    AnomalyEvent::ReplayRejected,
                    RejectReason::ReplayRejected,
                    now_ms,
                    policy,
                );
                if !self.state.is_terminal()
                    && self.ledger.violations() >= policy.max_replay_violations
                {
                    self.revoke(RevocationReason::ReplayViolations, now_ms);
                }
                return verdict;
            }
            Admission::Advanced { gap } => events.push(AnomalyEvent::SequenceGap { gap }),
            Admission::Reordered => {}
        }

        self.burst = if self.burst.0 == signal.epoch {
            (signal.epoch, self.burst.1.saturating_add(1))
        } else {
            (signal.epoch, 1)
        };
        events.push(AnomalyEvent::BurstRate { count: self.burst.1 });
        events.push(AnomalyEvent::TimingOutlier {
            skew_ms: signal.issued_at_ms.abs_diff(now_ms),
        });
        if let Some(last) = self.last_arrival_ms {
            events.push(AnomalyEvent::ArrivalCadence {
                interval_ms: now_ms.saturating_sub(last),
                expected_ms: policy.window_ms,
            });
        }
        if let Some(observed) = observed {
            events.push(AnomalyEvent::FingerprintDrift(self.fingerprint.drift(observed)));
        }

        for event in events {
            if policy.detector.is_significant(&event) {
                let value = policy.detector.score(&mut self.anomaly, event, now_ms);
                debug!(
                    target: "signal_runtime::anomaly",
                    "session {} {} -> score {:.3}",
                    self.id,
                    event.name(),
                    value
                );
            }
        }

        let score = policy.detector.current(&self.anomaly, now_ms);
        if policy.detector.is_breached(score, self.trust) {
            self.revoke(RevocationReason::AnomalyThreshold, now_ms);
            return Verdict::Reject(RejectReason::AnomalyThresholdBreached);
        }

        self.accepted += 1;
        self.last_arrival_ms = Some(self.last_arrival_ms.map_or(now_ms, |last| last.max(now_ms)));
        Verdict::Accept(Acceptance {
            epoch: signal.epoch,
            sequence: signal.sequence,
            anomaly_score: score,
        })
    }

    fn reject_scored(
        &mut self,
        event: AnomalyEvent,
        reason: RejectReason,
        now_ms: u64,
        policy: &SessionPolicy,
    ) -> Verdict {
        let score = policy.detector.score(&mut self.anomaly, event, now_ms);
        if policy.detector.is_breached(score, self.trust) {
            self.revoke(RevocationReason::AnomalyThreshold, now_ms);
            return Verdict::Reject(RejectReason::AnomalyThresholdBreached);
        }
        Verdict::Reject(reason)
    }

    /// Extend the session with a fresh window and ratchet the signal key.
    ///
    /// A plain refresh leaves the anomaly score untouched. With `observed`,
    /// drift from the bound fingerprint is scored first and may revoke the
    /// session instead.
    pub fn refresh(
        &mut self,
        observed: Option<&FingerprintVector>,
        now_ms: u64,
        policy: &SessionPolicy,
    ) -> Result<RefreshGrant> {
        self.check_expiry(now_ms);
        match self.state.state() {
            SessionState::Revoked => return Err(Error::SessionRevoked),
            SessionState::Expired => return Err(Error::SessionExpired),
            _ => {}
        }

        if let Some(observed) = observed {
            let drift = self.fingerprint.drift(observed);
            let score =
                policy
                    .detector
                    .score(&mut self.anomaly, AnomalyEvent::FingerprintDrift(drift), now_ms);
            if policy.detector.is_breached(score, self.trust) {
                warn!(
                    target: "signal_runtime::refresh",
                    "session {} fingerprint drift {:.3} breached threshold on refresh",
                    self.id,
                    drift.value()
                );
                self.revoke(RevocationReason::AnomalyThreshold, now_ms);
                return Err(Error::SessionRevoked);
            }
        }

        self.state.transition_to_refreshing()?;
        self.generation = self.generation.saturating_add(1);
        self.key = digest::ratchet(&self.key, self.generation);
        let epoch_start = self.epochs.epoch_start(self.epochs.epoch_at(now_ms));
        self.window = ValidityWindow::starting_at(epoch_start, policy.session_lifetime_ms);
        self.state.transition_to_active()?;

        Ok(RefreshGrant {
            session_id: self.id,
            generation: self.generation,
            window: self.window,
        })
    }

    /// Enter `Revoked` and wipe the key. Returns `false` if already terminal.
    pub fn revoke(&mut self, reason: RevocationReason, now_ms: u64) -> bool {
        self.terminate(Some(reason), now_ms)
    }

    fn terminate(&mut self, reason: Option<RevocationReason>, at_ms: u64) -> bool {
        let transitioned = match reason {
            Some(_) => self.state.transition_to_revoked(),
            None => self.state.transition_to_expired(),
        };
        if transitioned {
            self.key.wipe();
            self.revocation = reason;
            self.terminated_at_ms = Some(at_ms);
        }
        transitioned
    }

    /// When the session became terminal
    pub fn terminated_at_ms(&self) -> Option<u64> {
        self.terminated_at_ms
    }

    /// Whether a terminal session has been kept for at least `retention_ms`
    pub fn is_purgeable(&self, now_ms: u64, retention_ms: u64) -> bool {
        self.terminated_at_ms
            .is_some_and(|at| now_ms >= at.saturating_add(retention_ms))
    }

    /// Snapshot for audit/persistence
    pub fn record(&self, now_ms: u64, policy: &SessionPolicy) -> SessionRecord {
        SessionRecord {
            session_id: self.id,
            principal: self.principal.clone(),
            issued_at_ms: self.issued_at_ms,
            state: self.state.state(),
            trust: self.trust,
            current_epoch: self.epochs.epoch_at(now_ms),
            last_accepted: self.ledger.high_watermark(),
            anomaly_score: self.anomaly_score(now_ms, policy),
            window: self.window,
            generation: self.generation,
            accepted_signals: self.accepted,
            replay_violations: self.ledger.violations(),
            revocation_reason: self.revocation.as_ref().map(|r| r.as_str().to_string()),
            exported_at_ms: now_ms,
        }
    }

    /// Expected digest, for tests in this crate
    #[cfg(test)]
    pub(crate) fn expected_signal(&self, epoch: u64, sequence: u64, issued_at_ms: u64) -> Signal {
        Signal {
            epoch,
            sequence,
            digest: digest::derive(&self.key, epoch, sequence, &self.binding),
            issued_at_ms,
        }
    }
}

impl std::fmt::Debug for SignalSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignalSession")
            .field("id", &self.id)
            .field("principal", &self.principal)
            .field("state", &self.state.state())
            .field("trust", &self.trust)
            .field("generation", &self.generation)
            .field("window", &self.window)
            .finish_non_exhaustive()
    }
}
