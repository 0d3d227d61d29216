/*!
Session export for persistence and audit.

A record carries no secret material and no fingerprint data, raw or hashed.
*/

use super::state::SessionState;
use super::window::ValidityWindow;
use crate::core::fingerprint::TrustLevel;
use crate::core::signal::SessionId;

/// Auditable snapshot of one session
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde-support", derive(serde::Serialize, serde::Deserialize))]
pub struct SessionRecord {
    pub session_id: SessionId,
    pub principal: String,
    pub issued_at_ms: u64,
    pub state: SessionState,
    pub trust: TrustLevel,
    /// Epoch at the time of export
    pub current_epoch: u64,
    /// Highest accepted (epoch, sequence), if any
    pub last_accepted: Option<(u64, u64)>,
    /// Decayed to the time of export
    pub anomaly_score: f64,
    pub window: ValidityWindow,
    pub generation: u32,
    pub accepted_signals: u64,
    pub replay_violations: u32,
    pub revocation_reason: Option<String>,
    pub exported_at_ms: u64,
}

impl SessionRecord {
    /// Sequence of the last accepted signal
    pub fn last_sequence(&self) -> Option<u64> {
        self.last_accepted.map(|(_, sequence)| sequence)
    }
}
