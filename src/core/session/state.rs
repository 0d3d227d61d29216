/*!
Session state management for the signal runtime.

This module defines session states and the state machine for session
progression: `Issued -> Active -> (Refreshing) -> Active | Revoked | Expired`.
*/

use std::fmt;

use crate::core::error::Result;
use crate::invalid_state_err;

/// Session lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde-support", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde-support", serde(rename_all = "lowercase"))]
pub enum SessionState {
    /// Fingerprint bound and key agreed, not yet serving
    Issued,
    /// Steady state; validations occur here
    Active,
    /// Transient, during key/window rollover
    Refreshing,
    /// Terminal
    Revoked,
    /// Terminal
    Expired,
}

impl SessionState {
    /// Whether no further transition is possible
    pub fn is_terminal(&self) -> bool {
        matches!(self, SessionState::Revoked | SessionState::Expired)
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionState::Issued => write!(f, "Issued"),
            SessionState::Active => write!(f, "Active"),
            SessionState::Refreshing => write!(f, "Refreshing"),
            SessionState::Revoked => write!(f, "Revoked"),
            SessionState::Expired => write!(f, "Expired"),
        }
    }
}

/// Why a session was revoked
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde-support", derive(serde::Serialize, serde::Deserialize))]
pub enum RevocationReason {
    /// Explicit administrative revoke
    Requested,
    /// User logged out
    Logout,
    /// Anomaly score crossed the threshold
    AnomalyThreshold,
    /// Too many replay rejections
    ReplayViolations,
    /// Device or key reported compromised
    Compromised,
    /// Free-form reason from the caller
    Other(String),
}

impl RevocationReason {
    /// Stable code for logs and exports
    pub fn as_str(&self) -> &str {
        match self {
            RevocationReason::Requested => "requested",
            RevocationReason::Logout => "logout",
            RevocationReason::AnomalyThreshold => "anomaly_threshold",
            RevocationReason::ReplayViolations => "replay_violations",
            RevocationReason::Compromised => "compromised",
            RevocationReason::Other(reason) => reason,
        }
    }
}

impl From<&str> for RevocationReason {
    fn from(code: &str) -> Self {
        match code {
            "requested" => RevocationReason::Requested,
            "logout" => RevocationReason::Logout,
            "anomaly_threshold" => RevocationReason::AnomalyThreshold,
            "replay_violations" => RevocationReason::ReplayViolations,
            "compromised" => RevocationReason::Compromised,
            other => RevocationReason::Other(other.to_string()),
        }
    }
}

impl fmt::Display for RevocationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Session state manager
///
/// Handles state transitions and validation of operations
/// based on the current session state.
#[derive(Debug, Clone, Copy)]
pub struct StateManager {
    state: SessionState,
}

impl StateManager {
    /// Create a new state manager in `Issued`
    pub fn new() -> Self {
        Self {
            state: SessionState::Issued,
        }
    }

    /// Get the current state
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Check if the session is in the given state
    pub fn is_state(&self, state: SessionState) -> bool {
        self.state == state
    }

    pub fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }

    /// Check if signals may be validated
    pub fn can_validate(&self) -> bool {
        self.state == SessionState::Active
    }

    /// Check if a refresh may start
    pub fn can_refresh(&self) -> bool {
        self.state == SessionState::Active
    }

    /// `Issued -> Active`
    pub fn transition_to_active(&mut self) -> Result<()> {
        match self.state {
            SessionState::Issued | SessionState::Refreshing => {
                self.state = SessionState::Active;
                Ok(())
            }
            other => invalid_state_err!("Issued or Refreshing", other),
        }
    }

    /// `Active -> Refreshing`
    pub fn transition_to_refreshing(&mut self) -> Result<()> {
        if !self.can_refresh() {
            return invalid_state_err!(SessionState::Active, self.state);
        }
        self.state = SessionState::Refreshing;
        Ok(())
    }

    /// Enter `Revoked`. Returns `false` if already terminal.
    pub fn transition_to_revoked(&mut self) -> bool {
        if self.is_terminal() {
            return false;
        }
        self.state = SessionState::Revoked;
        true
    }

    /// Enter `Expired`. Returns `false` if already terminal.
    pub fn transition_to_expired(&mut self) -> bool {
        if self.is_terminal() {
            return false;
        }
        self.state = SessionState::Expired;
        true
    }
}

impl Default for StateManager {
    fn default() -> Self {
        Self::new()
    }
}
