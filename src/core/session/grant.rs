/*!
What the runtime hands back to a device.
*/

use super::binding::BindingRecord;
use super::window::ValidityWindow;
use crate::core::fingerprint::TrustLevel;
use crate::core::signal::SessionId;

/// Result of `issue`
#[derive(Debug, Clone)]
pub struct SessionGrant {
    pub session_id: SessionId,
    /// KEM ciphertext the device decapsulates to recover the shared secret
    pub kem_ciphertext: Vec<u8>,
    /// Signed binding record
    pub binding: BindingRecord,
    pub binding_signature: Vec<u8>,
    /// Public key of the runtime signing identity
    pub server_verify_key: Vec<u8>,
}

impl SessionGrant {
    pub fn principal(&self) -> &str {
        &self.binding.principal
    }

    pub fn window(&self) -> ValidityWindow {
        self.binding.window
    }

    pub fn trust(&self) -> TrustLevel {
        self.binding.trust
    }

    /// Start of epoch 0
    pub fn epoch_origin_ms(&self) -> u64 {
        self.binding.issued_at_ms
    }

    pub fn window_size_ms(&self) -> u64 {
        self.binding.window_size_ms
    }
}

/// Result of `refresh`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshGrant {
    pub session_id: SessionId,
    /// Key generation the device must ratchet to
    pub generation: u32,
    /// The new current window
    pub window: ValidityWindow,
}
