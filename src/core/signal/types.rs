/*!
Signal data types.
*/

use std::fmt;

use crate::core::constants::sizes;
use crate::core::memory::SecretKey32;
use crate::core::security::constant_time::constant_time_eq_arrays;

/// Opaque, random session identifier
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde-support", derive(serde::Serialize, serde::Deserialize))]
pub struct SessionId([u8; sizes::SESSION_ID_BYTES]);

impl SessionId {
    /// Fresh random identifier
    pub fn generate() -> Self {
        Self(rand::random())
    }

    pub fn from_bytes(bytes: [u8; sizes::SESSION_ID_BYTES]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; sizes::SESSION_ID_BYTES] {
        &self.0
    }

    /// Parse the hex form produced by `Display`
    pub fn from_hex(s: &str) -> Option<Self> {
        let mut bytes = [0u8; sizes::SESSION_ID_BYTES];
        hex::decode_to_slice(s.trim(), &mut bytes).ok()?;
        Some(Self(bytes))
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl fmt::Debug for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SessionId({})", self)
    }
}

/// Rotating keyed digest presented in place of a bearer token
#[derive(Clone, Copy, Hash)]
pub struct SignalDigest([u8; sizes::DIGEST_BYTES]);

impl SignalDigest {
    pub fn from_bytes(bytes: [u8; sizes::DIGEST_BYTES]) -> Self {
        Self(bytes)
    }

    /// Exact-length slice conversion
    pub fn from_slice(bytes: &[u8]) -> Option<Self> {
        bytes.try_into().ok().map(Self)
    }

    /// Decode from hex
    pub fn from_hex(s: &str) -> Option<Self> {
        let mut bytes = [0u8; sizes::DIGEST_BYTES];
        hex::decode_to_slice(s.trim(), &mut bytes).ok()?;
        Some(Self(bytes))
    }

    pub fn as_bytes(&self) -> &[u8; sizes::DIGEST_BYTES] {
        &self.0
    }

    /// Hex encoding for transport
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Constant-time comparison
    pub fn ct_eq(&self, other: &SignalDigest) -> bool {
        constant_time_eq_arrays(&self.0, &other.0)
    }
}

impl PartialEq for SignalDigest {
    fn eq(&self, other: &Self) -> bool {
        self.ct_eq(other)
    }
}

impl Eq for SignalDigest {}

impl fmt::Debug for SignalDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SignalDigest(..)")
    }
}

/// A signal as presented by a device
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Signal {
    /// Session-relative epoch index
    pub epoch: u64,
    /// Sequence number, monotonic over the session
    pub sequence: u64,
    /// Keyed digest over (key, epoch, sequence, fingerprint binding)
    pub digest: SignalDigest,
    /// Device clock at generation, Unix milliseconds
    pub issued_at_ms: u64,
}

/// Per-session symmetric key the digests are derived from
#[derive(Clone, PartialEq, Eq)]
pub struct SignalKey(SecretKey32);

impl SignalKey {
    pub fn from_bytes(bytes: [u8; sizes::SIGNAL_KEY_BYTES]) -> Self {
        Self(SecretKey32::from_bytes(bytes))
    }

    pub(crate) fn expose(&self) -> &[u8; sizes::SIGNAL_KEY_BYTES] {
        self.0.expose()
    }

    /// Zero the key in place
    pub fn wipe(&mut self) {
        self.0.wipe();
    }
}

impl fmt::Debug for SignalKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SignalKey([REDACTED])")
    }
}
