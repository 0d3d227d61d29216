/*!
Zero-on-drop containers for secret material.

Shared secrets and signal keys live only inside these wrappers. They are
wiped when dropped, never implement `Display`, and their `Debug` output is
redacted so a stray `{:?}` in a log line cannot leak them.
*/

use std::fmt;

use zeroize::Zeroize;

use crate::core::constants::sizes;
use crate::core::security::constant_time::constant_time_eq;

/// Variable-length secret buffer (KEM secret keys, raw shared secrets)
pub struct SecretBytes {
    inner: Vec<u8>,
}

impl SecretBytes {
    /// Take ownership of `bytes`
    pub fn new(bytes: Vec<u8>) -> Self {
        Self { inner: bytes }
    }

    /// Copy from a slice
    pub fn from_slice(bytes: &[u8]) -> Self {
        Self::new(bytes.to_vec())
    }

    /// Borrow the secret bytes
    pub fn expose(&self) -> &[u8] {
        &self.inner
    }

    /// Length in bytes
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Whether the buffer is empty
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl Drop for SecretBytes {
    fn drop(&mut self) {
        self.inner.zeroize();
    }
}

impl PartialEq for SecretBytes {
    fn eq(&self, other: &Self) -> bool {
        constant_time_eq(&self.inner, &other.inner)
    }
}

impl Eq for SecretBytes {}

impl fmt::Debug for SecretBytes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SecretBytes([REDACTED; {}])", self.inner.len())
    }
}

/// Fixed 32-byte secret (signal keys, epoch keys)
pub struct SecretKey32 {
    inner: [u8; sizes::SIGNAL_KEY_BYTES],
}

impl SecretKey32 {
    /// Wrap raw key bytes
    pub fn from_bytes(bytes: [u8; sizes::SIGNAL_KEY_BYTES]) -> Self {
        Self { inner: bytes }
    }

    /// Borrow the key bytes
    pub fn expose(&self) -> &[u8; sizes::SIGNAL_KEY_BYTES] {
        &self.inner
    }

    /// Wipe the key in place
    pub fn wipe(&mut self) {
        self.inner.zeroize();
    }
}

impl Drop for SecretKey32 {
    fn drop(&mut self) {
        self.inner.zeroize();
    }
}

impl Clone for SecretKey32 {
    fn clone(&self) -> Self {
        Self::from_bytes(self.inner)
    }
}

impl PartialEq for SecretKey32 {
    fn eq(&self, other: &Self) -> bool {
        constant_time_eq(&self.inner, &other.inner)
    }
}

impl Eq for SecretKey32 {}

impl fmt::Debug for SecretKey32 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SecretKey32([REDACTED])")
    }
}
