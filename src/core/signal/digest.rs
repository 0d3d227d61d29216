/*!
Time-variant digest engine.

Key schedule:

- signal key = HKDF-SHA256(ikm = shared secret, salt = session id)
- epoch key = BLAKE3-keyed(signal key, label || epoch)
- digest = BLAKE3-keyed(epoch key, label || sequence || fingerprint binding)

Refresh ratchets the signal key forward with
`BLAKE3-keyed(key, label || generation)`; the old key is dropped and wiped.

Validation recomputes the digest and compares; nothing about issued
signals is stored server side.
*/

use hkdf::Hkdf;
use sha2::Sha256;

use super::types::{SessionId, SignalDigest, SignalKey};
use crate::core::constants::{labels, sizes};
use crate::core::error::{CryptoError, Result};
use crate::core::fingerprint::FingerprintBinding;
use crate::core::memory::{SecretBytes, SecretKey32};

/// Derive the session signal key from the negotiated shared secret
pub fn derive_signal_key(shared_secret: &SecretBytes, session_id: &SessionId) -> Result<SignalKey> {
    if shared_secret.is_empty() {
        return Err(CryptoError::KeyDerivationFailed.into());
    }

    let hkdf = Hkdf::<Sha256>::new(Some(session_id.as_bytes()), shared_secret.expose());
    let mut okm = [0u8; sizes::SIGNAL_KEY_BYTES];
    hkdf.expand(labels::HKDF_INFO_SIGNAL_KEY, &mut okm)
        .map_err(|_| CryptoError::KeyDerivationFailed)?;

    let key = SignalKey::from_bytes(okm);
    zeroize::Zeroize::zeroize(&mut okm);
    Ok(key)
}

/// Roll `key` forward to `generation`
pub fn ratchet(key: &SignalKey, generation: u32) -> SignalKey {
    let mut hasher = blake3::Hasher::new_keyed(key.expose());
    hasher.update(labels::KEY_RATCHET);
    hasher.update(&generation.to_be_bytes());
    SignalKey::from_bytes(*hasher.finalize().as_bytes())
}

fn epoch_key(key: &SignalKey, epoch: u64) -> SecretKey32 {
    let mut hasher = blake3::Hasher::new_keyed(key.expose());
    hasher.update(labels::EPOCH_KEY);
    hasher.update(&epoch.to_be_bytes());
    SecretKey32::from_bytes(*hasher.finalize().as_bytes())
}

/// Digest for `(epoch, sequence)` under `key`, bound to `binding`
pub fn derive(
    key: &SignalKey,
    epoch: u64,
    sequence: u64,
    binding: &FingerprintBinding,
) -> SignalDigest {
    let epoch_key = epoch_key(key, epoch);
    let mut hasher = blake3::Hasher::new_keyed(epoch_key.expose());
    hasher.update(labels::SIGNAL_DIGEST);
    hasher.update(&sequence.to_be_bytes());
    hasher.update(binding.as_bytes());
    SignalDigest::from_bytes(*hasher.finalize().as_bytes())
}

/// Recompute and compare in constant time
pub fn verify(
    key: &SignalKey,
    epoch: u64,
    sequence: u64,
    binding: &FingerprintBinding,
    presented: &SignalDigest,
) -> bool {
    derive(key, epoch, sequence, binding).ct_eq(presented)
}
