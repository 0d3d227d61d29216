/*!
Device-side counterpart.

A device generates a key agreement key pair, sends the public half with its
fingerprint to whoever calls [`SignalRuntime::issue`](crate::SignalRuntime::issue),
and turns the returned grant into a [`DeviceSession`] that produces signals.
Establishment checks the binding signature and that the grant was issued
for this device's key and fingerprint before anything is derived.
*/

use log::debug;

use crate::core::crypto::algorithms::{create_key_agreement, verify_detached};
use crate::core::crypto::types::KeyAgreementAlgorithm;
use crate::core::error::{AuthError, Error, Result};
use crate::core::fingerprint::{FingerprintBinding, FingerprintVector};
use crate::core::memory::SecretBytes;
use crate::core::security::constant_time::{constant_time_eq, constant_time_eq_arrays};
use crate::core::session::{EpochClock, RefreshGrant, SessionGrant, ValidityWindow, hash_public_key};
use crate::core::signal::digest;
use crate::core::signal::{SessionId, Signal, SignalKey};

/// Key agreement key pair held by a device
pub struct DeviceKeys {
    algorithm: KeyAgreementAlgorithm,
    public_key: Vec<u8>,
    secret_key: SecretBytes,
}

impl DeviceKeys {
    /// Generate a fresh key pair
    pub fn generate(algorithm: KeyAgreementAlgorithm) -> Result<Self> {
        let (public_key, secret_key) = create_key_agreement(algorithm).generate_keypair()?;
        Ok(Self {
            algorithm,
            public_key,
            secret_key,
        })
    }

    pub fn algorithm(&self) -> KeyAgreementAlgorithm {
        self.algorithm
    }

    /// Public half to send with the issuance request
    pub fn public_key(&self) -> &[u8] {
        &self.public_key
    }
}

impl std::fmt::Debug for DeviceKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceKeys")
            .field("algorithm", &self.algorithm)
            .finish_non_exhaustive()
    }
}

/// Signal generator for one session
pub struct DeviceSession {
    session_id: SessionId,
    key: SignalKey,
    binding: FingerprintBinding,
    epochs: EpochClock,
    window: ValidityWindow,
    generation: u32,
    next_sequence: u64,
}

impl DeviceSession {
    /// Verify `grant` and derive the signal key.
    ///
    /// The binding signature is checked against the key carried in the grant;
    /// use [`establish_pinned`](Self::establish_pinned) when the runtime's
    /// verify key is known in advance.
    pub fn establish(
        keys: &DeviceKeys,
        grant: &SessionGrant,
        fingerprint: &FingerprintVector,
    ) -> Result<Self> {
        let record = &grant.binding;
        if !verify_detached(
            record.signature,
            &record.to_bytes(),
            &grant.binding_signature,
            &grant.server_verify_key,
        ) {
            return Err(AuthError::SignatureVerificationFailed.into());
        }
        if record.session_id != grant.session_id {
            return Err(AuthError::SessionMismatch.into());
        }
        if !fingerprint.binding().ct_eq(&record.fingerprint) {
            return Err(AuthError::BindingMismatch.into());
        }
        if !constant_time_eq_arrays(&hash_public_key(&keys.public_key), &record.client_key_hash) {
            return Err(AuthError::BindingMismatch.into());
        }
        if record.key_agreement != keys.algorithm {
            return Err(Error::UnsupportedAlgorithm(format!(
                "grant negotiated {}, device holds {}",
                record.key_agreement, keys.algorithm
            )));
        }

        let shared_secret =
            create_key_agreement(keys.algorithm).decapsulate(&grant.kem_ciphertext, &keys.secret_key)?;
        let key = digest::derive_signal_key(&shared_secret, &grant.session_id)?;
        debug!(target: "signal_runtime::device", "established session {}", grant.session_id);

        Ok(Self {
            session_id: grant.session_id,
            key,
            binding: record.fingerprint,
            epochs: EpochClock::new(grant.epoch_origin_ms(), grant.window_size_ms()),
            window: record.window,
            generation: 0,
            next_sequence: 0,
        })
    }

    /// Like [`establish`](Self::establish), but the grant must carry `verify_key`
    pub fn establish_pinned(
        keys: &DeviceKeys,
        grant: &SessionGrant,
        fingerprint: &FingerprintVector,
        verify_key: &[u8],
    ) -> Result<Self> {
        if !constant_time_eq(&grant.server_verify_key, verify_key) {
            return Err(AuthError::SignatureVerificationFailed.into());
        }
        Self::establish(keys, grant, fingerprint)
    }

    pub fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    pub fn generation(&self) -> u32 {
        self.generation
    }

    pub fn window(&self) -> ValidityWindow {
        self.window
    }

    /// Epoch the runtime will consider current at `now_ms`
    pub fn epoch_at(&self, now_ms: u64) -> u64 {
        self.epochs.epoch_at(now_ms)
    }

    /// Signal for an explicit `(epoch, sequence)`; does not advance the counter
    pub fn signal_at(&self, epoch: u64, sequence: u64, issued_at_ms: u64) -> Signal {
        Signal {
            epoch,
            sequence,
            digest: digest::derive(&self.key, epoch, sequence, &self.binding),
            issued_at_ms,
        }
    }

    /// Signal for the current epoch with the next sequence number
    pub fn next_signal(&mut self, now_ms: u64) -> Signal {
        let sequence = self.next_sequence;
        self.next_sequence = self.next_sequence.saturating_add(1);
        self.signal_at(self.epoch_at(now_ms), sequence, now_ms)
    }

    /// Ratchet to the generation in `grant` and adopt its window
    pub fn apply_refresh(&mut self, grant: &RefreshGrant) -> Result<()> {
        if grant.session_id != self.session_id {
            return Err(AuthError::SessionMismatch.into());
        }
        if grant.generation <= self.generation {
            return crate::invalid_state_err!(
                format!("generation above {}", self.generation),
                grant.generation
            );
        }
        for generation in self.generation + 1..=grant.generation {
            self.key = digest::ratchet(&self.key, generation);
        }
        self.generation = grant.generation;
        self.window = grant.window;
        Ok(())
    }
}

impl std::fmt::Debug for DeviceSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceSession")
            .field("session_id", &self.session_id)
            .field("generation", &self.generation)
            .field("next_sequence", &self.next_sequence)
            .finish_non_exhaustive()
    }
}
