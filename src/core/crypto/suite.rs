/*!
The primitive pair a runtime is built around.

A `CryptoSuite` owns one key agreement implementation and one signing
identity. The signing identity authenticates binding records at issuance;
devices verify against its public key.
*/

use std::fmt;

use crate::core::crypto::algorithms::{create_key_agreement, create_signer};
use crate::core::crypto::config::CryptoConfig;
use crate::core::crypto::traits::{KeyAgreement, Negotiated, Signer};
use crate::core::error::Result;

/// Key agreement + signature capability, selected at construction
pub struct CryptoSuite {
    key_agreement: Box<dyn KeyAgreement>,
    signer: Box<dyn Signer>,
}

impl CryptoSuite {
    /// Build the suite named by `config`, generating a fresh signing identity
    pub fn from_config(config: &CryptoConfig) -> Self {
        Self::new(
            create_key_agreement(config.key_agreement),
            create_signer(config.signature),
        )
    }

    /// Assemble a suite from explicit implementations
    pub fn new(key_agreement: Box<dyn KeyAgreement>, signer: Box<dyn Signer>) -> Self {
        Self {
            key_agreement,
            signer,
        }
    }

    /// The configured key agreement
    pub fn key_agreement(&self) -> &dyn KeyAgreement {
        self.key_agreement.as_ref()
    }

    /// The configured signer
    pub fn signer(&self) -> &dyn Signer {
        self.signer.as_ref()
    }

    /// Algorithms in use
    pub fn config(&self) -> CryptoConfig {
        CryptoConfig::with_algorithms(self.key_agreement.algorithm(), self.signer.algorithm())
    }

    /// One-shot key agreement against a client public key
    pub fn negotiate(&self, client_public_key: &[u8]) -> Result<Negotiated> {
        self.key_agreement.negotiate(client_public_key)
    }

    /// Sign a payload with the runtime identity
    pub fn sign(&self, payload: &[u8]) -> Result<Vec<u8>> {
        self.signer.sign(payload)
    }

    /// Verify a payload against the runtime identity
    pub fn verify(&self, payload: &[u8], signature: &[u8]) -> bool {
        self.signer
            .verify(payload, signature, self.signer.public_key())
    }

    /// Public half of the runtime signing identity
    pub fn verify_key(&self) -> &[u8] {
        self.signer.public_key()
    }
}

impl Default for CryptoSuite {
    fn default() -> Self {
        Self::from_config(&CryptoConfig::default())
    }
}

impl fmt::Debug for CryptoSuite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CryptoSuite")
            .field("key_agreement", &self.key_agreement.algorithm())
            .field("signature", &self.signer.algorithm())
            .finish()
    }
}
