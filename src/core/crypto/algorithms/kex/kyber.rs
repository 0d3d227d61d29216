/*!
CRYSTALS-Kyber key agreement implementation.

This module provides an implementation of the Kyber KEM with support for
all three parameter sets.
*/

use pqcrypto_kyber::{kyber512, kyber768, kyber1024};
use pqcrypto_traits::kem::{Ciphertext as _, PublicKey as _, SecretKey as _, SharedSecret as _};

use crate::core::crypto::traits::kex::{KeyAgreement, Negotiated};
use crate::core::crypto::types::KeyAgreementAlgorithm;
use crate::core::error::{KeyExchangeError, Result};
use crate::core::memory::SecretBytes;
use crate::key_exchange_err;

/// Kyber key agreement implementation
#[derive(Debug, Clone, Copy)]
pub struct KyberKeyAgreement {
    algorithm: KeyAgreementAlgorithm,
}

impl KyberKeyAgreement {
    /// Create a new KyberKeyAgreement with the specified parameter set
    pub fn new(algorithm: KeyAgreementAlgorithm) -> Self {
        Self { algorithm }
    }
}

impl KeyAgreement for KyberKeyAgreement {
    fn algorithm(&self) -> KeyAgreementAlgorithm {
        self.algorithm
    }

    /// Generate a new Kyber key pair
    fn generate_keypair(&self) -> Result<(Vec<u8>, SecretBytes)> {
        let (pk, sk) = match self.algorithm {
            KeyAgreementAlgorithm::Kyber512 => {
                let (pk, sk) = kyber512::keypair();
                (pk.as_bytes().to_vec(), SecretBytes::from_slice(sk.as_bytes()))
            }
            KeyAgreementAlgorithm::Kyber768 => {
                let (pk, sk) = kyber768::keypair();
                (pk.as_bytes().to_vec(), SecretBytes::from_slice(sk.as_bytes()))
            }
            KeyAgreementAlgorithm::Kyber1024 => {
                let (pk, sk) = kyber1024::keypair();
                (pk.as_bytes().to_vec(), SecretBytes::from_slice(sk.as_bytes()))
            }
        };
        Ok((pk, sk))
    }

    /// Encapsulate a fresh shared secret to the client's public key
    fn negotiate(&self, client_public_key: &[u8]) -> Result<Negotiated> {
        if client_public_key.len() != self.public_key_size() {
            return key_exchange_err!(KeyExchangeError::InvalidPublicKey);
        }

        let (shared_secret, ciphertext) = match self.algorithm {
            KeyAgreementAlgorithm::Kyber512 => {
                let pk = kyber512::PublicKey::from_bytes(client_public_key)
                    .map_err(|_| KeyExchangeError::InvalidPublicKey)?;
                let (ss, ct) = kyber512::encapsulate(&pk);
                (SecretBytes::from_slice(ss.as_bytes()), ct.as_bytes().to_vec())
            }
            KeyAgreementAlgorithm::Kyber768 => {
                let pk = kyber768::PublicKey::from_bytes(client_public_key)
                    .map_err(|_| KeyExchangeError::InvalidPublicKey)?;
                let (ss, ct) = kyber768::encapsulate(&pk);
                (SecretBytes::from_slice(ss.as_bytes()), ct.as_bytes().to_vec())
            }
            KeyAgreementAlgorithm::Kyber1024 => {
                let pk = kyber1024::PublicKey::from_bytes(client_public_key)
                    .map_err(|_| KeyExchangeError::InvalidPublicKey)?;
                let (ss, ct) = kyber1024::encapsulate(&pk);
                (SecretBytes::from_slice(ss.as_bytes()), ct.as_bytes().to_vec())
            }
        };

        if shared_secret.is_empty() {
            return key_exchange_err!(KeyExchangeError::EncapsulationFailed);
        }

        Ok(Negotiated {
            shared_secret,
            ciphertext,
        })
    }

    /// Decapsulate a shared secret from a ciphertext (client side)
    fn decapsulate(&self, ciphertext: &[u8], secret_key: &SecretBytes) -> Result<SecretBytes> {
        let secret = match self.algorithm {
            KeyAgreementAlgorithm::Kyber512 => {
                let ct = kyber512::Ciphertext::from_bytes(ciphertext)
                    .map_err(|_| KeyExchangeError::InvalidCiphertext)?;
                let sk = kyber512::SecretKey::from_bytes(secret_key.expose())
                    .map_err(|_| KeyExchangeError::InvalidSecretKey)?;
                SecretBytes::from_slice(kyber512::decapsulate(&ct, &sk).as_bytes())
            }
            KeyAgreementAlgorithm::Kyber768 => {
                let ct = kyber768::Ciphertext::from_bytes(ciphertext)
                    .map_err(|_| KeyExchangeError::InvalidCiphertext)?;
                let sk = kyber768::SecretKey::from_bytes(secret_key.expose())
                    .map_err(|_| KeyExchangeError::InvalidSecretKey)?;
                SecretBytes::from_slice(kyber768::decapsulate(&ct, &sk).as_bytes())
            }
            KeyAgreementAlgorithm::Kyber1024 => {
                let ct = kyber1024::Ciphertext::from_bytes(ciphertext)
                    .map_err(|_| KeyExchangeError::InvalidCiphertext)?;
                let sk = kyber1024::SecretKey::from_bytes(secret_key.expose())
                    .map_err(|_| KeyExchangeError::InvalidSecretKey)?;
                SecretBytes::from_slice(kyber1024::decapsulate(&ct, &sk).as_bytes())
            }
        };

        if secret.is_empty() {
            return key_exchange_err!(KeyExchangeError::DecapsulationFailed);
        }
        Ok(secret)
    }

    /// Public key size for the configured algorithm
    fn public_key_size(&self) -> usize {
        match self.algorithm {
            KeyAgreementAlgorithm::Kyber512 => kyber512::public_key_bytes(),
            KeyAgreementAlgorithm::Kyber768 => kyber768::public_key_bytes(),
            KeyAgreementAlgorithm::Kyber1024 => kyber1024::public_key_bytes(),
        }
    }

    /// Ciphertext size for the configured algorithm
    fn ciphertext_size(&self) -> usize {
        match self.algorithm {
            KeyAgreementAlgorithm::Kyber512 => kyber512::ciphertext_bytes(),
            KeyAgreementAlgorithm::Kyber768 => kyber768::ciphertext_bytes(),
            KeyAgreementAlgorithm::Kyber1024 => kyber1024::ciphertext_bytes(),
        }
    }
}
