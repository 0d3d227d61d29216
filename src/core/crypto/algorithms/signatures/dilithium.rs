/*!
CRYSTALS-Dilithium signature implementation.

This module provides an implementation of the Dilithium signature algorithm
with support for all three parameter sets.
*/

use pqcrypto_dilithium::{dilithium2, dilithium3, dilithium5};
use pqcrypto_traits::sign::{DetachedSignature as _, PublicKey as _, SecretKey as _};

use crate::core::crypto::traits::signature::Signer;
use crate::core::crypto::types::SignatureAlgorithm;
use crate::core::error::{CryptoError, Result};
use crate::core::memory::SecretBytes;

/// Dilithium signer holding one signing key pair
pub struct DilithiumSigner {
    algorithm: SignatureAlgorithm,
    public_key: Vec<u8>,
    secret_key: SecretBytes,
}

impl DilithiumSigner {
    /// Generate a fresh signing identity for the specified parameter set
    pub fn generate(algorithm: SignatureAlgorithm) -> Self {
        let (public_key, secret_key) = match algorithm {
            SignatureAlgorithm::Dilithium2 => {
                let (pk, sk) = dilithium2::keypair();
                (pk.as_bytes().to_vec(), SecretBytes::from_slice(sk.as_bytes()))
            }
            SignatureAlgorithm::Dilithium3 => {
                let (pk, sk) = dilithium3::keypair();
                (pk.as_bytes().to_vec(), SecretBytes::from_slice(sk.as_bytes()))
            }
            SignatureAlgorithm::Dilithium5 => {
                let (pk, sk) = dilithium5::keypair();
                (pk.as_bytes().to_vec(), SecretBytes::from_slice(sk.as_bytes()))
            }
        };

        Self {
            algorithm,
            public_key,
            secret_key,
        }
    }
}

/// Verify a detached Dilithium signature without holding a signing key
pub fn verify_detached(
    algorithm: SignatureAlgorithm,
    payload: &[u8],
    signature: &[u8],
    public_key: &[u8],
) -> bool {
    match algorithm {
        SignatureAlgorithm::Dilithium2 => {
            let (Ok(pk), Ok(sig)) = (
                dilithium2::PublicKey::from_bytes(public_key),
                dilithium2::DetachedSignature::from_bytes(signature),
            ) else {
                return false;
            };
            dilithium2::verify_detached_signature(&sig, payload, &pk).is_ok()
        }
        SignatureAlgorithm::Dilithium3 => {
            let (Ok(pk), Ok(sig)) = (
                dilithium3::PublicKey::from_bytes(public_key),
                dilithium3::DetachedSignature::from_bytes(signature),
            ) else {
                return false;
            };
            dilithium3::verify_detached_signature(&sig, payload, &pk).is_ok()
        }
        SignatureAlgorithm::Dilithium5 => {
            let (Ok(pk), Ok(sig)) = (
                dilithium5::PublicKey::from_bytes(public_key),
                dilithium5::DetachedSignature::from_bytes(signature),
            ) else {
                return false;
            };
            dilithium5::verify_detached_signature(&sig, payload, &pk).is_ok()
        }
    }
}

impl Signer for DilithiumSigner {
    fn algorithm(&self) -> SignatureAlgorithm {
        self.algorithm
    }

    fn public_key(&self) -> &[u8] {
        &self.public_key
    }

    /// Sign data using the held Dilithium signing key
    fn sign(&self, payload: &[u8]) -> Result<Vec<u8>> {
        let signature = match self.algorithm {
            SignatureAlgorithm::Dilithium2 => {
                let sk = dilithium2::SecretKey::from_bytes(self.secret_key.expose())
                    .map_err(|_| CryptoError::InvalidKeyFormat)?;
                dilithium2::detached_sign(payload, &sk).as_bytes().to_vec()
            }
            SignatureAlgorithm::Dilithium3 => {
                let sk = dilithium3::SecretKey::from_bytes(self.secret_key.expose())
                    .map_err(|_| CryptoError::InvalidKeyFormat)?;
                dilithium3::detached_sign(payload, &sk).as_bytes().to_vec()
            }
            SignatureAlgorithm::Dilithium5 => {
                let sk = dilithium5::SecretKey::from_bytes(self.secret_key.expose())
                    .map_err(|_| CryptoError::InvalidKeyFormat)?;
                dilithium5::detached_sign(payload, &sk).as_bytes().to_vec()
            }
        };

        if signature.is_empty() {
            return Err(CryptoError::SigningFailed.into());
        }
        Ok(signature)
    }

    fn verify(&self, payload: &[u8], signature: &[u8], public_key: &[u8]) -> bool {
        verify_detached(self.algorithm, payload, signature, public_key)
    }

    /// Get the signature size for the configured algorithm
    fn signature_size(&self) -> usize {
        match self.algorithm {
            SignatureAlgorithm::Dilithium2 => dilithium2::signature_bytes(),
            SignatureAlgorithm::Dilithium3 => dilithium3::signature_bytes(),
            SignatureAlgorithm::Dilithium5 => dilithium5::signature_bytes(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sign_verify_all_parameter_sets() {
        for algorithm in SignatureAlgorithm::ALL {
            let signer = DilithiumSigner::generate(algorithm);
            let payload = b"binding record";
            let signature = signer.sign(payload).unwrap();
            assert_eq!(signature.len(), signer.signature_size());
            assert!(signer.verify(payload, &signature, signer.public_key()), "{}", algorithm);
            assert!(!signer.verify(b"other record", &signature, signer.public_key()));
        }
    }

    #[test]
    fn test_verify_with_wrong_key() {
        let signer = DilithiumSigner::generate(SignatureAlgorithm::Dilithium3);
        let other = DilithiumSigner::generate(SignatureAlgorithm::Dilithium3);
        let signature = signer.sign(b"payload").unwrap();
        assert!(!signer.verify(b"payload", &signature, other.public_key()));
    }

    #[test]
    fn test_verify_rejects_garbage() {
        let signer = DilithiumSigner::generate(SignatureAlgorithm::Dilithium2);
        assert!(!signer.verify(b"payload", &[0u8; 12], signer.public_key()));
        assert!(!verify_detached(SignatureAlgorithm::Dilithium2, b"payload", &[], &[]));
    }
}
