/*!
Cryptographic algorithm configuration.

Selects the key agreement and signature primitives once, when the runtime
is constructed. Sessions never switch primitives per call.
*/

use crate::core::crypto::types::{KeyAgreementAlgorithm, SignatureAlgorithm};
use crate::core::error::Result;

/// Cryptographic configuration for a runtime
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde-support", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde-support", serde(default))]
pub struct CryptoConfig {
    /// Key agreement algorithm
    pub key_agreement: KeyAgreementAlgorithm,
    /// Signature algorithm for binding records
    pub signature: SignatureAlgorithm,
}

impl CryptoConfig {
    /// Create a new configuration with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new configuration with specific settings
    pub fn with_algorithms(
        key_agreement: KeyAgreementAlgorithm,
        signature: SignatureAlgorithm,
    ) -> Self {
        Self {
            key_agreement,
            signature,
        }
    }

    /// Parse algorithm identifiers, as read by an external config loader
    pub fn from_identifiers(key_agreement: &str, signature: &str) -> Result<Self> {
        Ok(Self {
            key_agreement: key_agreement.parse()?,
            signature: signature.parse()?,
        })
    }

    /// Create a configuration optimized for resource-constrained environments
    pub fn lightweight() -> Self {
        Self::with_algorithms(KeyAgreementAlgorithm::Kyber512, SignatureAlgorithm::Dilithium2)
    }

    /// Create a configuration optimized for highest security
    pub fn high_security() -> Self {
        Self::with_algorithms(KeyAgreementAlgorithm::Kyber1024, SignatureAlgorithm::Dilithium5)
    }

    /// Get the name of the key agreement algorithm as a string
    pub fn key_agreement_name(&self) -> &'static str {
        self.key_agreement.name()
    }

    /// Get the name of the signature algorithm as a string
    pub fn signature_name(&self) -> &'static str {
        self.signature.name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::Error;

    #[test]
    fn test_default_config() {
        let config = CryptoConfig::default();
        assert_eq!(config.key_agreement, KeyAgreementAlgorithm::Kyber768);
        assert_eq!(config.signature, SignatureAlgorithm::Dilithium3);
        assert_eq!(config.key_agreement_name(), "CRYSTALS-Kyber-768");
        assert_eq!(config.signature_name(), "CRYSTALS-Dilithium-3");
    }

    #[test]
    fn test_preset_configs() {
        let lightweight = CryptoConfig::lightweight();
        assert_eq!(lightweight.key_agreement, KeyAgreementAlgorithm::Kyber512);
        assert_eq!(lightweight.signature, SignatureAlgorithm::Dilithium2);

        let high_security = CryptoConfig::high_security();
        assert_eq!(high_security.key_agreement, KeyAgreementAlgorithm::Kyber1024);
        assert_eq!(high_security.signature, SignatureAlgorithm::Dilithium5);
    }

    #[test]
    fn test_from_identifiers() {
        let config = CryptoConfig::from_identifiers("kyber1024", "dilithium2").unwrap();
        assert_eq!(config.key_agreement, KeyAgreementAlgorithm::Kyber1024);
        assert_eq!(config.signature, SignatureAlgorithm::Dilithium2);

        let err = CryptoConfig::from_identifiers("rsa2048", "dilithium2").unwrap_err();
        assert!(matches!(err, Error::UnsupportedAlgorithm(name) if name == "rsa2048"));
    }
}
