/*!
Algorithm type definitions.

This module defines the algorithm enums used throughout the crypto
subsystem. Identifiers parse from the lower-case names accepted by the
configuration surface (`"kyber768"`, `"dilithium3"`, ...).
*/

use std::fmt;
use std::str::FromStr;

use crate::core::error::Error;

/// Supported Key Encapsulation Mechanisms
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde-support", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde-support", serde(rename_all = "lowercase"))]
pub enum KeyAgreementAlgorithm {
    /// CRYSTALS-Kyber KEM (Kyber512) - for resource-constrained environments
    Kyber512,
    /// CRYSTALS-Kyber KEM (Kyber768)
    #[default]
    Kyber768,
    /// CRYSTALS-Kyber KEM (Kyber1024) - highest security level
    Kyber1024,
}

impl KeyAgreementAlgorithm {
    /// All supported parameter sets
    pub const ALL: [KeyAgreementAlgorithm; 3] = [
        KeyAgreementAlgorithm::Kyber512,
        KeyAgreementAlgorithm::Kyber768,
        KeyAgreementAlgorithm::Kyber1024,
    ];

    /// Get the name of the algorithm as a string
    pub fn name(&self) -> &'static str {
        match self {
            KeyAgreementAlgorithm::Kyber512 => "CRYSTALS-Kyber-512",
            KeyAgreementAlgorithm::Kyber768 => "CRYSTALS-Kyber-768",
            KeyAgreementAlgorithm::Kyber1024 => "CRYSTALS-Kyber-1024",
        }
    }

    /// Configuration identifier
    pub fn identifier(&self) -> &'static str {
        match self {
            KeyAgreementAlgorithm::Kyber512 => "kyber512",
            KeyAgreementAlgorithm::Kyber768 => "kyber768",
            KeyAgreementAlgorithm::Kyber1024 => "kyber1024",
        }
    }

    /// Stable one-byte id bound into signed binding records
    pub fn id(&self) -> u8 {
        match self {
            KeyAgreementAlgorithm::Kyber512 => 0x01,
            KeyAgreementAlgorithm::Kyber768 => 0x02,
            KeyAgreementAlgorithm::Kyber1024 => 0x03,
        }
    }
}

impl fmt::Display for KeyAgreementAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for KeyAgreementAlgorithm {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace(['-', '_'], "");
        match normalized.as_str() {
            "kyber512" | "mlkem512" => Ok(KeyAgreementAlgorithm::Kyber512),
            "kyber768" | "mlkem768" | "kyber" => Ok(KeyAgreementAlgorithm::Kyber768),
            "kyber1024" | "mlkem1024" => Ok(KeyAgreementAlgorithm::Kyber1024),
            _ => Err(Error::UnsupportedAlgorithm(s.to_string())),
        }
    }
}

/// Supported Digital Signature Algorithms
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde-support", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde-support", serde(rename_all = "lowercase"))]
pub enum SignatureAlgorithm {
    /// CRYSTALS-Dilithium (dilithium2) - for resource-constrained environments
    Dilithium2,
    /// CRYSTALS-Dilithium (dilithium3)
    #[default]
    Dilithium3,
    /// CRYSTALS-Dilithium (dilithium5) - highest security level
    Dilithium5,
}

impl SignatureAlgorithm {
    /// All supported parameter sets
    pub const ALL: [SignatureAlgorithm; 3] = [
        SignatureAlgorithm::Dilithium2,
        SignatureAlgorithm::Dilithium3,
        SignatureAlgorithm::Dilithium5,
    ];

    /// Get the name of the algorithm as a string
    pub fn name(&self) -> &'static str {
        match self {
            SignatureAlgorithm::Dilithium2 => "CRYSTALS-Dilithium-2",
            SignatureAlgorithm::Dilithium3 => "CRYSTALS-Dilithium-3",
            SignatureAlgorithm::Dilithium5 => "CRYSTALS-Dilithium-5",
        }
    }

    /// Configuration identifier
    pub fn identifier(&self) -> &'static str {
        match self {
            SignatureAlgorithm::Dilithium2 => "dilithium2",
            SignatureAlgorithm::Dilithium3 => "dilithium3",
            SignatureAlgorithm::Dilithium5 => "dilithium5",
        }
    }

    /// Stable one-byte id bound into signed binding records
    pub fn id(&self) -> u8 {
        match self {
            SignatureAlgorithm::Dilithium2 => 0x11,
            SignatureAlgorithm::Dilithium3 => 0x12,
            SignatureAlgorithm::Dilithium5 => 0x13,
        }
    }
}

impl fmt::Display for SignatureAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SignatureAlgorithm {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace(['-', '_'], "");
        match normalized.as_str() {
            "dilithium2" | "mldsa44" => Ok(SignatureAlgorithm::Dilithium2),
            "dilithium3" | "mldsa65" | "dilithium" => Ok(SignatureAlgorithm::Dilithium3),
            "dilithium5" | "mldsa87" => Ok(SignatureAlgorithm::Dilithium5),
            _ => Err(Error::UnsupportedAlgorithm(s.to_string())),
        }
    }
}
