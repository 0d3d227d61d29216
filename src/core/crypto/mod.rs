/*!
Cryptographic components for the signal runtime.

This module provides the post-quantum primitives used at session
establishment: Kyber key agreement and Dilithium signatures over the
binding record. The high-frequency rotating signal never touches them.
*/

// Algorithm implementations
pub mod algorithms;

// Algorithm selection
pub mod config;

// Capability interfaces
pub mod traits;

// Algorithm identifiers
pub mod types;

// Primitive pair owned by a runtime
pub mod suite;

// Re-export main components
pub use config::CryptoConfig;
pub use suite::CryptoSuite;
pub use traits::{KeyAgreement, Negotiated, Signer};
pub use types::{KeyAgreementAlgorithm, SignatureAlgorithm};
