/*!
Implementations of cryptographic algorithms.

This module provides concrete implementations of the
cryptographic capability interfaces.
*/

// Key agreement algorithms
pub mod kex;

// Signature algorithms
pub mod signatures;

// Re-export factory functions
pub use kex::create_key_agreement;
pub use signatures::{create_signer, verify_detached};
