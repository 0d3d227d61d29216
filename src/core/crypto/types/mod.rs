/*!
Core types for cryptographic operations.

This module provides the algorithm enums used to select primitives.
*/

pub mod algorithms;

// Re-export core types for easier access
pub use algorithms::{KeyAgreementAlgorithm, SignatureAlgorithm};
