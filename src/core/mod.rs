//! Core components for the signal runtime.
//!
//! This module contains the fundamental building blocks: post-quantum
//! primitives, the digest engine, fingerprinting, replay and anomaly
//! logic, per-session state, configuration and error handling.

// Time source
pub mod clock;

// Runtime configuration
pub mod config;

// Export cryptographic functionality
pub mod crypto;

// Hardware fingerprinting
pub mod fingerprint;

// Export memory handling for sensitive data
pub mod memory;

// Export security utilities
pub mod security;

// Export session management
pub mod session;

// Rotating signals
pub mod signal;

// Runtime constants
pub mod constants;

// Error handling
pub mod error;

// Re-exports for convenience
pub use self::config::{AnomalyConfig, AnomalyWeights, RuntimeConfig};
pub use self::constants::VERSION;
pub use self::error::{AuthError, CryptoError, Error, KeyExchangeError, RejectReason, Result};
pub use self::session::{SessionState, Verdict};
