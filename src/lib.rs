/*!
# Signal Runtime

Time-variant, hardware-bound authentication signals with post-quantum
session binding, meant to sit behind an OAuth-compatible token layer in
place of static bearer tokens.

## Overview

A session is issued once per device:

- CRYSTALS-Kyber key agreement establishes a shared secret with the device
- A CRYSTALS-Dilithium signature over the binding record ties the session
  to the principal, the device key and a hashed hardware fingerprint
- HKDF-SHA256 turns the shared secret into a per-session signal key

Every request then presents a signal: a BLAKE3 digest keyed by the signal
key, the current epoch and a sequence number. Validation recomputes the
digest, rejects replays through a per-session ledger and feeds suspicious
events into a decaying anomaly score that revokes the session on breach.

## Usage

```no_run
use signal_runtime::{DeviceKeys, DeviceSession, FingerprintProvider, SignalRuntime};
use signal_runtime::core::crypto::types::KeyAgreementAlgorithm;

# fn main() -> signal_runtime::Result<()> {
let runtime = SignalRuntime::builder().build()?;

let keys = DeviceKeys::generate(KeyAgreementAlgorithm::Kyber768)?;
let fingerprint = FingerprintProvider::system().collect()?;
let grant = runtime.issue("alice@example.com", keys.public_key(), &fingerprint)?;

let mut device = DeviceSession::establish(&keys, &grant, &fingerprint)?;
let signal = device.next_signal(runtime.now_ms());
assert!(runtime.validate(&grant.session_id, &signal).is_accept());
# Ok(())
# }
```
*/

// Core runtime components
pub mod core;

// Concurrent facade
pub mod runtime;

// Device-side counterpart
pub mod device;

// Re-export commonly used types for convenience
pub use crate::core::clock::{Clock, ManualClock, SystemClock};
pub use crate::core::config::{AnomalyConfig, AnomalyWeights, RuntimeConfig};
pub use crate::core::constants::{VERSION, sizes};
pub use crate::core::error::{AuthError, CryptoError, Error, KeyExchangeError, RejectReason, Result};
pub use crate::core::fingerprint::{
    AttributeKind, AttributeSource, DriftScore, FingerprintProvider, FingerprintVector,
    StaticSource, TrustLevel,
};
pub use crate::core::session::{
    Acceptance, RefreshGrant, RevocationReason, SessionGrant, SessionRecord, SessionState,
    Verdict,
};
pub use crate::core::signal::{SessionId, Signal, SignalDigest};

// Re-export crypto configuration
pub use crate::core::crypto::types::{KeyAgreementAlgorithm, SignatureAlgorithm};
pub use crate::core::crypto::{CryptoConfig, CryptoSuite};

// Re-export the runtime
pub use crate::device::{DeviceKeys, DeviceSession};
pub use crate::runtime::{SignalRuntime, SignalRuntimeBuilder, StatsSnapshot, SweepReport, SweeperHandle};
