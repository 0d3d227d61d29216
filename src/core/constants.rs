/*!
Constants for the signal runtime.

Domain-separation labels, fixed sizes and configuration defaults.
*/

/// Runtime wire/record version, bound into every signed binding record
pub const VERSION: u8 = 0x01;

/// Size constants
pub mod sizes {
    /// Size of a session identifier in bytes
    pub const SESSION_ID_BYTES: usize = 16;

    /// Size of a signal digest in bytes (BLAKE3 output)
    pub const DIGEST_BYTES: usize = 32;

    /// Size of the per-session signal key in bytes
    pub const SIGNAL_KEY_BYTES: usize = 32;

    /// Size of a fingerprint binding value in bytes
    pub const BINDING_BYTES: usize = 32;

    /// Number of attribute slots in a fingerprint vector
    pub const FINGERPRINT_SLOTS: usize = 16;

    /// Width of the out-of-order replay bitmap
    pub const REPLAY_WINDOW_BITS: u32 = 64;

    /// CRYSTALS-Kyber shared secret size (all parameter sets)
    pub const SHARED_SECRET_BYTES: usize = 32;
}

/// Domain separation labels. Changing any of these invalidates every
/// outstanding signal and binding signature.
pub mod labels {
    /// HKDF info for the session signal key
    pub const HKDF_INFO_SIGNAL_KEY: &[u8] = b"signal-runtime/v1/signal-key";

    /// Epoch key derivation prefix
    pub const EPOCH_KEY: &[u8] = b"signal-runtime/v1/epoch";

    /// Signal digest prefix
    pub const SIGNAL_DIGEST: &[u8] = b"signal-runtime/v1/signal";

    /// Signal key ratchet prefix applied on refresh
    pub const KEY_RATCHET: &[u8] = b"signal-runtime/v1/ratchet";

    /// Fingerprint attribute hashing prefix
    pub const FINGERPRINT_ATTRIBUTE: &[u8] = b"signal-runtime/v1/fp-attr";

    /// Fingerprint binding prefix
    pub const FINGERPRINT_BINDING: &[u8] = b"signal-runtime/v1/fp-binding";

    /// Binding record prefix
    pub const BINDING_RECORD: &[u8] = b"signal-runtime/v1/binding";
}

/// Configuration defaults
pub mod defaults {
    /// Epoch duration in milliseconds
    pub const WINDOW_SIZE_MS: u64 = 5_000;

    /// Accepted epoch distance either side of the server's current epoch
    pub const EPOCH_SKEW_TOLERANCE: u64 = 1;

    /// Out-of-order tolerance for the replay sequencer (0 = strict)
    pub const REPLAY_TOLERANCE_COUNT: u32 = 0;

    /// Replay violations tolerated before the session is revoked
    pub const MAX_REPLAY_VIOLATIONS: u32 = 5;

    /// Minimum number of fingerprint attributes for a full-trust session
    pub const MIN_FINGERPRINT_ATTRIBUTES: usize = 4;

    /// Session lifetime per validity window, in milliseconds (1 hour)
    pub const SESSION_LIFETIME_MS: u64 = 60 * 60 * 1_000;

    /// How long terminal sessions linger before the sweep purges them (10 minutes)
    pub const TOMBSTONE_RETENTION_MS: u64 = 10 * 60 * 1_000;

    /// Registry shard count (power of two)
    pub const REGISTRY_SHARDS: usize = 64;

    /// Anomaly score that forces revocation
    pub const ANOMALY_THRESHOLD: f64 = 5.0;

    /// Half-life of the anomaly score, in milliseconds (5 minutes)
    pub const ANOMALY_HALF_LIFE_MS: u64 = 5 * 60 * 1_000;

    /// Upper bound of the anomaly score
    pub const ANOMALY_CEILING: f64 = 100.0;
}
