/*!
Runtime configuration.

`RuntimeConfig` carries every recognised option of the runtime. It is a
plain struct with defaults, a couple of presets and a `validate()` pass that
the builder runs before anything is constructed. With the `serde-support`
feature it can be loaded by an external configuration layer.
*/

use std::time::Duration;

use crate::config_err;
use crate::core::constants::{defaults, sizes};
use crate::core::crypto::config::CryptoConfig;
use crate::core::error::Result;

/// Convert a duration to whole milliseconds, saturating
pub(crate) fn duration_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

/// Per-event score increments
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde-support", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde-support", serde(default))]
pub struct AnomalyWeights {
    /// A replayed or too-old (epoch, sequence)
    pub replay_rejected: f64,
    /// Epoch outside the skew tolerance
    pub epoch_out_of_range: f64,
    /// Digest did not match
    pub digest_mismatch: f64,
    /// Accepted signal skipped more than `gap_threshold` sequence numbers
    pub sequence_gap: f64,
    /// Multiplied by the drift score when drift exceeds the tolerance
    pub fingerprint_drift: f64,
    /// Client timestamp too far from the server clock
    pub timing_outlier: f64,
    /// More than `burst_limit` accepted signals in one epoch
    pub burst_rate: f64,
    /// Silence between accepted signals beyond `cadence_tolerance` epochs
    pub arrival_cadence: f64,
}

impl Default for AnomalyWeights {
    fn default() -> Self {
        Self {
            replay_rejected: 1.0,
            epoch_out_of_range: 1.0,
            digest_mismatch: 1.0,
            sequence_gap: 0.5,
            fingerprint_drift: 4.0,
            timing_outlier: 0.5,
            burst_rate: 2.0,
            arrival_cadence: 0.5,
        }
    }
}

impl AnomalyWeights {
    fn as_array(&self) -> [(&'static str, f64); 8] {
        [
            ("replay_rejected", self.replay_rejected),
            ("epoch_out_of_range", self.epoch_out_of_range),
            ("digest_mismatch", self.digest_mismatch),
            ("sequence_gap", self.sequence_gap),
            ("fingerprint_drift", self.fingerprint_drift),
            ("timing_outlier", self.timing_outlier),
            ("burst_rate", self.burst_rate),
            ("arrival_cadence", self.arrival_cadence),
        ]
    }
}

/// Anomaly detector tuning
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde-support", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde-support", serde(default))]
pub struct AnomalyConfig {
    /// Score at which the session is revoked
    pub threshold: f64,
    /// Time for the score to halve absent new events
    pub half_life: Duration,
    /// Upper bound of the score
    pub ceiling: f64,
    /// Per-event increments
    pub weights: AnomalyWeights,
    /// Drift at or below this value is not scored
    pub drift_tolerance: f64,
    /// Sequence skip (beyond the next expected) that counts as a gap
    pub gap_threshold: u64,
    /// Allowed distance between a signal's timestamp and the server clock
    pub timing_tolerance: Duration,
    /// Accepted signals per epoch before a burst is scored
    pub burst_limit: u32,
    /// Epochs of silence between accepted signals before the gap is scored
    pub cadence_tolerance: u32,
    /// Threshold multiplier for degraded-trust sessions
    pub degraded_threshold_factor: f64,
}

impl Default for AnomalyConfig {
    fn default() -> Self {
        Self {
            threshold: defaults::ANOMALY_THRESHOLD,
            half_life: Duration::from_millis(defaults::ANOMALY_HALF_LIFE_MS),
            ceiling: defaults::ANOMALY_CEILING,
            weights: AnomalyWeights::default(),
            drift_tolerance: 0.1,
            gap_threshold: 32,
            timing_tolerance: Duration::from_secs(15),
            burst_limit: 256,
            cadence_tolerance: 64,
            degraded_threshold_factor: 0.5,
        }
    }
}

impl AnomalyConfig {
    /// Validate the anomaly settings
    pub fn validate(&self) -> Result<()> {
        if !self.threshold.is_finite() || self.threshold <= 0.0 {
            return config_err!("anomaly threshold must be positive and finite");
        }
        if !self.ceiling.is_finite() || self.ceiling < self.threshold {
            return config_err!("anomaly ceiling must be finite and at least the threshold");
        }
        if self.half_life.is_zero() {
            return config_err!("anomaly half-life must be non-zero");
        }
        for (name, weight) in self.weights.as_array() {
            if !weight.is_finite() || weight < 0.0 {
                return config_err!("anomaly weight {} must be non-negative", name);
            }
        }
        if !(0.0..1.0).contains(&self.drift_tolerance) {
            return config_err!("drift tolerance must be in [0, 1)");
        }
        if self.burst_limit == 0 {
            return config_err!("burst limit must be non-zero");
        }
        if self.cadence_tolerance == 0 {
            return config_err!("cadence tolerance must be non-zero");
        }
        if !(self.degraded_threshold_factor > 0.0 && self.degraded_threshold_factor <= 1.0) {
            return config_err!("degraded threshold factor must be in (0, 1]");
        }
        Ok(())
    }
}

/// Configuration for a signal runtime
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde-support", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde-support", serde(default))]
pub struct RuntimeConfig {
    /// Epoch duration
    pub window_size: Duration,
    /// Accepted epoch distance either side of the current epoch
    pub epoch_skew_tolerance: u64,
    /// Out-of-order window of the replay sequencer (0 = strict)
    pub replay_tolerance_count: u32,
    /// Replay rejections before the session is revoked
    pub max_replay_violations: u32,
    /// Allow issuance below `min_fingerprint_attributes`
    pub degraded_mode_allowed: bool,
    /// Attributes required for a full-trust session
    pub min_fingerprint_attributes: usize,
    /// Length of each validity window
    pub session_lifetime: Duration,
    /// How long terminal sessions are kept before the sweep purges them
    pub tombstone_retention: Duration,
    /// Registry shard count (power of two)
    pub registry_shards: usize,
    /// Primitive selection
    pub crypto: CryptoConfig,
    /// Anomaly detector tuning
    pub anomaly: AnomalyConfig,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            window_size: Duration::from_millis(defaults::WINDOW_SIZE_MS),
            epoch_skew_tolerance: defaults::EPOCH_SKEW_TOLERANCE,
            replay_tolerance_count: defaults::REPLAY_TOLERANCE_COUNT,
            max_replay_violations: defaults::MAX_REPLAY_VIOLATIONS,
            degraded_mode_allowed: false,
            min_fingerprint_attributes: defaults::MIN_FINGERPRINT_ATTRIBUTES,
            session_lifetime: Duration::from_millis(defaults::SESSION_LIFETIME_MS),
            tombstone_retention: Duration::from_millis(defaults::TOMBSTONE_RETENTION_MS),
            registry_shards: defaults::REGISTRY_SHARDS,
            crypto: CryptoConfig::default(),
            anomaly: AnomalyConfig::default(),
        }
    }
}

impl RuntimeConfig {
    /// Create a new configuration with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Strongest primitives and a tighter anomaly threshold
    pub fn high_security() -> Self {
        Self {
            max_replay_violations: 3,
            min_fingerprint_attributes: 6,
            crypto: CryptoConfig::high_security(),
            anomaly: AnomalyConfig {
                threshold: 3.0,
                drift_tolerance: 0.05,
                ..AnomalyConfig::default()
            },
            ..Self::default()
        }
    }

    /// Tolerates reordering, wider skew and weak hardware signal
    pub fn lenient() -> Self {
        Self {
            epoch_skew_tolerance: 2,
            replay_tolerance_count: 8,
            max_replay_violations: 10,
            degraded_mode_allowed: true,
            min_fingerprint_attributes: 3,
            anomaly: AnomalyConfig {
                threshold: 10.0,
                drift_tolerance: 0.2,
                ..AnomalyConfig::default()
            },
            ..Self::default()
        }
    }

    /// Epoch duration in milliseconds
    pub fn window_size_ms(&self) -> u64 {
        duration_ms(self.window_size)
    }

    /// Validity window length in milliseconds
    pub fn session_lifetime_ms(&self) -> u64 {
        duration_ms(self.session_lifetime)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.window_size_ms() == 0 {
            return config_err!("window_size must be at least one millisecond");
        }
        if self.session_lifetime < self.window_size {
            return config_err!("session_lifetime must cover at least one window");
        }
        if self.replay_tolerance_count > sizes::REPLAY_WINDOW_BITS {
            return config_err!(
                "replay_tolerance_count must be at most {}",
                sizes::REPLAY_WINDOW_BITS
            );
        }
        if self.max_replay_violations == 0 {
            return config_err!("max_replay_violations must be non-zero");
        }
        if self.min_fingerprint_attributes == 0
            || self.min_fingerprint_attributes > sizes::FINGERPRINT_SLOTS
        {
            return config_err!(
                "min_fingerprint_attributes must be between 1 and {}",
                sizes::FINGERPRINT_SLOTS
            );
        }
        if self.registry_shards < 2 || !self.registry_shards.is_power_of_two() {
            return config_err!("registry_shards must be a power of two greater than one");
        }
        self.anomaly.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::crypto::types::{KeyAgreementAlgorithm, SignatureAlgorithm};
    use crate::core::error::Error;

    #[test]
    fn test_default_config() {
        let config = RuntimeConfig::default();
        assert_eq!(config.window_size_ms(), 5_000);
        assert_eq!(config.epoch_skew_tolerance, 1);
        assert_eq!(config.replay_tolerance_count, 0);
        assert!(!config.degraded_mode_allowed);
        assert_eq!(config.anomaly.threshold, 5.0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_presets_validate() {
        let high = RuntimeConfig::high_security();
        assert_eq!(high.crypto.key_agreement, KeyAgreementAlgorithm::Kyber1024);
        assert_eq!(high.crypto.signature, SignatureAlgorithm::Dilithium5);
        assert!(high.anomaly.threshold < RuntimeConfig::default().anomaly.threshold);
        assert!(high.validate().is_ok());

        let lenient = RuntimeConfig::lenient();
        assert!(lenient.degraded_mode_allowed);
        assert!(lenient.replay_tolerance_count > 0);
        assert!(lenient.validate().is_ok());
    }

    #[test]
    fn test_rejects_invalid_values() {
        let cases: Vec<RuntimeConfig> = vec![
            RuntimeConfig {
                window_size: Duration::ZERO,
                ..RuntimeConfig::default()
            },
            RuntimeConfig {
                replay_tolerance_count: 65,
                ..RuntimeConfig::default()
            },
            RuntimeConfig {
                registry_shards: 48,
                ..RuntimeConfig::default()
            },
            RuntimeConfig {
                min_fingerprint_attributes: 0,
                ..RuntimeConfig::default()
            },
            RuntimeConfig {
                session_lifetime: Duration::from_millis(10),
                ..RuntimeConfig::default()
            },
            RuntimeConfig {
                anomaly: AnomalyConfig {
                    threshold: f64::NAN,
                    ..AnomalyConfig::default()
                },
                ..RuntimeConfig::default()
            },
            RuntimeConfig {
                anomaly: AnomalyConfig {
                    cadence_tolerance: 0,
                    ..AnomalyConfig::default()
                },
                ..RuntimeConfig::default()
            },
            RuntimeConfig {
                anomaly: AnomalyConfig {
                    weights: AnomalyWeights {
                        burst_rate: -1.0,
                        ..AnomalyWeights::default()
                    },
                    ..AnomalyConfig::default()
                },
                ..RuntimeConfig::default()
            },
        ];

        for config in cases {
            assert!(
                matches!(config.validate(), Err(Error::InvalidConfig(_))),
                "accepted {:?}",
                config
            );
        }
    }

    #[cfg(feature = "serde-support")]
    #[test]
    fn test_config_survives_json() {
        let config = RuntimeConfig::high_security();
        let json = serde_json::to_string(&config).unwrap();
        let parsed: RuntimeConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, config);

        // missing fields fall back to defaults
        let partial: RuntimeConfig =
            serde_json::from_str(r#"{"epoch_skew_tolerance": 2, "crypto": {"key_agreement": "kyber512"}}"#)
                .unwrap();
        assert_eq!(partial.epoch_skew_tolerance, 2);
        assert_eq!(partial.crypto.key_agreement, KeyAgreementAlgorithm::Kyber512);
        assert_eq!(partial.anomaly, AnomalyConfig::default());
        assert!(partial.validate().is_ok());
    }
}
