/*!
Runtime builder.

This module provides a builder pattern for creating a [`SignalRuntime`]
with a specific configuration, clock and crypto suite.
*/

use std::sync::Arc;
use std::time::Duration;

use super::facade::SignalRuntime;
use crate::core::clock::{Clock, SystemClock};
use crate::core::config::RuntimeConfig;
use crate::core::crypto::types::{KeyAgreementAlgorithm, SignatureAlgorithm};
use crate::core::crypto::{CryptoConfig, CryptoSuite};
use crate::core::error::Result;

/// Builder for [`SignalRuntime`]
pub struct SignalRuntimeBuilder {
    /// Runtime configuration
    config: RuntimeConfig,

    /// Time source, system clock when unset
    clock: Option<Arc<dyn Clock>>,

    /// Prebuilt primitives; generated from `config.crypto` when unset
    suite: Option<CryptoSuite>,
}

impl SignalRuntimeBuilder {
    /// Create a new builder with default configuration
    pub fn new() -> Self {
        Self {
            config: RuntimeConfig::default(),
            clock: None,
            suite: None,
        }
    }

    /// Replace the whole configuration
    pub fn with_config(mut self, config: RuntimeConfig) -> Self {
        self.config = config;
        self
    }

    /// Use a specific time source
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Some(Arc::new(clock));
        self
    }

    /// Use a shared time source
    pub fn with_shared_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Use prebuilt primitives, e.g. to keep a signing identity across restarts.
    /// Overrides the algorithms in the configuration.
    pub fn with_suite(mut self, suite: CryptoSuite) -> Self {
        self.config.crypto = suite.config();
        self.suite = Some(suite);
        self
    }

    /// Use a specific algorithm pair
    pub fn with_crypto(mut self, crypto: CryptoConfig) -> Self {
        self.config.crypto = crypto;
        self.suite = None;
        self
    }

    /// Use a specific key agreement algorithm
    pub fn with_key_agreement(mut self, algorithm: KeyAgreementAlgorithm) -> Self {
        self.config.crypto.key_agreement = algorithm;
        self.suite = None;
        self
    }

    /// Use a specific signature algorithm
    pub fn with_signature(mut self, algorithm: SignatureAlgorithm) -> Self {
        self.config.crypto.signature = algorithm;
        self.suite = None;
        self
    }

    /// Epoch duration
    pub fn with_window_size(mut self, window_size: Duration) -> Self {
        self.config.window_size = window_size;
        self
    }

    /// Accepted epoch distance either side of the current epoch
    pub fn with_epoch_skew_tolerance(mut self, tolerance: u64) -> Self {
        self.config.epoch_skew_tolerance = tolerance;
        self
    }

    /// Out-of-order window of the replay sequencer
    pub fn with_replay_tolerance(mut self, count: u32) -> Self {
        self.config.replay_tolerance_count = count;
        self
    }

    /// Anomaly score that forces revocation
    pub fn with_anomaly_threshold(mut self, threshold: f64) -> Self {
        self.config.anomaly.threshold = threshold;
        self
    }

    /// Allow issuance below the fingerprint attribute minimum
    pub fn with_degraded_mode(mut self, allowed: bool) -> Self {
        self.config.degraded_mode_allowed = allowed;
        self
    }

    /// Use the lightweight algorithm pair
    pub fn lightweight(self) -> Self {
        self.with_crypto(CryptoConfig::lightweight())
    }

    /// Use the high security preset
    pub fn high_security(mut self) -> Self {
        self.config = RuntimeConfig::high_security();
        self.suite = None;
        self
    }

    /// Use the lenient preset
    pub fn lenient(mut self) -> Self {
        self.config = RuntimeConfig::lenient();
        self.suite = None;
        self
    }

    /// Validate the configuration and build the runtime
    pub fn build(self) -> Result<SignalRuntime> {
        self.config.validate()?;
        let suite = match self.suite {
            Some(suite) => suite,
            None => CryptoSuite::from_config(&self.config.crypto),
        };
        let clock = self.clock.unwrap_or_else(|| Arc::new(SystemClock));
        Ok(SignalRuntime::from_parts(self.config, suite, clock))
    }
}

impl Default for SignalRuntimeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::clock::ManualClock;
    use crate::core::error::Error;

    #[test]
    fn test_builder_defaults() -> Result<()> {
        let runtime = SignalRuntimeBuilder::new().build()?;
        assert_eq!(runtime.config(), &RuntimeConfig::default());
        assert_eq!(runtime.crypto_config(), CryptoConfig::default());
        assert_eq!(runtime.session_count(), 0);
        Ok(())
    }

    #[test]
    fn test_builder_configuration() -> Result<()> {
        let runtime = SignalRuntimeBuilder::new()
            .high_security()
            .with_clock(ManualClock::new(42))
            .build()?;
        assert_eq!(runtime.crypto_config(), CryptoConfig::high_security());
        assert_eq!(runtime.now_ms(), 42);

        let runtime = SignalRuntimeBuilder::new()
            .lenient()
            .lightweight()
            .with_window_size(Duration::from_secs(10))
            .with_anomaly_threshold(7.5)
            .build()?;
        assert_eq!(runtime.crypto_config(), CryptoConfig::lightweight());
        assert_eq!(runtime.config().window_size_ms(), 10_000);
        assert_eq!(runtime.config().anomaly.threshold, 7.5);
        assert!(runtime.config().degraded_mode_allowed);
        Ok(())
    }

    #[test]
    fn test_builder_keeps_supplied_suite() -> Result<()> {
        let suite = CryptoSuite::from_config(&CryptoConfig::lightweight());
        let verify_key = suite.verify_key().to_vec();
        let runtime = SignalRuntimeBuilder::new().with_suite(suite).build()?;
        assert_eq!(runtime.verify_key(), verify_key.as_slice());
        assert_eq!(runtime.config().crypto, CryptoConfig::lightweight());
        Ok(())
    }

    #[test]
    fn test_builder_rejects_invalid_config() {
        let result = SignalRuntimeBuilder::new()
            .with_window_size(Duration::ZERO)
            .build();
        assert!(matches!(result, Err(Error::InvalidConfig(_))));

        let result = SignalRuntimeBuilder::new().with_replay_tolerance(65).build();
        assert!(matches!(result, Err(Error::InvalidConfig(_))));
    }
}
