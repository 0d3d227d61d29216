/*!
Fingerprint collection and trust assessment.
*/

use log::debug;

use super::sources::{
    AttributeSource, CpuMemorySource, LocaleSource, MachineSource, NetworkSource,
    OperatingSystemSource,
};
use super::vector::FingerprintVector;
use crate::core::error::{Error, Result};

/// Trust attached to a session at issuance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde-support", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde-support", serde(rename_all = "lowercase"))]
pub enum TrustLevel {
    /// Enough hardware signal
    Full,
    /// Issued below the attribute minimum; anomaly threshold is scaled down
    Degraded,
}

impl TrustLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            TrustLevel::Full => "full",
            TrustLevel::Degraded => "degraded",
        }
    }
}

/// Decide the trust level for a fingerprint.
///
/// An empty fingerprint never qualifies, not even in degraded mode.
pub fn assess_trust(
    fingerprint: &FingerprintVector,
    min_attributes: usize,
    degraded_mode_allowed: bool,
) -> Result<TrustLevel> {
    let available = fingerprint.attribute_count();
    if available >= min_attributes {
        return Ok(TrustLevel::Full);
    }
    if available > 0 && degraded_mode_allowed {
        return Ok(TrustLevel::Degraded);
    }
    Err(Error::InsufficientHardwareSignal {
        available,
        required: min_attributes,
    })
}

/// Collects a [`FingerprintVector`] from a set of sources
pub struct FingerprintProvider {
    sources: Vec<Box<dyn AttributeSource>>,
}

impl FingerprintProvider {
    /// A provider with no sources
    pub fn new() -> Self {
        Self {
            sources: Vec::new(),
        }
    }

    /// A provider reading the local host
    pub fn system() -> Self {
        Self::new()
            .with_source(MachineSource)
            .with_source(CpuMemorySource)
            .with_source(NetworkSource)
            .with_source(OperatingSystemSource)
            .with_source(LocaleSource)
    }

    /// Add a source; later sources overwrite earlier ones for the same slot
    pub fn with_source(mut self, source: impl AttributeSource + 'static) -> Self {
        self.sources.push(Box::new(source));
        self
    }

    /// Number of configured sources
    pub fn source_count(&self) -> usize {
        self.sources.len()
    }

    /// Read every source into one vector
    pub fn collect(&self) -> Result<FingerprintVector> {
        let mut vector = FingerprintVector::new();
        for source in &self.sources {
            let attributes = source.collect();
            debug!(
                target: "signal_runtime::fingerprint",
                "source {} produced {} attributes",
                source.name(),
                attributes.len()
            );
            for (kind, value) in &attributes {
                vector.set(*kind, value);
            }
        }

        if vector.is_empty() {
            return Err(Error::SourceUnavailable(format!(
                "no attributes from {} sources",
                self.sources.len()
            )));
        }
        Ok(vector)
    }
}

impl Default for FingerprintProvider {
    fn default() -> Self {
        Self::system()
    }
}
