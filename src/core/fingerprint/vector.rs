/*!
Fixed-length fingerprint vectors and drift scoring.

A vector holds one slot per [`AttributeKind`]. A populated slot stores the
SHA-256 of the normalized attribute value, never the value itself. Drift
between two vectors is a weighted Hamming distance in `[0, 1]`: strongly
identifying attributes (machine id, board serial, TPM key) dominate, while
volatile ones (OS and kernel version) barely register.
*/

use std::fmt;

use sha2::{Digest, Sha256};

use crate::core::constants::{labels, sizes};
use crate::core::security::constant_time::constant_time_eq_arrays;

/// One weighted attribute slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde-support", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde-support", serde(rename_all = "snake_case"))]
pub enum AttributeKind {
    MachineId,
    BoardSerial,
    CpuModel,
    CpuCores,
    MemoryTotal,
    DiskSerial,
    MacAddress,
    GpuModel,
    TpmEndorsement,
    Hostname,
    OsFamily,
    OsVersion,
    KernelVersion,
    Architecture,
    Timezone,
    Locale,
}

impl AttributeKind {
    /// Every slot, in vector order
    pub const ALL: [AttributeKind; sizes::FINGERPRINT_SLOTS] = [
        AttributeKind::MachineId,
        AttributeKind::BoardSerial,
        AttributeKind::CpuModel,
        AttributeKind::CpuCores,
        AttributeKind::MemoryTotal,
        AttributeKind::DiskSerial,
        AttributeKind::MacAddress,
        AttributeKind::GpuModel,
        AttributeKind::TpmEndorsement,
        AttributeKind::Hostname,
        AttributeKind::OsFamily,
        AttributeKind::OsVersion,
        AttributeKind::KernelVersion,
        AttributeKind::Architecture,
        AttributeKind::Timezone,
        AttributeKind::Locale,
    ];

    /// Slot index in the vector
    pub fn index(&self) -> usize {
        *self as usize
    }

    /// Contribution of this slot to the drift score
    pub fn weight(&self) -> f64 {
        match self {
            AttributeKind::MachineId => 3.0,
            AttributeKind::BoardSerial => 3.0,
            AttributeKind::CpuModel => 2.0,
            AttributeKind::CpuCores => 1.0,
            AttributeKind::MemoryTotal => 1.0,
            AttributeKind::DiskSerial => 2.5,
            AttributeKind::MacAddress => 2.0,
            AttributeKind::GpuModel => 1.5,
            AttributeKind::TpmEndorsement => 3.0,
            AttributeKind::Hostname => 1.0,
            AttributeKind::OsFamily => 1.5,
            AttributeKind::OsVersion => 0.25,
            AttributeKind::KernelVersion => 0.25,
            AttributeKind::Architecture => 2.0,
            AttributeKind::Timezone => 0.5,
            AttributeKind::Locale => 0.5,
        }
    }

    /// Stable name, also mixed into the slot hash
    pub fn name(&self) -> &'static str {
        match self {
            AttributeKind::MachineId => "machine_id",
            AttributeKind::BoardSerial => "board_serial",
            AttributeKind::CpuModel => "cpu_model",
            AttributeKind::CpuCores => "cpu_cores",
            AttributeKind::MemoryTotal => "memory_total",
            AttributeKind::DiskSerial => "disk_serial",
            AttributeKind::MacAddress => "mac_address",
            AttributeKind::GpuModel => "gpu_model",
            AttributeKind::TpmEndorsement => "tpm_endorsement",
            AttributeKind::Hostname => "hostname",
            AttributeKind::OsFamily => "os_family",
            AttributeKind::OsVersion => "os_version",
            AttributeKind::KernelVersion => "kernel_version",
            AttributeKind::Architecture => "architecture",
            AttributeKind::Timezone => "timezone",
            AttributeKind::Locale => "locale",
        }
    }
}

impl fmt::Display for AttributeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Trim, lowercase and collapse internal whitespace
pub fn normalize(value: &str) -> String {
    value
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

fn hash_attribute(kind: AttributeKind, value: &str) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(labels::FINGERPRINT_ATTRIBUTE);
    hasher.update(kind.name().as_bytes());
    hasher.update([0u8]);
    hasher.update(normalize(value).as_bytes());
    hasher.finalize().into()
}

/// Compact commitment to a fingerprint vector, mixed into every signal digest
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct FingerprintBinding([u8; sizes::BINDING_BYTES]);

impl FingerprintBinding {
    pub fn from_bytes(bytes: [u8; sizes::BINDING_BYTES]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; sizes::BINDING_BYTES] {
        &self.0
    }

    /// Constant-time comparison
    pub fn ct_eq(&self, other: &FingerprintBinding) -> bool {
        constant_time_eq_arrays(&self.0, &other.0)
    }
}

impl fmt::Debug for FingerprintBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FingerprintBinding({}..)", hex::encode(&self.0[..4]))
    }
}

/// Drift between two fingerprints, in `[0, 1]`
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default)]
pub struct DriftScore(f64);

impl DriftScore {
    pub const NONE: DriftScore = DriftScore(0.0);

    pub fn new(value: f64) -> Self {
        Self(value.clamp(0.0, 1.0))
    }

    pub fn value(&self) -> f64 {
        self.0
    }

    /// Whether drift is beyond `tolerance`
    pub fn exceeds(&self, tolerance: f64) -> bool {
        self.0 > tolerance
    }
}

/// Hashed, weighted device attributes
#[derive(Clone, PartialEq, Eq, Default)]
pub struct FingerprintVector {
    slots: [Option<[u8; 32]>; sizes::FINGERPRINT_SLOTS],
}

impl FingerprintVector {
    /// An empty vector
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from raw `(kind, value)` pairs. Blank values leave the slot empty.
    pub fn from_attributes<'a, I>(attributes: I) -> Self
    where
        I: IntoIterator<Item = (AttributeKind, &'a str)>,
    {
        let mut vector = Self::new();
        for (kind, value) in attributes {
            vector.set(kind, value);
        }
        vector
    }

    /// Hash `value` into the slot for `kind`. Later values win.
    pub fn set(&mut self, kind: AttributeKind, value: &str) {
        if value.trim().is_empty() {
            return;
        }
        self.slots[kind.index()] = Some(hash_attribute(kind, value));
    }

    /// Clear a slot
    pub fn clear(&mut self, kind: AttributeKind) {
        self.slots[kind.index()] = None;
    }

    /// Whether a slot is populated
    pub fn has(&self, kind: AttributeKind) -> bool {
        self.slots[kind.index()].is_some()
    }

    /// Number of populated slots
    pub fn attribute_count(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.attribute_count() == 0
    }

    /// Populated slot kinds
    pub fn present(&self) -> impl Iterator<Item = AttributeKind> + '_ {
        AttributeKind::ALL.into_iter().filter(|kind| self.has(*kind))
    }

    /// Presence bitmap, bit `i` set when slot `i` is populated
    pub fn presence_mask(&self) -> u16 {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.is_some())
            .fold(0u16, |mask, (i, _)| mask | (1 << i))
    }

    /// Commitment over the presence bitmap and every populated slot
    pub fn binding(&self) -> FingerprintBinding {
        let mut hasher = Sha256::new();
        hasher.update(labels::FINGERPRINT_BINDING);
        hasher.update(self.presence_mask().to_be_bytes());
        for digest in self.slots.iter().flatten() {
            hasher.update(digest);
        }
        FingerprintBinding(hasher.finalize().into())
    }

    /// Drift from `self` to `other`
    pub fn drift(&self, other: &FingerprintVector) -> DriftScore {
        compare_drift(self, other)
    }
}

impl fmt::Debug for FingerprintVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FingerprintVector")
            .field("attributes", &self.attribute_count())
            .field("presence", &format_args!("{:#06x}", self.presence_mask()))
            .finish()
    }
}

/// Weighted Hamming distance between two vectors.
///
/// A slot populated on both sides with different values contributes its
/// full weight; a slot populated on only one side contributes half. The sum
/// is normalised by the weight of slots populated on either side, so two
/// empty vectors have zero drift.
pub fn compare_drift(a: &FingerprintVector, b: &FingerprintVector) -> DriftScore {
    let mut differing = 0.0;
    let mut considered = 0.0;

    for kind in AttributeKind::ALL {
        let weight = kind.weight();
        match (&a.slots[kind.index()], &b.slots[kind.index()]) {
            (Some(x), Some(y)) => {
                considered += weight;
                if !constant_time_eq_arrays(x, y) {
                    differing += weight;
                }
            }
            (Some(_), None) | (None, Some(_)) => {
                considered += weight;
                differing += weight * 0.5;
            }
            (None, None) => {}
        }
    }

    if considered == 0.0 {
        return DriftScore::NONE;
    }
    DriftScore::new(differing / considered)
}
