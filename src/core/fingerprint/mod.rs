/*!
Hardware fingerprinting.

Collects semi-stable device attributes, hashes them into a fixed-length
vector, and scores drift between two vectors.
*/

pub mod provider;
pub mod sources;
pub mod vector;

pub use provider::{FingerprintProvider, TrustLevel, assess_trust};
pub use sources::{AttributeSource, StaticSource};
pub use vector::{AttributeKind, DriftScore, FingerprintBinding, FingerprintVector, compare_drift};
