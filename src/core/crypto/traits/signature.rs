/*!
Traits for signature operations.

Signatures authenticate the one-time binding record produced at issuance.
They are never computed on the per-request validation path.
*/

use crate::core::crypto::types::SignatureAlgorithm;
use crate::core::error::Result;

/// Trait for signature operations backed by a held signing key
pub trait Signer: Send + Sync {
    /// Get the current algorithm
    fn algorithm(&self) -> SignatureAlgorithm;

    /// Verification key matching the held signing key
    fn public_key(&self) -> &[u8];

    /// Sign data with the held signing key
    fn sign(&self, payload: &[u8]) -> Result<Vec<u8>>;

    /// Verify a detached signature against an arbitrary verification key
    fn verify(&self, payload: &[u8], signature: &[u8], public_key: &[u8]) -> bool;

    /// Get the signature size for this algorithm
    fn signature_size(&self) -> usize;
}
