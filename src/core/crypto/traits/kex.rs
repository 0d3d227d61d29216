/*!
Traits for key agreement operations.
*/

use crate::core::crypto::types::KeyAgreementAlgorithm;
use crate::core::error::Result;
use crate::core::memory::SecretBytes;

/// Outcome of a one-shot server-side negotiation
#[derive(Debug)]
pub struct Negotiated {
    /// Shared secret, held exclusively by the runtime for the session lifetime
    pub shared_secret: SecretBytes,
    /// KEM ciphertext the client decapsulates to recover the same secret
    pub ciphertext: Vec<u8>,
}

/// Trait for key agreement operations
pub trait KeyAgreement: Send + Sync {
    /// Get the current algorithm
    fn algorithm(&self) -> KeyAgreementAlgorithm;

    /// Generate a key pair (client side); returns `(public_key, secret_key)`
    fn generate_keypair(&self) -> Result<(Vec<u8>, SecretBytes)>;

    /// Establish a shared secret against the client's public key (server side)
    fn negotiate(&self, client_public_key: &[u8]) -> Result<Negotiated>;

    /// Recover the shared secret from the server's ciphertext (client side)
    fn decapsulate(&self, ciphertext: &[u8], secret_key: &SecretBytes) -> Result<SecretBytes>;

    /// Get the public key size for this algorithm
    fn public_key_size(&self) -> usize;

    /// Get the ciphertext size for this algorithm
    fn ciphertext_size(&self) -> usize;
}
