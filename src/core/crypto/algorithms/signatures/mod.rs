/*!
Signature algorithm implementations.
*/

mod dilithium;

pub use dilithium::{DilithiumSigner, verify_detached};

use crate::core::crypto::traits::signature::Signer;
use crate::core::crypto::types::SignatureAlgorithm;

/// Create a signer with a freshly generated identity for the specified algorithm
pub fn create_signer(algorithm: SignatureAlgorithm) -> Box<dyn Signer> {
    match algorithm {
        SignatureAlgorithm::Dilithium2
        | SignatureAlgorithm::Dilithium3
        | SignatureAlgorithm::Dilithium5 => Box::new(DilithiumSigner::generate(algorithm)),
    }
}
