/*!
Key agreement algorithm implementations.
*/

mod kyber;

pub use kyber::KyberKeyAgreement;

use crate::core::crypto::traits::kex::KeyAgreement;
use crate::core::crypto::types::KeyAgreementAlgorithm;

/// Create a key agreement implementation for the specified algorithm
pub fn create_key_agreement(algorithm: KeyAgreementAlgorithm) -> Box<dyn KeyAgreement> {
    match algorithm {
        KeyAgreementAlgorithm::Kyber512
        | KeyAgreementAlgorithm::Kyber768
        | KeyAgreementAlgorithm::Kyber1024 => Box::new(KyberKeyAgreement::new(algorithm)),
    }
}
