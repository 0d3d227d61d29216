/*!
Capability interfaces over the post-quantum primitives.

The runtime only ever talks to these traits; concrete algorithm families are
selected once, when the runtime is constructed.
*/

pub mod kex;
pub mod signature;

// Re-export core traits for easier access
pub use kex::{KeyAgreement, Negotiated};
pub use signature::Signer;
