/*!
Rotating signals and the digest engine that produces them.
*/

pub mod digest;
pub mod types;

pub use types::{SessionId, Signal, SignalDigest, SignalKey};
