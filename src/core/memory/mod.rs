/*!
Memory handling for secret material.

Shared secrets and signal keys are held in zero-on-drop containers with
redacted `Debug` output.
*/

pub mod secret;

pub use secret::{SecretBytes, SecretKey32};
