/*!
Security components of the validation path.

Constant-time comparison, the anti-replay sequencer and the anomaly
detector.
*/

// Anomaly scoring with lazy decay
pub mod anomaly;

// Constant-time operations to prevent timing attacks
pub mod constant_time;

// Per-session replay ledger
pub mod replay;

// Re-export main components
pub use anomaly::{AnomalyDetector, AnomalyEvent, AnomalyScore};
pub use constant_time::{constant_time_eq, constant_time_eq_arrays};
pub use replay::{Admission, ReplayLedger};
