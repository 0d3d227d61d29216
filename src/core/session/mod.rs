/*!
Session management for the signal runtime.

This module contains the per-session state machine and everything a
session hands out or exports: grants, binding records and audit records.
*/

pub mod binding;
pub mod grant;
pub mod record;
pub mod session;
pub mod state;
pub mod verdict;
pub mod window;

pub use binding::{BindingRecord, hash_public_key};
pub use grant::{RefreshGrant, SessionGrant};
pub use record::SessionRecord;
pub use session::{Establishment, SessionPolicy, SignalSession};
pub use state::{RevocationReason, SessionState, StateManager};
pub use verdict::{Acceptance, Verdict};
pub use window::{EpochClock, ValidityWindow};
