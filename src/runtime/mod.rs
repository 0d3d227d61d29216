/*!
Concurrent runtime facade.

Wraps per-session logic from [`crate::core::session`] in a sharded
registry and exposes the operations the OAuth compatibility layer calls.
*/

pub mod builder;
pub mod facade;
pub mod registry;
pub mod stats;
pub mod sweeper;

pub use builder::SignalRuntimeBuilder;
pub use facade::SignalRuntime;
pub use registry::{SessionHandle, SessionRegistry, SweepReport};
pub use stats::{RuntimeStats, StatsSnapshot};
pub use sweeper::SweeperHandle;
