//! # Dispatch core: per-target loops and the orchestrator around them.
//!
//! - [`TargetDispatcher`] — the listening loop, verify gate and toggle state
//!   machine for one target
//! - [`Orchestrator`] — spawns dispatchers, wires event delivery and drives
//!   graceful shutdown
//! - [`shutdown`] — OS termination-signal helper

mod dispatcher;
mod orchestrator;
pub(crate) mod shutdown;

pub use dispatcher::TargetDispatcher;
pub use orchestrator::Orchestrator;
