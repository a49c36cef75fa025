//! # Behaviors: the pluggable per-target strategy.
//!
//! A behavior parameterizes how a target's signals are interpreted and what
//! side effects bracket a toggle half-cycle. The dispatcher calls exactly
//! four operations:
//!
//! ```text
//! init()                  once, before the loop begins
//! before()                on entry to every outer cycle
//! verify(conn, signal)    once per received signal; false = discard
//! after()                 once a forward transition succeeded (toggle only)
//! ```
//!
//! Behaviors are selected by name through the [`BehaviorRegistry`] — a
//! compiled-in registry of factories instead of dynamically loaded modules,
//! which removes an entire class of load-time failure. One instance is
//! created per target; instances are never shared.
//!
//! Built-ins:
//! - [`AcceptAll`] — pass-through gate
//! - [`SessionLock`] — accept `(Un)Lock` signals for the caller's own logind
//!   session only
//! - [`SleepInhibit`] — gate on `PrepareForSleep` and hold a logind delay
//!   inhibitor while armed

mod accept;
mod logind;
mod registry;
mod session_lock;
mod sleep_inhibit;

use std::sync::Arc;

use async_trait::async_trait;
use zbus::Connection;

use crate::bus::Signal;

pub use accept::AcceptAll;
pub use registry::BehaviorRegistry;
pub use session_lock::SessionLock;
pub use sleep_inhibit::SleepInhibit;

/// Shared handle to a behavior instance.
pub type BehaviorRef = Arc<dyn Behavior>;

/// # Per-target strategy with a fixed capability set.
///
/// No operation returns an error to the core: failures inside a behavior are
/// the behavior's own responsibility (the core does not retry or sandbox
/// them). `verify` may issue queries over the same connection the signal
/// arrived on, but must not block indefinitely.
#[async_trait]
pub trait Behavior: Send + Sync + 'static {
    /// One-time setup before the dispatch loop begins.
    async fn init(&self, conn: &Connection) {
        let _ = conn;
    }

    /// Decision gate: `false` means "not my signal, discard".
    async fn verify(&self, conn: &Connection, signal: &Signal) -> bool;

    /// Side-effecting hook at the start of every outer cycle.
    async fn before(&self) {}

    /// Side-effecting hook after a forward transition, before the reverse wait.
    async fn after(&self) {}

    /// Registry name of this behavior (for logs).
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}
