//! # dbus-systemd-dispatcher
//!
//! A daemon that bridges D-Bus signals to systemd unit lifecycle changes:
//! each configured *target* listens for matching bus signals, verifies them
//! through a pluggable behavior, and starts or stops its unit in response.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!     ┌───────────────┐   ┌───────────────┐   ┌───────────────┐
//!     │ TargetConfig  │   │ TargetConfig  │   │ TargetConfig  │
//!     │ (lock.target) │   │ (sleep.target)│   │     (...)     │
//!     └──────┬────────┘   └──────┬────────┘   └──────┬────────┘
//!            ▼                   ▼                   ▼
//! ┌──────────────────────────────────────────────────────────────────┐
//! │  Orchestrator (runtime)                                          │
//! │  - Bus (broadcast events)                                        │
//! │  - AliveTracker (which dispatchers are still running)            │
//! │  - SubscriberSet (fans out to subscribers)                       │
//! │  - BehaviorRegistry (name → behavior factory)                    │
//! └──────┬───────────────────┬───────────────────┬───────────────────┘
//!        ▼                   ▼                   ▼
//!  ┌───────────────┐   ┌───────────────┐   ┌───────────────┐
//!  │TargetDispatcher│  │TargetDispatcher│  │TargetDispatcher│
//!  │ (signal loop) │   │ (signal loop) │   │ (signal loop) │
//!  └┬──────────────┘   └┬──────────────┘   └┬──────────────┘
//!   │ bus session       │                   │
//!   │ + match rule      │                   │
//!   ▼                   ▼                   ▼
//!  D-Bus signals ─► verify() gate ─► UnitBackend::transition()
//!                                      (StartUnit/StopUnit, await
//!                                       JobRemoved, "done" = success)
//! ```
//!
//! ### Per-target lifecycle
//! ```text
//! TargetConfig ──► Orchestrator ──► TargetDispatcher::run()
//!
//! init()                      (once)
//! before()                    (arm forward edge)
//! loop {
//!   ├─► await signal, verify()   (rejected signals are discarded silently)
//!   ├─► transition(forward)      (failure logged, loop continues)
//!   ├─ toggle=false ─► continue  (before/after not re-invoked)
//!   ├─► after()
//!   ├─► await signal, verify()
//!   ├─► transition(reverse)
//!   └─► before()
//! }
//! exit: runtime token cancelled, or signal stream lost (no reconnection)
//! ```
//!
//! ## Features
//! | Area           | Description                                             | Key types / traits                 |
//! |----------------|---------------------------------------------------------|------------------------------------|
//! | **Dispatch**   | Per-target signal loop and runtime orchestration.       | [`TargetDispatcher`], [`Orchestrator`] |
//! | **Behaviors**  | Pluggable verification and transition hooks.            | [`Behavior`], [`BehaviorRegistry`] |
//! | **Units**      | Service-manager job submission and completion waiting.  | [`UnitBackend`], [`SystemdBackend`] |
//! | **Bus**        | Exclusive per-target connections and match rules.       | [`BusConnection`], [`Signal`]      |
//! | **Config**     | Layered YAML files on an XDG search path.               | [`TargetConfig`], [`Settings`]     |
//! | **Events**     | Observability surface consumed by subscribers.          | [`Event`], [`Subscribe`]           |
//! | **Errors**     | Typed startup, bus, transition and runtime errors.      | [`StartupError`], [`TransitionError`] |

mod behavior;
mod bus;
mod config;
mod dispatch;
mod error;
mod events;
mod subscribers;
mod unit;

#[cfg(test)]
pub(crate) mod test_support;

pub use behavior::{AcceptAll, Behavior, BehaviorRef, BehaviorRegistry, SessionLock, SleepInhibit};
pub use bus::{BusConnection, Signal};
pub use config::{load, SearchPath, Settings, TargetConfig, CONFIG_SUBDIR};
pub use dispatch::{Orchestrator, TargetDispatcher};
pub use error::{BusError, RuntimeError, StartupError, TransitionError};
pub use events::{Bus, Event, EventKind};
pub use subscribers::{AliveTracker, LogWriter, Subscribe, SubscriberSet};
pub use unit::{Direction, Scope, SystemdBackend, UnitBackend};
