//! # Unit transitions against the service manager.
//!
//! This module provides the types around a single unit transition:
//! - [`Direction`] / [`Scope`] — which way a unit is driven and against which
//!   manager instance
//! - [`UnitBackend`] — trait seam for issuing a transition and blocking until
//!   the job resolves
//! - [`SystemdBackend`] — the real implementation speaking to
//!   `org.freedesktop.systemd1` over D-Bus

mod controller;
mod proxy;
mod types;

pub use controller::{SystemdBackend, UnitBackend};
pub use types::{Direction, Scope};
