//! # Stateful subscriber tracking which dispatchers are still running.
//!
//! [`AliveTracker`] maintains an in-memory set of active target names from
//! [`EventKind::Listening`] and [`EventKind::DispatcherStopped`] events. The
//! orchestrator consults it during shutdown to name the dispatchers that did
//! not stop within the grace period.

use std::collections::BTreeSet;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;

use crate::events::{Event, EventKind};

use super::Subscribe;

/// Tracks currently running dispatchers by target name.
///
/// Thread-safe and cloneable; clones share the same internal state.
#[derive(Clone, Default)]
pub struct AliveTracker {
    inner: Arc<RwLock<BTreeSet<String>>>,
}

impl AliveTracker {
    /// Creates a new, empty tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a sorted snapshot of targets whose dispatchers are running.
    pub fn snapshot(&self) -> Vec<String> {
        match self.inner.read() {
            Ok(guard) => guard.iter().cloned().collect(),
            Err(poisoned) => poisoned.into_inner().iter().cloned().collect(),
        }
    }
}

#[async_trait]
impl Subscribe for AliveTracker {
    async fn on_event(&self, event: &Event) {
        let Some(target) = event.target.as_deref() else {
            return;
        };
        let mut guard = match self.inner.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        match event.kind {
            EventKind::Listening => {
                guard.insert(target.to_string());
            }
            EventKind::DispatcherStopped => {
                guard.remove(target);
            }
            _ => {}
        }
    }

    fn name(&self) -> &'static str {
        "alive"
    }
}
