//! # Runtime events emitted by the orchestrator and dispatchers.
//!
//! [`EventKind`] classifies what happened; [`Event`] carries the metadata
//! (timestamp, sequence, target, direction, reason). Events are the
//! observability surface of the daemon: subscribers turn them into log lines
//! or metrics, and tests assert on them.
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases
//! monotonically; use it to restore order when events are observed out of
//! band.

use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::sync::Arc;
use std::time::SystemTime;

use crate::unit::Direction;

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of runtime events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Dispatcher lifecycle ===
    /// A dispatcher registered its match and entered the listening loop.
    ///
    /// Sets: `target`.
    Listening,

    /// A received signal passed the behavior's verify gate.
    ///
    /// Sets: `target`.
    SignalAccepted,

    /// A transition job resolved with the `"done"` token.
    ///
    /// Sets: `target`, `direction`.
    TransitionSucceeded,

    /// A transition failed (non-`"done"` token or RPC error).
    ///
    /// Sets: `target`, `direction`, `reason`.
    TransitionFailed,

    /// A dispatcher's loop ended (cancellation or lost signal stream).
    ///
    /// Sets: `target`, optionally `reason`.
    DispatcherStopped,

    // === Shutdown ===
    /// Shutdown requested (OS signal observed).
    ShutdownRequested,

    /// All dispatchers stopped within the configured grace period.
    AllStoppedWithin,

    /// Grace period exceeded; some dispatchers did not stop in time.
    GraceExceeded,
}

/// Runtime event with optional metadata.
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,
    /// Name of the target (unit), if applicable.
    pub target: Option<Arc<str>>,
    /// Transition direction, if applicable.
    pub direction: Option<Direction>,
    /// Human-readable reason (failure details etc.).
    pub reason: Option<Arc<str>>,
}

impl Event {
    /// Creates a new event of the given kind with the current timestamp and
    /// next sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            target: None,
            direction: None,
            reason: None,
        }
    }

    /// Attaches a target name.
    #[inline]
    pub fn with_target(mut self, target: impl Into<Arc<str>>) -> Self {
        self.target = Some(target.into());
        self
    }

    /// Attaches a transition direction.
    #[inline]
    pub fn with_direction(mut self, direction: Direction) -> Self {
        self.direction = Some(direction);
        self
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Target name or `"-"` for log formatting.
    #[inline]
    pub fn target_str(&self) -> &str {
        self.target.as_deref().unwrap_or("-")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sequence_is_monotonic() {
        let a = Event::new(EventKind::Listening);
        let b = Event::new(EventKind::Listening);
        assert!(b.seq > a.seq);
    }

    #[test]
    fn test_builders_attach_metadata() {
        let ev = Event::new(EventKind::TransitionFailed)
            .with_target("sleep.target")
            .with_direction(Direction::Start)
            .with_reason("failed");
        assert_eq!(ev.target.as_deref(), Some("sleep.target"));
        assert_eq!(ev.direction, Some(Direction::Start));
        assert_eq!(ev.reason.as_deref(), Some("failed"));
    }
}
