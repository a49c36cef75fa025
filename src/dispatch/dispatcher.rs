//! # TargetDispatcher: per-target listening loop and toggle state machine.
//!
//! One dispatcher owns one bus connection, one behavior instance and one
//! inbound signal channel, and drives the unit through transitions:
//!
//! ```text
//! Init ──► Before ──► AwaitSignal(forward) ──► Transitioning(forward)
//!            ▲                                      │
//!            │ (toggle)                             ├─ toggle=false ──► AwaitSignal(forward)
//!            │                                      ▼
//!            └── Transitioning(reverse) ◄── AwaitSignal(reverse) ◄── AfterHook
//! ```
//!
//! ## Rules
//! - `init()` runs once; `before()` runs on entry to every outer cycle. For a
//!   non-toggling target the loop returns straight to the forward wait, so
//!   `before()`/`after()` are **not** re-invoked.
//! - Rejected signals are discarded with **no** side effects and no log line.
//! - A failed transition is published and the machine proceeds as though the
//!   cycle completed; the dispatcher never halts on a transition failure.
//! - Two consecutive jobs in the same direction never happen without an
//!   intervening verified signal (by construction of the loop).
//! - At most one in-flight transition per target.
//!
//! ## Exit conditions
//! - the runtime token is cancelled (shutdown), or
//! - the signal channel closes (transport stream ended; no reconnection).

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use zbus::Connection;

use crate::behavior::BehaviorRef;
use crate::bus::Signal;
use crate::config::TargetConfig;
use crate::events::{Bus, Event, EventKind};
use crate::unit::{Direction, UnitBackend};

/// Per-target control loop.
pub struct TargetDispatcher {
    config: TargetConfig,
    conn: Connection,
    signals: mpsc::Receiver<Signal>,
    behavior: BehaviorRef,
    backend: Arc<dyn UnitBackend>,
    bus: Bus,
}

impl TargetDispatcher {
    /// Creates a dispatcher over an already-subscribed signal channel.
    pub fn new(
        config: TargetConfig,
        conn: Connection,
        signals: mpsc::Receiver<Signal>,
        behavior: BehaviorRef,
        backend: Arc<dyn UnitBackend>,
        bus: Bus,
    ) -> Self {
        Self {
            config,
            conn,
            signals,
            behavior,
            backend,
            bus,
        }
    }

    /// Runs the dispatch loop until cancellation or loss of the signal stream.
    pub async fn run(mut self, token: CancellationToken) {
        self.behavior.init(&self.conn).await;
        self.bus
            .publish(Event::new(EventKind::Listening).with_target(&*self.config.name));

        let forward = self.config.forward();
        self.behavior.before().await;

        loop {
            if self.next_accepted(&token).await.is_none() {
                break;
            }
            self.transition(forward).await;

            if !self.config.toggle {
                continue;
            }

            self.behavior.after().await;
            if self.next_accepted(&token).await.is_none() {
                break;
            }
            self.transition(forward.reverse()).await;
            self.behavior.before().await;
        }

        self.bus
            .publish(Event::new(EventKind::DispatcherStopped).with_target(&*self.config.name));
    }

    /// Waits for the next signal the behavior accepts.
    ///
    /// Returns `None` on cancellation or when the signal channel closes.
    async fn next_accepted(&mut self, token: &CancellationToken) -> Option<Signal> {
        loop {
            let signal = tokio::select! {
                _ = token.cancelled() => return None,
                signal = self.signals.recv() => signal?,
            };
            if self.behavior.verify(&self.conn, &signal).await {
                self.bus
                    .publish(Event::new(EventKind::SignalAccepted).with_target(&*self.config.name));
                return Some(signal);
            }
        }
    }

    /// Issues one transition and publishes the outcome.
    async fn transition(&self, direction: Direction) {
        let result = self
            .backend
            .transition(&self.config.name, direction, self.config.scope)
            .await;
        match result {
            Ok(()) => {
                self.bus.publish(
                    Event::new(EventKind::TransitionSucceeded)
                        .with_target(&*self.config.name)
                        .with_direction(direction),
                );
            }
            Err(e) => {
                self.bus.publish(
                    Event::new(EventKind::TransitionFailed)
                        .with_target(&*self.config.name)
                        .with_direction(direction)
                        .with_reason(format!("{}: {}", e.as_label(), e)),
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::behavior::Behavior;
    use crate::error::TransitionError;
    use crate::test_support::p2p_connection;
    use crate::unit::Scope;

    use async_trait::async_trait;
    use std::collections::{HashMap, VecDeque};
    use std::sync::Mutex;
    use std::time::Duration;
    use tokio::sync::broadcast;

    /// Behavior that records hook calls and accepts only the "Go" member.
    #[derive(Default)]
    struct ScriptedGate {
        calls: Mutex<Vec<&'static str>>,
    }

    #[async_trait]
    impl Behavior for ScriptedGate {
        async fn init(&self, _conn: &Connection) {
            self.calls.lock().unwrap().push("init");
        }

        async fn verify(&self, _conn: &Connection, signal: &Signal) -> bool {
            self.calls.lock().unwrap().push("verify");
            signal.member().as_deref() == Some("Go")
        }

        async fn before(&self) {
            self.calls.lock().unwrap().push("before");
        }

        async fn after(&self) {
            self.calls.lock().unwrap().push("after");
        }
    }

    /// Backend that records calls and pops scripted results (default `Ok`).
    #[derive(Default)]
    struct RecordingBackend {
        calls: Mutex<Vec<(String, Direction, Scope)>>,
        results: Mutex<VecDeque<Result<(), TransitionError>>>,
    }

    #[async_trait]
    impl UnitBackend for RecordingBackend {
        async fn transition(
            &self,
            unit: &str,
            direction: Direction,
            scope: Scope,
        ) -> Result<(), TransitionError> {
            self.calls
                .lock()
                .unwrap()
                .push((unit.to_string(), direction, scope));
            self.results.lock().unwrap().pop_front().unwrap_or(Ok(()))
        }
    }

    fn signal(member: &str) -> Signal {
        let msg = zbus::Message::signal("/test", "org.test.Dispatch", member)
            .unwrap()
            .build(&())
            .unwrap();
        Signal::new(msg)
    }

    fn target(name: &str, toggle: bool, start: bool, scope: Scope) -> TargetConfig {
        TargetConfig {
            name: name.into(),
            behavior: "scripted".into(),
            toggle,
            start,
            scope,
            match_options: HashMap::new(),
        }
    }

    struct Harness {
        tx: mpsc::Sender<Signal>,
        events: broadcast::Receiver<Event>,
        gate: Arc<ScriptedGate>,
        backend: Arc<RecordingBackend>,
        token: CancellationToken,
        task: tokio::task::JoinHandle<()>,
        _peer: Connection,
    }

    impl Harness {
        async fn spawn(config: TargetConfig, results: Vec<Result<(), TransitionError>>) -> Self {
            let (conn, peer) = p2p_connection().await;
            let (tx, rx) = mpsc::channel(8);
            let gate = Arc::new(ScriptedGate::default());
            let backend = Arc::new(RecordingBackend {
                calls: Mutex::new(Vec::new()),
                results: Mutex::new(results.into_iter().collect()),
            });
            let bus = Bus::new(64);
            let events = bus.subscribe();
            let token = CancellationToken::new();
            let dispatcher = TargetDispatcher::new(
                config,
                conn,
                rx,
                gate.clone() as BehaviorRef,
                backend.clone() as Arc<dyn UnitBackend>,
                bus,
            );
            let task = tokio::spawn(dispatcher.run(token.clone()));
            Self {
                tx,
                events,
                gate,
                backend,
                token,
                task,
                _peer: peer,
            }
        }

        /// Receives events until one of `kind` arrives (1s timeout).
        async fn expect_event(&mut self, kind: EventKind) -> Event {
            tokio::time::timeout(Duration::from_secs(1), async {
                loop {
                    let ev = self.events.recv().await.expect("event bus closed");
                    if ev.kind == kind {
                        return ev;
                    }
                }
            })
            .await
            .unwrap_or_else(|_| panic!("timed out waiting for {kind:?}"))
        }

        /// Cancels the loop and joins the dispatcher task.
        async fn finish(self) {
            self.token.cancel();
            tokio::time::timeout(Duration::from_secs(1), self.task)
                .await
                .expect("dispatcher did not stop")
                .expect("dispatcher task panicked");
        }

        fn hook_calls(&self) -> Vec<&'static str> {
            self.gate.calls.lock().unwrap().clone()
        }

        fn backend_calls(&self) -> Vec<(String, Direction, Scope)> {
            self.backend.calls.lock().unwrap().clone()
        }
    }

    #[tokio::test]
    async fn test_rejected_signals_cause_no_transition() {
        let mut h = Harness::spawn(target("lock.target", false, true, Scope::User), vec![]).await;
        h.expect_event(EventKind::Listening).await;

        h.tx.send(signal("Skip")).await.unwrap();
        h.tx.send(signal("Skip")).await.unwrap();
        // The accepted signal proves the rejected ones were processed first
        // (per-channel FIFO) without triggering anything.
        h.tx.send(signal("Go")).await.unwrap();
        h.expect_event(EventKind::TransitionSucceeded).await;

        assert_eq!(
            h.backend_calls(),
            vec![("lock.target".to_string(), Direction::Start, Scope::User)]
        );
        h.finish().await;
    }

    #[tokio::test]
    async fn test_non_toggle_loops_without_rearming_hooks() {
        let mut h = Harness::spawn(target("lock.target", false, true, Scope::User), vec![]).await;
        h.expect_event(EventKind::Listening).await;

        h.tx.send(signal("Go")).await.unwrap();
        h.expect_event(EventKind::TransitionSucceeded).await;
        h.tx.send(signal("Go")).await.unwrap();
        h.expect_event(EventKind::TransitionSucceeded).await;

        // Each accepted signal produced exactly one forward transition.
        assert_eq!(
            h.backend_calls(),
            vec![
                ("lock.target".to_string(), Direction::Start, Scope::User),
                ("lock.target".to_string(), Direction::Start, Scope::User),
            ]
        );
        // init and before exactly once; after never.
        let hooks = h.hook_calls();
        assert_eq!(hooks.iter().filter(|c| **c == "init").count(), 1);
        assert_eq!(hooks.iter().filter(|c| **c == "before").count(), 1);
        assert_eq!(hooks.iter().filter(|c| **c == "after").count(), 0);
        h.finish().await;
    }

    #[tokio::test]
    async fn test_stop_direction_target_issues_stop_jobs() {
        let mut h = Harness::spawn(target("idle.target", false, false, Scope::System), vec![]).await;
        h.expect_event(EventKind::Listening).await;

        h.tx.send(signal("Go")).await.unwrap();
        h.expect_event(EventKind::TransitionSucceeded).await;

        assert_eq!(
            h.backend_calls(),
            vec![("idle.target".to_string(), Direction::Stop, Scope::System)]
        );
        h.finish().await;
    }

    #[tokio::test]
    async fn test_toggle_alternates_directions_and_brackets_hooks() {
        let mut h = Harness::spawn(target("sleep.target", true, true, Scope::System), vec![]).await;
        h.expect_event(EventKind::Listening).await;

        // Forward half-cycle.
        h.tx.send(signal("Go")).await.unwrap();
        let ev = h.expect_event(EventKind::TransitionSucceeded).await;
        assert_eq!(ev.direction, Some(Direction::Start));

        // Reverse half-cycle.
        h.tx.send(signal("Go")).await.unwrap();
        let ev = h.expect_event(EventKind::TransitionSucceeded).await;
        assert_eq!(ev.direction, Some(Direction::Stop));

        // Next cycle starts again with a forward transition.
        h.tx.send(signal("Go")).await.unwrap();
        let ev = h.expect_event(EventKind::TransitionSucceeded).await;
        assert_eq!(ev.direction, Some(Direction::Start));

        // Join the loop first; the hook calls after the last transition have
        // no observable event to wait on.
        let gate = h.gate.clone();
        let backend = h.backend.clone();
        h.finish().await;

        let directions: Vec<Direction> = backend
            .calls
            .lock()
            .unwrap()
            .iter()
            .map(|(_, d, _)| *d)
            .collect();
        assert_eq!(
            directions,
            vec![Direction::Start, Direction::Stop, Direction::Start]
        );

        // Hook bracketing across one and a half toggle cycles.
        assert_eq!(
            *gate.calls.lock().unwrap(),
            vec!["init", "before", "verify", "after", "verify", "before", "verify", "after"]
        );
    }

    #[tokio::test]
    async fn test_failed_transition_keeps_the_dispatcher_running() {
        let mut h = Harness::spawn(
            target("lock.target", false, true, Scope::User),
            vec![Err(TransitionError::JobFailed {
                result: "failed".into(),
            })],
        )
        .await;
        h.expect_event(EventKind::Listening).await;

        h.tx.send(signal("Go")).await.unwrap();
        let ev = h.expect_event(EventKind::TransitionFailed).await;
        assert_eq!(ev.direction, Some(Direction::Start));
        let reason = ev.reason.as_deref().unwrap();
        assert!(reason.starts_with("job_failed:"), "reason = {reason:?}");
        assert!(reason.contains("failed"));

        // Still listening: the next accepted signal transitions again.
        h.tx.send(signal("Go")).await.unwrap();
        h.expect_event(EventKind::TransitionSucceeded).await;
        assert_eq!(h.backend_calls().len(), 2);
        h.finish().await;
    }

    #[tokio::test]
    async fn test_cancellation_stops_the_loop() {
        let mut h = Harness::spawn(target("lock.target", false, true, Scope::User), vec![]).await;
        h.expect_event(EventKind::Listening).await;

        h.token.cancel();
        h.expect_event(EventKind::DispatcherStopped).await;
        assert!(h.backend_calls().is_empty());
        let _ = tokio::time::timeout(Duration::from_secs(1), h.task).await;
    }

    #[tokio::test]
    async fn test_closed_signal_channel_stops_the_loop() {
        let mut h = Harness::spawn(target("lock.target", false, true, Scope::User), vec![]).await;
        h.expect_event(EventKind::Listening).await;

        drop(std::mem::replace(&mut h.tx, mpsc::channel(1).0));
        h.expect_event(EventKind::DispatcherStopped).await;
        h.finish().await;
    }
}
