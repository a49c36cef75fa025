//! # Orchestrator: startup, fan-out delivery, and graceful shutdown.
//!
//! The [`Orchestrator`] owns the event bus, the subscribers, the behavior
//! registry and global [`Settings`]. It spawns one [`TargetDispatcher`] per
//! configured target, handles OS termination signals, and enforces the
//! shutdown grace period.
//!
//! ## High-level architecture
//! ```text
//! Inputs to run():
//!   Vec<TargetConfig>  ──►  Orchestrator::run(targets)
//!
//! Preparation:
//!   - subscriber_listener(): Bus.subscribe() ─► SubscriberSet::emit(&Event)
//!
//! Per target (all-or-nothing; the first failure aborts startup):
//!   registry.resolve(target)            → fresh behavior instance
//!   BusConnection::connect(System)      → exclusive bus session
//!   .subscribe(match_options, queue)    → bounded signal channel
//!   TargetDispatcher::new(..)           → set.spawn(run(child_token))
//!
//! Event flow:
//!   Dispatcher ── publish(Event) ──► Bus ──► listener ──► SubscriberSet
//!
//! Shutdown path:
//!   shutdown::wait_for_shutdown_signal()
//!             └─► Bus.publish(ShutdownRequested)
//!             └─► runtime_token.cancel()   → propagates to child tokens
//!             └─► wait_all_with_grace(settings.grace):
//!                    ├─ Ok (all joined)    → Bus.publish(AllStoppedWithin)
//!                    └─ Timeout exceeded   → Bus.publish(GraceExceeded)
//!                                            (AliveTracker names the stuck)
//!             └─► stop the listener, which drains the remaining published
//!                 events and awaits the subscriber workers before run()
//!                 returns, so the final events reach the sinks
//! ```
//!
//! ## Rules
//! - Signal subscriptions always go through the system bus; a target's
//!   `scope` selects only the service-manager instance transitions are
//!   requested against.
//! - Readiness is reported to the service manager (`READY=1`) only after
//!   every dispatcher has been spawned.

use std::sync::Arc;

use tokio::sync::broadcast::error::{RecvError, TryRecvError};
use tokio::task::{JoinHandle, JoinSet};
use tokio_util::sync::CancellationToken;

use crate::behavior::BehaviorRegistry;
use crate::bus::BusConnection;
use crate::config::{Settings, TargetConfig};
use crate::dispatch::{shutdown, TargetDispatcher};
use crate::error::{RuntimeError, StartupError};
use crate::events::{Bus, Event, EventKind};
use crate::subscribers::{AliveTracker, Subscribe, SubscriberSet};
use crate::unit::{Scope, SystemdBackend, UnitBackend};

/// Coordinates dispatchers, event delivery, and graceful shutdown.
pub struct Orchestrator {
    /// Global runtime settings.
    pub settings: Settings,
    /// Event bus shared with all dispatchers.
    pub bus: Bus,
    /// Subscribers handed to the listener task on every run.
    subscribers: Vec<Arc<dyn Subscribe>>,
    /// Tracks running dispatchers for the final shutdown snapshot.
    alive: AliveTracker,
    /// Behavior registry consulted once per target at startup.
    registry: BehaviorRegistry,
    /// Unit backend shared by all dispatchers.
    backend: Arc<dyn UnitBackend>,
}

impl Orchestrator {
    /// Creates an orchestrator with the given settings and subscribers.
    ///
    /// An [`AliveTracker`] is added to the subscribers automatically; unit
    /// transitions go through the systemd backend.
    pub fn new(
        settings: Settings,
        subscribers: Vec<Arc<dyn Subscribe>>,
        registry: BehaviorRegistry,
    ) -> Self {
        Self::with_backend(settings, subscribers, registry, Arc::new(SystemdBackend))
    }

    /// Creates an orchestrator over a custom unit backend.
    pub fn with_backend(
        settings: Settings,
        mut subscribers: Vec<Arc<dyn Subscribe>>,
        registry: BehaviorRegistry,
        backend: Arc<dyn UnitBackend>,
    ) -> Self {
        let bus = Bus::new(settings.bus_capacity);
        let alive = AliveTracker::new();
        subscribers.push(Arc::new(alive.clone()));
        Self {
            settings,
            bus,
            subscribers,
            alive,
            registry,
            backend,
        }
    }

    /// Runs the configured targets until either:
    /// - all dispatchers exit on their own (lost signal streams), or
    /// - a termination signal arrives → graceful shutdown (may end with
    ///   [`RuntimeError::GraceExceeded`]).
    ///
    /// Startup is all-or-nothing: the first target that fails to set up
    /// cancels whatever was already spawned and aborts with the error.
    pub async fn run(&self, targets: Vec<TargetConfig>) -> Result<(), RuntimeError> {
        let token = CancellationToken::new();
        let listener_stop = CancellationToken::new();
        let listener = self.subscriber_listener(listener_stop.clone());

        let mut set = JoinSet::new();
        let result = match self.spawn_dispatchers(&mut set, &token, targets).await {
            Ok(()) => {
                notify_ready();
                self.drive_shutdown(&mut set, &token).await
            }
            Err(err) => {
                token.cancel();
                while set.join_next().await.is_some() {}
                Err(err.into())
            }
        };

        // Everything is published by now; let the listener drain and the
        // subscriber workers finish before returning.
        listener_stop.cancel();
        let _ = listener.await;
        result
    }

    /// Spawns the listener task that owns the subscriber set.
    ///
    /// The listener forwards bus events until `stop` fires, then delivers
    /// whatever was already published and shuts the set down (draining the
    /// per-subscriber queues).
    fn subscriber_listener(&self, stop: CancellationToken) -> JoinHandle<()> {
        let mut rx = self.bus.subscribe();
        let set = SubscriberSet::new(self.subscribers.clone());
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = stop.cancelled() => break,
                    next = rx.recv() => match next {
                        Ok(ev) => set.emit(&ev),
                        Err(RecvError::Lagged(missed)) => {
                            tracing::warn!(missed, "event listener lagged; events skipped");
                        }
                        Err(RecvError::Closed) => break,
                    },
                }
            }
            loop {
                match rx.try_recv() {
                    Ok(ev) => set.emit(&ev),
                    Err(TryRecvError::Lagged(_)) => continue,
                    Err(_) => break,
                }
            }
            set.shutdown().await;
        })
    }

    /// Resolves, connects and spawns one dispatcher per target.
    async fn spawn_dispatchers(
        &self,
        set: &mut JoinSet<()>,
        runtime_token: &CancellationToken,
        targets: Vec<TargetConfig>,
    ) -> Result<(), StartupError> {
        for target in targets {
            let behavior = self.registry.resolve(&target)?;
            let bus_conn = BusConnection::connect(Scope::System)
                .await
                .map_err(|source| StartupError::Bus {
                    target: target.name.clone(),
                    source,
                })?;
            let signals = bus_conn
                .subscribe(&target.match_options, self.settings.signal_queue)
                .await
                .map_err(|source| StartupError::Bus {
                    target: target.name.clone(),
                    source,
                })?;

            let dispatcher = TargetDispatcher::new(
                target,
                bus_conn.connection().clone(),
                signals,
                behavior,
                Arc::clone(&self.backend),
                self.bus.clone(),
            );
            set.spawn(dispatcher.run(runtime_token.child_token()));
        }
        Ok(())
    }

    /// Waits until all dispatchers finish or a shutdown signal is received.
    async fn drive_shutdown(
        &self,
        set: &mut JoinSet<()>,
        runtime_token: &CancellationToken,
    ) -> Result<(), RuntimeError> {
        tokio::select! {
            _ = shutdown::wait_for_shutdown_signal() => {
                self.bus.publish(Event::new(EventKind::ShutdownRequested));
                runtime_token.cancel();
                self.wait_all_with_grace(set).await
            }
            _ = async { while set.join_next().await.is_some() {} } => {
                Ok(())
            }
        }
    }

    /// Waits for all dispatchers to finish within the grace period.
    ///
    /// Publishes [`EventKind::AllStoppedWithin`] on success, or
    /// [`EventKind::GraceExceeded`] on timeout and returns
    /// [`RuntimeError::GraceExceeded`] naming the stuck targets.
    async fn wait_all_with_grace(&self, set: &mut JoinSet<()>) -> Result<(), RuntimeError> {
        let grace = self.settings.grace;
        let done = async { while set.join_next().await.is_some() {} };

        match tokio::time::timeout(grace, done).await {
            Ok(_) => {
                self.bus.publish(Event::new(EventKind::AllStoppedWithin));
                Ok(())
            }
            Err(_) => {
                self.bus.publish(Event::new(EventKind::GraceExceeded));
                let stuck = self.alive.snapshot();
                Err(RuntimeError::GraceExceeded { grace, stuck })
            }
        }
    }
}

/// Tells the service manager we are ready (best-effort; a no-op outside a
/// `Type=notify` unit).
fn notify_ready() {
    if let Err(e) = sd_notify::notify(false, &[sd_notify::NotifyState::Ready]) {
        tracing::debug!(error = %e, "readiness notification not delivered");
    }
}
