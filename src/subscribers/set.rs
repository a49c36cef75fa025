//! # SubscriberSet: non-blocking fan-out over multiple subscribers.
//!
//! Each subscriber gets its own bounded lane (queue + worker task), so a slow
//! sink blocks neither the publisher nor the other sinks. Panics inside a
//! subscriber are caught and logged.
//!
//! The set is owned by the orchestrator's listener task: events flow in via
//! [`emit`](SubscriberSet::emit) until shutdown, and
//! [`shutdown`](SubscriberSet::shutdown) closes every lane and waits for the
//! workers to drain what is still queued, so the final events of a run are
//! delivered before the process exits.
//!
//! Not guaranteed: global ordering across different subscribers, and delivery
//! on lane overflow (the event is dropped for that subscriber, with a
//! warning).

use std::sync::Arc;

use futures::FutureExt;
use tokio::{sync::mpsc, task::JoinHandle};

use crate::events::Event;

use super::Subscribe;

/// One subscriber's queue plus the handle of its worker.
struct Lane {
    name: &'static str,
    tx: mpsc::Sender<Arc<Event>>,
    worker: JoinHandle<()>,
}

/// Fan-out over per-subscriber bounded lanes.
pub struct SubscriberSet {
    lanes: Vec<Lane>,
}

impl SubscriberSet {
    /// Creates the set and one worker task per subscriber.
    #[must_use]
    pub fn new(subs: Vec<Arc<dyn Subscribe>>) -> Self {
        let lanes = subs.into_iter().map(spawn_lane).collect();
        Self { lanes }
    }

    /// Fans one event out to all lanes without awaiting anything.
    ///
    /// A full or closed lane drops the event for that subscriber only.
    pub fn emit(&self, event: &Event) {
        let ev = Arc::new(event.clone());
        for lane in &self.lanes {
            match lane.tx.try_send(Arc::clone(&ev)) {
                Ok(()) => {}
                Err(mpsc::error::TrySendError::Full(_)) => {
                    tracing::warn!(subscriber = lane.name, "dropped event: queue full");
                }
                Err(mpsc::error::TrySendError::Closed(_)) => {
                    tracing::warn!(subscriber = lane.name, "dropped event: worker closed");
                }
            }
        }
    }

    /// Closes every lane and waits until the workers have drained their
    /// queues.
    pub async fn shutdown(self) {
        let workers: Vec<JoinHandle<()>> = self
            .lanes
            .into_iter()
            .map(|lane| {
                drop(lane.tx);
                lane.worker
            })
            .collect();
        for worker in workers {
            let _ = worker.await;
        }
    }
}

/// Spawns the worker loop for one subscriber.
fn spawn_lane(sub: Arc<dyn Subscribe>) -> Lane {
    let name = sub.name();
    let (tx, mut rx) = mpsc::channel::<Arc<Event>>(sub.queue_capacity().max(1));

    let worker = tokio::spawn(async move {
        while let Some(ev) = rx.recv().await {
            let fut = sub.on_event(ev.as_ref());
            if let Err(panic) = std::panic::AssertUnwindSafe(fut).catch_unwind().await {
                tracing::error!(subscriber = sub.name(), ?panic, "subscriber panicked");
            }
        }
    });

    Lane { name, tx, worker }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventKind;
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        seen: Mutex<Vec<EventKind>>,
    }

    #[async_trait]
    impl Subscribe for Recorder {
        async fn on_event(&self, event: &Event) {
            self.seen.lock().unwrap().push(event.kind);
        }

        fn name(&self) -> &'static str {
            "recorder"
        }
    }

    struct Bomb;

    #[async_trait]
    impl Subscribe for Bomb {
        async fn on_event(&self, _event: &Event) {
            panic!("boom");
        }

        fn name(&self) -> &'static str {
            "bomb"
        }
    }

    #[tokio::test]
    async fn test_events_reach_the_subscriber_in_order() {
        let recorder = Arc::new(Recorder::default());
        let set = SubscriberSet::new(vec![recorder.clone() as Arc<dyn Subscribe>]);

        set.emit(&Event::new(EventKind::Listening));
        set.emit(&Event::new(EventKind::SignalAccepted));
        set.shutdown().await;

        assert_eq!(
            *recorder.seen.lock().unwrap(),
            vec![EventKind::Listening, EventKind::SignalAccepted]
        );
    }

    #[tokio::test]
    async fn test_shutdown_drains_queued_events() {
        let recorder = Arc::new(Recorder::default());
        let set = SubscriberSet::new(vec![recorder.clone() as Arc<dyn Subscribe>]);

        for _ in 0..16 {
            set.emit(&Event::new(EventKind::SignalAccepted));
        }
        set.shutdown().await;

        assert_eq!(recorder.seen.lock().unwrap().len(), 16);
    }

    #[tokio::test]
    async fn test_panicking_subscriber_does_not_affect_others() {
        let recorder = Arc::new(Recorder::default());
        let set = SubscriberSet::new(vec![
            Arc::new(Bomb) as Arc<dyn Subscribe>,
            recorder.clone() as Arc<dyn Subscribe>,
        ]);

        set.emit(&Event::new(EventKind::Listening));
        set.emit(&Event::new(EventKind::SignalAccepted));
        set.shutdown().await;

        assert_eq!(
            *recorder.seen.lock().unwrap(),
            vec![EventKind::Listening, EventKind::SignalAccepted]
        );
    }
}
