//! # Per-target bus connection.
//!
//! Each dispatcher exclusively owns one [`BusConnection`]: it registers the
//! target's match rule and pumps matching signals into a bounded channel the
//! dispatcher consumes. Connections are never pooled or shared across
//! targets.
//!
//! ## Delivery and backpressure
//! ```text
//! transport ──► MessageStream (bounded, max_queued = capacity)
//!                     │ pump task
//!                     ▼
//!               mpsc channel (bounded, capacity) ──► dispatcher
//! ```
//! The pump awaits channel capacity, so our channel never drops. The
//! transport-side queue is bounded too: if verification or job handling falls
//! behind the delivery rate for longer than both buffers absorb, signals are
//! lost at the transport queue. There is no reconnection after transport
//! loss; the stream ending stops the dispatcher.

use std::collections::HashMap;

use futures::StreamExt;
use tokio::sync::mpsc;
use zbus::{Connection, MessageStream};

use crate::bus::{match_rule, Signal};
use crate::error::BusError;
use crate::unit::Scope;

/// An established session to the message bus, bound to one target.
#[derive(Debug)]
pub struct BusConnection {
    conn: Connection,
}

impl BusConnection {
    /// Connects to the bus for the given scope.
    pub async fn connect(scope: Scope) -> Result<Self, BusError> {
        let conn = match scope {
            Scope::System => Connection::system().await,
            Scope::User => Connection::session().await,
        }
        .map_err(|source| BusError::Connect { scope, source })?;
        Ok(Self { conn })
    }

    /// The underlying connection (shared with the behavior's `verify` calls).
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Registers the target's match options and returns the signal channel.
    ///
    /// Spawns the pump task that forwards matching signals from the transport
    /// stream into the returned bounded channel. The pump exits when the
    /// receiver is dropped or the transport stream ends.
    pub async fn subscribe(
        &self,
        options: &HashMap<String, String>,
        capacity: usize,
    ) -> Result<mpsc::Receiver<Signal>, BusError> {
        let rule = match_rule::from_options(options)?;
        let capacity = capacity.max(1);
        let stream = MessageStream::for_match_rule(rule, &self.conn, Some(capacity))
            .await
            .map_err(|source| BusError::Register { source })?;

        let (tx, rx) = mpsc::channel(capacity);
        tokio::spawn(pump(stream, tx));
        Ok(rx)
    }
}

/// Forwards signals from the transport stream into the dispatcher channel.
async fn pump(mut stream: MessageStream, tx: mpsc::Sender<Signal>) {
    while let Some(next) = stream.next().await {
        match next {
            Ok(msg) => {
                if tx.send(Signal::new(msg)).await.is_err() {
                    // Dispatcher is gone; nothing left to deliver to.
                    return;
                }
            }
            Err(e) => {
                tracing::debug!(error = %e, "undecodable message on signal stream; skipping");
            }
        }
    }
    if !tx.is_closed() {
        tracing::warn!("signal stream ended; no reconnection is attempted");
    }
}
