//! # Logging subscriber.
//!
//! [`LogWriter`] renders runtime events as structured log lines via
//! `tracing`. It is the daemon's default observability sink; recoverable
//! transition failures surface here and nowhere else.

use async_trait::async_trait;

use crate::events::{Event, EventKind};

use super::Subscribe;

/// Renders events through the `tracing` macros.
#[derive(Debug, Default)]
pub struct LogWriter;

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, event: &Event) {
        let unit = event.target_str();
        match event.kind {
            EventKind::Listening => {
                tracing::info!(unit, "listening for signals");
            }
            EventKind::SignalAccepted => {
                tracing::debug!(unit, "signal accepted");
            }
            EventKind::TransitionSucceeded => {
                let direction = event.direction.map(|d| d.to_string()).unwrap_or_default();
                tracing::info!(unit, %direction, "unit transition completed");
            }
            EventKind::TransitionFailed => {
                let direction = event.direction.map(|d| d.to_string()).unwrap_or_default();
                let reason = event.reason.as_deref().unwrap_or("-");
                tracing::warn!(unit, %direction, reason, "unit transition failed");
            }
            EventKind::DispatcherStopped => {
                let reason = event.reason.as_deref().unwrap_or("cancelled");
                tracing::info!(unit, reason, "dispatcher stopped");
            }
            EventKind::ShutdownRequested => {
                tracing::info!("shutdown requested");
            }
            EventKind::AllStoppedWithin => {
                tracing::info!("all dispatchers stopped within grace");
            }
            EventKind::GraceExceeded => {
                tracing::warn!("shutdown grace exceeded");
            }
        }
    }

    fn name(&self) -> &'static str {
        "log"
    }
}
