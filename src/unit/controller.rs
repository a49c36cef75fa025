//! # Unit controller: issue one job and block until it resolves.
//!
//! [`SystemdBackend`] drives a unit through a start or stop transition
//! against the requested manager instance:
//!
//! ```text
//! transition(unit, direction, scope)
//!   ├─► connect (fresh session per call, never pooled)
//!   ├─► Subscribe()                 (manager emits JobRemoved only when subscribed)
//!   ├─► arm JobRemoved stream      (before submission, so the result cannot race past us)
//!   ├─► StartUnit/StopUnit(unit, "replace")
//!   └─► await JobRemoved for our job path → "done" = success, anything else = failure
//! ```
//!
//! ## Rules
//! - Mode `"replace"` makes submission idempotent with respect to concurrently
//!   queued jobs for the same unit: a new job supersedes a pending one instead
//!   of being rejected.
//! - The wait is unbounded. The manager is trusted to resolve every submitted
//!   job; no local timeout is applied.
//! - One RPC session per call, dropped when the call returns.

use async_trait::async_trait;
use futures::StreamExt;
use zbus::Connection;

use crate::error::TransitionError;
use crate::unit::proxy::SystemdManagerProxy;
use crate::unit::{Direction, Scope};

/// Queue mode for every submitted job.
const JOB_MODE: &str = "replace";

/// Seam for issuing unit transitions.
///
/// The dispatcher only talks to this trait; tests substitute a recording
/// implementation.
#[async_trait]
pub trait UnitBackend: Send + Sync + 'static {
    /// Drives `unit` through one transition and blocks until the job resolves.
    async fn transition(
        &self,
        unit: &str,
        direction: Direction,
        scope: Scope,
    ) -> Result<(), TransitionError>;
}

/// Unit backend speaking to the systemd manager over D-Bus.
///
/// Stateless; each [`transition`](UnitBackend::transition) call opens its own
/// session (simplicity favored over connection reuse).
#[derive(Debug, Default)]
pub struct SystemdBackend;

#[async_trait]
impl UnitBackend for SystemdBackend {
    async fn transition(
        &self,
        unit: &str,
        direction: Direction,
        scope: Scope,
    ) -> Result<(), TransitionError> {
        let conn = match scope {
            Scope::System => Connection::system().await,
            Scope::User => Connection::session().await,
        }
        .map_err(|source| TransitionError::Connect { scope, source })?;

        let manager = SystemdManagerProxy::new(&conn)
            .await
            .map_err(|source| TransitionError::Submit { direction, source })?;
        manager
            .subscribe()
            .await
            .map_err(|source| TransitionError::Submit { direction, source })?;

        // The stream must exist before the job is submitted; short jobs can
        // resolve before a late subscriber sees anything.
        let mut removals = manager
            .receive_job_removed()
            .await
            .map_err(|source| TransitionError::Submit { direction, source })?;

        let job = match direction {
            Direction::Start => manager.start_unit(unit, JOB_MODE).await,
            Direction::Stop => manager.stop_unit(unit, JOB_MODE).await,
        }
        .map_err(|source| TransitionError::Submit { direction, source })?;

        while let Some(removal) = removals.next().await {
            let args = match removal.args() {
                Ok(args) => args,
                Err(e) => {
                    tracing::debug!(error = %e, "undecodable JobRemoved signal; skipping");
                    continue;
                }
            };
            if args.job().as_str() == job.as_str() {
                return job_outcome(args.result());
            }
        }

        Err(TransitionError::CompletionLost { unit: unit.into() })
    }
}

/// Maps a terminal job result token to the transition outcome.
///
/// Exactly `"done"` means success; every other token (e.g. `"failed"`,
/// `"canceled"`, `"dependency"`, `"timeout"`) is a failure carrying the token
/// as the reason.
pub(crate) fn job_outcome(result: &str) -> Result<(), TransitionError> {
    if result == "done" {
        Ok(())
    } else {
        Err(TransitionError::JobFailed {
            result: result.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_done_token_is_success() {
        assert!(job_outcome("done").is_ok());
    }

    #[test]
    fn test_other_tokens_carry_the_reason() {
        for token in ["failed", "canceled", "dependency", "timeout", ""] {
            match job_outcome(token) {
                Err(TransitionError::JobFailed { result }) => assert_eq!(result, token),
                other => panic!("expected JobFailed for {token:?}, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_job_mode_is_replace() {
        assert_eq!(JOB_MODE, "replace");
    }
}
