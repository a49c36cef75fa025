//! Error types used by the dispatcher runtime.
//!
//! This module defines the error enums for the failure classes the daemon
//! distinguishes:
//!
//! - [`StartupError`] — fatal, all-or-nothing startup failures (config, bus,
//!   behavior resolution). These terminate the process with a diagnostic
//!   naming the offending target.
//! - [`BusError`] — connection and match-registration failures, wrapped into
//!   [`StartupError::Bus`] with the target name attached.
//! - [`TransitionError`] — recoverable per-transition failures. Logged with
//!   target, direction and reason; the dispatcher keeps running.
//! - [`RuntimeError`] — errors surfaced by the orchestrator itself, such as a
//!   shutdown exceeding its grace period.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::unit::{Direction, Scope};

/// # Fatal startup failures.
///
/// Startup is all-or-nothing: the first failing target aborts the whole
/// process. Every variant carries enough context to identify the offending
/// target or configuration path.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum StartupError {
    /// No configuration file with the given name was found anywhere on the search path.
    #[error("no configuration file {file:?} found on the search path")]
    ConfigNotFound {
        /// The file name that was searched for.
        file: String,
    },

    /// A configuration file exists but could not be read.
    #[error("failed to read configuration file {path:?}: {source}")]
    ConfigRead {
        /// Path of the unreadable file.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// A configuration file exists but is not valid YAML for our schema.
    #[error("failed to parse configuration file {path:?}: {source}")]
    ConfigParse {
        /// Path of the malformed file.
        path: PathBuf,
        /// Underlying parse error.
        source: serde_yaml::Error,
    },

    /// A target references a behavior name that is not in the registry.
    #[error("unknown behavior {name:?} for target {target:?}")]
    UnknownBehavior {
        /// The target whose configuration named the behavior.
        target: String,
        /// The unresolvable behavior name.
        name: String,
    },

    /// Bus connection or signal-match registration failed for a target.
    #[error("bus setup failed for target {target:?}: {source}")]
    Bus {
        /// The target being set up.
        target: String,
        /// Underlying bus error.
        #[source]
        source: BusError,
    },
}

impl StartupError {
    /// Returns a short stable label (snake_case) for use in logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            StartupError::ConfigNotFound { .. } => "config_not_found",
            StartupError::ConfigRead { .. } => "config_read",
            StartupError::ConfigParse { .. } => "config_parse",
            StartupError::UnknownBehavior { .. } => "unknown_behavior",
            StartupError::Bus { .. } => "bus_setup",
        }
    }
}

/// # Bus connection and match-registration failures.
///
/// Produced by [`BusConnection`](crate::bus::BusConnection); the orchestrator
/// wraps these into [`StartupError::Bus`] together with the target name.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum BusError {
    /// Establishing the bus connection failed.
    #[error("failed to connect to the {scope} bus: {source}")]
    Connect {
        /// Which bus was requested.
        scope: Scope,
        /// Underlying transport error.
        source: zbus::Error,
    },

    /// A match-option key is not part of the supported match-rule vocabulary.
    #[error("unknown match option key {key:?}")]
    UnknownMatchKey {
        /// The rejected key.
        key: String,
    },

    /// A match-option value was rejected by the bus's rule syntax.
    #[error("invalid value for match option {key:?}: {source}")]
    InvalidMatchValue {
        /// The key whose value was rejected.
        key: String,
        /// Underlying validation error.
        source: zbus::Error,
    },

    /// Registering the assembled match rule with the bus failed.
    #[error("failed to register signal match: {source}")]
    Register {
        /// Underlying transport error.
        source: zbus::Error,
    },
}

/// # Recoverable per-transition failures.
///
/// A failed transition is logged and the dispatcher proceeds as though the
/// cycle completed, waiting for the next qualifying signal. No retry is
/// attempted automatically.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum TransitionError {
    /// Opening the per-call RPC session to the service manager failed.
    #[error("failed to connect to the {scope} manager: {source}")]
    Connect {
        /// Which manager instance was requested.
        scope: Scope,
        /// Underlying transport error.
        source: zbus::Error,
    },

    /// The job request was rejected before a job was enqueued.
    #[error("failed to submit {direction} job: {source}")]
    Submit {
        /// Requested transition direction.
        direction: Direction,
        /// Underlying RPC error.
        source: zbus::Error,
    },

    /// The job resolved with a terminal token other than `"done"`.
    #[error("job finished with result {result:?}")]
    JobFailed {
        /// The terminal result token reported by the manager.
        result: String,
    },

    /// The completion stream ended before the submitted job resolved.
    #[error("completion stream ended before a result for unit {unit:?} arrived")]
    CompletionLost {
        /// The unit whose job was pending.
        unit: String,
    },
}

impl TransitionError {
    /// Returns a short stable label (snake_case) for use in logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            TransitionError::Connect { .. } => "manager_connect",
            TransitionError::Submit { .. } => "job_submit",
            TransitionError::JobFailed { .. } => "job_failed",
            TransitionError::CompletionLost { .. } => "completion_lost",
        }
    }
}

/// # Errors produced by the orchestrator runtime.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// A fatal startup failure; see [`StartupError`].
    #[error(transparent)]
    Startup(#[from] StartupError),

    /// Shutdown grace period was exceeded; some dispatchers remained stuck.
    #[error("shutdown grace {grace:?} exceeded; stuck: {stuck:?}; forcing termination")]
    GraceExceeded {
        /// The configured grace duration.
        grace: Duration,
        /// Names of the targets whose dispatchers did not stop in time.
        stuck: Vec<String>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_startup_labels_are_stable() {
        let err = StartupError::ConfigNotFound {
            file: "config.yml".into(),
        };
        assert_eq!(err.as_label(), "config_not_found");
        let err = StartupError::UnknownBehavior {
            target: "lock.target".into(),
            name: "nope".into(),
        };
        assert_eq!(err.as_label(), "unknown_behavior");
    }

    #[test]
    fn test_transition_labels_are_stable() {
        let err = TransitionError::JobFailed {
            result: "canceled".into(),
        };
        assert_eq!(err.as_label(), "job_failed");
        let err = TransitionError::CompletionLost {
            unit: "sleep.target".into(),
        };
        assert_eq!(err.as_label(), "completion_lost");
    }
}
