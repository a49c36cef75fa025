//! # Configuration data model.
//!
//! [`TargetConfig`] is the immutable per-target record the core consumes;
//! [`Settings`] centralizes runtime tuning. The raw serde-facing file schema
//! lives here too, private to the config module:
//!
//! ```yaml
//! targets:
//!   lock.target:
//!     behavior: session-lock
//!     toggle: true
//!     start: true
//!     system: false
//!     dbus:
//!       interface: org.freedesktop.login1.Session
//! settings:
//!   grace_secs: 30
//! ```

use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

use serde::Deserialize;

use crate::unit::{Direction, Scope};

/// Immutable per-target record.
///
/// Created once at startup from the merged configuration files and never
/// mutated afterwards.
#[derive(Debug, Clone)]
pub struct TargetConfig {
    /// Unit identifier, e.g. `lock.target`.
    pub name: String,
    /// Registry key of the behavior bound to this target.
    pub behavior: String,
    /// Alternate between forward and reverse transitions.
    pub toggle: bool,
    /// `true` if the forward transition starts the unit.
    pub start: bool,
    /// Manager instance transitions are requested against.
    pub scope: Scope,
    /// Signal filter, passed through to the bus's match-rule syntax.
    pub match_options: HashMap<String, String>,
}

impl TargetConfig {
    /// The forward transition direction of this target.
    #[inline]
    pub fn forward(&self) -> Direction {
        Direction::forward_from_flag(self.start)
    }
}

/// Global runtime settings.
///
/// ## Field semantics
/// - `grace`: maximum wait for dispatchers to stop after a shutdown signal
/// - `bus_capacity`: event-bus ring buffer size (min 1, clamped)
/// - `signal_queue`: per-dispatcher inbound signal channel capacity (min 1).
///   The pump blocks when the channel is full; signals can still be lost at
///   the bounded transport queue if a consumer stays slow.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Maximum time to wait for graceful shutdown before force-terminating.
    pub grace: Duration,
    /// Capacity of the event-bus broadcast ring buffer.
    pub bus_capacity: usize,
    /// Capacity of each dispatcher's inbound signal channel.
    pub signal_queue: usize,
}

impl Default for Settings {
    /// - `grace = 30s`
    /// - `bus_capacity = 256`
    /// - `signal_queue = 10`
    fn default() -> Self {
        Self {
            grace: Duration::from_secs(30),
            bus_capacity: 256,
            signal_queue: 10,
        }
    }
}

/// One parsed configuration file (serde-facing schema).
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct FileConfig {
    #[serde(default)]
    pub(crate) targets: BTreeMap<String, RawTarget>,
    #[serde(default)]
    pub(crate) settings: RawSettings,
}

impl FileConfig {
    /// Merges `higher` on top of `self`: targets override per-name, settings
    /// override per-field.
    pub(crate) fn merge(mut self, higher: FileConfig) -> FileConfig {
        self.targets.extend(higher.targets);
        self.settings = self.settings.merge(higher.settings);
        self
    }

    /// Resolves the raw schema into the core-facing records.
    pub(crate) fn resolve(self) -> (Vec<TargetConfig>, Settings) {
        let targets = self
            .targets
            .into_iter()
            .map(|(name, raw)| TargetConfig {
                name,
                behavior: raw.behavior,
                toggle: raw.toggle,
                start: raw.start,
                scope: if raw.system { Scope::System } else { Scope::User },
                match_options: raw.match_options,
            })
            .collect();
        (targets, self.settings.resolve())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct RawTarget {
    pub(crate) behavior: String,
    #[serde(default)]
    pub(crate) toggle: bool,
    #[serde(default = "default_true")]
    pub(crate) start: bool,
    #[serde(default)]
    pub(crate) system: bool,
    #[serde(default, rename = "dbus")]
    pub(crate) match_options: HashMap<String, String>,
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct RawSettings {
    #[serde(default)]
    pub(crate) grace_secs: Option<u64>,
    #[serde(default)]
    pub(crate) bus_capacity: Option<usize>,
    #[serde(default)]
    pub(crate) signal_queue: Option<usize>,
}

impl RawSettings {
    fn merge(self, higher: RawSettings) -> RawSettings {
        RawSettings {
            grace_secs: higher.grace_secs.or(self.grace_secs),
            bus_capacity: higher.bus_capacity.or(self.bus_capacity),
            signal_queue: higher.signal_queue.or(self.signal_queue),
        }
    }

    fn resolve(self) -> Settings {
        let defaults = Settings::default();
        Settings {
            grace: self.grace_secs.map_or(defaults.grace, Duration::from_secs),
            bus_capacity: self.bus_capacity.unwrap_or(defaults.bus_capacity).max(1),
            signal_queue: self.signal_queue.unwrap_or(defaults.signal_queue).max(1),
        }
    }
}

fn default_true() -> bool {
    true
}
