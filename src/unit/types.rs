//! # Direction and scope of a unit transition.
//!
//! [`Direction`] says whether a transition starts or stops the unit;
//! [`Scope`] says which service-manager instance (system-wide or per-user)
//! receives the job. Both are small copyable enums used across the config,
//! bus and dispatch layers.

use std::fmt;

/// Direction of a unit transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Issue a start job for the unit.
    Start,
    /// Issue a stop job for the unit.
    Stop,
}

impl Direction {
    /// Returns the opposite direction.
    ///
    /// Used by the toggle state machine: the reverse half-cycle drives the
    /// unit the other way.
    #[inline]
    pub fn reverse(self) -> Self {
        match self {
            Direction::Start => Direction::Stop,
            Direction::Stop => Direction::Start,
        }
    }

    /// Maps the `start` configuration flag to the forward direction.
    #[inline]
    pub fn forward_from_flag(start: bool) -> Self {
        if start {
            Direction::Start
        } else {
            Direction::Stop
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Start => f.write_str("start"),
            Direction::Stop => f.write_str("stop"),
        }
    }
}

/// Which service-manager instance a transition is requested against.
///
/// Also selects the message bus a controller session connects to: the
/// system-wide manager lives on the system bus, the per-user manager on the
/// session bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// The system-wide manager instance.
    System,
    /// The per-user manager instance.
    User,
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scope::System => f.write_str("system"),
            Scope::User => f.write_str("user"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reverse_is_involutive() {
        assert_eq!(Direction::Start.reverse(), Direction::Stop);
        assert_eq!(Direction::Stop.reverse(), Direction::Start);
        assert_eq!(Direction::Start.reverse().reverse(), Direction::Start);
    }

    #[test]
    fn test_forward_from_flag() {
        assert_eq!(Direction::forward_from_flag(true), Direction::Start);
        assert_eq!(Direction::forward_from_flag(false), Direction::Stop);
    }

    #[test]
    fn test_display() {
        assert_eq!(Direction::Start.to_string(), "start");
        assert_eq!(Direction::Stop.to_string(), "stop");
        assert_eq!(Scope::System.to_string(), "system");
        assert_eq!(Scope::User.to_string(), "user");
    }
}
