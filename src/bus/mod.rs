//! # Bus connection: signal subscription and delivery.
//!
//! This module owns everything between the message bus and a dispatcher's
//! inbound signal channel:
//! - [`Signal`] — opaque wrapper around a received bus message
//! - match-rule translation from the configured `key=value` map
//! - [`BusConnection`] — per-target connection that registers the match and
//!   pumps matching signals into a bounded channel

mod connection;
mod match_rule;
mod signal;

pub use connection::BusConnection;
pub use signal::Signal;
