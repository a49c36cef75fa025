//! # Signal: an opaque event delivered by the bus connection.
//!
//! The core never interprets a signal itself; it hands it to the behavior's
//! `verify` operation and discards it. The accessors here exist for behaviors
//! (and log lines), not for the dispatch loop.

use zbus::Message;

/// One signal received over the bus.
///
/// Thin wrapper over [`zbus::Message`]; cheap to clone.
#[derive(Clone, Debug)]
pub struct Signal(Message);

impl Signal {
    /// Wraps a received message.
    pub fn new(message: Message) -> Self {
        Self(message)
    }

    /// The underlying bus message.
    pub fn message(&self) -> &Message {
        &self.0
    }

    /// Object path the signal was emitted from, if present.
    pub fn path(&self) -> Option<String> {
        self.0.header().path().map(|p| p.to_string())
    }

    /// Interface the signal belongs to, if present.
    pub fn interface(&self) -> Option<String> {
        self.0.header().interface().map(|i| i.to_string())
    }

    /// Signal member name, if present.
    pub fn member(&self) -> Option<String> {
        self.0.header().member().map(|m| m.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lock_signal() -> Signal {
        let msg = Message::signal(
            "/org/freedesktop/login1/session/_31",
            "org.freedesktop.login1.Session",
            "Lock",
        )
        .unwrap()
        .build(&())
        .unwrap();
        Signal::new(msg)
    }

    #[test]
    fn test_header_accessors() {
        let sig = lock_signal();
        assert_eq!(
            sig.path().as_deref(),
            Some("/org/freedesktop/login1/session/_31")
        );
        assert_eq!(
            sig.interface().as_deref(),
            Some("org.freedesktop.login1.Session")
        );
        assert_eq!(sig.member().as_deref(), Some("Lock"));
    }
}
