//! Pass-through behavior: every delivered signal is accepted.
//!
//! Useful when the match options alone describe the interesting signals
//! precisely enough.

use async_trait::async_trait;
use zbus::Connection;

use crate::behavior::Behavior;
use crate::bus::Signal;

/// Accepts every signal; all hooks are no-ops.
#[derive(Debug, Default)]
pub struct AcceptAll;

#[async_trait]
impl Behavior for AcceptAll {
    async fn verify(&self, _conn: &Connection, _signal: &Signal) -> bool {
        true
    }

    fn name(&self) -> &'static str {
        "accept-all"
    }
}
