//! # Session-lock gate for `(un)lock.target`-style targets.
//!
//! logind emits `Lock`/`Unlock` on every session object; a multi-seat or
//! multi-session machine delivers signals for sessions that are not ours.
//! This behavior resolves the caller's own session object path once at init
//! and accepts only signals emitted from that path.

use async_trait::async_trait;
use tokio::sync::Mutex;
use zbus::Connection;

use crate::behavior::logind::LogindManagerProxy;
use crate::behavior::Behavior;
use crate::bus::Signal;

/// Accepts signals emitted from the caller's own logind session object.
#[derive(Debug, Default)]
pub struct SessionLock {
    session_path: Mutex<Option<String>>,
}

impl SessionLock {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Behavior for SessionLock {
    async fn init(&self, conn: &Connection) {
        let resolved = async {
            let manager = LogindManagerProxy::new(conn).await?;
            // pid 0 = the calling process.
            manager.get_session_by_pid(0).await
        }
        .await;

        match resolved {
            Ok(path) => {
                tracing::debug!(session = %path, "resolved own logind session");
                *self.session_path.lock().await = Some(path.to_string());
            }
            Err(e) => {
                // Without a session path nothing will ever verify; the target
                // stays armed but inert.
                tracing::warn!(error = %e, "could not resolve own logind session");
            }
        }
    }

    async fn verify(&self, _conn: &Connection, signal: &Signal) -> bool {
        match (&*self.session_path.lock().await, signal.path()) {
            (Some(session), Some(path)) => *session == path,
            _ => false,
        }
    }

    fn name(&self) -> &'static str {
        "session-lock"
    }
}
