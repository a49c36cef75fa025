//! # Sleep gate for `sleep.target`-style toggling targets.
//!
//! Brackets the armed half of the toggle cycle with a logind delay
//! inhibitor, so the unit gets a chance to run before the machine actually
//! suspends:
//!
//! ```text
//! before()  take "sleep" delay inhibitor
//! verify()  accept PrepareForSleep(b) when b matches the expected phase
//! after()   release the inhibitor (lets the suspend proceed)
//! ```
//!
//! `PrepareForSleep` carries a single boolean: `true` right before the
//! machine sleeps, `false` after it wakes. The gate tracks which value it
//! expects next and flips on every accepted signal, mirroring the
//! dispatcher's forward/reverse alternation.

use async_trait::async_trait;
use tokio::sync::Mutex;
use zbus::zvariant::OwnedFd;
use zbus::Connection;

use crate::behavior::logind::LogindManagerProxy;
use crate::behavior::Behavior;
use crate::bus::Signal;

const INHIBIT_WHAT: &str = "sleep";
const INHIBIT_WHO: &str = "dbus-systemd-dispatcher";
const INHIBIT_WHY: &str = "dispatching sleep transition units";

/// Gates on `PrepareForSleep` and holds a delay inhibitor while armed.
#[derive(Debug)]
pub struct SleepInhibit {
    conn: Mutex<Option<Connection>>,
    lock: Mutex<Option<OwnedFd>>,
    expect_sleep: Mutex<bool>,
}

impl SleepInhibit {
    pub fn new() -> Self {
        Self {
            conn: Mutex::new(None),
            lock: Mutex::new(None),
            expect_sleep: Mutex::new(true),
        }
    }

    async fn acquire(&self) {
        let conn = self.conn.lock().await.clone();
        let Some(conn) = conn else {
            tracing::warn!("sleep-inhibit has no bus connection; cannot take inhibitor");
            return;
        };
        let taken = async {
            let manager = LogindManagerProxy::new(&conn).await?;
            manager
                .inhibit(INHIBIT_WHAT, INHIBIT_WHO, INHIBIT_WHY, "delay")
                .await
        }
        .await;
        match taken {
            Ok(fd) => {
                *self.lock.lock().await = Some(fd);
            }
            Err(e) => tracing::warn!(error = %e, "failed to take sleep inhibitor"),
        }
    }

    async fn release(&self) {
        // Dropping the fd releases the inhibitor.
        self.lock.lock().await.take();
    }
}

#[async_trait]
impl Behavior for SleepInhibit {
    async fn init(&self, conn: &Connection) {
        *self.conn.lock().await = Some(conn.clone());
    }

    async fn verify(&self, _conn: &Connection, signal: &Signal) -> bool {
        let got: bool = match signal.message().body().deserialize() {
            Ok(v) => v,
            Err(e) => {
                tracing::debug!(error = %e, "non-boolean PrepareForSleep payload; discarding");
                return false;
            }
        };

        let mut expected = self.expect_sleep.lock().await;
        if got == *expected {
            *expected = !*expected;
            true
        } else {
            false
        }
    }

    async fn before(&self) {
        self.acquire().await;
    }

    async fn after(&self) {
        self.release().await;
    }

    fn name(&self) -> &'static str {
        "sleep-inhibit"
    }
}
