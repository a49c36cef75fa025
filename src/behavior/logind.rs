//! Proxy for the `org.freedesktop.login1.Manager` interface.
//!
//! Used by the built-in behaviors: session resolution for the lock gate and
//! delay inhibitors for the sleep gate.

use zbus::zvariant::{OwnedFd, OwnedObjectPath};

#[zbus::proxy(
    interface = "org.freedesktop.login1.Manager",
    default_service = "org.freedesktop.login1",
    default_path = "/org/freedesktop/login1",
    gen_blocking = false
)]
pub(crate) trait LogindManager {
    /// Resolves the session a process belongs to; pid 0 means the caller.
    /// logind spells the member `GetSessionByPID`, not the derived casing.
    #[zbus(name = "GetSessionByPID")]
    fn get_session_by_pid(&self, pid: u32) -> zbus::Result<OwnedObjectPath>;

    /// Takes an inhibitor lock; the lock is held for the lifetime of the
    /// returned file descriptor.
    fn inhibit(&self, what: &str, who: &str, why: &str, mode: &str) -> zbus::Result<OwnedFd>;
}
