//! Proxy for the `org.freedesktop.systemd1.Manager` interface.
//!
//! Only the small slice of the interface the controller needs: job
//! submission with a queue mode, the `Subscribe` call that enables signal
//! emission, and the `JobRemoved` completion signal.

use zbus::zvariant::{ObjectPath, OwnedObjectPath};

/// Client proxy for the systemd manager object.
///
/// `JobRemoved` is only emitted to connections that called
/// [`subscribe`](SystemdManagerProxy::subscribe) first; the controller does
/// so before arming the completion stream.
#[zbus::proxy(
    interface = "org.freedesktop.systemd1.Manager",
    default_service = "org.freedesktop.systemd1",
    default_path = "/org/freedesktop/systemd1",
    gen_blocking = false
)]
pub trait SystemdManager {
    /// Enqueues a start job for `name` and returns the job object path.
    fn start_unit(&self, name: &str, mode: &str) -> zbus::Result<OwnedObjectPath>;

    /// Enqueues a stop job for `name` and returns the job object path.
    fn stop_unit(&self, name: &str, mode: &str) -> zbus::Result<OwnedObjectPath>;

    /// Enables emission of manager signals (including `JobRemoved`) to this connection.
    fn subscribe(&self) -> zbus::Result<()>;

    /// Emitted when a job is dequeued; `result` carries the terminal status token.
    #[zbus(signal)]
    fn job_removed(
        &self,
        id: u32,
        job: ObjectPath<'_>,
        unit: &str,
        result: &str,
    ) -> zbus::Result<()>;
}
