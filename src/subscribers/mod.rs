//! # Event subscribers.
//!
//! Subscribers consume the runtime [`Event`](crate::events::Event) stream
//! without blocking the dispatchers that publish it:
//!
//! ```text
//! Dispatcher ── publish(Event) ──► Bus ──► orchestrator listener ──► SubscriberSet
//!                                                               ┌────────┴────────┐
//!                                                               ▼                 ▼
//!                                                          [queue S1]        [queue SN]
//!                                                           worker S1         worker SN
//!                                                           on_event()        on_event()
//! ```
//!
//! - [`Subscribe`] — the extension point for custom handlers
//! - [`SubscriberSet`] — bounded-queue fan-out with one worker per subscriber
//! - [`LogWriter`] — built-in subscriber that renders events as log lines
//! - [`AliveTracker`] — built-in subscriber tracking running dispatchers

mod alive;
mod log;
mod set;
mod subscribe;

pub use alive::AliveTracker;
pub use log::LogWriter;
pub use set::SubscriberSet;
pub use subscribe::Subscribe;
