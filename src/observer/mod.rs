//! Session observers
//!
//! The notification interface between a session and whatever displays it.

pub mod channel;
pub mod console;

pub use channel::{ChannelObserver, SessionEvent};
pub use console::ConsoleObserver;

use crate::error::ErrorKind;

/// Receives lifecycle and data notifications from a session.
///
/// Calls for one session are made sequentially from its worker task, never
/// concurrently. Implementations should return quickly since the worker does
/// not read from the socket while a callback runs.
pub trait SessionObserver: Send + Sync {
    /// The connection has been established.
    fn on_connected(&self) {}

    /// Bytes arrived from the peer. Boundaries carry no meaning.
    fn on_data_received(&self, data: &[u8]);

    /// The session failed and is now `Errored`.
    fn on_error(&self, kind: ErrorKind, message: &str);

    /// The session was closed by `close()`.
    fn on_closed(&self) {}
}
