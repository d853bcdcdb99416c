//! Channel observer
//!
//! Turns notifications into `SessionEvent` values on a Tokio channel.

use log::debug;
use tokio::sync::mpsc;

use crate::error::ErrorKind;
use crate::observer::SessionObserver;

/// One observer notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    Connected,
    Data(Vec<u8>),
    Error { kind: ErrorKind, message: String },
    Closed,
}

/// Forwards every notification over an unbounded channel.
pub struct ChannelObserver {
    tx: mpsc::UnboundedSender<SessionEvent>,
}

impl ChannelObserver {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<SessionEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    fn emit(&self, event: SessionEvent) {
        if self.tx.send(event).is_err() {
            debug!("Session event receiver dropped");
        }
    }
}

impl SessionObserver for ChannelObserver {
    fn on_connected(&self) {
        self.emit(SessionEvent::Connected);
    }

    fn on_data_received(&self, data: &[u8]) {
        self.emit(SessionEvent::Data(data.to_vec()));
    }

    fn on_error(&self, kind: ErrorKind, message: &str) {
        self.emit(SessionEvent::Error {
            kind,
            message: message.to_string(),
        });
    }

    fn on_closed(&self) {
        self.emit(SessionEvent::Closed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forwards_in_call_order() {
        let (observer, mut rx) = ChannelObserver::new();
        observer.on_connected();
        observer.on_data_received(b"abc");
        observer.on_error(ErrorKind::Connection, "reset");

        assert_eq!(rx.try_recv().ok(), Some(SessionEvent::Connected));
        assert_eq!(rx.try_recv().ok(), Some(SessionEvent::Data(b"abc".to_vec())));
        assert_eq!(
            rx.try_recv().ok(),
            Some(SessionEvent::Error {
                kind: ErrorKind::Connection,
                message: "reset".into()
            })
        );
    }

    #[test]
    fn dropped_receiver_is_ignored() {
        let (observer, rx) = ChannelObserver::new();
        drop(rx);
        observer.on_closed();
    }
}
