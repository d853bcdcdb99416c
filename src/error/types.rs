//! Error types
//!
//! Defines the error taxonomy reported by the session client.

use std::fmt;
use std::io;
use std::time::Duration;

use crate::session::{Endpoint, SessionState};

/// Coarse error category handed to observers alongside the message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Refused, unreachable, timed out, reset, or closed by the remote host.
    Connection,
    /// An operation was invoked outside its valid state.
    InvalidState,
    /// Any other local socket fault.
    Transport,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::Connection => write!(f, "ConnectionError"),
            ErrorKind::InvalidState => write!(f, "InvalidStateError"),
            ErrorKind::Transport => write!(f, "TransportError"),
        }
    }
}

/// Session client errors
#[derive(Debug)]
pub enum SessionError {
    HostNotFound(Endpoint, io::Error),
    ConnectionRefused(Endpoint),
    HostUnreachable(Endpoint, io::Error),
    ConnectTimeout(Endpoint, Duration),
    ConnectionReset(io::Error),
    RemoteHostClosed,
    InvalidState {
        operation: &'static str,
        state: SessionState,
    },
    Transport(io::Error),
}

impl SessionError {
    /// Category of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            SessionError::HostNotFound(..)
            | SessionError::ConnectionRefused(_)
            | SessionError::HostUnreachable(..)
            | SessionError::ConnectTimeout(..)
            | SessionError::ConnectionReset(_)
            | SessionError::RemoteHostClosed => ErrorKind::Connection,
            SessionError::InvalidState { .. } => ErrorKind::InvalidState,
            SessionError::Transport(_) => ErrorKind::Transport,
        }
    }
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionError::HostNotFound(endpoint, e) => {
                write!(f, "Host {} not found: {}", endpoint.host(), e)
            }
            SessionError::ConnectionRefused(endpoint) => {
                write!(f, "Connection refused by {}", endpoint)
            }
            SessionError::HostUnreachable(endpoint, e) => {
                write!(f, "Host {} unreachable: {}", endpoint, e)
            }
            SessionError::ConnectTimeout(endpoint, after) => {
                write!(f, "Connection to {} timed out after {:?}", endpoint, after)
            }
            SessionError::ConnectionReset(e) => write!(f, "Connection reset: {}", e),
            SessionError::RemoteHostClosed => write!(f, "The remote host closed the connection"),
            SessionError::InvalidState { operation, state } => {
                write!(f, "Cannot {} while {}", operation, state)
            }
            SessionError::Transport(e) => write!(f, "Socket error: {}", e),
        }
    }
}

impl std::error::Error for SessionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SessionError::HostNotFound(_, e)
            | SessionError::HostUnreachable(_, e)
            | SessionError::ConnectionReset(e)
            | SessionError::Transport(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for SessionError {
    fn from(error: io::Error) -> Self {
        SessionError::Transport(error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_follow_taxonomy() {
        let endpoint = Endpoint::new("127.0.0.1", 7);
        assert_eq!(
            SessionError::ConnectionRefused(endpoint.clone()).kind(),
            ErrorKind::Connection
        );
        assert_eq!(
            SessionError::ConnectTimeout(endpoint, Duration::from_secs(3)).kind(),
            ErrorKind::Connection
        );
        assert_eq!(SessionError::RemoteHostClosed.kind(), ErrorKind::Connection);
        assert_eq!(
            SessionError::InvalidState {
                operation: "send",
                state: SessionState::Disconnected,
            }
            .kind(),
            ErrorKind::InvalidState
        );
        let local = io::Error::new(io::ErrorKind::OutOfMemory, "no descriptors");
        assert_eq!(SessionError::from(local).kind(), ErrorKind::Transport);
    }

    #[test]
    fn messages_name_the_problem() {
        let err = SessionError::ConnectionRefused(Endpoint::new("10.0.0.1", 9000));
        assert_eq!(err.to_string(), "Connection refused by 10.0.0.1:9000");

        let err = SessionError::InvalidState {
            operation: "send",
            state: SessionState::Connecting,
        };
        assert_eq!(err.to_string(), "Cannot send while connecting");
    }
}
