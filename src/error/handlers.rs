//! Error handlers
//!
//! Maps socket failures onto the session error taxonomy.

use log::error;
use std::io;

use crate::error::types::SessionError;
use crate::session::Endpoint;

/// Classify an I/O error raised while connecting to `endpoint`
pub fn classify_connect_error(endpoint: &Endpoint, err: io::Error) -> SessionError {
    match err.kind() {
        io::ErrorKind::ConnectionRefused => SessionError::ConnectionRefused(endpoint.clone()),
        io::ErrorKind::HostUnreachable
        | io::ErrorKind::NetworkUnreachable
        | io::ErrorKind::AddrNotAvailable
        | io::ErrorKind::TimedOut => SessionError::HostUnreachable(endpoint.clone(), err),
        _ => classify_io_error(err),
    }
}

/// Classify an I/O error raised on an established stream
pub fn classify_io_error(err: io::Error) -> SessionError {
    match err.kind() {
        io::ErrorKind::ConnectionReset
        | io::ErrorKind::ConnectionAborted
        | io::ErrorKind::BrokenPipe
        | io::ErrorKind::NotConnected => SessionError::ConnectionReset(err),
        io::ErrorKind::UnexpectedEof => SessionError::RemoteHostClosed,
        _ => SessionError::Transport(err),
    }
}

/// Log a session error
pub fn log_session_error(endpoint: &Endpoint, err: &SessionError) {
    error!("Session {} failed ({}): {}", endpoint, err.kind(), err);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn endpoint() -> Endpoint {
        Endpoint::new("127.0.0.1", 9000)
    }

    #[test]
    fn refused_connect_is_connection_error() {
        let err = io::Error::from(io::ErrorKind::ConnectionRefused);
        let classified = classify_connect_error(&endpoint(), err);
        assert!(matches!(classified, SessionError::ConnectionRefused(_)));
        assert_eq!(classified.kind(), ErrorKind::Connection);
    }

    #[test]
    fn unreachable_connect_keeps_source() {
        let err = io::Error::new(io::ErrorKind::NetworkUnreachable, "no route");
        let classified = classify_connect_error(&endpoint(), err);
        assert!(matches!(classified, SessionError::HostUnreachable(..)));
        assert!(classified.to_string().contains("no route"));
    }

    #[test]
    fn reset_on_stream_is_connection_error() {
        let err = io::Error::from(io::ErrorKind::ConnectionReset);
        assert_eq!(classify_io_error(err).kind(), ErrorKind::Connection);
    }

    #[test]
    fn local_fault_is_transport_error() {
        let err = io::Error::new(io::ErrorKind::Other, "too many open files");
        let classified = classify_io_error(err);
        assert_eq!(classified.kind(), ErrorKind::Transport);
        assert_eq!(classified.to_string(), "Socket error: too many open files");
    }
}
