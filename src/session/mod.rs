//! Session management
//!
//! A single outbound TCP session: its endpoint, its state machine, the
//! caller-facing client handle and the I/O worker that owns the socket.

pub mod client;
pub mod endpoint;
mod gate;
pub mod state;
mod worker;

pub use client::{SessionClient, SessionSettings};
pub use endpoint::Endpoint;
pub use state::SessionState;
