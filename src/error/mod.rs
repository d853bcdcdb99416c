//! Error handling
//!
//! Defines error types and classification for the session client.

pub mod handlers;
pub mod types;

pub use types::*;
