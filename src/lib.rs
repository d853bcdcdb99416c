pub mod config;
pub mod error;
pub mod observer;
pub mod session;
pub mod utils;

pub use crate::config::ClientConfig;
pub use crate::error::{ErrorKind, SessionError};
pub use crate::observer::{ChannelObserver, ConsoleObserver, SessionEvent, SessionObserver};
pub use crate::session::{Endpoint, SessionClient, SessionSettings, SessionState};
