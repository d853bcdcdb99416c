//! Console observer
//!
//! The display side of the console shell: prints what the session reports.

use log::debug;

use crate::error::ErrorKind;
use crate::observer::SessionObserver;
use crate::session::Endpoint;

pub struct ConsoleObserver {
    endpoint: Endpoint,
}

impl ConsoleObserver {
    pub fn new(endpoint: Endpoint) -> Self {
        Self { endpoint }
    }
}

impl SessionObserver for ConsoleObserver {
    fn on_connected(&self) {
        println!("Connected to {}.", self.endpoint);
    }

    fn on_data_received(&self, data: &[u8]) {
        println!("Reading data: {}", String::from_utf8_lossy(data));
    }

    fn on_error(&self, kind: ErrorKind, message: &str) {
        debug!("Displaying {} for {}", kind, self.endpoint);
        println!("The following error occurred: {}.", message);
    }

    fn on_closed(&self) {
        println!("Disconnected from {}.", self.endpoint);
    }
}
