//! TCP Echo Client - Entry Point
//!
//! Sends each line typed on stdin to the configured endpoint and prints
//! whatever the endpoint sends back.

use log::{error, info, warn};
use std::process;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};

use tcp_echo_client::utils::logging::setup_logging;
use tcp_echo_client::{ClientConfig, ConsoleObserver, SessionClient, SessionState};

#[tokio::main]
async fn main() {
    setup_logging();

    let config = match ClientConfig::load() {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            process::exit(2);
        }
    };

    let observer = Arc::new(ConsoleObserver::new(config.endpoint()));
    let client = SessionClient::from_config(&config, observer);

    if let Err(e) = client.connect() {
        error!("Failed to start session: {}", e);
        process::exit(1);
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    let state = loop {
        tokio::select! {
            line = lines.next_line() => match line {
                Ok(Some(line)) => {
                    if let Err(e) = client.send(&line) {
                        warn!("Input not sent: {}", e);
                    }
                }
                Ok(None) => {
                    info!("End of input, closing session");
                    client.close();
                    break client.wait_terminal().await;
                }
                Err(e) => {
                    error!("Failed to read input: {}", e);
                    client.close();
                    break client.wait_terminal().await;
                }
            },
            state = client.wait_terminal() => break state,
        }
    };

    info!("Session with {} ended: {}", client.endpoint(), state);

    // exit explicitly, a pending stdin read would otherwise hold the runtime open
    process::exit(if state == SessionState::Errored { 1 } else { 0 });
}
