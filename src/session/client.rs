//! Module `client`
//!
//! Defines `SessionClient`, the caller-facing handle of one TCP session.
//! Every operation returns immediately; socket work happens on the session
//! worker, which is also the only place observer notifications come from.

use log::{debug, info};
use std::io;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::{mpsc, watch};

use crate::config::ClientConfig;
use crate::error::SessionError;
use crate::observer::SessionObserver;
use crate::session::gate::NotifyGate;
use crate::session::worker::{Command, Worker, transition};
use crate::session::{Endpoint, SessionState};

const DEFAULT_READ_BUFFER_SIZE: usize = 4096;
const DEFAULT_CLOSE_LINGER: Duration = Duration::from_secs(1);

/// Tunables of a session that are not part of its identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionSettings {
    /// Upper bound on name resolution plus the TCP handshake. `None` waits for the OS.
    pub connect_timeout: Option<Duration>,
    /// Size of a single socket read.
    pub read_buffer_size: usize,
    /// How long `close()` lets already accepted writes drain before dropping them.
    pub close_linger: Duration,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            connect_timeout: None,
            read_buffer_size: DEFAULT_READ_BUFFER_SIZE,
            close_linger: DEFAULT_CLOSE_LINGER,
        }
    }
}

/// Owns a single outbound TCP connection to a fixed endpoint.
///
/// The client is `Send + Sync`. `send` and `close` serialize on the worker
/// mailbox, so a `send` that returned `Ok` is queued ahead of a later `close`,
/// which then gives it up to `close_linger` to reach the peer. `close` also
/// waits out any callback the worker is running, so no connected, data or
/// error notification starts after it returns.
pub struct SessionClient {
    endpoint: Endpoint,
    settings: SessionSettings,
    observer: Arc<dyn SessionObserver>,
    state: Arc<watch::Sender<SessionState>>,
    released: Arc<watch::Sender<bool>>,
    gate: Arc<NotifyGate>,
    mailbox: Mutex<Option<mpsc::UnboundedSender<Command>>>,
}

impl SessionClient {
    pub fn new(endpoint: Endpoint, observer: Arc<dyn SessionObserver>) -> Self {
        Self::with_settings(endpoint, SessionSettings::default(), observer)
    }

    pub fn with_settings(
        endpoint: Endpoint,
        settings: SessionSettings,
        observer: Arc<dyn SessionObserver>,
    ) -> Self {
        let (state, _) = watch::channel(SessionState::Disconnected);
        // no socket is held until the worker starts
        let (released, _) = watch::channel(true);

        Self {
            endpoint,
            settings,
            observer,
            state: Arc::new(state),
            released: Arc::new(released),
            gate: Arc::new(NotifyGate::default()),
            mailbox: Mutex::new(None),
        }
    }

    /// Build a client for the endpoint and tunables in `config`.
    pub fn from_config(config: &ClientConfig, observer: Arc<dyn SessionObserver>) -> Self {
        Self::with_settings(config.endpoint(), config.session_settings(), observer)
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    pub fn state(&self) -> SessionState {
        *self.state.borrow()
    }

    /// Starts connecting to the endpoint.
    ///
    /// Valid only while `Disconnected` and inside a Tokio runtime. The outcome
    /// arrives as `on_connected` or `on_error`.
    pub fn connect(&self) -> Result<(), SessionError> {
        let runtime = tokio::runtime::Handle::try_current().map_err(|e| {
            SessionError::Transport(io::Error::other(format!(
                "connect requires a Tokio runtime: {}",
                e
            )))
        })?;

        let mut mailbox = self.lock_mailbox();

        if !transition(&self.state, SessionState::Connecting) {
            return Err(SessionError::InvalidState {
                operation: "connect",
                state: self.state(),
            });
        }

        let (tx, rx) = mpsc::unbounded_channel();
        *mailbox = Some(tx);
        self.released.send_replace(false);

        info!("Connecting to {}", self.endpoint);

        let worker = Worker {
            endpoint: self.endpoint.clone(),
            settings: self.settings,
            observer: Arc::clone(&self.observer),
            state: Arc::clone(&self.state),
            released: Arc::clone(&self.released),
            gate: Arc::clone(&self.gate),
            mailbox: rx,
        };
        runtime.spawn(worker.run());

        Ok(())
    }

    /// Writes `text` as UTF-8 with no framing. See [`send_bytes`](Self::send_bytes).
    pub fn send(&self, text: &str) -> Result<(), SessionError> {
        self.send_bytes(text.as_bytes())
    }

    /// Submits `bytes` for a single best-effort write.
    ///
    /// Valid only while `Connected`; otherwise nothing is written. Completion
    /// is not reported, a failed write surfaces as `on_error`.
    pub fn send_bytes(&self, bytes: &[u8]) -> Result<(), SessionError> {
        let mailbox = self.lock_mailbox();

        let state = self.state();
        if state != SessionState::Connected {
            return Err(SessionError::InvalidState {
                operation: "send",
                state,
            });
        }

        if let Some(tx) = mailbox.as_ref() {
            if tx.send(Command::Write(bytes.to_vec())).is_err() {
                debug!("Session worker for {} already exited", self.endpoint);
            }
        }

        Ok(())
    }

    /// Closes the session. Idempotent.
    ///
    /// No connected, data or error notification fires once this returns;
    /// `on_closed` follows from the worker, or right away if the client never
    /// connected.
    pub fn close(&self) {
        // gate before mailbox: callbacks run under the gate and may call `send`
        let gate = self.gate.enter();
        let mut mailbox = self.lock_mailbox();

        if !transition(&self.state, SessionState::Closed) {
            debug!("Session {} already {}", self.endpoint, self.state());
            return;
        }

        match mailbox.take() {
            Some(tx) => {
                if tx.send(Command::Close).is_err() {
                    debug!("Session worker for {} already exited", self.endpoint);
                }
            }
            None => {
                drop(mailbox);
                drop(gate);
                info!("Session {} closed before connecting", self.endpoint);
                self.observer.on_closed();
            }
        }
    }

    /// Resolves once the session is terminal and its socket has been released.
    pub async fn wait_terminal(&self) -> SessionState {
        let mut state = self.state.subscribe();
        let terminal = match state.wait_for(|s| s.is_terminal()).await {
            Ok(s) => *s,
            Err(_) => self.state(),
        };

        let mut released = self.released.subscribe();
        let _ = released.wait_for(|r| *r).await;

        terminal
    }

    fn lock_mailbox(&self) -> MutexGuard<'_, Option<mpsc::UnboundedSender<Command>>> {
        self.mailbox.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
