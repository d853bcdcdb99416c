//! Session worker
//!
//! One Tokio task per session. It owns the read half and a writer task that
//! owns the write half, so the socket is dropped on every exit path, and it
//! delivers every observer notification in order.

use log::{debug, info, warn};
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpStream, lookup_host};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use crate::error::SessionError;
use crate::error::handlers::{classify_connect_error, classify_io_error, log_session_error};
use crate::observer::SessionObserver;
use crate::session::SessionSettings;
use crate::session::gate::NotifyGate;
use crate::session::{Endpoint, SessionState};

/// Requests from the client handle to its worker.
pub(super) enum Command {
    Write(Vec<u8>),
    Close,
}

/// How the worker's session ended.
enum Exit {
    Closed,
    Failed(SessionError),
    /// The client handle was dropped without closing.
    Dropped,
}

/// Applies `next` if the state machine allows it. Returns whether it did.
pub(super) fn transition(state: &watch::Sender<SessionState>, next: SessionState) -> bool {
    state.send_if_modified(|current| {
        if current.can_transition_to(next) {
            *current = next;
            true
        } else {
            false
        }
    })
}

pub(super) struct Worker {
    pub(super) endpoint: Endpoint,
    pub(super) settings: SessionSettings,
    pub(super) observer: Arc<dyn SessionObserver>,
    pub(super) state: Arc<watch::Sender<SessionState>>,
    pub(super) released: Arc<watch::Sender<bool>>,
    pub(super) gate: Arc<NotifyGate>,
    pub(super) mailbox: mpsc::UnboundedReceiver<Command>,
}

impl Worker {
    pub(super) async fn run(mut self) {
        // the socket lives inside `session` and is gone once it returns
        let exit = self.session().await;

        match exit {
            Exit::Closed => self.finish_closed(),
            Exit::Failed(err) => {
                let reported = self.gate.dispatch(|| {
                    if !transition(&self.state, SessionState::Errored) {
                        return false;
                    }
                    log_session_error(&self.endpoint, &err);
                    self.observer.on_error(err.kind(), &err.to_string());
                    true
                });
                if !reported {
                    debug!("Ignoring error after close on {}: {}", self.endpoint, err);
                    self.finish_closed();
                }
            }
            Exit::Dropped => debug!("Session {} dropped, socket released", self.endpoint),
        }

        self.released.send_replace(true);
    }

    fn finish_closed(&self) {
        info!("Session {} closed", self.endpoint);
        self.observer.on_closed();
    }

    async fn session(&mut self) -> Exit {
        let stream = match self.establish().await {
            Ok(stream) => stream,
            Err(exit) => return exit,
        };

        let connected = self.gate.dispatch(|| {
            if !transition(&self.state, SessionState::Connected) {
                return false;
            }
            info!("Connected to {}", self.endpoint);
            self.observer.on_connected();
            true
        });
        if !connected {
            // closed while the handshake was completing
            return Exit::Closed;
        }

        let (mut reader, writer) = stream.into_split();
        let (write_tx, write_rx) = mpsc::unbounded_channel();
        let (failed_tx, mut failed_rx) = mpsc::unbounded_channel();
        let write_task = tokio::spawn(write_loop(
            writer,
            write_rx,
            failed_tx,
            self.endpoint.clone(),
        ));
        let mut buf = vec![0u8; self.settings.read_buffer_size.max(1)];

        let exit = self
            .pump(&mut reader, &write_tx, &mut failed_rx, &mut buf)
            .await;
        drop(write_tx);

        match exit {
            Exit::Closed => self.linger(&mut reader, write_task, &mut buf).await,
            _ => {
                write_task.abort();
                let _ = write_task.await;
            }
        }

        exit
    }

    /// Connects while still honoring `Close` and a dropped handle.
    async fn establish(&mut self) -> Result<TcpStream, Exit> {
        let connecting = open_stream(&self.endpoint, self.settings.connect_timeout);
        tokio::pin!(connecting);

        loop {
            tokio::select! {
                biased;
                command = self.mailbox.recv() => match command {
                    Some(Command::Close) => return Err(Exit::Closed),
                    Some(Command::Write(bytes)) => {
                        debug!("Discarding {} bytes queued before connect", bytes.len());
                    }
                    None => return Err(Exit::Dropped),
                },
                result = &mut connecting => return result.map_err(Exit::Failed),
            }
        }
    }

    /// Moves data both ways until the session ends. Writes run on the writer
    /// task, so reading never stalls behind a slow peer.
    async fn pump(
        &mut self,
        reader: &mut OwnedReadHalf,
        write_tx: &mpsc::UnboundedSender<Vec<u8>>,
        failed_rx: &mut mpsc::UnboundedReceiver<io::Error>,
        buf: &mut [u8],
    ) -> Exit {
        loop {
            tokio::select! {
                biased;
                command = self.mailbox.recv() => match command {
                    Some(Command::Write(bytes)) => {
                        if write_tx.send(bytes).is_err() {
                            debug!("Writer for {} already exited", self.endpoint);
                        }
                    }
                    Some(Command::Close) => return Exit::Closed,
                    None => return Exit::Dropped,
                },
                Some(err) = failed_rx.recv() => return Exit::Failed(classify_io_error(err)),
                result = reader.read(buf) => match result {
                    Ok(0) => {
                        warn!("Remote host {} closed the connection", self.endpoint);
                        return Exit::Failed(SessionError::RemoteHostClosed);
                    }
                    Ok(n) => {
                        let data = drain_available(reader, buf, n);
                        let delivered = self.gate.dispatch(|| {
                            if *self.state.borrow() != SessionState::Connected {
                                return false;
                            }
                            debug!("Read {} bytes from {}", data.len(), self.endpoint);
                            self.observer.on_data_received(&data);
                            true
                        });
                        if !delivered {
                            return Exit::Closed;
                        }
                    }
                    Err(e) => return Exit::Failed(classify_io_error(e)),
                },
            }
        }
    }

    /// Gives writes accepted before `close()` up to `close_linger` to reach the
    /// peer, discarding inbound bytes meanwhile, then drops whatever is left.
    async fn linger(
        &self,
        reader: &mut OwnedReadHalf,
        mut write_task: JoinHandle<()>,
        buf: &mut [u8],
    ) {
        let deadline = tokio::time::sleep(self.settings.close_linger);
        tokio::pin!(deadline);
        let mut reading = true;

        let flushed = loop {
            tokio::select! {
                biased;
                _ = &mut write_task => break true,
                _ = &mut deadline => break false,
                result = reader.read(buf), if reading => {
                    if matches!(result, Ok(0) | Err(_)) {
                        reading = false;
                    }
                }
            }
        };

        if !flushed {
            warn!(
                "Discarding unsent data to {} after {:?}",
                self.endpoint, self.settings.close_linger
            );
            write_task.abort();
            let _ = write_task.await;
        }
    }
}

/// Writes queued chunks in order. The first failure is reported on `failed`
/// and ends the task; dropping the write half shuts down the sending side.
async fn write_loop(
    mut writer: OwnedWriteHalf,
    mut queue: mpsc::UnboundedReceiver<Vec<u8>>,
    failed: mpsc::UnboundedSender<io::Error>,
    endpoint: Endpoint,
) {
    while let Some(bytes) = queue.recv().await {
        if let Err(e) = writer.write_all(&bytes).await {
            let _ = failed.send(e);
            return;
        }
        debug!("Wrote {} bytes to {}", bytes.len(), endpoint);
    }
}

/// Resolves `endpoint` and opens a stream to the first address that accepts.
async fn open_stream(
    endpoint: &Endpoint,
    connect_timeout: Option<Duration>,
) -> Result<TcpStream, SessionError> {
    let attempt = async {
        let addrs: Vec<SocketAddr> = lookup_host((endpoint.host(), endpoint.port()))
            .await
            .map_err(|e| SessionError::HostNotFound(endpoint.clone(), e))?
            .collect();

        if addrs.is_empty() {
            return Err(SessionError::HostNotFound(
                endpoint.clone(),
                io::Error::new(io::ErrorKind::NotFound, "no addresses resolved"),
            ));
        }
        debug!("Resolved {} to {:?}", endpoint, addrs);

        let stream = TcpStream::connect(&addrs[..])
            .await
            .map_err(|e| classify_connect_error(endpoint, e))?;
        Ok::<TcpStream, SessionError>(stream)
    };

    match connect_timeout {
        Some(limit) => tokio::time::timeout(limit, attempt)
            .await
            .map_err(|_| SessionError::ConnectTimeout(endpoint.clone(), limit))?,
        None => attempt.await,
    }
}

/// Collects everything readable right now after a read of `first` bytes
/// filled the front of `buf`.
fn drain_available(reader: &OwnedReadHalf, buf: &mut [u8], first: usize) -> Vec<u8> {
    let mut data = buf[..first].to_vec();
    let mut last = first;

    while last == buf.len() {
        match reader.try_read(buf) {
            Ok(0) => break,
            Ok(n) => {
                data.extend_from_slice(&buf[..n]);
                last = n;
            }
            // WouldBlock, or an error the next read will surface
            Err(_) => break,
        }
    }

    data
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transition_rejects_leaving_terminal_state() {
        let (state, _rx) = watch::channel(SessionState::Disconnected);
        assert!(transition(&state, SessionState::Connecting));
        assert!(transition(&state, SessionState::Closed));
        assert!(!transition(&state, SessionState::Errored));
        assert_eq!(*state.borrow(), SessionState::Closed);
    }

    #[test]
    fn transition_does_not_notify_when_rejected() {
        let (state, rx) = watch::channel(SessionState::Disconnected);
        assert!(!transition(&state, SessionState::Connected));
        assert!(!rx.has_changed().unwrap());
    }

    #[tokio::test]
    async fn unresolvable_host_is_host_not_found() {
        let endpoint = Endpoint::new("no-such-host.invalid", 7);
        let err = open_stream(&endpoint, None).await.unwrap_err();
        assert!(matches!(err, SessionError::HostNotFound(..)), "{err:?}");
        assert_eq!(err.kind(), crate::error::ErrorKind::Connection);
    }
}
