//! Video relay: the fire-and-forget sibling of the bridge.
//!
//! The same listener pattern as [`Bridge`](crate::Bridge), with no reply
//! path: the peer streams raw encoded video chunks as binary frames, the
//! relay appends them to a [`FrameSink`], and a text `"finish"` sentinel
//! finalizes the sink (hands the recording to the downstream encoding
//! pipeline). The caller never calls `receive()` on this channel.

// ============================================================================
// Imports
// ============================================================================

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::thread::JoinHandle;

use async_trait::async_trait;
use futures_util::StreamExt;
use parking_lot::Mutex;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tokio::net::{TcpListener, TcpStream};
use tokio::runtime;
use tokio::sync::watch;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, error, info, warn};

use crate::config::RelayConfig;
use crate::error::{Error, Result};
use crate::identifiers::ConnectionId;

// ============================================================================
// Constants
// ============================================================================

/// Text payload that finalizes the current recording.
pub const FINISH_SENTINEL: &str = "finish";

// ============================================================================
// FrameSink
// ============================================================================

/// Destination for relayed video chunks.
///
/// Implementations append chunks in arrival order and finalize on
/// [`finish`](Self::finish). A sink may be finished and written again; each
/// finish closes one recording.
#[async_trait]
pub trait FrameSink: Send + 'static {
    /// Appends one chunk.
    async fn write_frame(&mut self, bytes: &[u8]) -> Result<()>;

    /// Finalizes the current recording.
    async fn finish(&mut self) -> Result<()>;
}

// ============================================================================
// FileSink
// ============================================================================

/// [`FrameSink`] that appends chunks to a file.
///
/// The file is created (truncating any previous recording) on the first
/// chunk after construction or after a `finish`.
pub struct FileSink {
    path: PathBuf,
    file: Option<File>,
}

impl FileSink {
    /// Creates a sink writing to `path`.
    #[must_use]
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            file: None,
        }
    }

    /// Returns the output path.
    #[inline]
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl FrameSink for FileSink {
    async fn write_frame(&mut self, bytes: &[u8]) -> Result<()> {
        if self.file.is_none() {
            self.file = Some(File::create(&self.path).await?);
            debug!(path = %self.path.display(), "recording started");
        }

        if let Some(file) = self.file.as_mut() {
            file.write_all(bytes).await?;
        }
        Ok(())
    }

    async fn finish(&mut self) -> Result<()> {
        if let Some(mut file) = self.file.take() {
            file.flush().await?;
            file.sync_all().await?;
            info!(path = %self.path.display(), "recording finalized");
        }
        Ok(())
    }
}

// ============================================================================
// VideoRelay
// ============================================================================

/// Runtime-side handles held while the relay is started.
struct Started {
    shutdown_tx: watch::Sender<bool>,
    local_addr: SocketAddr,
    worker: JoinHandle<()>,
}

enum State {
    Idle,
    Started(Started),
}

/// One-way bridge from a streaming peer to a [`FrameSink`].
///
/// # Example
///
/// ```ignore
/// use sim_bridge::{FileSink, RelayConfig, VideoRelay};
///
/// let relay = VideoRelay::new(RelayConfig::new().with_port(8076));
/// relay.start(FileSink::new("video/recorded.webm"))?;
/// // ... peer streams chunks, then sends "finish" ...
/// relay.stop();
/// ```
pub struct VideoRelay {
    config: RelayConfig,
    state: Mutex<State>,
}

impl VideoRelay {
    /// Creates an idle relay with the given configuration.
    #[must_use]
    pub fn new(config: RelayConfig) -> Self {
        Self {
            config,
            state: Mutex::new(State::Idle),
        }
    }

    /// Binds the listener and launches the background runtime.
    ///
    /// Idempotent: a no-op if already started (the sink is dropped).
    ///
    /// # Errors
    ///
    /// - [`Error::Bind`] if the listener cannot acquire its address
    /// - [`Error::Io`] if the background thread cannot be spawned
    pub fn start(&self, sink: impl FrameSink) -> Result<()> {
        let mut state = self.state.lock();
        if matches!(&*state, State::Started(_)) {
            debug!("start() on a started relay is a no-op");
            return Ok(());
        }

        let rt = runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;

        let addr = SocketAddr::new(self.config.bind_ip, self.config.port);
        let tcp_listener = rt
            .block_on(TcpListener::bind(addr))
            .map_err(|e| Error::bind(addr, e))?;
        let local_addr = tcp_listener.local_addr()?;

        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let worker = std::thread::Builder::new()
            .name("sim-relay".into())
            .spawn(move || {
                rt.block_on(serve(tcp_listener, Box::new(sink), shutdown_rx));
            })?;

        info!(%local_addr, "relay started");

        *state = State::Started(Started {
            shutdown_tx,
            local_addr,
            worker,
        });

        Ok(())
    }

    /// Stops the background runtime and joins it.
    ///
    /// Finalizes the sink if a recording is in progress. Idempotent.
    pub fn stop(&self) {
        let started = {
            let mut state = self.state.lock();
            match std::mem::replace(&mut *state, State::Idle) {
                State::Started(started) => started,
                State::Idle => return,
            }
        };

        let _ = started.shutdown_tx.send(true);
        if started.worker.join().is_err() {
            warn!("relay worker thread panicked");
        }

        info!("relay stopped");
    }

    /// Returns the address the listener bound.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotStarted`] if the relay is not started.
    pub fn local_addr(&self) -> Result<SocketAddr> {
        match &*self.state.lock() {
            State::Started(started) => Ok(started.local_addr),
            State::Idle => Err(Error::NotStarted),
        }
    }

    /// Returns the port the listener bound.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotStarted`] if the relay is not started.
    pub fn port(&self) -> Result<u16> {
        self.local_addr().map(|addr| addr.port())
    }
}

impl Drop for VideoRelay {
    fn drop(&mut self) {
        self.stop();
    }
}

// ============================================================================
// Serve Loop
// ============================================================================

/// Accepts streaming peers one at a time until shutdown.
///
/// Sequential handling keeps a single writer on the sink; a recording is
/// never interleaved between peers.
async fn serve(
    listener: TcpListener,
    mut sink: Box<dyn FrameSink>,
    mut shutdown: watch::Receiver<bool>,
) {
    debug!("relay accept loop started");

    let mut conn_shutdown = shutdown.clone();

    loop {
        tokio::select! {
            accepted = listener.accept() => match accepted {
                Ok((stream, addr)) => {
                    let id = ConnectionId::next();
                    info!(connection_id = %id, ?addr, "relay peer accepted");
                    relay_connection(id, stream, &mut sink, &mut conn_shutdown).await;
                }
                Err(e) => {
                    error!(error = %e, "relay accept failed");
                }
            },

            _ = shutdown.changed() => {
                debug!("relay accept loop shutting down");
                break;
            }
        }
    }

    // Close out a recording interrupted by shutdown.
    if let Err(e) = sink.finish().await {
        error!(error = %e, "failed to finalize sink on shutdown");
    }

    debug!("relay accept loop terminated");
}

/// Drains one streaming peer into the sink.
async fn relay_connection(
    id: ConnectionId,
    stream: TcpStream,
    sink: &mut Box<dyn FrameSink>,
    shutdown: &mut watch::Receiver<bool>,
) {
    let mut ws_stream = match tokio_tungstenite::accept_async(stream).await {
        Ok(ws_stream) => ws_stream,
        Err(e) => {
            warn!(connection_id = %id, error = %e, "relay upgrade failed");
            return;
        }
    };

    loop {
        tokio::select! {
            incoming = ws_stream.next() => match incoming {
                Some(Ok(Message::Binary(bytes))) => {
                    // A failed write leaves the recording short; appending
                    // later chunks would corrupt it silently. Drop the peer
                    // and finalize what was written.
                    if let Err(e) = sink.write_frame(&bytes).await {
                        error!(connection_id = %id, error = %e, "sink write failed");
                        if let Err(e) = sink.finish().await {
                            error!(connection_id = %id, error = %e, "sink finish failed");
                        }
                        let _ = ws_stream.close(None).await;
                        break;
                    }
                }

                Some(Ok(Message::Text(text))) => {
                    if text.as_str() == FINISH_SENTINEL {
                        if let Err(e) = sink.finish().await {
                            error!(connection_id = %id, error = %e, "sink finish failed");
                        }
                    } else {
                        warn!(connection_id = %id, payload = %text, "unexpected text frame");
                    }
                }

                Some(Ok(message)) => {
                    if message.is_close() {
                        debug!(connection_id = %id, "relay peer closed");
                        break;
                    }
                    // Ping/pong ignored.
                }

                Some(Err(e)) => {
                    error!(connection_id = %id, error = %e, "relay read failed");
                    break;
                }

                None => {
                    debug!(connection_id = %id, "relay stream ended");
                    break;
                }
            },

            _ = shutdown.changed() => {
                debug!(connection_id = %id, "relay shutdown received");
                let _ = ws_stream.close(None).await;
                break;
            }
        }
    }

    info!(connection_id = %id, "relay peer disconnected");
}
