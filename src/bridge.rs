//! Synchronous-facing bridge over the asynchronous transport.
//!
//! The [`Bridge`] is what the rest of the system sees: a blocking
//! request/response interface backed by a persistent, event-driven WebSocket
//! listener running on a dedicated background runtime.
//!
//! # Concurrency Domains
//!
//! ```text
//! ┌──────────────────┐   outbound queue    ┌─────────────────────────┐
//! │  Caller thread   │ ──────────────────► │  Background runtime     │
//! │  (blocking)      │                     │  Listener + Actor       │
//! │  send / receive  │ ◄────────────────── │  (all socket I/O)       │
//! └──────────────────┘   inbound queue     └─────────────────────────┘
//! ```
//!
//! The caller's thread never performs socket I/O; the background runtime
//! never blocks the caller. The queues and the live-connection counter are
//! the only state crossing the boundary.
//!
//! # Ordering
//!
//! Frames reach the wire in `send()` order and reach `receive()` in wire
//! order. There is no correlation ID; ordering is the only pairing
//! guarantee, so the intended use is one outstanding `request()` at a time.

// ============================================================================
// Imports
// ============================================================================

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread::JoinHandle;
use std::time::Instant;

use crossbeam_channel::select;
use parking_lot::Mutex;
use tokio::net::TcpListener;
use tokio::runtime;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::config::BridgeConfig;
use crate::error::{Error, Result};
use crate::frame::Frame;
use crate::identifiers::ConnectionId;
use crate::transport::listener::{self, ListenerContext};

// ============================================================================
// Types
// ============================================================================

/// Lifecycle notifications emitted by the transport layer.
///
/// Consumed by `receive()` so a caller waiting for a reply is unblocked
/// promptly when the peer goes away instead of waiting out a deadline.
#[derive(Debug, Clone, Copy)]
pub(crate) enum BridgeEvent {
    /// A connection actor terminated.
    Disconnected(ConnectionId),
}

/// Runtime-side handles held while the bridge is started.
struct Started {
    /// Producer side of the bounded outbound queue.
    outbound_tx: mpsc::Sender<Frame>,
    /// Consumer side of the inbound queue.
    inbound_rx: crossbeam_channel::Receiver<Frame>,
    /// Consumer side of the lifecycle event queue.
    events_rx: crossbeam_channel::Receiver<BridgeEvent>,
    /// Shutdown signal for the listener and actors.
    shutdown_tx: watch::Sender<bool>,
    /// Address the listener actually bound.
    local_addr: SocketAddr,
    /// Background runtime thread.
    worker: JoinHandle<()>,
}

enum State {
    Idle,
    Started(Started),
}

// ============================================================================
// Bridge
// ============================================================================

/// Blocking facade over a background WebSocket listener.
///
/// Constructed idle; [`start`](Self::start) binds the listener and spins up
/// the background runtime, [`stop`](Self::stop) tears it down and joins it.
/// A stopped bridge can be started again.
///
/// Every `Bridge` is an owned value with its own lifecycle, so independent
/// bridges (e.g. one per training run) can coexist and be torn down
/// deterministically.
///
/// # Example
///
/// ```ignore
/// use sim_bridge::{Bridge, BridgeConfig, Frame};
///
/// let bridge = Bridge::new(BridgeConfig::new().with_port(7725));
/// bridge.start()?;
///
/// let reply = bridge.request(Frame::text(r#"{"type":"reset"}"#))?;
///
/// bridge.stop();
/// ```
pub struct Bridge {
    /// Static configuration.
    config: BridgeConfig,
    /// Lifecycle state.
    state: Mutex<State>,
    /// Live-connection count, shared with the transport layer.
    live: Arc<AtomicUsize>,
    /// Serializes `request()` calls so replies cannot interleave.
    request_lock: Mutex<()>,
}

// ============================================================================
// Bridge - Constructors
// ============================================================================

impl Bridge {
    /// Creates an idle bridge with the given configuration.
    #[must_use]
    pub fn new(config: BridgeConfig) -> Self {
        Self {
            config,
            state: Mutex::new(State::Idle),
            live: Arc::new(AtomicUsize::new(0)),
            request_lock: Mutex::new(()),
        }
    }

    /// Returns the configuration the bridge was built with.
    #[inline]
    #[must_use]
    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }
}

impl Default for Bridge {
    fn default() -> Self {
        Self::new(BridgeConfig::default())
    }
}

// ============================================================================
// Bridge - Lifecycle
// ============================================================================

impl Bridge {
    /// Binds the listener and launches the background runtime.
    ///
    /// Idempotent: a no-op if the bridge is already started.
    ///
    /// # Errors
    ///
    /// - [`Error::Bind`] if the listener cannot acquire its address
    /// - [`Error::Io`] if the background thread cannot be spawned
    pub fn start(&self) -> Result<()> {
        let mut state = self.state.lock();
        if matches!(&*state, State::Started(_)) {
            debug!("start() on a started bridge is a no-op");
            return Ok(());
        }

        let rt = runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;

        // Bind synchronously so a bind failure is fatal from start() itself.
        let addr = SocketAddr::new(self.config.bind_ip, self.config.port);
        let tcp_listener = rt
            .block_on(TcpListener::bind(addr))
            .map_err(|e| Error::bind(addr, e))?;
        let local_addr = tcp_listener.local_addr()?;

        let (outbound_tx, outbound_rx) = mpsc::channel(self.config.outbound_capacity);
        let (inbound_tx, inbound_rx) = crossbeam_channel::unbounded();
        let (events_tx, events_rx) = crossbeam_channel::unbounded();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let context = ListenerContext::new(
            Arc::clone(&self.live),
            outbound_rx,
            inbound_tx,
            events_tx,
            shutdown_rx,
        );

        let worker = std::thread::Builder::new()
            .name("sim-bridge".into())
            .spawn(move || {
                rt.block_on(listener::serve(tcp_listener, context));
            })?;

        info!(%local_addr, "bridge started");

        *state = State::Started(Started {
            outbound_tx,
            inbound_rx,
            events_rx,
            shutdown_tx,
            local_addr,
            worker,
        });

        Ok(())
    }

    /// Stops the background runtime and joins it.
    ///
    /// Unblocks any in-flight `receive()` with
    /// [`Error::ConnectionClosed`]. Idempotent: stopping an idle bridge is a
    /// no-op. After `stop()` returns no background activity remains and no
    /// queue is mutated further.
    pub fn stop(&self) {
        let started = {
            let mut state = self.state.lock();
            match std::mem::replace(&mut *state, State::Idle) {
                State::Started(started) => started,
                State::Idle => return,
            }
        };

        let Started {
            outbound_tx,
            inbound_rx,
            events_rx,
            shutdown_tx,
            local_addr: _,
            worker,
        } = started;

        let _ = shutdown_tx.send(true);
        drop(outbound_tx);

        if worker.join().is_err() {
            warn!("bridge worker thread panicked");
        }

        // Joining the worker dropped every runtime-side sender, so any
        // blocked receive() has already observed the disconnect.
        drop((inbound_rx, events_rx));
        self.live.store(0, Ordering::SeqCst);

        info!("bridge stopped");
    }

    /// Returns `true` iff at least one live connection exists.
    ///
    /// Safe to call concurrently with actor lifecycle changes; the count is
    /// a single atomic, so reads are never torn.
    #[inline]
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.live.load(Ordering::SeqCst) > 0
    }

    /// Returns the number of live connections.
    #[inline]
    #[must_use]
    pub fn connection_count(&self) -> usize {
        self.live.load(Ordering::SeqCst)
    }

    /// Returns the address the listener bound.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotStarted`] if the bridge is not started.
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
    /// Returns [`Error::NotStarted`] if the bridge is not started.
    pub fn port(&self) -> Result<u16> {
        self.local_addr().map(|addr| addr.port())
    }
}

// ============================================================================
// Bridge - Data Path
// ============================================================================

impl Bridge {
    /// Enqueues a payload for delivery to the peer.
    ///
    /// Never blocks. Succeeds with zero live connections: the payload is
    /// buffered and delivered FIFO once a connection exists.
    ///
    /// # Errors
    ///
    /// - [`Error::NotStarted`] if the bridge is not started
    /// - [`Error::QueueFull`] if the bounded outbound queue is at capacity
    /// - [`Error::ConnectionClosed`] if the background runtime is gone
    pub fn send(&self, frame: Frame) -> Result<()> {
        let outbound_tx = {
            let state = self.state.lock();
            match &*state {
                State::Started(started) => started.outbound_tx.clone(),
                State::Idle => return Err(Error::NotStarted),
            }
        };

        match outbound_tx.try_send(frame) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(_)) => Err(Error::queue_full(self.config.outbound_capacity)),
            Err(TrySendError::Closed(_)) => Err(Error::ConnectionClosed),
        }
    }

    /// Blocks until the next frame from the peer and returns it.
    ///
    /// Wake-up on frame arrival is immediate (channel-based, no sleep
    /// polling). Unblocks with [`Error::ConnectionClosed`] when the last
    /// live connection drops or the bridge stops, and with
    /// [`Error::Timeout`] if a request deadline is configured and elapses.
    ///
    /// # Errors
    ///
    /// - [`Error::NotStarted`] if the bridge is not started
    /// - [`Error::ConnectionClosed`] on disconnect or stop
    /// - [`Error::Timeout`] if the configured deadline elapses
    pub fn receive(&self) -> Result<Frame> {
        let deadline = self.config.request_timeout.map(|t| Instant::now() + t);
        self.blocking_receive(deadline, "receive")
    }

    /// Sends a payload and blocks for the matching reply.
    ///
    /// Composition of [`send`](Self::send) then [`receive`](Self::receive);
    /// inherits both contracts. Concurrent `request()` calls are serialized
    /// so replies cannot be claimed by the wrong caller.
    ///
    /// # Errors
    ///
    /// Any error from `send` or `receive`.
    pub fn request(&self, frame: Frame) -> Result<Frame> {
        let _guard = self.request_lock.lock();
        let deadline = self.config.request_timeout.map(|t| Instant::now() + t);
        self.send(frame)?;
        self.blocking_receive(deadline, "request")
    }

    /// Shared blocking wait over the inbound and lifecycle-event queues.
    fn blocking_receive(&self, deadline: Option<Instant>, operation: &str) -> Result<Frame> {
        let (inbound_rx, events_rx) = {
            let state = self.state.lock();
            match &*state {
                State::Started(started) => {
                    (started.inbound_rx.clone(), started.events_rx.clone())
                }
                State::Idle => return Err(Error::NotStarted),
            }
        };

        let timeout_ms = self
            .config
            .request_timeout
            .map_or(0, |t| t.as_millis() as u64);

        // Disconnect events queued before this call predate the wait. Only a
        // disconnect observed while blocked fails it; a past close with no
        // call pending must not stop a later wait from seeing a replacement
        // peer.
        while let Ok(BridgeEvent::Disconnected(id)) = events_rx.try_recv() {
            debug!(connection_id = %id, "drained pre-wait disconnect event");
        }

        loop {
            let event = match deadline {
                Some(deadline) => {
                    let wait = deadline.saturating_duration_since(Instant::now());
                    if wait.is_zero() {
                        return Err(Error::timeout(operation, timeout_ms));
                    }
                    select! {
                        recv(inbound_rx) -> frame => Waited::Inbound(frame.ok()),
                        recv(events_rx) -> event => Waited::Event(event.ok()),
                        default(wait) => return Err(Error::timeout(operation, timeout_ms)),
                    }
                }
                None => select! {
                    recv(inbound_rx) -> frame => Waited::Inbound(frame.ok()),
                    recv(events_rx) -> event => Waited::Event(event.ok()),
                },
            };

            match event {
                Waited::Inbound(Some(frame)) => return Ok(frame),
                // Inbound disconnects only once drained: the bridge stopped.
                Waited::Inbound(None) => return Err(Error::ConnectionClosed),
                Waited::Event(None) => {
                    // Runtime-side senders dropped; hand over anything that
                    // arrived before the shutdown, then report the close.
                    if let Ok(frame) = inbound_rx.try_recv() {
                        return Ok(frame);
                    }
                    return Err(Error::ConnectionClosed);
                }
                Waited::Event(Some(BridgeEvent::Disconnected(id))) => {
                    // The reply may have arrived just before the disconnect;
                    // drain it before giving up.
                    if let Ok(frame) = inbound_rx.try_recv() {
                        return Ok(frame);
                    }
                    if self.live.load(Ordering::SeqCst) == 0 {
                        debug!(connection_id = %id, "peer disconnected while waiting");
                        return Err(Error::ConnectionClosed);
                    }
                    // A replacement connection is live; keep waiting.
                    debug!(connection_id = %id, "stale disconnect event ignored");
                }
            }
        }
    }
}

/// Outcome of one wait iteration in [`Bridge::blocking_receive`].
enum Waited {
    Inbound(Option<Frame>),
    Event(Option<BridgeEvent>),
}

// ============================================================================
// Drop
// ============================================================================

impl Drop for Bridge {
    fn drop(&mut self) {
        // Deterministic teardown even if the caller forgot to stop().
        self.stop();
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_started_errors() {
        let bridge = Bridge::default();

        assert!(matches!(
            bridge.send(Frame::text("x")),
            Err(Error::NotStarted)
        ));
        assert!(matches!(bridge.receive(), Err(Error::NotStarted)));
        assert!(matches!(
            bridge.request(Frame::text("x")),
            Err(Error::NotStarted)
        ));
        assert!(matches!(bridge.local_addr(), Err(Error::NotStarted)));
    }

    #[test]
    fn test_stop_idle_is_noop() {
        let bridge = Bridge::default();
        bridge.stop();
        bridge.stop();
        assert!(!bridge.is_connected());
    }

    #[test]
    fn test_start_is_idempotent() {
        let bridge = Bridge::default();
        bridge.start().expect("first start");
        let addr = bridge.local_addr().expect("bound address");

        bridge.start().expect("second start is a no-op");
        assert_eq!(bridge.local_addr().expect("still bound"), addr);

        bridge.stop();
    }

    #[test]
    fn test_restart_after_stop() {
        let bridge = Bridge::default();
        bridge.start().expect("start");
        bridge.stop();
        assert!(matches!(bridge.local_addr(), Err(Error::NotStarted)));

        bridge.start().expect("restart");
        assert!(!bridge.is_connected());
        bridge.stop();
    }

    #[test]
    fn test_send_buffers_without_connection() {
        let bridge = Bridge::new(BridgeConfig::new().with_outbound_capacity(2));
        bridge.start().expect("start");

        bridge.send(Frame::text("p1")).expect("first send buffers");
        bridge.send(Frame::text("p2")).expect("second send buffers");
        assert!(matches!(
            bridge.send(Frame::text("p3")),
            Err(Error::QueueFull { capacity: 2 })
        ));

        bridge.stop();
    }

    #[test]
    fn test_bind_failure_is_synchronous() {
        let first = Bridge::default();
        first.start().expect("start");
        let port = first.port().expect("port");

        let second = Bridge::new(BridgeConfig::new().with_port(port));
        assert!(matches!(second.start(), Err(Error::Bind { .. })));

        first.stop();
    }
}
