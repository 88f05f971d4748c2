//! Accept loop and connection policy.
//!
//! The listener accepts incoming TCP connections, upgrades them to
//! WebSocket and hands each to a [`ConnectionActor`]. It holds no payload
//! state itself.
//!
//! # Connection Policy
//!
//! At most one connection is live at a time. A second connection arriving
//! while one is active is rejected outright (the socket is dropped before
//! the WebSocket upgrade) and a warning is logged. The protocol has no
//! per-connection identity on messages, so multiplexing two peers into the
//! shared queues would interleave unrelated request/response streams.

// ============================================================================
// Imports
// ============================================================================

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Mutex as AsyncMutex;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::bridge::BridgeEvent;
use crate::frame::Frame;
use crate::identifiers::ConnectionId;
use crate::transport::ConnectionActor;

// ============================================================================
// ListenerContext
// ============================================================================

/// Shared state handed from the bridge to the listener and its actors.
///
/// The outbound queue receiver lives in a slot guarded by an async mutex:
/// the active actor holds the lock for its lifetime, and releasing it on
/// actor exit hands any still-buffered payloads to the next connection
/// intact and in order.
#[derive(Clone)]
pub(crate) struct ListenerContext {
    /// Live-connection count, shared with the bridge facade.
    pub(crate) live: Arc<AtomicUsize>,
    /// Slot holding the single consumer of the outbound queue.
    pub(crate) outbound_slot: Arc<AsyncMutex<mpsc::Receiver<Frame>>>,
    /// Producer side of the inbound queue.
    pub(crate) inbound_tx: crossbeam_channel::Sender<Frame>,
    /// Producer side of the lifecycle event queue.
    pub(crate) events_tx: crossbeam_channel::Sender<BridgeEvent>,
    /// Shutdown signal from the bridge facade.
    pub(crate) shutdown: watch::Receiver<bool>,
}

impl ListenerContext {
    /// Creates the shared listener state.
    pub(crate) fn new(
        live: Arc<AtomicUsize>,
        outbound_rx: mpsc::Receiver<Frame>,
        inbound_tx: crossbeam_channel::Sender<Frame>,
        events_tx: crossbeam_channel::Sender<BridgeEvent>,
        shutdown: watch::Receiver<bool>,
    ) -> Self {
        Self {
            live,
            outbound_slot: Arc::new(AsyncMutex::new(outbound_rx)),
            inbound_tx,
            events_tx,
            shutdown,
        }
    }
}

// ============================================================================
// Accept Loop
// ============================================================================

/// Runs the accept loop until shutdown is signaled.
///
/// Per-connection accept or upgrade errors are logged and do not take the
/// listener down. On shutdown the current actor (if any) is awaited so the
/// socket closes cleanly before the runtime is torn down.
pub(crate) async fn serve(listener: TcpListener, context: ListenerContext) {
    debug!("accept loop started");

    let mut shutdown = context.shutdown.clone();
    let mut active: Option<JoinHandle<()>> = None;

    loop {
        tokio::select! {
            accepted = listener.accept() => match accepted {
                Ok((stream, addr)) => {
                    if let Some(handle) = handle_connection(stream, addr, &context) {
                        active = Some(handle);
                    }
                }
                Err(e) => {
                    error!(error = %e, "accept failed");
                }
            },

            _ = shutdown.changed() => {
                debug!("accept loop shutting down");
                break;
            }
        }
    }

    if let Some(handle) = active {
        let _ = handle.await;
    }

    debug!("accept loop terminated");
}

/// Applies the connection policy and spawns an actor for an accepted socket.
///
/// Returns the actor's task handle, or `None` if the connection was
/// rejected.
fn handle_connection(
    stream: TcpStream,
    addr: SocketAddr,
    context: &ListenerContext,
) -> Option<JoinHandle<()>> {
    // Reserve the single live slot before the upgrade so two racing
    // connections cannot both pass the policy check.
    if context
        .live
        .compare_exchange(0, 1, Ordering::SeqCst, Ordering::SeqCst)
        .is_err()
    {
        warn!(?addr, "rejecting connection: another peer is already active");
        return None;
    }

    let id = ConnectionId::next();
    let context = context.clone();

    Some(tokio::spawn(async move {
        match tokio_tungstenite::accept_async(stream).await {
            Ok(ws_stream) => {
                info!(connection_id = %id, ?addr, "connection established");
                ConnectionActor::new(id, ws_stream, context).run().await;
            }
            Err(e) => {
                // Release the reserved slot; the upgrade never completed.
                context.live.fetch_sub(1, Ordering::SeqCst);
                warn!(connection_id = %id, ?addr, error = %e, "websocket upgrade failed");
            }
        }
    }))
}
