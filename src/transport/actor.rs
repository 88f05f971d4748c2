//! Per-connection event loop.
//!
//! A [`ConnectionActor`] is the sole owner of one live WebSocket
//! connection. It is the only entity that issues raw read/write operations
//! on that socket: the bridge facade only ever observes the live-connection
//! count and the queues.
//!
//! # Event Loop
//!
//! One `tokio::select!` loop over three sources:
//!
//! - the outbound queue: dequeued payloads are written to the wire in order
//! - the WebSocket read half: data frames are pushed onto the inbound queue
//! - the shutdown signal: the socket is closed and the loop exits
//!
//! Wake-up is event-driven on all three; the loop never busy-spins and
//! never blocks reads while outbound work is pending.

// ============================================================================
// Imports
// ============================================================================

use std::sync::atomic::Ordering;

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::WebSocketStream;
use tracing::{debug, error, info, trace};

use crate::bridge::BridgeEvent;
use crate::frame::Frame;
use crate::identifiers::ConnectionId;
use crate::transport::listener::ListenerContext;

// ============================================================================
// ConnectionActor
// ============================================================================

/// Owns exactly one live connection and drives its I/O.
///
/// On termination (peer close, transport error or shutdown) the actor
/// releases its live-connection slot and emits a disconnect event; it does
/// not resurrect the connection.
pub(crate) struct ConnectionActor {
    id: ConnectionId,
    ws_stream: WebSocketStream<TcpStream>,
    context: ListenerContext,
}

impl ConnectionActor {
    /// Creates an actor for an upgraded WebSocket stream.
    pub(crate) fn new(
        id: ConnectionId,
        ws_stream: WebSocketStream<TcpStream>,
        context: ListenerContext,
    ) -> Self {
        Self {
            id,
            ws_stream,
            context,
        }
    }

    /// Runs the event loop until the connection ends.
    pub(crate) async fn run(self) {
        let Self {
            id,
            ws_stream,
            context,
        } = self;

        let (mut ws_write, mut ws_read) = ws_stream.split();
        let mut shutdown = context.shutdown.clone();

        // Take sole ownership of the outbound queue for the lifetime of
        // this connection. Released on exit so buffered payloads carry
        // over to the next connection unconsumed.
        let mut outbound = context.outbound_slot.lock().await;

        debug!(connection_id = %id, "actor started");

        loop {
            tokio::select! {
                // Outbound payloads from the caller
                queued = outbound.recv() => match queued {
                    Some(frame) => {
                        if let Err(e) = ws_write.send(frame.into_message()).await {
                            error!(connection_id = %id, error = %e, "write failed");
                            break;
                        }
                        trace!(connection_id = %id, "frame written");
                    }

                    None => {
                        debug!(connection_id = %id, "outbound queue closed");
                        break;
                    }
                },

                // Incoming frames from the peer
                incoming = ws_read.next() => match incoming {
                    Some(Ok(message)) => {
                        if message.is_close() {
                            debug!(connection_id = %id, "closed by peer");
                            break;
                        }

                        // Ping/pong are answered by the protocol layer and
                        // filtered out here.
                        if let Some(frame) = Frame::from_message(message)
                            && context.inbound_tx.send(frame).is_err()
                        {
                            debug!(connection_id = %id, "inbound queue closed");
                            break;
                        }
                    }

                    Some(Err(e)) => {
                        error!(connection_id = %id, error = %e, "read failed");
                        break;
                    }

                    None => {
                        debug!(connection_id = %id, "stream ended");
                        break;
                    }
                },

                // Shutdown from the bridge facade
                _ = shutdown.changed() => {
                    debug!(connection_id = %id, "shutdown received");
                    let _ = ws_write.close().await;
                    break;
                }
            }
        }

        // Release the outbound queue before announcing the disconnect so a
        // replacement connection can take over seamlessly.
        drop(outbound);

        context.live.fetch_sub(1, Ordering::SeqCst);
        let _ = context.events_tx.send(BridgeEvent::Disconnected(id));

        info!(connection_id = %id, "connection closed");
    }
}
