//! WebSocket transport layer.
//!
//! This module owns all socket I/O. It runs entirely inside the bridge's
//! background runtime; nothing in here ever executes on the caller's thread.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐        accept         ┌───────────────────┐
//! │   Listener   │ ────────────────────► │  ConnectionActor  │
//! │ (TcpListener │   (at most one live)  │  sole owner of    │
//! │  + upgrade)  │                       │  the socket       │
//! └──────────────┘                       └───────────────────┘
//! ```
//!
//! # Connection Lifecycle
//!
//! 1. `listener::serve` accepts a TCP connection
//! 2. A slot in the live-connection count is reserved; a second connection
//!    while one is live is rejected outright
//! 3. The socket is upgraded to WebSocket and handed to a [`ConnectionActor`]
//! 4. The actor drains the outbound queue and feeds the inbound queue
//! 5. On peer close, transport error or shutdown the actor terminates,
//!    releases its slot and emits a disconnect event
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `actor` | Per-connection event loop |
//! | `listener` | Accept loop and connection policy |

// ============================================================================
// Submodules
// ============================================================================

/// Per-connection event loop.
pub(crate) mod actor;

/// Accept loop and connection policy.
pub(crate) mod listener;

// ============================================================================
// Re-exports
// ============================================================================

pub(crate) use actor::ConnectionActor;
