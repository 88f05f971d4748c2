//! sim-bridge - Synchronous bridge to a WebSocket-connected simulator.
//!
//! This library glues a blocking, step-based reinforcement-learning
//! training loop to an external real-time simulator that runs as a
//! separate process and communicates only over a duplex WebSocket.
//!
//! # Architecture
//!
//! Two concurrency domains, joined only by queues:
//!
//! - **Caller thread (blocking)**: the simulation-step loop issues one
//!   `request` per tick and expects exactly one matching reply
//! - **Background runtime (event-driven)**: a per-bridge tokio runtime
//!   runs the listener and the connection actor; all socket I/O lives here
//!
//! Key design principles:
//!
//! - The [`Bridge`] never touches the wire; the connection actor never
//!   blocks the caller's thread
//! - One actor is the sole owner of one live connection
//! - Delivery order equals arrival order on both queues; ordering is the
//!   only request/response correlation
//! - Channel-based waits throughout (no sleep polling, no bare flags)
//!
//! # Quick Start
//!
//! ```no_run
//! use sim_bridge::{Bridge, BridgeConfig, Frame, Result};
//!
//! fn main() -> Result<()> {
//!     let bridge = Bridge::new(BridgeConfig::new().with_port(7725));
//!     bridge.start()?;
//!
//!     // The simulator connects, then one request per tick:
//!     let reply = bridge.request(Frame::text(r#"{"type":"reset"}"#))?;
//!     println!("initial state: {:?}", reply.as_text());
//!
//!     bridge.stop();
//!     Ok(())
//! }
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`bridge`] | Blocking facade: queues, lifecycle, request/response |
//! | [`config`] | Bridge and relay configuration |
//! | [`env`] | Reset/step adapter for the training loop |
//! | [`error`] | Error types and [`Result`] alias |
//! | [`frame`] | Opaque message unit |
//! | [`identifiers`] | Type-safe ID wrappers |
//! | [`protocol`] | Simulator message envelope |
//! | [`relay`] | Fire-and-forget video chunk relay |
//! | [`transport`] | Listener and connection actor (internal) |

// ============================================================================
// Modules
// ============================================================================

/// Blocking facade over the asynchronous transport.
///
/// The component the rest of the system sees: `start`, `stop`,
/// `is_connected`, `send`, `receive`, `request`.
pub mod bridge;

/// Bridge and relay configuration.
pub mod config;

/// Reset/step adapter for the training loop.
pub mod env;

/// Error types and result aliases.
///
/// All fallible operations return [`Result<T>`] which uses [`Error`].
pub mod error;

/// Opaque message unit exchanged over the transport.
pub mod frame;

/// Type-safe identifiers for bridge entities.
pub mod identifiers;

/// Simulator message envelope (adapter layer).
pub mod protocol;

/// Fire-and-forget video chunk relay.
pub mod relay;

/// WebSocket transport layer.
///
/// Internal module handling the listener and per-connection actors.
pub mod transport;

// ============================================================================
// Re-exports
// ============================================================================

// Bridge types
pub use bridge::Bridge;

// Configuration types
pub use config::{
    BridgeConfig, DEFAULT_OUTBOUND_CAPACITY, DEFAULT_RELAY_PORT, DEFAULT_SIM_PORT, RelayConfig,
};

// Adapter types
pub use env::RemoteEnv;

// Error types
pub use error::{Error, Result};

// Frame type
pub use frame::Frame;

// Identifier types
pub use identifiers::ConnectionId;

// Protocol types
pub use protocol::{AgentAction, SimReply, SimRequest, StepData};

// Relay types
pub use relay::{FINISH_SENTINEL, FileSink, FrameSink, VideoRelay};
