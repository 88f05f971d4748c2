//! Simulator message envelope.
//!
//! The bridge itself is payload-agnostic; this module defines the small
//! tagged-message envelope the environment adapter layers on top of it.
//!
//! # Wire Format
//!
//! Outbound (trainer → simulator):
//!
//! ```json
//! {"type": "reset"}
//! {"type": "action", "actions": {"red": {"linear": [0.1, -0.2], "angular": 0.5}}}
//! ```
//!
//! Inbound (simulator → trainer):
//!
//! ```json
//! {"data": {"observation": {...}, "reward": {...},
//!           "termination": {...}, "truncation": {...}, "info": {...}}}
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `request` | Outbound reset/action messages |
//! | `reply` | Inbound step data |

// ============================================================================
// Submodules
// ============================================================================

/// Outbound reset/action messages.
pub mod request;

/// Inbound step data.
pub mod reply;

// ============================================================================
// Re-exports
// ============================================================================

pub use reply::{SimReply, StepData};
pub use request::{AgentAction, SimRequest};
