//! Outbound reset/action messages.
//!
//! One [`SimRequest`] is sent per simulation tick: `reset` at episode start,
//! `action` for every step thereafter.

// ============================================================================
// Imports
// ============================================================================

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::frame::Frame;

// ============================================================================
// AgentAction
// ============================================================================

/// One agent's control input for a single step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentAction {
    /// Planar movement command, each component in `[-1, 1]`.
    pub linear: [f32; 2],
    /// Rotation command in `[-1, 1]`.
    pub angular: f32,
}

impl AgentAction {
    /// Creates an action from raw policy output.
    #[inline]
    #[must_use]
    pub const fn new(linear: [f32; 2], angular: f32) -> Self {
        Self { linear, angular }
    }
}

// ============================================================================
// SimRequest
// ============================================================================

/// A message from the trainer to the simulator.
///
/// Serializes to the tagged form the simulator expects:
/// `{"type": "reset"}` or `{"type": "action", "actions": {...}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SimRequest {
    /// Begin a new episode.
    Reset,
    /// Advance one step with the given per-agent actions.
    Action {
        /// Control input keyed by agent name.
        actions: FxHashMap<String, AgentAction>,
    },
}

impl SimRequest {
    /// Creates an action request from a per-agent map.
    #[inline]
    #[must_use]
    pub fn action(actions: FxHashMap<String, AgentAction>) -> Self {
        Self::Action { actions }
    }

    /// Encodes the request as a text frame.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Json`](crate::Error::Json) if serialization fails.
    pub fn to_frame(&self) -> Result<Frame> {
        Ok(Frame::Text(serde_json::to_string(self)?))
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reset_wire_shape() {
        let frame = SimRequest::Reset.to_frame().expect("encode");
        assert_eq!(frame.as_text(), Some(r#"{"type":"reset"}"#));
    }

    #[test]
    fn test_action_wire_shape() {
        let mut actions = FxHashMap::default();
        actions.insert("red".to_owned(), AgentAction::new([0.5, -0.5], 1.0));

        let frame = SimRequest::action(actions).to_frame().expect("encode");
        let value: serde_json::Value =
            serde_json::from_str(frame.as_text().expect("text frame")).expect("valid json");

        assert_eq!(value["type"], "action");
        assert_eq!(value["actions"]["red"]["linear"][0], 0.5);
        assert_eq!(value["actions"]["red"]["angular"], 1.0);
    }

    #[test]
    fn test_request_round_trip() {
        let mut actions = FxHashMap::default();
        actions.insert("blue".to_owned(), AgentAction::new([0.0, 1.0], -0.25));
        let request = SimRequest::action(actions);

        let json = serde_json::to_string(&request).expect("encode");
        let decoded: SimRequest = serde_json::from_str(&json).expect("decode");
        assert_eq!(decoded, request);
    }
}
