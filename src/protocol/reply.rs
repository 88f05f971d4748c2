//! Inbound step data.
//!
//! Every simulator reply wraps the step outcome in a `data` object. Only
//! `observation` is mandatory; reset replies omit the reward and
//! termination maps.

// ============================================================================
// Imports
// ============================================================================

use rustc_hash::FxHashMap;
use serde::Deserialize;
use serde_json::Value;

use crate::error::{Error, Result};
use crate::frame::Frame;

// ============================================================================
// SimReply
// ============================================================================

/// Top-level simulator reply: `{"data": {...}}`.
#[derive(Debug, Clone, Deserialize)]
pub struct SimReply {
    /// The step outcome.
    pub data: StepData,
}

// ============================================================================
// StepData
// ============================================================================

/// Outcome of one reset or step, keyed by agent name throughout.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StepData {
    /// Per-agent observation vectors.
    pub observation: FxHashMap<String, Vec<f32>>,

    /// Per-agent scalar rewards (absent on reset).
    #[serde(default)]
    pub reward: FxHashMap<String, f32>,

    /// Per-agent termination flags (absent on reset).
    #[serde(default)]
    pub termination: FxHashMap<String, bool>,

    /// Per-agent truncation flags (absent on reset).
    #[serde(default)]
    pub truncation: FxHashMap<String, bool>,

    /// Free-form per-agent metadata.
    #[serde(default)]
    pub info: FxHashMap<String, Value>,
}

impl StepData {
    /// Decodes step data from a reply frame.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Protocol`] if the frame is binary or the JSON does
    /// not match the envelope.
    pub fn from_frame(frame: &Frame) -> Result<Self> {
        let text = frame
            .as_text()
            .ok_or_else(|| Error::protocol("binary frame where JSON reply expected"))?;

        let reply: SimReply = serde_json::from_str(text)
            .map_err(|e| Error::protocol(format!("malformed simulator reply: {e}")))?;

        Ok(reply.data)
    }

    /// Returns `true` if the agent's episode ended this step.
    #[inline]
    #[must_use]
    pub fn is_done(&self, agent: &str) -> bool {
        self.termination.get(agent).copied().unwrap_or(false)
            || self.truncation.get(agent).copied().unwrap_or(false)
    }

    /// Returns the agents still active after this step.
    #[must_use]
    pub fn active_agents(&self) -> Vec<&str> {
        self.observation
            .keys()
            .map(String::as_str)
            .filter(|agent| !self.is_done(agent))
            .collect()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const STEP_JSON: &str = r#"{
        "data": {
            "observation": {"red": [0.1, 0.2], "blue": [0.3, 0.4]},
            "reward": {"red": 1.0, "blue": -1.0},
            "termination": {"red": false, "blue": true},
            "truncation": {"red": false, "blue": false},
            "info": {}
        }
    }"#;

    #[test]
    fn test_decode_step_reply() {
        let data = StepData::from_frame(&Frame::text(STEP_JSON)).expect("decode");

        assert_eq!(data.observation["red"], vec![0.1, 0.2]);
        assert_eq!(data.reward["blue"], -1.0);
        assert!(data.is_done("blue"));
        assert!(!data.is_done("red"));
        assert_eq!(data.active_agents(), vec!["red"]);
    }

    #[test]
    fn test_decode_reset_reply_defaults() {
        let json = r#"{"data": {"observation": {"red": [0.0]}, "info": {"red": {"hp": 10}}}}"#;
        let data = StepData::from_frame(&Frame::text(json)).expect("decode");

        assert!(data.reward.is_empty());
        assert!(data.termination.is_empty());
        assert!(!data.is_done("red"));
        assert_eq!(data.info["red"]["hp"], 10);
    }

    #[test]
    fn test_malformed_reply_is_protocol_error() {
        let err = StepData::from_frame(&Frame::text("not json")).unwrap_err();
        assert!(matches!(err, Error::Protocol { .. }));
    }

    #[test]
    fn test_binary_reply_is_protocol_error() {
        let err = StepData::from_frame(&Frame::binary(vec![0u8, 1])).unwrap_err();
        assert!(matches!(err, Error::Protocol { .. }));
    }
}
