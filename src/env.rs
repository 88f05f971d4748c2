//! Environment adapter: the reset/step interface the training loop calls.
//!
//! [`RemoteEnv`] translates gym-style calls into envelope messages over the
//! bridge and decodes the simulator's replies. One `request` is issued per
//! simulation tick; the protocol carries no correlation IDs, so the adapter
//! relies on the bridge's ordering guarantee.

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;

use rustc_hash::FxHashMap;
use tracing::{debug, error};

use crate::bridge::Bridge;
use crate::error::Result;
use crate::protocol::{AgentAction, SimRequest, StepData};

// ============================================================================
// RemoteEnv
// ============================================================================

/// Reset/step adapter over a started [`Bridge`].
///
/// # Example
///
/// ```ignore
/// use std::sync::Arc;
/// use sim_bridge::{Bridge, BridgeConfig, RemoteEnv};
///
/// let bridge = Arc::new(Bridge::new(BridgeConfig::new().with_port(7725)));
/// bridge.start()?;
///
/// let env = RemoteEnv::new(Arc::clone(&bridge));
/// let initial = env.reset()?;
/// ```
pub struct RemoteEnv {
    bridge: Arc<Bridge>,
}

impl RemoteEnv {
    /// Creates an adapter over the given bridge.
    #[must_use]
    pub fn new(bridge: Arc<Bridge>) -> Self {
        Self { bridge }
    }

    /// Returns the underlying bridge.
    #[inline]
    #[must_use]
    pub fn bridge(&self) -> &Arc<Bridge> {
        &self.bridge
    }

    /// Begins a new episode and returns the initial step data.
    ///
    /// # Errors
    ///
    /// Any bridge error, plus [`Error::Protocol`](crate::Error::Protocol)
    /// if the reply does not decode.
    pub fn reset(&self) -> Result<StepData> {
        debug!("env reset");
        self.round_trip(&SimRequest::Reset)
    }

    /// Advances one step with the given per-agent actions.
    ///
    /// # Errors
    ///
    /// Any bridge error, plus [`Error::Protocol`](crate::Error::Protocol)
    /// if the reply does not decode.
    pub fn step(&self, actions: FxHashMap<String, AgentAction>) -> Result<StepData> {
        self.round_trip(&SimRequest::action(actions))
    }

    /// Encodes, round-trips and decodes one envelope message.
    fn round_trip(&self, request: &SimRequest) -> Result<StepData> {
        let reply = self.bridge.request(request.to_frame()?)?;

        StepData::from_frame(&reply).inspect_err(|e| {
            // Decode failures are surfaced, never swallowed.
            error!(error = %e, "failed to decode simulator reply");
        })
    }
}
