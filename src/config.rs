//! Bridge and relay configuration.
//!
//! Provides type-safe configuration for the bridge listener, queue sizing
//! and request deadlines.
//!
//! # Example
//!
//! ```ignore
//! use std::time::Duration;
//! use sim_bridge::BridgeConfig;
//!
//! let config = BridgeConfig::new()
//!     .with_port(7725)
//!     .with_outbound_capacity(64)
//!     .with_request_timeout(Duration::from_secs(10));
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::net::{IpAddr, Ipv4Addr};
use std::time::Duration;

// ============================================================================
// Constants
// ============================================================================

/// Port the simulator peer historically connects to.
pub const DEFAULT_SIM_PORT: u16 = 7725;

/// Port the video relay historically listens on.
pub const DEFAULT_RELAY_PORT: u16 = 8076;

/// Default outbound queue capacity.
pub const DEFAULT_OUTBOUND_CAPACITY: usize = 256;

const DEFAULT_BIND_IP: IpAddr = IpAddr::V4(Ipv4Addr::LOCALHOST);

// ============================================================================
// BridgeConfig
// ============================================================================

/// Configuration for a [`Bridge`](crate::Bridge) instance.
///
/// Defaults bind to `127.0.0.1:0` (OS-assigned port) with a 256-slot
/// outbound queue and no request deadline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BridgeConfig {
    /// IP address the listener binds to.
    pub bind_ip: IpAddr,

    /// Port the listener binds to (0 = OS-assigned).
    pub port: u16,

    /// Capacity of the bounded outbound queue.
    ///
    /// `send()` returns [`Error::QueueFull`](crate::Error::QueueFull) once
    /// this many payloads are buffered, rather than growing without bound.
    pub outbound_capacity: usize,

    /// Optional deadline applied to `receive()` and `request()`.
    ///
    /// `None` waits indefinitely (until a frame arrives, the peer
    /// disconnects, or the bridge stops).
    pub request_timeout: Option<Duration>,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            bind_ip: DEFAULT_BIND_IP,
            port: 0,
            outbound_capacity: DEFAULT_OUTBOUND_CAPACITY,
            request_timeout: None,
        }
    }
}

// ============================================================================
// Builder Methods
// ============================================================================

impl BridgeConfig {
    /// Creates a new configuration with default settings.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the IP address to bind to.
    #[inline]
    #[must_use]
    pub fn with_bind_ip(mut self, ip: IpAddr) -> Self {
        self.bind_ip = ip;
        self
    }

    /// Sets the port to bind to (0 = OS-assigned).
    #[inline]
    #[must_use]
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Sets the outbound queue capacity.
    #[inline]
    #[must_use]
    pub fn with_outbound_capacity(mut self, capacity: usize) -> Self {
        self.outbound_capacity = capacity;
        self
    }

    /// Sets the deadline for `receive()`/`request()`.
    #[inline]
    #[must_use]
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }
}

// ============================================================================
// RelayConfig
// ============================================================================

/// Configuration for a [`VideoRelay`](crate::VideoRelay) instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayConfig {
    /// IP address the relay listener binds to.
    pub bind_ip: IpAddr,

    /// Port the relay listener binds to (0 = OS-assigned).
    pub port: u16,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            bind_ip: DEFAULT_BIND_IP,
            port: 0,
        }
    }
}

impl RelayConfig {
    /// Creates a new configuration with default settings.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the IP address to bind to.
    #[inline]
    #[must_use]
    pub fn with_bind_ip(mut self, ip: IpAddr) -> Self {
        self.bind_ip = ip;
        self
    }

    /// Sets the port to bind to (0 = OS-assigned).
    #[inline]
    #[must_use]
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_bridge_config() {
        let config = BridgeConfig::default();
        assert_eq!(config.bind_ip, DEFAULT_BIND_IP);
        assert_eq!(config.port, 0);
        assert_eq!(config.outbound_capacity, DEFAULT_OUTBOUND_CAPACITY);
        assert_eq!(config.request_timeout, None);
    }

    #[test]
    fn test_bridge_config_builder() {
        let config = BridgeConfig::new()
            .with_port(DEFAULT_SIM_PORT)
            .with_outbound_capacity(8)
            .with_request_timeout(Duration::from_secs(5));

        assert_eq!(config.port, DEFAULT_SIM_PORT);
        assert_eq!(config.outbound_capacity, 8);
        assert_eq!(config.request_timeout, Some(Duration::from_secs(5)));
    }

    #[test]
    fn test_relay_config_builder() {
        let config = RelayConfig::new().with_port(DEFAULT_RELAY_PORT);
        assert_eq!(config.port, DEFAULT_RELAY_PORT);
        assert_eq!(config.bind_ip, DEFAULT_BIND_IP);
    }
}
