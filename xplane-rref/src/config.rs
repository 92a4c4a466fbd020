//! Client configuration types
//!
//! Every constant the client depends on (addresses, timers, dataref paths and
//! thresholds) lives in one immutable [`ClientConfig`] that is handed to the
//! session, the scheduler and the dispatcher when they are built. The two index
//! ranges are protocol-level constants and are not configurable.

use crate::types::{Result, RrefError};
use serde::{Deserialize, Serialize};
use std::net::{SocketAddr, ToSocketAddrs};
use std::ops::RangeInclusive;
use std::time::Duration;

/// Subscription indices used for the generic light switches (inclusive)
pub const LIGHT_INDICES: RangeInclusive<i32> = 0..=100;

/// Subscription indices used for the gear deploy ratios (inclusive)
pub const GEAR_INDICES: RangeInclusive<i32> = 200..=209;

/// Offset between a gear subscription index and its gear unit number
pub const GEAR_INDEX_BASE: i32 = 200;

/// Default dataref array for the generic light switches
pub const DEFAULT_LIGHTS_PATH: &str = "sim/cockpit2/switches/generic_lights_switch";

/// Default dataref array for the gear deploy ratios
pub const DEFAULT_GEAR_PATH: &str = "sim/flightmodel2/gear/deploy_ratio";

/// Configuration for the RREF client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Simulator host (default: 127.0.0.1)
    #[serde(default = "default_sim_host")]
    pub sim_host: String,

    /// Simulator UDP port (default: 49001)
    #[serde(default = "default_sim_port")]
    pub sim_port: u16,

    /// Local interface to bind (default: 0.0.0.0)
    #[serde(default = "default_local_host")]
    pub local_host: String,

    /// Local UDP port the simulator sends updates to (default: 19191)
    #[serde(default = "default_local_port")]
    pub local_port: u16,

    /// Seconds between full subscription batches (default: 10)
    #[serde(default = "default_resubscribe_interval")]
    pub resubscribe_interval_secs: u64,

    /// Receive timeout in milliseconds (default: 1000ms)
    #[serde(default = "default_receive_timeout")]
    pub receive_timeout_ms: u64,

    /// Largest datagram accepted in one receive (default: 4096)
    #[serde(default = "default_receive_buffer")]
    pub receive_buffer_size: usize,

    /// Requested update rate for every subscription (default: 5 Hz)
    #[serde(default = "default_frequency")]
    pub frequency_hz: i32,

    /// Dataref array subscribed for indices 0..=100
    #[serde(default = "default_lights_path")]
    pub lights_path: String,

    /// Dataref array subscribed for indices 200..=209
    #[serde(default = "default_gear_path")]
    pub gear_path: String,

    /// Light values strictly above this are "on" (default: 0.5)
    #[serde(default = "default_light_threshold")]
    pub light_threshold: f32,

    /// Gear ratio changes strictly above this are reported (default: 0.01)
    #[serde(default = "default_gear_delta")]
    pub gear_delta: f32,

    /// Send frequency-0 requests for the whole batch when stopping
    #[serde(default)]
    pub unsubscribe_on_stop: bool,
}

fn default_sim_host() -> String {
    "127.0.0.1".to_string()
}

fn default_sim_port() -> u16 {
    49001
}

fn default_local_host() -> String {
    "0.0.0.0".to_string()
}

fn default_local_port() -> u16 {
    19191
}

fn default_resubscribe_interval() -> u64 {
    10
}

fn default_receive_timeout() -> u64 {
    1000
}

fn default_receive_buffer() -> usize {
    4096
}

fn default_frequency() -> i32 {
    5
}

fn default_lights_path() -> String {
    DEFAULT_LIGHTS_PATH.to_string()
}

fn default_gear_path() -> String {
    DEFAULT_GEAR_PATH.to_string()
}

fn default_light_threshold() -> f32 {
    0.5
}

fn default_gear_delta() -> f32 {
    0.01
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            sim_host: default_sim_host(),
            sim_port: default_sim_port(),
            local_host: default_local_host(),
            local_port: default_local_port(),
            resubscribe_interval_secs: default_resubscribe_interval(),
            receive_timeout_ms: default_receive_timeout(),
            receive_buffer_size: default_receive_buffer(),
            frequency_hz: default_frequency(),
            lights_path: default_lights_path(),
            gear_path: default_gear_path(),
            light_threshold: default_light_threshold(),
            gear_delta: default_gear_delta(),
            unsubscribe_on_stop: false,
        }
    }
}

impl ClientConfig {
    /// Create a configuration with the default simulator settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method: set the simulator address
    pub fn with_simulator(mut self, host: impl Into<String>, port: u16) -> Self {
        self.sim_host = host.into();
        self.sim_port = port;
        self
    }

    /// Builder method: set the local bind address
    pub fn with_local(mut self, host: impl Into<String>, port: u16) -> Self {
        self.local_host = host.into();
        self.local_port = port;
        self
    }

    /// Builder method: set the receive timeout (must be non-zero, `UdpSession::open` rejects zero)
    pub fn with_receive_timeout(mut self, timeout: Duration) -> Self {
        self.receive_timeout_ms = timeout.as_millis() as u64;
        self
    }

    /// Builder method: set the resubscription interval in seconds
    pub fn with_resubscribe_interval(mut self, secs: u64) -> Self {
        self.resubscribe_interval_secs = secs;
        self
    }

    /// Builder method: unsubscribe everything on graceful stop
    pub fn with_unsubscribe_on_stop(mut self, enabled: bool) -> Self {
        self.unsubscribe_on_stop = enabled;
        self
    }

    /// Resolve the simulator address
    pub fn sim_addr(&self) -> Result<SocketAddr> {
        resolve(&self.sim_host, self.sim_port)
    }

    /// Resolve the local bind address
    pub fn local_addr(&self) -> Result<SocketAddr> {
        resolve(&self.local_host, self.local_port)
    }

    /// Receive timeout as a std duration
    pub fn receive_timeout(&self) -> Duration {
        Duration::from_millis(self.receive_timeout_ms)
    }

    /// Resubscription interval, measured on the monotonic clock
    pub fn resubscribe_interval(&self) -> Duration {
        Duration::from_secs(self.resubscribe_interval_secs)
    }
}

fn resolve(host: &str, port: u16) -> Result<SocketAddr> {
    (host, port)
        .to_socket_addrs()
        .map_err(|e| RrefError::InvalidAddress(format!("{}:{} ({})", host, port, e)))?
        .next()
        .ok_or_else(|| RrefError::InvalidAddress(format!("{}:{}", host, port)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_protocol_constants() {
        let config = ClientConfig::new();

        assert_eq!(config.sim_addr().unwrap(), "127.0.0.1:49001".parse::<SocketAddr>().unwrap());
        assert_eq!(config.local_addr().unwrap(), "0.0.0.0:19191".parse::<SocketAddr>().unwrap());
        assert_eq!(config.receive_timeout(), Duration::from_secs(1));
        assert_eq!(config.resubscribe_interval(), Duration::from_secs(10));
        assert_eq!(config.frequency_hz, 5);
        assert_eq!(config.receive_buffer_size, 4096);
        assert!(!config.unsubscribe_on_stop);
    }

    #[test]
    fn test_builder() {
        let config = ClientConfig::new()
            .with_simulator("10.0.0.2", 49000)
            .with_local("127.0.0.1", 0)
            .with_receive_timeout(Duration::from_millis(250))
            .with_resubscribe_interval(30)
            .with_unsubscribe_on_stop(true);

        assert_eq!(config.sim_addr().unwrap(), "10.0.0.2:49000".parse::<SocketAddr>().unwrap());
        assert_eq!(config.local_port, 0);
        assert_eq!(config.receive_timeout_ms, 250);
        assert_eq!(config.resubscribe_interval_secs, 30);
        assert!(config.unsubscribe_on_stop);
    }

    #[test]
    fn test_fixed_ranges() {
        assert_eq!(LIGHT_INDICES.clone().count(), 101);
        assert_eq!(GEAR_INDICES.clone().count(), 10);
        assert_eq!(*GEAR_INDICES.start(), GEAR_INDEX_BASE);
    }
}
