//! Core types for the RREF client library
//!
//! This module defines the values that flow between the codec, the scheduler and
//! the dispatcher: subscription requests going out, value updates coming in, and
//! the changes the dispatcher reports.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Timestamp type used throughout the client
pub type Timestamp = DateTime<Utc>;

/// Result type for client operations
pub type Result<T> = std::result::Result<T, RrefError>;

/// Errors that can occur while talking to the simulator
#[derive(Debug, thiserror::Error)]
pub enum RrefError {
    #[error("Receive timed out")]
    Timeout,

    #[error("Transport error: {0}")]
    Transport(#[from] std::io::Error),

    #[error("Failed to bind UDP socket on {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Dataref name '{name}' is {len} bytes, the name field holds at most 400")]
    NameTooLong { name: String, len: usize },

    #[error("Receive timeout must be greater than zero")]
    ZeroReceiveTimeout,

    #[error("Session is closed")]
    SessionClosed,

    #[error("Invalid address: {0}")]
    InvalidAddress(String),
}

impl RrefError {
    /// True for the expected "no data within the receive window" case
    pub fn is_timeout(&self) -> bool {
        matches!(self, RrefError::Timeout)
    }
}

/// A single dataref subscription request
///
/// The index is chosen by the caller and echoed back by the simulator in every
/// value record, so it is the only way to tell updates apart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatarefSubscription {
    /// Full dataref path including any array subscript
    pub name: String,
    /// Caller-assigned correlation index
    pub index: i32,
    /// Requested update rate in Hz (0 cancels the subscription)
    pub frequency_hz: i32,
}

impl DatarefSubscription {
    /// Create a subscription for one element of an array dataref
    pub fn array_element(base_path: &str, element: i32, index: i32, frequency_hz: i32) -> Self {
        Self {
            name: format!("{}[{}]", base_path, element),
            index,
            frequency_hz,
        }
    }
}

/// One `(index, value)` record decoded from a response packet
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ValueUpdate {
    pub index: i32,
    pub value: f32,
}

/// A change worth reporting, produced by the dispatcher
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DatarefChange {
    /// A light switch crossed the on/off threshold (or was seen for the first time)
    Light {
        /// Receive time of the packet carrying the update
        timestamp: Timestamp,
        /// Subscription index (0..=100)
        index: i32,
        /// Derived on/off state
        on: bool,
        /// Raw value as sent by the simulator
        raw: f32,
    },

    /// A gear deploy ratio moved by more than the configured delta
    Gear {
        /// Receive time of the packet carrying the update
        timestamp: Timestamp,
        /// Gear unit (subscription index minus 200)
        gear: i32,
        /// Deploy ratio, 0.0 = retracted, 1.0 = fully extended
        ratio: f32,
    },
}

impl DatarefChange {
    /// Get the timestamp of this change
    pub fn timestamp(&self) -> Timestamp {
        match self {
            DatarefChange::Light { timestamp, .. } => *timestamp,
            DatarefChange::Gear { timestamp, .. } => *timestamp,
        }
    }

    /// Deploy percentage for gear changes
    pub fn gear_percent(&self) -> Option<f32> {
        match self {
            DatarefChange::Gear { ratio, .. } => Some(ratio * 100.0),
            DatarefChange::Light { .. } => None,
        }
    }
}

impl fmt::Display for DatarefChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DatarefChange::Light { index, on, raw, .. } => write!(
                f,
                "[light] index {}: {} (raw {:.2})",
                index,
                if *on { "ON" } else { "OFF" },
                raw
            ),
            DatarefChange::Gear { gear, ratio, .. } => {
                write!(f, "[gear] gear {}: deployed {:.1}%", gear, ratio * 100.0)
            }
        }
    }
}
