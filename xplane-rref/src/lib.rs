//! X-Plane RREF Client Library
//!
//! A small, single-threaded client for the simulator's RREF telemetry protocol:
//! subscribe to datarefs over UDP, then decode and report the value updates the
//! simulator streams back.
//!
//! # Architecture
//!
//! - [`codec`] builds 409-byte subscription requests and decodes response records
//! - [`SubscriptionScheduler`] re-sends the full subscription batch every interval
//! - [`UpdateDispatcher`] runs the receive loop and detects light/gear changes
//! - [`UdpSession`] owns the socket and the cooperative [`StopSignal`]
//!
//! The library does NOT:
//! - Guarantee delivery (subscriptions are fire-and-forget, reissued periodically)
//! - Print anything (changes are handed to a caller-supplied callback)
//!
//! # Example Usage
//!
//! ```no_run
//! use xplane_rref::{ClientConfig, UdpSession, UpdateDispatcher};
//!
//! let config = ClientConfig::new();
//! let mut session = UdpSession::open(&config).unwrap();
//! let stop = session.stop_signal();
//!
//! let mut dispatcher = UpdateDispatcher::new(&config);
//! let result = dispatcher.run(&mut session, &stop, |change| {
//!     println!("{}", change);
//! });
//!
//! session.close();
//! if let Err(e) = result {
//!     eprintln!("Receive error: {}", e);
//! }
//! ```

// Public modules
pub mod codec;
pub mod config;
pub mod dispatcher;
pub mod scheduler;
pub mod transport;
pub mod types;

// Re-export main types for convenience
pub use codec::{decode_updates, encode_subscribe, encode_unsubscribe, UpdateIter};
pub use config::{ClientConfig, GEAR_INDICES, LIGHT_INDICES};
pub use dispatcher::{DispatchStats, IndexKind, UpdateDispatcher, ValueStores};
pub use scheduler::SubscriptionScheduler;
pub use transport::{StopSignal, Transport, UdpSession};
pub use types::{DatarefChange, DatarefSubscription, Result, RrefError, Timestamp, ValueUpdate};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_library_basics() {
        // Smoke test: the default batch covers both ranges
        let dispatcher = UpdateDispatcher::new(&ClientConfig::new());
        assert_eq!(dispatcher.scheduler().subscriptions().len(), 111);
        assert!(dispatcher.stores().latest_values().is_empty());
    }
}
