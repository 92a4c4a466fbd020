//! Update dispatcher
//!
//! Drives the receive loop: resubscribe when due, wait for one datagram, decode
//! it, and report the values that changed in a meaningful way.
//!
//! Change detection differs per index range:
//! - light indices (0..=100) compare the derived on/off state, so any change of
//!   the raw value that stays on the same side of the threshold is silent;
//! - gear indices (200..=209) compare the raw ratio against a delta threshold.
//!
//! Every decoded value, including indices outside both ranges, is also kept in
//! a separate latest-value store.

use crate::codec;
use crate::config::{ClientConfig, GEAR_INDEX_BASE, GEAR_INDICES, LIGHT_INDICES};
use crate::scheduler::SubscriptionScheduler;
use crate::transport::{StopSignal, Transport};
use crate::types::{DatarefChange, Result, RrefError, Timestamp, ValueUpdate};
use chrono::Utc;
use std::collections::HashMap;
use std::time::Instant;

/// Which change-detection rule applies to an index
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexKind {
    Light,
    Gear,
    Other,
}

impl IndexKind {
    pub fn classify(index: i32) -> Self {
        if LIGHT_INDICES.contains(&index) {
            IndexKind::Light
        } else if GEAR_INDICES.contains(&index) {
            IndexKind::Gear
        } else {
            IndexKind::Other
        }
    }
}

/// The three last-known-value tables owned by the dispatcher
///
/// Kept apart so the three meanings of "index" never collide.
#[derive(Debug, Default)]
pub struct ValueStores {
    /// Light index (0..=100) → last reported on/off state
    light_states: HashMap<i32, bool>,
    /// Gear index (200..=209) → last reported raw deploy ratio
    gear_ratios: HashMap<i32, f32>,
    /// Any index → last raw value received
    latest_values: HashMap<i32, f32>,
}

impl ValueStores {
    pub fn light_state(&self, index: i32) -> Option<bool> {
        self.light_states.get(&index).copied()
    }

    pub fn gear_ratio(&self, index: i32) -> Option<f32> {
        self.gear_ratios.get(&index).copied()
    }

    pub fn latest(&self, index: i32) -> Option<f32> {
        self.latest_values.get(&index).copied()
    }

    pub fn latest_values(&self) -> &HashMap<i32, f32> {
        &self.latest_values
    }
}

/// Counters logged when the receive loop ends
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchStats {
    pub packets: usize,
    pub ignored_packets: usize,
    pub updates: usize,
    pub changes: usize,
    pub requests_sent: usize,
}

/// Receives, decodes and reports dataref updates
pub struct UpdateDispatcher {
    scheduler: SubscriptionScheduler,
    stores: ValueStores,
    stats: DispatchStats,
    light_threshold: f32,
    gear_delta: f32,
    unsubscribe_on_stop: bool,
}

impl UpdateDispatcher {
    pub fn new(config: &ClientConfig) -> Self {
        Self {
            scheduler: SubscriptionScheduler::new(config),
            stores: ValueStores::default(),
            stats: DispatchStats::default(),
            light_threshold: config.light_threshold,
            gear_delta: config.gear_delta,
            unsubscribe_on_stop: config.unsubscribe_on_stop,
        }
    }

    pub fn scheduler(&self) -> &SubscriptionScheduler {
        &self.scheduler
    }

    pub fn stores(&self) -> &ValueStores {
        &self.stores
    }

    pub fn stats(&self) -> &DispatchStats {
        &self.stats
    }

    /// Run the receive loop until `stop` is cleared or the transport fails
    ///
    /// The stop flag is checked at the top of every iteration, after the
    /// previous receive has returned or timed out. A receive error other than
    /// a timeout ends the loop and is returned.
    pub fn run<T, F>(&mut self, transport: &mut T, stop: &StopSignal, mut on_change: F) -> Result<DispatchStats>
    where
        T: Transport + ?Sized,
        F: FnMut(&DatarefChange),
    {
        log::info!("Listening for dataref updates");

        while stop.is_running() {
            self.stats.requests_sent += self.scheduler.maybe_resubscribe(Instant::now(), transport);

            let packet = match transport.receive() {
                Ok(packet) => packet,
                Err(RrefError::Timeout) => continue,
                Err(e) => {
                    log::error!("Receive loop terminated: {}", e);
                    return Err(e);
                }
            };

            for change in self.dispatch_packet(&packet, Utc::now()) {
                on_change(&change);
            }
        }

        if self.unsubscribe_on_stop {
            self.scheduler.unsubscribe_all(transport);
        }

        log::info!(
            "Receive loop stopped: {} packets ({} ignored), {} updates, {} changes, {} requests sent",
            self.stats.packets,
            self.stats.ignored_packets,
            self.stats.updates,
            self.stats.changes,
            self.stats.requests_sent
        );
        Ok(self.stats.clone())
    }

    /// Decode one packet and return the changes it produced, in packet order
    ///
    /// Anything that is not an RREF response is counted and dropped.
    pub fn dispatch_packet(&mut self, packet: &[u8], now: Timestamp) -> Vec<DatarefChange> {
        self.stats.packets += 1;

        let updates = codec::decode_updates(packet);
        if updates.len() == 0 {
            if !packet.starts_with(codec::RESPONSE_TAG) {
                self.stats.ignored_packets += 1;
                log::trace!("Ignoring {}-byte non-RREF packet", packet.len());
            }
            return Vec::new();
        }

        log::debug!("Packet with {} values", updates.len());
        let changes: Vec<DatarefChange> = updates.filter_map(|u| self.apply(u, now)).collect();
        self.stats.changes += changes.len();
        changes
    }

    /// Apply a single decoded value to the stores
    pub fn apply(&mut self, update: ValueUpdate, now: Timestamp) -> Option<DatarefChange> {
        let ValueUpdate { index, value } = update;
        self.stats.updates += 1;

        let change = match IndexKind::classify(index) {
            IndexKind::Light => {
                let on = value > self.light_threshold;
                if self.stores.light_states.get(&index) != Some(&on) {
                    self.stores.light_states.insert(index, on);
                    Some(DatarefChange::Light {
                        timestamp: now,
                        index,
                        on,
                        raw: value,
                    })
                } else {
                    None
                }
            }
            IndexKind::Gear => {
                let changed = match self.stores.gear_ratios.get(&index) {
                    Some(previous) => (previous - value).abs() > self.gear_delta,
                    None => true,
                };
                if changed {
                    self.stores.gear_ratios.insert(index, value);
                    Some(DatarefChange::Gear {
                        timestamp: now,
                        gear: index - GEAR_INDEX_BASE,
                        ratio: value,
                    })
                } else {
                    None
                }
            }
            IndexKind::Other => None,
        };

        self.stores.latest_values.insert(index, value);
        change
    }
}
