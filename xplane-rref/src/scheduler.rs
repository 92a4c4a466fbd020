//! Periodic resubscription
//!
//! The simulator never acknowledges a subscription, so the scheduler simply
//! re-sends the whole batch every interval. If the simulator restarts, the next
//! batch re-establishes every subscription.

use crate::codec;
use crate::config::{ClientConfig, GEAR_INDEX_BASE, GEAR_INDICES, LIGHT_INDICES};
use crate::transport::Transport;
use crate::types::DatarefSubscription;
use std::time::{Duration, Instant};

/// Re-issues the fixed subscription batch on a timer
pub struct SubscriptionScheduler {
    interval: Duration,
    last_sent: Option<Instant>,
    batch: Vec<DatarefSubscription>,
}

impl SubscriptionScheduler {
    /// Build the light and gear batch from the configured dataref paths
    pub fn new(config: &ClientConfig) -> Self {
        let lights = LIGHT_INDICES.map(|i| {
            DatarefSubscription::array_element(&config.lights_path, i, i, config.frequency_hz)
        });
        let gear = GEAR_INDICES.map(|i| {
            DatarefSubscription::array_element(
                &config.gear_path,
                i - GEAR_INDEX_BASE,
                i,
                config.frequency_hz,
            )
        });

        Self {
            interval: config.resubscribe_interval(),
            last_sent: None,
            batch: lights.chain(gear).collect(),
        }
    }

    /// The subscriptions sent in every batch
    pub fn subscriptions(&self) -> &[DatarefSubscription] {
        &self.batch
    }

    /// Time the last batch went out, if any
    pub fn last_sent(&self) -> Option<Instant> {
        self.last_sent
    }

    /// True if a batch is due at `now`
    ///
    /// Uses the monotonic clock so wall-clock corrections cannot stall resubscription.
    pub fn is_due(&self, now: Instant) -> bool {
        match self.last_sent {
            None => true,
            Some(last) => now.saturating_duration_since(last) > self.interval,
        }
    }

    /// Send the full batch if more than one interval has passed since the last one
    ///
    /// Returns how many requests were handed to the transport. A failed send is
    /// logged and does not stop the rest of the batch.
    pub fn maybe_resubscribe<T: Transport + ?Sized>(&mut self, now: Instant, transport: &mut T) -> usize {
        if !self.is_due(now) {
            return 0;
        }

        log::info!("Sending {} subscription requests", self.batch.len());
        let sent = send_batch(&self.batch, transport, |sub| {
            codec::encode_subscribe(&sub.name, sub.frequency_hz, sub.index)
        });

        self.last_sent = Some(now);
        sent
    }

    /// Cancel every subscription in the batch (frequency 0)
    pub fn unsubscribe_all<T: Transport + ?Sized>(&self, transport: &mut T) -> usize {
        log::info!("Cancelling {} subscriptions", self.batch.len());
        send_batch(&self.batch, transport, |sub| {
            codec::encode_unsubscribe(&sub.name, sub.index)
        })
    }
}

fn send_batch<T, F>(batch: &[DatarefSubscription], transport: &mut T, encode: F) -> usize
where
    T: Transport + ?Sized,
    F: Fn(&DatarefSubscription) -> crate::types::Result<Vec<u8>>,
{
    let mut sent = 0;
    for sub in batch {
        let result = encode(sub).and_then(|packet| transport.send(&packet));
        match result {
            Ok(()) => {
                log::debug!("Subscribed {} (index {}, {} Hz)", sub.name, sub.index, sub.frequency_hz);
                sent += 1;
            }
            Err(e) => log::warn!("Failed to send request for {}: {}", sub.name, e),
        }
    }
    sent
}
