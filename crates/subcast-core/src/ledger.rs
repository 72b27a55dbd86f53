//! Notification ledger
//!
//! Records, per key, the instant of its most recent activation and answers
//! the liveness question: a key is *live* at time `now` iff it was activated
//! less than `notification_lifetime` ago. Entries are refreshed on every
//! activation and never evicted; a never-activated key is not live.

use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Per-key record of the most recent activation
#[derive(Debug)]
pub struct NotificationLedger {
    lifetime: Duration,
    activations: HashMap<String, Instant>,
}

impl NotificationLedger {
    /// Create an empty ledger with the given notification lifetime
    pub fn new(lifetime: Duration) -> Self {
        Self {
            lifetime,
            activations: HashMap::new(),
        }
    }

    /// Record an activation of `key` at `now`
    ///
    /// Repeated activation only refreshes the timestamp.
    pub fn activate(&mut self, key: &str, now: Instant) {
        self.activations.insert(key.to_string(), now);
    }

    /// Whether `key` was activated within the notification lifetime
    pub fn is_live(&self, key: &str, now: Instant) -> bool {
        self.activations
            .get(key)
            .is_some_and(|&at| now.duration_since(at) < self.lifetime)
    }

    /// Number of distinct keys ever activated
    pub fn len(&self) -> usize {
        self.activations.len()
    }

    /// Whether no key was ever activated
    pub fn is_empty(&self) -> bool {
        self.activations.is_empty()
    }
}
