//! Category engine
//!
//! One [`Category`] is one independent pub/sub channel: a key pattern, a
//! notification ledger, and a subscription registry. It owns the decision of
//! *when* a subscriber should receive a datagram; the transport layer owns
//! *how* that datagram is sent.
//!
//! ## Lifecycle
//!
//! Every (key, subscriber) pair is an implicit two-state machine, dormant or
//! notifying, recomputed lazily from three timestamps at every call:
//!
//! - key **live**: activated within `notification_lifetime`
//! - subscriber **fresh**: subscribed within `subscription_lifetime`
//! - subscriber **due**: fresh, key live, and `resend_timeout` elapsed since
//!   the last notification
//!
//! No state enum is persisted, so a missed sweep tick loses nothing: the
//! pair simply becomes due on the next sweep.
//!
//! ## Event flow
//!
//! ```text
//! publish datagram ──▶ activate_key ──▶ ledger refresh ──▶ fan-out to
//!                                                          fresh subscribers
//! subscribe datagram ─▶ add_subscriber ─▶ registry upsert ─▶ immediate fire
//!                                                            iff key live
//! periodic tick ──────▶ sweep ──────────▶ resend for every due pair
//! ```
//!
//! All three entry points return the resulting notify decisions directly;
//! the caller dispatches them before the entry point's effects are
//! considered complete.

use std::net::SocketAddr;
use std::time::Instant;

use tracing::{debug, info};

use crate::config::CategoryConfig;
use crate::error::Result;
use crate::ledger::NotificationLedger;
use crate::matcher::KeyMatcher;
use crate::registry::SubscriptionRegistry;

/// The decision that `target` should receive a datagram carrying `key`, now
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    /// Destination subscriber address
    pub target: SocketAddr,
    /// The key to deliver
    pub key: String,
}

impl Notification {
    fn new(target: SocketAddr, key: &str) -> Self {
        Self {
            target,
            key: key.to_string(),
        }
    }
}

/// One independent pub/sub channel
#[derive(Debug)]
pub struct Category {
    matcher: KeyMatcher,
    ledger: NotificationLedger,
    registry: SubscriptionRegistry,
}

impl Category {
    /// Create a category from its matcher and timing windows
    pub fn new(matcher: KeyMatcher, config: &CategoryConfig) -> Self {
        Self {
            matcher,
            ledger: NotificationLedger::new(config.notification_lifetime()),
            registry: SubscriptionRegistry::new(
                config.subscription_lifetime(),
                config.resend_timeout(),
            ),
        }
    }

    /// Create a category from a validated config section
    pub fn from_config(config: &CategoryConfig) -> Result<Self> {
        let matcher = config.build_matcher()?;
        Ok(Self::new(matcher, config))
    }

    /// The pattern this category matches keys against
    pub fn pattern(&self) -> &str {
        self.matcher.as_str()
    }

    /// Handle an inbound publish of `key` at `now`
    ///
    /// Returns `None` if the key does not match the category pattern (no
    /// state change). Otherwise refreshes the ledger and returns one
    /// notification per currently fresh subscriber of the key; each target's
    /// resend timer restarts at `now`, regardless of where it stood.
    pub fn activate_key(&mut self, key: &str, now: Instant) -> Option<Vec<Notification>> {
        if key.is_empty() {
            debug!(pattern = self.pattern(), "Received empty publish payload");
        }
        if !self.matcher.matches(key) {
            debug!(pattern = self.pattern(), key, "Received non-matching key");
            return None;
        }

        debug!(pattern = self.pattern(), key, "Received matching key");
        self.ledger.activate(key, now);

        let notifications = self
            .registry
            .notify_fresh(key, now)
            .into_iter()
            .map(|target| Notification::new(target, key))
            .collect();
        Some(notifications)
    }

    /// Handle an inbound subscription of `addr` to `key` at `now`
    ///
    /// Returns `None` if the key does not match the category pattern.
    /// Otherwise the registry entry is created or fully reset, and exactly
    /// one immediate notification fires iff the key is already live.
    pub fn add_subscriber(
        &mut self,
        addr: SocketAddr,
        key: &str,
        now: Instant,
    ) -> Option<Vec<Notification>> {
        if !self.matcher.matches(key) {
            debug!(
                pattern = self.pattern(),
                key, %addr,
                "Received non-matching key from subscriber"
            );
            return None;
        }

        info!(key, %addr, "Subscriber registered");
        self.registry.upsert(key, addr, now);

        if self.ledger.is_live(key, now) {
            self.registry.mark_notified(key, addr, now);
            return Some(vec![Notification::new(addr, key)]);
        }
        Some(Vec::new())
    }

    /// Collect every (key, subscriber) pair due for a resend at `now`
    pub fn sweep(&mut self, now: Instant) -> Vec<Notification> {
        let ledger = &self.ledger;
        let due = self
            .registry
            .drain_due(now, |key| ledger.is_live(key, now));

        due.into_iter()
            .map(|(key, target)| {
                debug!(key, %target, "Resending notification");
                Notification::new(target, &key)
            })
            .collect()
    }

    /// Number of distinct keys ever activated
    pub fn active_key_count(&self) -> usize {
        self.ledger.len()
    }

    /// Number of (key, address) subscription entries ever recorded
    pub fn subscriber_count(&self) -> usize {
        self.registry.subscriber_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn category() -> Category {
        let config = CategoryConfig::with_pattern("^ping$");
        Category::from_config(&config).unwrap()
    }

    fn addr(port: u16) -> SocketAddr {
        format!("127.0.0.1:{port}").parse().unwrap()
    }

    #[test]
    fn non_matching_publish_is_rejected_without_state_change() {
        let mut cat = category();
        let t0 = Instant::now();

        assert!(cat.activate_key("pong", t0).is_none());
        assert_eq!(cat.active_key_count(), 0);
    }

    #[test]
    fn empty_payload_is_a_plain_non_match() {
        let mut cat = category();
        assert!(cat.activate_key("", Instant::now()).is_none());
    }

    #[test]
    fn subscribe_before_activation_fires_nothing() {
        let mut cat = category();
        let t0 = Instant::now();

        let fired = cat.add_subscriber(addr(9000), "ping", t0).unwrap();
        assert!(fired.is_empty());
        assert_eq!(cat.subscriber_count(), 1);
    }

    #[test]
    fn activation_notifies_each_fresh_subscriber_once() {
        let mut cat = category();
        let t0 = Instant::now();

        cat.add_subscriber(addr(9000), "ping", t0).unwrap();
        cat.add_subscriber(addr(9001), "ping", t0).unwrap();

        let mut fired = cat.activate_key("ping", t0 + Duration::from_millis(1_000)).unwrap();
        fired.sort_by_key(|n| n.target);
        assert_eq!(
            fired,
            vec![
                Notification::new(addr(9000), "ping"),
                Notification::new(addr(9001), "ping"),
            ]
        );
    }

    #[test]
    fn subscribe_while_live_fires_exactly_once() {
        let mut cat = category();
        let t0 = Instant::now();

        cat.activate_key("ping", t0).unwrap();
        let fired = cat
            .add_subscriber(addr(9000), "ping", t0 + Duration::from_millis(100))
            .unwrap();
        assert_eq!(fired, vec![Notification::new(addr(9000), "ping")]);

        // The immediate fire stamped the resend timer, so an instant sweep
        // stays quiet.
        assert!(cat.sweep(t0 + Duration::from_millis(100)).is_empty());
    }
}
