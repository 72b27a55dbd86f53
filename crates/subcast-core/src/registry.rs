//! Subscription registry
//!
//! Records, per (key, subscriber address) pair, when the subscriber last
//! subscribed and when it was last notified. Three independent clocks drive
//! the lifecycle:
//!
//! - a subscriber is **fresh** iff it re-subscribed within
//!   `subscription_lifetime`;
//! - a fresh subscriber is **due** for a resend iff at least
//!   `resend_timeout` elapsed since its last notification *and* the key is
//!   still live in the ledger (liveness is supplied by the caller).
//!
//! A freshly upserted subscriber has no `last_notified` at all, which makes
//! it immediately due once its key goes live. Entries for expired
//! subscribers are skipped, never removed.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy)]
struct SubscriberEntry {
    last_subscribed: Instant,
    /// `None` until the first notification, so a new subscriber is due
    /// as soon as its key is live.
    last_notified: Option<Instant>,
}

impl SubscriberEntry {
    fn is_fresh(&self, now: Instant, lifetime: Duration) -> bool {
        now.duration_since(self.last_subscribed) < lifetime
    }

    fn is_overdue(&self, now: Instant, resend_timeout: Duration) -> bool {
        match self.last_notified {
            Some(at) => now.duration_since(at) >= resend_timeout,
            None => true,
        }
    }
}

/// Per-category map of (key, address) subscription state
#[derive(Debug)]
pub struct SubscriptionRegistry {
    subscription_lifetime: Duration,
    resend_timeout: Duration,
    entries: HashMap<String, HashMap<SocketAddr, SubscriberEntry>>,
}

impl SubscriptionRegistry {
    /// Create an empty registry with the given freshness and resend windows
    pub fn new(subscription_lifetime: Duration, resend_timeout: Duration) -> Self {
        Self {
            subscription_lifetime,
            resend_timeout,
            entries: HashMap::new(),
        }
    }

    /// Create or overwrite the entry for (key, addr)
    ///
    /// Resets `last_subscribed` to `now` and clears `last_notified`, so the
    /// subscriber is immediately eligible for a notify decision.
    pub fn upsert(&mut self, key: &str, addr: SocketAddr, now: Instant) {
        self.entries.entry(key.to_string()).or_default().insert(
            addr,
            SubscriberEntry {
                last_subscribed: now,
                last_notified: None,
            },
        );
    }

    /// Stamp (key, addr) as notified at `now`
    pub fn mark_notified(&mut self, key: &str, addr: SocketAddr, now: Instant) {
        if let Some(entry) = self
            .entries
            .get_mut(key)
            .and_then(|subs| subs.get_mut(&addr))
        {
            entry.last_notified = Some(now);
        }
    }

    /// Whether (key, addr) subscribed within the subscription lifetime
    pub fn is_fresh(&self, key: &str, addr: SocketAddr, now: Instant) -> bool {
        self.entries
            .get(key)
            .and_then(|subs| subs.get(&addr))
            .is_some_and(|entry| entry.is_fresh(now, self.subscription_lifetime))
    }

    /// Fresh subscribers of `key`, each stamped as notified at `now`
    ///
    /// This is the activation fan-out: freshness is the only gate here, the
    /// resend timer is deliberately ignored (an activation always notifies).
    pub fn notify_fresh(&mut self, key: &str, now: Instant) -> Vec<SocketAddr> {
        let Some(subs) = self.entries.get_mut(key) else {
            return Vec::new();
        };

        let mut targets = Vec::new();
        for (addr, entry) in subs.iter_mut() {
            if entry.is_fresh(now, self.subscription_lifetime) {
                entry.last_notified = Some(now);
                targets.push(*addr);
            }
        }
        targets
    }

    /// All (key, addr) pairs due for a resend at `now`
    ///
    /// A pair is yielded iff the subscriber is fresh, at least
    /// `resend_timeout` elapsed since its last notification, and `is_live`
    /// reports the key live. Each yielded pair is stamped
    /// `last_notified = now`; pairs failing any condition are skipped, not
    /// removed.
    pub fn drain_due(
        &mut self,
        now: Instant,
        is_live: impl Fn(&str) -> bool,
    ) -> Vec<(String, SocketAddr)> {
        let mut due = Vec::new();
        for (key, subs) in &mut self.entries {
            for (addr, entry) in subs.iter_mut() {
                if !entry.is_fresh(now, self.subscription_lifetime) {
                    continue;
                }
                if !entry.is_overdue(now, self.resend_timeout) {
                    continue;
                }
                if !is_live(key) {
                    continue;
                }
                entry.last_notified = Some(now);
                due.push((key.clone(), *addr));
            }
        }
        due
    }

    /// Number of (key, address) entries ever recorded
    pub fn subscriber_count(&self) -> usize {
        self.entries.values().map(HashMap::len).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(port: u16) -> SocketAddr {
        format!("127.0.0.1:{port}").parse().unwrap()
    }

    fn registry() -> SubscriptionRegistry {
        SubscriptionRegistry::new(Duration::from_millis(180_000), Duration::from_millis(5_000))
    }

    #[test]
    fn new_subscriber_is_due_once_key_is_live() {
        let mut reg = registry();
        let t0 = Instant::now();

        reg.upsert("ping", addr(9000), t0);
        let due = reg.drain_due(t0, |_| true);
        assert_eq!(due, vec![("ping".to_string(), addr(9000))]);
    }

    #[test]
    fn dead_key_suppresses_resend() {
        let mut reg = registry();
        let t0 = Instant::now();

        reg.upsert("ping", addr(9000), t0);
        assert!(reg.drain_due(t0, |_| false).is_empty());
    }

    #[test]
    fn resend_timer_gates_consecutive_drains() {
        let mut reg = registry();
        let t0 = Instant::now();

        reg.upsert("ping", addr(9000), t0);
        assert_eq!(reg.drain_due(t0, |_| true).len(), 1);
        // Just notified, not yet overdue.
        assert!(reg.drain_due(t0 + Duration::from_millis(4_999), |_| true).is_empty());
        assert_eq!(reg.drain_due(t0 + Duration::from_millis(5_000), |_| true).len(), 1);
    }

    #[test]
    fn stale_subscriber_is_skipped_but_kept() {
        let mut reg = registry();
        let t0 = Instant::now();

        reg.upsert("ping", addr(9000), t0);
        let later = t0 + Duration::from_millis(180_000);
        assert!(!reg.is_fresh("ping", addr(9000), later));
        assert!(reg.drain_due(later, |_| true).is_empty());
        assert_eq!(reg.subscriber_count(), 1);
    }

    #[test]
    fn resubscription_resets_freshness() {
        let mut reg = registry();
        let t0 = Instant::now();

        reg.upsert("ping", addr(9000), t0);
        reg.mark_notified("ping", addr(9000), t0);

        let t1 = t0 + Duration::from_millis(179_000);
        reg.upsert("ping", addr(9000), t1);
        assert!(reg.is_fresh("ping", addr(9000), t1 + Duration::from_millis(100_000)));
        // Upsert cleared last_notified, so the subscriber is due again.
        assert_eq!(reg.drain_due(t1, |_| true).len(), 1);
    }

    #[test]
    fn activation_fanout_ignores_resend_timer() {
        let mut reg = registry();
        let t0 = Instant::now();

        reg.upsert("ping", addr(9000), t0);
        reg.upsert("ping", addr(9001), t0);
        reg.mark_notified("ping", addr(9000), t0);

        // Both are fresh, so both are notified even though 9000 was stamped
        // a moment ago.
        let mut targets = reg.notify_fresh("ping", t0 + Duration::from_millis(1));
        targets.sort();
        assert_eq!(targets, vec![addr(9000), addr(9001)]);
    }
}
