//! Common utilities for lifecycle contract tests

use std::net::SocketAddr;
use std::time::{Duration, Instant};

use subcast_core::{Category, CategoryConfig};

/// A fixed time origin for spelling test instants as millisecond offsets
pub struct Timeline {
    base: Instant,
}

impl Timeline {
    pub fn new() -> Self {
        Self {
            base: Instant::now(),
        }
    }

    /// The instant `ms` milliseconds after the origin
    pub fn at(&self, ms: u64) -> Instant {
        self.base + Duration::from_millis(ms)
    }
}

/// The reference category: `^ping$`, 60 s / 180 s / 5 s windows
pub fn ping_category() -> Category {
    let config = CategoryConfig {
        key_regex: Some("^ping$".to_string()),
        notification_lifetime_ms: 60_000,
        subscription_lifetime_ms: 180_000,
        resend_timeout_ms: 5_000,
        ..CategoryConfig::default()
    };
    Category::from_config(&config).expect("reference category builds")
}

pub fn addr(port: u16) -> SocketAddr {
    format!("127.0.0.1:{port}").parse().unwrap()
}
