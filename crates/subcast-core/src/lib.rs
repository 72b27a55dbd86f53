// # subcast-core
//
// Core library for the subcast UDP publish/subscribe relay.
//
// ## Architecture Overview
//
// Publishers broadcast short text keys over UDP; every endpoint subscribed
// to a matching pattern receives a copy, repeated periodically while the
// key stays live and the subscription stays fresh.
//
// - **KeyMatcher**: classifies an inbound string against one category
//   pattern
// - **NotificationLedger**: per-key last-activation instants (liveness)
// - **SubscriptionRegistry**: per-(key, address) subscription state
//   (freshness, resend timers)
// - **Category**: composes the three above and decides when to notify
// - **Endpoint / Dispatcher**: non-blocking UDP with rebind-on-failure
// - **CategoryService**: one category wired to its port pair, exposing the
//   three poll-loop entry points
//
// ## Design Principles
//
// 1. **Lazy lifecycle**: dormant/notifying is recomputed from timestamps at
//    every call, never stored, so missed ticks lose nothing
// 2. **Decisions, not callbacks**: the engine returns notify decisions as
//    plain values; the caller dispatches them synchronously
// 3. **Best-effort transport**: UDP, no queues, disconnects recovered by
//    rebinding in place
// 4. **Library-First**: the daemon is a thin loop over this crate

pub mod category;
pub mod config;
pub mod error;
pub mod ledger;
pub mod matcher;
pub mod net;
pub mod registry;
pub mod service;

// Re-export core types for convenience
pub use category::{Category, Notification};
pub use config::{CategoryConfig, RelayConfig};
pub use error::{Error, Result};
pub use ledger::NotificationLedger;
pub use matcher::KeyMatcher;
pub use registry::SubscriptionRegistry;
pub use service::CategoryService;
