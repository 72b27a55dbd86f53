//! Per-category service
//!
//! A [`CategoryService`] wires one [`Category`] to its pair of UDP endpoints
//! and exposes the three entry points the outer loop drives on a fixed
//! interval:
//!
//! 1. [`CategoryService::poll_publish`] — drain publish-in, activate keys
//! 2. [`CategoryService::poll_subscribe`] — drain subscribe-in, register
//!    subscribers
//! 3. [`CategoryService::sweep_resend`] — re-deliver to every due pair
//!
//! All notify decisions produced by an entry point are dispatched
//! synchronously before it returns. Nothing here is concurrent: one logical
//! task drives every category sequentially, so the engine needs no locks.

use std::time::Instant;

use crate::category::Category;
use crate::config::CategoryConfig;
use crate::error::Result;
use crate::net::{Dispatcher, Endpoint};

/// One category plus its transport, driven by the outer poll loop
#[derive(Debug)]
pub struct CategoryService {
    name: String,
    category: Category,
    publish: Endpoint,
    subscribe: Endpoint,
    dispatcher: Dispatcher,
}

impl CategoryService {
    /// Build the category engine and bind both endpoints
    ///
    /// Fails only on an invalid key pattern; a port that cannot be bound is
    /// logged and leaves that endpoint inert, the service still runs.
    pub async fn start(name: impl Into<String>, config: &CategoryConfig) -> Result<Self> {
        let category = Category::from_config(config)?;
        let publish = Endpoint::bind("publish", config.port).await;
        let subscribe = Endpoint::bind("subscribe", config.subscriber_port).await;

        Ok(Self {
            name: name.into(),
            category,
            publish,
            subscribe,
            dispatcher: Dispatcher::new(),
        })
    }

    /// Name of the config section this service was built from
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The pattern this service matches keys against
    pub fn pattern(&self) -> &str {
        self.category.pattern()
    }

    /// Locally bound publish-in address, if the bind succeeded
    pub fn publish_addr(&self) -> Option<std::net::SocketAddr> {
        self.publish.local_addr()
    }

    /// Locally bound subscribe-in/notify-out address, if the bind succeeded
    pub fn subscribe_addr(&self) -> Option<std::net::SocketAddr> {
        self.subscribe.local_addr()
    }

    /// Drain the publish endpoint and activate every received key
    pub async fn poll_publish(&mut self) {
        for (key, _from) in self.publish.drain().await {
            let now = Instant::now();
            if let Some(notifications) = self.category.activate_key(&key, now) {
                for notification in &notifications {
                    self.dispatcher
                        .dispatch(&mut self.subscribe, notification)
                        .await;
                }
            }
        }
    }

    /// Drain the subscribe endpoint and register every sender
    ///
    /// The datagram's source address is the subscriber identity.
    pub async fn poll_subscribe(&mut self) {
        for (key, from) in self.subscribe.drain().await {
            let now = Instant::now();
            if let Some(notifications) = self.category.add_subscriber(from, &key, now) {
                for notification in &notifications {
                    self.dispatcher
                        .dispatch(&mut self.subscribe, notification)
                        .await;
                }
            }
        }
    }

    /// Re-deliver to every (key, subscriber) pair that is due
    pub async fn sweep_resend(&mut self) {
        let now = Instant::now();
        for notification in self.category.sweep(now) {
            self.dispatcher
                .dispatch(&mut self.subscribe, &notification)
                .await;
        }
    }
}
