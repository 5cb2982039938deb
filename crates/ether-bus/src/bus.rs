//! # Bus
//!
//! One participant on a broadcast segment: a bound link, a subscription
//! registry, a publisher and, once listening, a dispatcher thread.
//!
//! ```text
//!  Bus::new ──► link opened ──► subscribe() ──► listen() ──► MessageStream
//!                                                   │
//!                                     dispatcher thread (recv → decode
//!                                     → match → deliver)
//! ```

use crate::config::BusConfig;
use crate::dispatcher::{Dispatcher, DispatcherHandle, StatsSnapshot};
use crate::error::BusError;
use crate::publisher::{PublishError, Publisher};
use crate::registry::{SubscriptionError, SubscriptionRegistry};
use crate::stream::MessageStream;
use crate::transport::{EthernetLink, FrameLink};
use pnet_base::MacAddr;
use std::sync::Arc;
use tracing::info;

/// Dispatcher lifecycle: `Idle → Running → Stopped`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatcherState {
    /// `listen` has not been called.
    Idle,
    /// The receive loop is running.
    Running,
    /// The receive loop was shut down; it cannot be restarted.
    Stopped,
}

enum Listener {
    Idle,
    Running(DispatcherHandle),
    Stopped,
}

/// A publish/subscribe participant.
pub struct Bus {
    config: BusConfig,
    link: Arc<dyn FrameLink>,
    registry: SubscriptionRegistry,
    publisher: Publisher,
    listener: Listener,
}

impl Bus {
    /// Open a bus on `interface` with default settings.
    ///
    /// # Errors
    ///
    /// - `InterfaceResolution` if no such interface exists
    /// - `Connection` if the raw channel cannot be opened
    pub fn new(interface: &str) -> Result<Self, BusError> {
        Self::with_config(BusConfig::default().with_interface(interface))
    }

    /// Open a bus with explicit configuration.
    pub fn with_config(config: BusConfig) -> Result<Self, BusError> {
        let link = EthernetLink::open(&config).map_err(BusError::from_open)?;
        info!(
            interface = %link.interface_name(),
            mac = %link.hardware_addr(),
            "Bus opened"
        );
        Ok(Self::with_link(Arc::new(link), config))
    }

    /// Build a bus over an already-open link.
    ///
    /// The link keeps its own receive timing and payload limit:
    /// `config.read_timeout` and `config.max_payload` only apply when
    /// [`Bus::with_config`] opens the link. A [`crate::MemoryLink`] polls at
    /// its segment's interval (see [`crate::MemorySegment::with_poll_interval`]).
    pub fn with_link(link: Arc<dyn FrameLink>, config: BusConfig) -> Self {
        Self {
            publisher: Publisher::new(Arc::clone(&link)),
            config,
            link,
            registry: SubscriptionRegistry::new(),
            listener: Listener::Idle,
        }
    }

    /// Deliver messages published under `topic`.
    ///
    /// Subscribing twice delivers each matching message twice.
    pub fn subscribe(&self, topic: &str) -> Result<(), SubscriptionError> {
        self.registry.add(topic)
    }

    /// Stop delivering `topic`, removing every occurrence.
    ///
    /// Removing a topic that is not subscribed is a no-op.
    pub fn unsubscribe(&self, topic: &str) -> Result<(), SubscriptionError> {
        self.registry.remove(topic);
        Ok(())
    }

    /// Current subscriptions, in the order they were added.
    #[must_use]
    pub fn subscriptions(&self) -> Vec<String> {
        self.registry.snapshot()
    }

    /// Whether `topic` is currently subscribed.
    #[must_use]
    pub fn is_subscribed(&self, topic: &str) -> bool {
        self.registry.contains(topic)
    }

    /// Broadcast a message to every participant on the segment.
    pub fn publish(&self, topic: &str, payload: &str) -> Result<(), PublishError> {
        self.publisher.publish(topic, payload)
    }

    /// A cloneable publishing handle for use from other threads or tasks.
    #[must_use]
    pub fn publisher(&self) -> Publisher {
        self.publisher.clone()
    }

    /// Start the dispatcher and return the delivery stream.
    ///
    /// Returns as soon as the dispatcher thread is started. May be called
    /// once per bus.
    pub fn listen(&mut self) -> Result<MessageStream, BusError> {
        if !matches!(self.listener, Listener::Idle) {
            return Err(BusError::AlreadyListening);
        }

        let subscriptions = self.registry.snapshot();
        info!(
            topics = subscriptions.len(),
            "Subscribed to topic(s): {} Now listening...",
            describe_subscriptions(&subscriptions)
        );

        let (dispatcher, stream) = Dispatcher::new(
            Arc::clone(&self.link),
            self.registry.clone(),
            self.config.delivery_capacity,
        );
        let handle = dispatcher.spawn().map_err(BusError::Spawn)?;
        self.listener = Listener::Running(handle);

        Ok(stream)
    }

    /// Stop the dispatcher and wait for it to exit.
    ///
    /// The delivery stream yields any buffered messages, then `None`.
    pub fn shutdown(&mut self) {
        if !matches!(self.listener, Listener::Running(_)) {
            return;
        }
        if let Listener::Running(mut handle) =
            std::mem::replace(&mut self.listener, Listener::Stopped)
        {
            handle.shutdown();
            info!(stats = ?handle.stats(), "Bus stopped listening");
        }
    }

    /// Dispatcher lifecycle state.
    #[must_use]
    pub fn state(&self) -> DispatcherState {
        match &self.listener {
            Listener::Idle => DispatcherState::Idle,
            Listener::Running(handle) if handle.is_finished() => DispatcherState::Stopped,
            Listener::Running(_) => DispatcherState::Running,
            Listener::Stopped => DispatcherState::Stopped,
        }
    }

    /// Dispatcher counters, once listening.
    #[must_use]
    pub fn stats(&self) -> Option<StatsSnapshot> {
        match &self.listener {
            Listener::Running(handle) => Some(handle.stats()),
            _ => None,
        }
    }

    /// Messages this bus has published.
    #[must_use]
    pub fn messages_published(&self) -> u64 {
        self.publisher.messages_published()
    }

    /// Hardware address frames are sent from.
    #[must_use]
    pub fn hardware_addr(&self) -> MacAddr {
        self.link.hardware_addr()
    }

    /// Configuration this bus was built with.
    #[must_use]
    pub fn config(&self) -> &BusConfig {
        &self.config
    }
}

/// `"a, b."`, or `"none."` when empty.
fn describe_subscriptions(topics: &[String]) -> String {
    if topics.is_empty() {
        return "none.".to_string();
    }
    format!("{}.", topics.join(", "))
}
