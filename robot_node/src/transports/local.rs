//! In-process topic bus.
//!
//! `LocalBus` is a cheaply cloneable handle to a shared topic table. Any
//! number of `LocalTransport`s, operators and tests holding clones of the
//! same bus see each other's messages.

use super::{TopicTable, spawn_dispatcher};
use robot_common::bus::config::TransportConfig;
use robot_common::bus::transport::{
    MessageCallback, Publisher, Subscription, Transport, TransportError, validate_topic,
};
use std::sync::Arc;
use tracing::{debug, info};

/// Shared in-process topic bus.
#[derive(Debug, Clone, Default)]
pub struct LocalBus {
    table: Arc<TopicTable>,
}

impl LocalBus {
    /// Create an empty bus.
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish `payload` on `topic`. Returns how many subscribers received it.
    pub fn publish(&self, topic: &str, payload: &str) -> Result<usize, TransportError> {
        validate_topic(topic)?;
        Ok(self.table.route(topic, payload))
    }

    /// Invoke `callback` for each message on `topic`.
    pub fn subscribe(
        &self,
        topic: &str,
        queue_size: usize,
        callback: MessageCallback,
    ) -> Result<Subscription, TransportError> {
        validate_topic(topic)?;
        let rx = self.table.add(topic, queue_size);
        spawn_dispatcher(topic, rx, callback)
    }

    /// Number of subscribers on `topic`.
    pub fn subscriber_count(&self, topic: &str) -> usize {
        self.table.subscriber_count(topic)
    }

    /// Messages dropped because a subscriber queue was full.
    pub fn dropped_messages(&self) -> u64 {
        self.table.dropped()
    }
}

/// Publisher for one topic on a [`LocalBus`].
pub struct LocalPublisher {
    bus: LocalBus,
    topic: String,
}

impl Publisher for LocalPublisher {
    fn topic(&self) -> &str {
        &self.topic
    }

    fn publish(&self, payload: &str) -> Result<(), TransportError> {
        let delivered = self.bus.publish(&self.topic, payload)?;
        if delivered == 0 {
            debug!("No subscribers on '{}'", self.topic);
        }
        Ok(())
    }
}

/// `Transport` backed by a [`LocalBus`].
#[derive(Debug, Default)]
pub struct LocalTransport {
    bus: Option<LocalBus>,
}

impl LocalTransport {
    /// Create a transport that starts its own bus on `connect()`.
    pub fn new() -> Self {
        Self { bus: None }
    }

    /// Create a transport attached to an existing bus.
    pub fn with_bus(bus: LocalBus) -> Self {
        Self { bus: Some(bus) }
    }

    /// Bus handle, once connected.
    pub fn bus(&self) -> Option<&LocalBus> {
        self.bus.as_ref()
    }

    fn connected_bus(&self) -> Result<&LocalBus, TransportError> {
        self.bus.as_ref().ok_or(TransportError::NotConnected)
    }
}

impl Transport for LocalTransport {
    fn name(&self) -> &'static str {
        "local"
    }

    fn connect(&mut self, config: &TransportConfig) -> Result<(), TransportError> {
        if self.bus.is_none() {
            self.bus = Some(LocalBus::new());
        }
        info!(
            "Local transport ready (action='{}', state='{}')",
            config.action_topic, config.state_topic
        );
        Ok(())
    }

    fn advertise(
        &mut self,
        topic: &str,
        _queue_size: usize,
    ) -> Result<Box<dyn Publisher>, TransportError> {
        validate_topic(topic)?;
        let bus = self.connected_bus()?.clone();
        Ok(Box::new(LocalPublisher {
            bus,
            topic: topic.to_string(),
        }))
    }

    fn subscribe(
        &mut self,
        topic: &str,
        queue_size: usize,
        callback: MessageCallback,
    ) -> Result<Subscription, TransportError> {
        self.connected_bus()?.subscribe(topic, queue_size, callback)
    }
}

/// Factory function to create a local transport instance.
pub fn create_transport() -> Box<dyn Transport> {
    Box::new(LocalTransport::new())
}
