//! Transport trait and error types.
//!
//! This module defines:
//! - `Transport` trait - Interface for pluggable topic backends
//! - `Publisher` trait - Handle for one advertised topic
//! - `Subscription` - Handle owning a subscription's dispatcher thread
//! - `TransportError` enum - Error types for transport operations
//! - `TransportFactory` type alias - Factory function type

use crate::bus::config::TransportConfig;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::JoinHandle;
use thiserror::Error;
use tracing::{debug, warn};

/// Error types for transport operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TransportError {
    /// No backend registered under this name
    #[error("Transport not found: {0}")]
    NotFound(String),

    /// Backend could not be brought up
    #[error("Connection failed: {0}")]
    ConnectFailed(String),

    /// Operation requires `connect()` first
    #[error("Transport not connected")]
    NotConnected,

    /// Topic name empty or containing whitespace
    #[error("Invalid topic name: '{0}'")]
    InvalidTopic(String),

    /// Message could not be handed to the backend
    #[error("Publish on '{topic}' failed: {reason}")]
    PublishFailed {
        /// Topic being published
        topic: String,
        /// Backend-specific reason
        reason: String,
    },

    /// Subscription could not be set up
    #[error("Subscribe to '{topic}' failed: {reason}")]
    SubscribeFailed {
        /// Topic being subscribed
        topic: String,
        /// Backend-specific reason
        reason: String,
    },

    /// Socket or thread I/O error
    #[error("Transport I/O error: {0}")]
    Io(String),
}

/// Callback invoked with each message payload received on a topic.
pub type MessageCallback = Box<dyn FnMut(String) + Send + 'static>;

/// Factory function type for creating transport instances.
pub type TransportFactory = fn() -> Box<dyn Transport>;

/// Check that a topic name is usable on every backend.
///
/// Topics must be non-empty and free of whitespace (the UDP wire format
/// separates topic and payload with a space).
pub fn validate_topic(topic: &str) -> Result<(), TransportError> {
    if topic.is_empty() || topic.chars().any(char::is_whitespace) {
        return Err(TransportError::InvalidTopic(topic.to_string()));
    }
    Ok(())
}

/// Handle for publishing on one advertised topic.
pub trait Publisher: Send + Sync {
    /// Topic this publisher sends on.
    fn topic(&self) -> &str;

    /// Send one message. Fire-and-forget: no delivery acknowledgement.
    fn publish(&self, payload: &str) -> Result<(), TransportError>;
}

/// Trait defining the interface for topic transports.
///
/// # Lifecycle
///
/// 1. `connect()` - Called once before any topic is used
/// 2. `advertise()` / `subscribe()` - Set up outbound and inbound topics
/// 3. `shutdown()` - Called when the node is stopping
///
/// Callbacks of one subscription run sequentially on that subscription's
/// dispatcher thread.
pub trait Transport: Send {
    /// Returns the backend's registry name (e.g., "local", "udp").
    fn name(&self) -> &'static str;

    /// Returns the backend's semantic version.
    fn version(&self) -> &'static str {
        env!("CARGO_PKG_VERSION")
    }

    /// Bring the backend up with the given configuration.
    ///
    /// # Errors
    /// Return `TransportError::ConnectFailed` if the backend cannot start.
    fn connect(&mut self, config: &TransportConfig) -> Result<(), TransportError>;

    /// Create a publisher for `topic` with the given queue depth.
    fn advertise(
        &mut self,
        topic: &str,
        queue_size: usize,
    ) -> Result<Box<dyn Publisher>, TransportError>;

    /// Invoke `callback` for every message arriving on `topic`.
    ///
    /// At most `queue_size` messages are buffered; newer messages are
    /// dropped while the queue is full.
    fn subscribe(
        &mut self,
        topic: &str,
        queue_size: usize,
        callback: MessageCallback,
    ) -> Result<Subscription, TransportError>;

    /// Graceful shutdown of the backend.
    fn shutdown(&mut self) -> Result<(), TransportError> {
        Ok(())
    }
}

/// Active subscription.
///
/// Owns the dispatcher thread delivering messages to the callback. Dropping
/// or cancelling the subscription stops the thread and joins it.
pub struct Subscription {
    topic: String,
    stop: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl Subscription {
    /// Wrap a dispatcher thread that exits once `stop` is set.
    pub fn new(topic: impl Into<String>, stop: Arc<AtomicBool>, handle: JoinHandle<()>) -> Self {
        Self {
            topic: topic.into(),
            stop,
            handle: Some(handle),
        }
    }

    /// Subscribed topic.
    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Whether the dispatcher thread is still delivering messages.
    pub fn is_active(&self) -> bool {
        !self.stop.load(Ordering::SeqCst)
            && self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Stop delivering messages and wait for the dispatcher to exit.
    pub fn cancel(mut self) {
        self.stop_and_join();
    }

    fn stop_and_join(&mut self) {
        self.stop.store(true, Ordering::SeqCst);
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                warn!("Dispatcher for topic '{}' panicked", self.topic);
            } else {
                debug!("Subscription to '{}' closed", self.topic);
            }
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.stop_and_join();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("topic", &self.topic)
            .field("active", &self.is_active())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_transport_error_display() {
        let err = TransportError::NotFound("zenoh".to_string());
        assert!(err.to_string().contains("zenoh"));

        let err = TransportError::PublishFailed {
            topic: "state".to_string(),
            reason: "queue closed".to_string(),
        };
        assert!(err.to_string().contains("state"));
        assert!(err.to_string().contains("queue closed"));
    }

    #[test]
    fn test_validate_topic() {
        assert!(validate_topic("action").is_ok());
        assert!(validate_topic("robot/state").is_ok());
        assert!(validate_topic("").is_err());
        assert!(validate_topic("a b").is_err());
        assert!(validate_topic("tab\t").is_err());
    }

    #[test]
    fn test_subscription_cancel_joins_thread() {
        let stop = Arc::new(AtomicBool::new(false));
        let thread_stop = Arc::clone(&stop);
        let handle = thread::spawn(move || {
            while !thread_stop.load(Ordering::SeqCst) {
                thread::sleep(Duration::from_millis(1));
            }
        });

        let sub = Subscription::new("action", Arc::clone(&stop), handle);
        assert_eq!(sub.topic(), "action");
        assert!(sub.is_active());

        sub.cancel();
        assert!(stop.load(Ordering::SeqCst));
    }

    #[test]
    fn test_subscription_drop_stops_thread() {
        let stop = Arc::new(AtomicBool::new(false));
        let thread_stop = Arc::clone(&stop);
        let handle = thread::spawn(move || {
            while !thread_stop.load(Ordering::SeqCst) {
                thread::sleep(Duration::from_millis(1));
            }
        });

        drop(Subscription::new("action", Arc::clone(&stop), handle));
        assert!(stop.load(Ordering::SeqCst));
    }
}
