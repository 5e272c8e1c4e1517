//! Topic transport implementations.
//!
//! - [`local`] - In-process bus for tests and the console bridge
//! - [`udp`] - One datagram per message, `"<topic> <payload>"`
//!
//! # Adding New Transports
//!
//! 1. Create a new submodule under `transports/`
//! 2. Implement the `Transport` trait from `robot_common::bus::transport`
//! 3. Register it in [`register_all_transports`]

pub mod local;
pub mod udp;

use crate::transport_registry::TransportRegistry;
use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, TrySendError};
use parking_lot::Mutex;
use robot_common::bus::consts::RECV_POLL_INTERVAL;
use robot_common::bus::transport::{MessageCallback, Subscription, TransportError};
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::thread;
use tracing::debug;

/// Register all built-in transports.
pub fn register_all_transports(registry: &mut TransportRegistry) {
    registry.register("local", local::create_transport);
    registry.register("udp", udp::create_transport);
}

/// Per-topic fan-out table of bounded subscriber queues.
///
/// Shared by the local bus and the UDP receive path.
#[derive(Debug, Default)]
pub(crate) struct TopicTable {
    routes: Mutex<HashMap<String, Vec<Sender<String>>>>,
    dropped: AtomicU64,
}

impl TopicTable {
    /// Add a bounded queue for `topic` and return its receiving end.
    pub(crate) fn add(&self, topic: &str, queue_size: usize) -> Receiver<String> {
        let (tx, rx) = crossbeam_channel::bounded(queue_size.max(1));
        self.routes
            .lock()
            .entry(topic.to_string())
            .or_default()
            .push(tx);
        rx
    }

    /// Offer `payload` to every live queue on `topic`.
    ///
    /// Full queues drop the message; closed queues are pruned. Returns the
    /// number of queues that accepted it.
    pub(crate) fn route(&self, topic: &str, payload: &str) -> usize {
        let mut routes = self.routes.lock();
        let Some(queues) = routes.get_mut(topic) else {
            return 0;
        };

        let mut delivered = 0;
        queues.retain(|tx| match tx.try_send(payload.to_string()) {
            Ok(()) => {
                delivered += 1;
                true
            }
            Err(TrySendError::Full(_)) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                debug!("Queue full on '{}', message dropped", topic);
                true
            }
            Err(TrySendError::Disconnected(_)) => false,
        });
        if queues.is_empty() {
            routes.remove(topic);
        }
        delivered
    }

    /// Whether any queue is registered for `topic`.
    pub(crate) fn has_route(&self, topic: &str) -> bool {
        self.routes.lock().contains_key(topic)
    }

    /// Number of queues for `topic`. Closed queues count until the next
    /// `route()` on that topic prunes them.
    pub(crate) fn subscriber_count(&self, topic: &str) -> usize {
        self.routes.lock().get(topic).map_or(0, Vec::len)
    }

    /// Messages dropped because a queue was full.
    pub(crate) fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Close every queue; dispatchers see a disconnect and exit.
    pub(crate) fn clear(&self) {
        self.routes.lock().clear();
    }
}

/// Spawn the thread that feeds messages from `rx` into `callback`.
///
/// The thread exits when the subscription is cancelled or every sender is
/// gone.
pub(crate) fn spawn_dispatcher(
    topic: &str,
    rx: Receiver<String>,
    mut callback: MessageCallback,
) -> Result<Subscription, TransportError> {
    let stop = Arc::new(AtomicBool::new(false));
    let thread_stop = Arc::clone(&stop);
    let thread_topic = topic.to_string();

    let handle = thread::Builder::new()
        .name(format!("sub-{topic}"))
        .spawn(move || {
            while !thread_stop.load(Ordering::SeqCst) {
                match rx.recv_timeout(RECV_POLL_INTERVAL) {
                    Ok(payload) => callback(payload),
                    Err(RecvTimeoutError::Timeout) => continue,
                    Err(RecvTimeoutError::Disconnected) => break,
                }
            }
            debug!("Dispatcher for '{}' exiting", thread_topic);
        })
        .map_err(|e| TransportError::SubscribeFailed {
            topic: topic.to_string(),
            reason: e.to_string(),
        })?;

    Ok(Subscription::new(topic, stop, handle))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_route_fans_out() {
        let table = TopicTable::default();
        let a = table.add("state", 4);
        let b = table.add("state", 4);

        assert_eq!(table.route("state", "north true"), 2);
        assert_eq!(a.recv().unwrap(), "north true");
        assert_eq!(b.recv().unwrap(), "north true");
        assert_eq!(table.route("action", "continue"), 0);
    }

    #[test]
    fn test_full_queue_drops() {
        let table = TopicTable::default();
        let rx = table.add("action", 1);

        assert_eq!(table.route("action", "turn_left"), 1);
        assert_eq!(table.route("action", "turn_right"), 0);
        assert_eq!(table.dropped(), 1);
        assert_eq!(rx.recv().unwrap(), "turn_left");
    }

    #[test]
    fn test_closed_queue_is_pruned() {
        let table = TopicTable::default();
        let rx = table.add("action", 2);
        drop(rx);

        assert_eq!(table.route("action", "continue"), 0);
        assert!(!table.has_route("action"));
    }

    #[test]
    fn test_dispatcher_delivers_in_order() {
        let table = TopicTable::default();
        let rx = table.add("action", 8);
        let received = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&received);

        let sub = spawn_dispatcher(
            "action",
            rx,
            Box::new(move |payload| sink.lock().push(payload)),
        )
        .unwrap();

        for token in ["turn_left", "continue", "turn_right"] {
            table.route("action", token);
        }
        let deadline = std::time::Instant::now() + Duration::from_secs(2);
        while received.lock().len() < 3 && std::time::Instant::now() < deadline {
            thread::sleep(Duration::from_millis(5));
        }
        sub.cancel();

        assert_eq!(
            *received.lock(),
            vec!["turn_left", "continue", "turn_right"]
        );
    }
}
