//! Operator console for the local transport.
//!
//! Lines typed on stdin are published as action tokens; every state snapshot
//! is printed to stdout.

use crate::transports::local::LocalBus;
use robot_common::bus::config::TransportConfig;
use robot_common::bus::transport::{Subscription, TransportError};
use std::io::{self, BufRead};
use std::thread;
use tracing::{debug, warn};

/// Publish each non-empty line of `reader` on `topic`.
///
/// Returns the number of lines published. Stops at end of input or on the
/// first read error.
pub fn forward_actions<R: BufRead>(reader: R, bus: &LocalBus, topic: &str) -> usize {
    let mut forwarded = 0;
    for line in reader.lines() {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                warn!("Console read error: {}", e);
                break;
            }
        };
        let token = line.trim();
        if token.is_empty() {
            continue;
        }
        match bus.publish(topic, token) {
            Ok(0) => debug!("No subscribers for action '{}'", token),
            Ok(_) => {}
            Err(e) => warn!("Failed to forward action '{}': {}", token, e),
        }
        forwarded += 1;
    }
    forwarded
}

/// stdin/stdout bridge attached to a [`LocalBus`].
#[derive(Debug)]
pub struct ConsoleBridge {
    _state_subscription: Subscription,
}

impl ConsoleBridge {
    /// Start printing snapshots and forwarding stdin.
    ///
    /// The stdin reader thread is detached; it ends with the process or at
    /// end of input.
    pub fn start(bus: LocalBus, config: &TransportConfig) -> Result<Self, TransportError> {
        let state_subscription = bus.subscribe(
            &config.state_topic,
            config.queue_size,
            Box::new(|snapshot| println!("{snapshot}")),
        )?;

        let action_topic = config.action_topic.clone();
        thread::Builder::new()
            .name("console-stdin".to_string())
            .spawn(move || {
                let forwarded = forward_actions(io::stdin().lock(), &bus, &action_topic);
                debug!("Console input closed after {} action(s)", forwarded);
            })
            .map_err(|e| TransportError::Io(e.to_string()))?;

        Ok(Self {
            _state_subscription: state_subscription,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::io::Cursor;
    use std::sync::Arc;
    use std::time::{Duration, Instant};

    #[test]
    fn test_forward_skips_blank_lines() {
        let bus = LocalBus::new();
        let received = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&received);
        let _sub = bus
            .subscribe("action", 10, Box::new(move |m| sink.lock().push(m)))
            .unwrap();

        let input = Cursor::new("turn_left\n\n   \n  continue  \nturn_right\n");
        assert_eq!(forward_actions(input, &bus, "action"), 3);

        let deadline = Instant::now() + Duration::from_secs(2);
        while received.lock().len() < 3 && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(5));
        }
        assert_eq!(
            *received.lock(),
            vec!["turn_left", "continue", "turn_right"]
        );
    }

    #[test]
    fn test_forward_without_subscribers() {
        let bus = LocalBus::new();
        assert_eq!(forward_actions(Cursor::new("continue\n"), &bus, "action"), 1);
    }
}
