//! Transport constants.

use std::time::Duration;

/// Registry name of the default transport.
pub const DEFAULT_TRANSPORT: &str = "local";

/// Topic carrying operator action tokens.
pub const DEFAULT_ACTION_TOPIC: &str = "action";

/// Topic carrying state snapshots.
pub const DEFAULT_STATE_TOPIC: &str = "state";

/// Per-topic queue depth.
pub const DEFAULT_QUEUE_SIZE: usize = 10;

/// Default UDP port the node binds on all interfaces.
pub const DEFAULT_UDP_PORT: u16 = 9870;

/// Largest datagram accepted by the UDP transport.
pub const MAX_DATAGRAM_SIZE: usize = 1024;

/// How often blocked receivers wake up to check for cancellation.
pub const RECV_POLL_INTERVAL: Duration = Duration::from_millis(50);
