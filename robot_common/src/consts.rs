//! Workspace-wide constants for the robot node.
//!
//! Single source of truth for defaults shared by the node, its transports
//! and operator tooling.

use std::time::Duration;

/// Default node name used in log lines.
pub const DEFAULT_NODE_NAME: &str = "robot";

/// Default publish rate in ticks per second.
pub const DEFAULT_RATE_HZ: f64 = 1.0;

/// Longest single sleep inside a tick, so shutdown is observed promptly.
pub const MAX_SLEEP_SLICE: Duration = Duration::from_millis(50);
