//! Prelude module for common re-exports.
//!
//! ```rust
//! use robot_common::prelude::*;
//! ```

// ─── Configuration ──────────────────────────────────────────────────
pub use crate::config::{ConfigError, ConfigLoader, LogLevel, SharedConfig};
pub use crate::robot::config::{NodeConfig, NodeParams};

// ─── Robot Types ────────────────────────────────────────────────────
pub use crate::robot::types::{
    Action, Heading, HeadingCycle, ParseHeadingError, ParseStateError, RobotState,
};

// ─── Transport ──────────────────────────────────────────────────────
pub use crate::bus::config::{TransportConfig, UdpConfig};
pub use crate::bus::transport::{
    MessageCallback, Publisher, Subscription, Transport, TransportError, TransportFactory,
};

// ─── Defaults ───────────────────────────────────────────────────────
pub use crate::consts::{DEFAULT_NODE_NAME, DEFAULT_RATE_HZ};
