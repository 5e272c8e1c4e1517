//! # Robot Node Library
//!
//! Simulated robot state node: keeps a heading and an obstacle flag, applies
//! operator actions received on a topic, and broadcasts its state at a fixed
//! rate.
//!
//! # Module Structure
//!
//! - [`core`] - `StateNode` struct, publish loop management
//! - [`model`] - `RobotModel`, the state-update policy
//! - [`transport_registry`] - Transport factory registration
//! - [`transports`] - Topic transport implementations (`local`, `udp`)
//! - [`console`] - stdin/stdout operator bridge for the local transport
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                     robot_node (single crate)                    │
//! │  ┌─────────────┐    ┌──────────────┐    ┌─────────────────────┐  │
//! │  │  Transport  │◄──►│  StateNode   │◄──►│ Transport Registry  │  │
//! │  │ local / udp │    │ (tick loop)  │    │                     │  │
//! │  └──────┬──────┘    └──────┬───────┘    └─────────────────────┘  │
//! │         │ action           │ snapshot                            │
//! │         ▼                  ▼                                     │
//! │   ┌──────────────────────────────┐                               │
//! │   │  Mutex<RobotModel>           │                               │
//! │   └──────────────────────────────┘                               │
//! └──────────────────────────────────────────────────────────────────┘
//! ```

#![deny(missing_docs)]

pub mod console;
pub mod core;
pub mod model;
pub mod transport_registry;
pub mod transports;

// Re-export key types for convenience
pub use crate::core::{NodeError, StateNode, TickStats};
pub use crate::model::RobotModel;
pub use crate::transport_registry::TransportRegistry;
pub use crate::transports::local::{LocalBus, LocalTransport};
pub use crate::transports::udp::UdpTransport;
