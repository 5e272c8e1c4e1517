//! Topic transport traits, constants and configuration.
//!
//! The node publishes and subscribes through the [`transport::Transport`]
//! trait; concrete backends live in `robot_node::transports`.

pub mod config;
pub mod consts;
pub mod transport;
