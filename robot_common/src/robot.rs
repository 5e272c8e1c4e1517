//! Robot state types and node parameters.
//!
//! This module contains the heading, action and state types shared by the
//! node and operators, plus the node configuration file layout.

pub mod config;
pub mod types;
