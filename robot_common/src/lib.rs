//! Robot Common Library
//!
//! Shared types, constants and configuration loading for the robot state
//! node and anything that talks to it (operators, test harnesses).
//!
//! # Module Structure
//!
//! - [`robot`] - Heading, action and state types plus node parameters
//! - [`bus`] - Topic transport traits, errors and configuration
//! - [`config`] - Configuration loading traits and types
//! - [`consts`] - Workspace-wide defaults
//! - [`prelude`] - Common re-exports for convenience
//!
//! # Usage
//!
//! ```rust
//! use robot_common::prelude::*;
//!
//! let cycle = HeadingCycle::default();
//! assert_eq!(cycle.right_of(Heading::West), Heading::North);
//! ```

pub mod bus;
pub mod config;
pub mod consts;
pub mod prelude;
pub mod robot;
