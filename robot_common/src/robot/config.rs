//! Node configuration file layout.
//!
//! Every section is optional; a missing file section falls back to the
//! defaults shown below.
//!
//! ```toml
//! [shared]
//! log_level = "info"
//! service_name = "robot"
//!
//! [node]
//! rate = 1.0
//! headings = ["north", "east", "south", "west"]
//! # seed = 42
//! # initial_heading = "north"
//!
//! [transport]
//! kind = "local"
//! action_topic = "action"
//! state_topic = "state"
//! queue_size = 10
//! ```

use crate::bus::config::TransportConfig;
use crate::config::{ConfigError, SharedConfig};
use crate::consts::DEFAULT_RATE_HZ;
use crate::robot::types::{Heading, HeadingCycle};
use serde::{Deserialize, Serialize};

/// Parameters of the state node itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NodeParams {
    /// Publish rate in ticks per second.
    #[serde(default = "default_rate")]
    pub rate: f64,

    /// Rotation order used by turn actions.
    #[serde(default)]
    pub headings: HeadingCycle,

    /// RNG seed for reproducible runs. Entropy-seeded when absent.
    #[serde(default)]
    pub seed: Option<u64>,

    /// Fixed starting heading. Drawn at random when absent.
    #[serde(default)]
    pub initial_heading: Option<Heading>,
}

fn default_rate() -> f64 {
    DEFAULT_RATE_HZ
}

impl Default for NodeParams {
    fn default() -> Self {
        Self {
            rate: DEFAULT_RATE_HZ,
            headings: HeadingCycle::default(),
            seed: None,
            initial_heading: None,
        }
    }
}

/// Complete node configuration file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NodeConfig {
    /// Logging and node name.
    #[serde(default)]
    pub shared: SharedConfig,

    /// State node parameters.
    #[serde(default)]
    pub node: NodeParams,

    /// Topic transport selection and settings.
    #[serde(default)]
    pub transport: TransportConfig,
}

impl NodeConfig {
    /// Validate the shared and transport sections.
    ///
    /// The publish rate is checked by the node when it derives its tick
    /// period.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.shared.validate()?;
        self.transport.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ConfigLoader, LogLevel};

    #[test]
    fn test_empty_document_uses_defaults() {
        let config = NodeConfig::from_toml("").unwrap();
        assert_eq!(config, NodeConfig::default());
        assert_eq!(config.node.rate, 1.0);
        assert_eq!(config.node.headings, HeadingCycle::default());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_node_section() {
        let config = NodeConfig::from_toml(
            r#"
[shared]
log_level = "debug"

[node]
rate = 5.0
headings = ["north", "west", "south", "east"]
seed = 7
initial_heading = "south"
"#,
        )
        .unwrap();

        assert_eq!(config.shared.log_level, LogLevel::Debug);
        assert_eq!(config.node.rate, 5.0);
        assert_eq!(config.node.seed, Some(7));
        assert_eq!(config.node.initial_heading, Some(Heading::South));
        assert_eq!(config.node.headings.right_of(Heading::North), Heading::West);
    }

    #[test]
    fn test_duplicate_headings_rejected_at_parse() {
        let result = NodeConfig::from_toml(
            "[node]\nheadings = [\"north\", \"north\", \"south\", \"west\"]\n",
        );
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_short_heading_list_rejected() {
        let result = NodeConfig::from_toml("[node]\nheadings = [\"north\", \"east\"]\n");
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_unknown_section_rejected() {
        let result = NodeConfig::from_toml("[planner]\nenabled = true\n");
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }
}
