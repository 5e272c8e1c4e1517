//! Transport configuration.
//!
//! # TOML Example
//!
//! ```toml
//! [transport]
//! kind = "udp"
//! action_topic = "action"
//! state_topic = "state"
//! queue_size = 10
//!
//! [transport.udp]
//! bind = "0.0.0.0:9870"
//! peers = ["192.168.1.20:9871"]
//! ```

use crate::bus::consts::{
    DEFAULT_ACTION_TOPIC, DEFAULT_QUEUE_SIZE, DEFAULT_STATE_TOPIC, DEFAULT_TRANSPORT,
    DEFAULT_UDP_PORT,
};
use crate::bus::transport::validate_topic;
use crate::config::ConfigError;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;

/// Transport selection and topic names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TransportConfig {
    /// Registry name of the backend (`local`, `udp`).
    #[serde(default = "default_kind")]
    pub kind: String,

    /// Inbound topic for operator actions.
    #[serde(default = "default_action_topic")]
    pub action_topic: String,

    /// Outbound topic for state snapshots.
    #[serde(default = "default_state_topic")]
    pub state_topic: String,

    /// Per-topic queue depth.
    #[serde(default = "default_queue_size")]
    pub queue_size: usize,

    /// UDP backend settings (ignored by other backends).
    #[serde(default)]
    pub udp: UdpConfig,
}

fn default_kind() -> String {
    DEFAULT_TRANSPORT.to_string()
}

fn default_action_topic() -> String {
    DEFAULT_ACTION_TOPIC.to_string()
}

fn default_state_topic() -> String {
    DEFAULT_STATE_TOPIC.to_string()
}

fn default_queue_size() -> usize {
    DEFAULT_QUEUE_SIZE
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            kind: default_kind(),
            action_topic: default_action_topic(),
            state_topic: default_state_topic(),
            queue_size: DEFAULT_QUEUE_SIZE,
            udp: UdpConfig::default(),
        }
    }
}

impl TransportConfig {
    /// Validate topic names, queue size and backend name.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.kind.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "transport kind cannot be empty".to_string(),
            ));
        }
        for topic in [&self.action_topic, &self.state_topic] {
            validate_topic(topic).map_err(|e| ConfigError::ValidationError(e.to_string()))?;
        }
        if self.action_topic == self.state_topic {
            return Err(ConfigError::ValidationError(format!(
                "action and state topics must differ (both '{}')",
                self.state_topic
            )));
        }
        if self.queue_size == 0 {
            return Err(ConfigError::ValidationError(
                "queue_size must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// UDP backend settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UdpConfig {
    /// Local address the node receives datagrams on.
    #[serde(default = "default_udp_bind")]
    pub bind: SocketAddr,

    /// Addresses every published message is sent to.
    #[serde(default)]
    pub peers: Vec<SocketAddr>,
}

fn default_udp_bind() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], DEFAULT_UDP_PORT))
}

impl Default for UdpConfig {
    fn default() -> Self {
        Self {
            bind: default_udp_bind(),
            peers: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigLoader;

    #[test]
    fn test_defaults() {
        let config = TransportConfig::default();
        assert_eq!(config.kind, "local");
        assert_eq!(config.action_topic, "action");
        assert_eq!(config.state_topic, "state");
        assert_eq!(config.queue_size, 10);
        assert_eq!(config.udp.bind.to_string(), "0.0.0.0:9870");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_udp_section() {
        let config = TransportConfig::from_toml(
            r#"
kind = "udp"

[udp]
bind = "127.0.0.1:9000"
peers = ["127.0.0.1:9001", "10.0.0.2:9001"]
"#,
        )
        .unwrap();
        assert_eq!(config.kind, "udp");
        assert_eq!(config.udp.bind.port(), 9000);
        assert_eq!(config.udp.peers.len(), 2);
    }

    #[test]
    fn test_invalid_peer_address_rejected() {
        let result = TransportConfig::from_toml("[udp]\npeers = [\"not-an-address\"]\n");
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_validation_failures() {
        let mut config = TransportConfig::default();
        config.queue_size = 0;
        assert!(config.validate().is_err());

        let mut config = TransportConfig::default();
        config.state_topic = "action".to_string();
        assert!(config.validate().is_err());

        let mut config = TransportConfig::default();
        config.action_topic = "robot action".to_string();
        assert!(config.validate().is_err());

        let mut config = TransportConfig::default();
        config.kind = String::new();
        assert!(config.validate().is_err());
    }
}
