//! State node and publish loop management.
//!
//! The `StateNode` struct is the main entry point. It owns the robot model,
//! wires the action topic to it, and publishes a snapshot on every tick.

use crate::model::RobotModel;
use crate::transport_registry::TransportRegistry;
use parking_lot::Mutex;
use robot_common::bus::transport::{
    MessageCallback, Publisher, Subscription, Transport, TransportError,
};
use robot_common::config::{ConfigError, ConfigLoader};
use robot_common::consts::MAX_SLEEP_SLICE;
use robot_common::robot::config::NodeConfig;
use robot_common::robot::types::{Action, RobotState};
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Errors raised while setting up or stopping the node.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum NodeError {
    /// Configuration could not be loaded or failed validation
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Transport could not be created, connected or wired
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// Publish rate is not a positive, finite number
    #[error("Invalid rate {0}: must be a positive, finite number of ticks per second")]
    InvalidRate(f64),
}

/// Publish loop statistics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickStats {
    /// Number of ticks executed
    pub tick_count: u64,
    /// Number of snapshots the transport refused
    pub publish_failures: u64,
    /// Number of ticks whose work exceeded the tick period
    pub overruns: u64,
    /// Longest observed tick work in microseconds
    pub max_tick_time_us: u64,
}

/// Simulated robot state node.
pub struct StateNode {
    /// Node name prefixed to operator-facing log lines
    name: String,
    /// Robot model shared with the action callback
    model: Arc<Mutex<RobotModel>>,
    /// Active transport
    transport: Box<dyn Transport>,
    /// Publisher for the state topic
    publisher: Box<dyn Publisher>,
    /// Subscription to the action topic
    subscription: Option<Subscription>,
    /// Running flag for loop control
    running: Arc<AtomicBool>,
    /// Time between ticks
    tick_period: Duration,
    /// Loop statistics
    stats: TickStats,
}

impl StateNode {
    /// Load and validate a node configuration file.
    pub fn load_config(config_path: &Path) -> Result<NodeConfig, NodeError> {
        let config = NodeConfig::load(config_path)?;
        config.validate()?;
        log_config_summary(Some(config_path), &config);
        Ok(config)
    }

    /// Create a node using the transport named in `config.transport.kind`.
    ///
    /// # Errors
    /// Returns `NodeError::Transport(TransportError::NotFound)` for an
    /// unregistered transport, or any error from [`StateNode::with_transport`].
    pub fn initialize(
        config: NodeConfig,
        registry: &TransportRegistry,
    ) -> Result<Self, NodeError> {
        let transport = registry.create_transport(&config.transport.kind)?;
        Self::with_transport(config, transport)
    }

    /// Create a node on an already constructed transport.
    ///
    /// Validates the configuration, draws the initial state, connects the
    /// transport, advertises the state topic and subscribes to the action
    /// topic. Nothing is published until [`StateNode::run_loop`].
    pub fn with_transport(
        config: NodeConfig,
        mut transport: Box<dyn Transport>,
    ) -> Result<Self, NodeError> {
        config.validate()?;
        let tick_period = tick_period(config.node.rate)?;
        let name = config.shared.service_name.clone();

        let params = &config.node;
        let model = match params.initial_heading {
            Some(heading) => RobotModel::with_heading(params.headings, heading, params.seed),
            None => RobotModel::new(params.headings, params.seed),
        };
        debug!("{}: Initial state: {}", name, model.state());
        let model = Arc::new(Mutex::new(model));

        let transport_config = &config.transport;
        transport.connect(transport_config)?;
        info!(
            "{}: Using transport '{}' v{}",
            name,
            transport.name(),
            transport.version()
        );

        let publisher =
            transport.advertise(&transport_config.state_topic, transport_config.queue_size)?;
        let subscription = transport.subscribe(
            &transport_config.action_topic,
            transport_config.queue_size,
            action_callback(name.clone(), Arc::clone(&model)),
        )?;

        info!("{} initialized", name);
        Ok(Self {
            name,
            model,
            transport,
            publisher,
            subscription: Some(subscription),
            running: Arc::new(AtomicBool::new(true)),
            tick_period,
            stats: TickStats::default(),
        })
    }

    /// Apply one operator action and return the resulting state.
    ///
    /// This is the same path the action topic callback takes.
    pub fn apply_action(&self, action: &Action) -> RobotState {
        apply_and_log(&self.name, &self.model, action)
    }

    /// Current state rendered as `"<heading> <obstacle>"`.
    pub fn snapshot(&self) -> String {
        self.model.lock().snapshot()
    }

    /// Current state.
    pub fn state(&self) -> RobotState {
        self.model.lock().state()
    }

    /// Run the publish loop.
    ///
    /// Blocks until the running flag is cleared (signal handler or
    /// [`StateNode::shutdown`]). Each tick publishes one snapshot and then
    /// sleeps to the next tick boundary. Actions are applied by the
    /// subscription callback, not by this loop.
    pub fn run_loop(&mut self) {
        info!(
            "{}: Publishing on '{}' every {:?}",
            self.name,
            self.publisher.topic(),
            self.tick_period
        );

        while self.running.load(Ordering::SeqCst) {
            let tick_start = Instant::now();

            let snapshot = self.snapshot();
            match self.publisher.publish(&snapshot) {
                Ok(()) => debug!("{}: Published state '{}'", self.name, snapshot),
                Err(e) => {
                    self.stats.publish_failures += 1;
                    warn!("{}: Failed to publish state: {}", self.name, e);
                }
            }

            let work = tick_start.elapsed();
            let work_us = u64::try_from(work.as_micros()).unwrap_or(u64::MAX);
            self.stats.tick_count += 1;
            self.stats.max_tick_time_us = self.stats.max_tick_time_us.max(work_us);
            if work > self.tick_period {
                self.stats.overruns += 1;
                if self.stats.overruns <= 10 || self.stats.overruns % 1000 == 0 {
                    warn!(
                        "{}: Tick overrun #{}: took {}us (period {:?})",
                        self.name, self.stats.overruns, work_us, self.tick_period
                    );
                }
            }

            // Periods too long to be represented as an Instant wait for shutdown.
            self.sleep_until(tick_start.checked_add(self.tick_period));
        }

        info!("{}: Exiting...", self.name);
        debug!(
            "{}: Loop stopped after {} ticks (overruns: {}, publish failures: {})",
            self.name, self.stats.tick_count, self.stats.overruns, self.stats.publish_failures
        );
    }

    /// Stop the loop, cancel the action subscription and shut down the transport.
    pub fn shutdown(&mut self) -> Result<(), NodeError> {
        info!("{}: Shutdown requested", self.name);
        self.running.store(false, Ordering::SeqCst);

        if let Some(subscription) = self.subscription.take() {
            subscription.cancel();
        }
        self.transport.shutdown()?;
        Ok(())
    }

    /// Get the running flag for signal handlers.
    pub fn running_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.running)
    }

    /// Get loop statistics.
    pub fn stats(&self) -> TickStats {
        self.stats
    }

    /// Time between ticks.
    pub fn tick_period(&self) -> Duration {
        self.tick_period
    }

    /// Node name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Sleep in short slices so a cleared running flag is seen promptly.
    ///
    /// With no deadline, sleeps until the flag clears.
    fn sleep_until(&self, deadline: Option<Instant>) {
        while self.running.load(Ordering::SeqCst) {
            let slice = match deadline {
                Some(deadline) => {
                    let now = Instant::now();
                    if now >= deadline {
                        return;
                    }
                    (deadline - now).min(MAX_SLEEP_SLICE)
                }
                None => MAX_SLEEP_SLICE,
            };
            thread::sleep(slice);
        }
    }
}

/// Log where a configuration came from and its main settings.
///
/// The binary calls this once tracing is installed, since the file is read
/// before the log level is known.
pub fn log_config_summary(source: Option<&Path>, config: &NodeConfig) {
    match source {
        Some(path) => info!("Loaded configuration from {:?}", path),
        None => info!("No configuration file given, using defaults"),
    }
    info!(
        "{}: transport={}, rate={}Hz, action='{}', state='{}'",
        config.shared.service_name,
        config.transport.kind,
        config.node.rate,
        config.transport.action_topic,
        config.transport.state_topic
    );
}

/// Convert a rate in ticks per second into a tick period.
pub fn tick_period(rate: f64) -> Result<Duration, NodeError> {
    if !rate.is_finite() || rate <= 0.0 {
        return Err(NodeError::InvalidRate(rate));
    }
    Duration::try_from_secs_f64(1.0 / rate).map_err(|_| NodeError::InvalidRate(rate))
}

fn apply_and_log(name: &str, model: &Mutex<RobotModel>, action: &Action) -> RobotState {
    info!("{}: Action received from operator: {}", name, action);
    let state = model.lock().apply(action);
    info!(
        "{}: New state: Heading: {}, Obstacle: {}",
        name, state.heading, state.obstacle
    );
    state
}

fn action_callback(name: String, model: Arc<Mutex<RobotModel>>) -> MessageCallback {
    Box::new(move |payload: String| {
        apply_and_log(&name, &model, &Action::parse(&payload));
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transports::local::{LocalBus, LocalTransport};
    use robot_common::robot::types::Heading;
    use std::io::{self, Write};

    /// Log sink shared between a test and its subscriber.
    #[derive(Clone, Default)]
    struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

    impl CapturedLogs {
        fn contents(&self) -> String {
            String::from_utf8_lossy(&self.0.lock()).into_owned()
        }
    }

    impl Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn with_captured_logs<T>(f: impl FnOnce() -> T) -> (T, String) {
        let logs = CapturedLogs::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_ansi(false)
            .with_max_level(tracing::Level::INFO)
            .with_writer(move || writer.clone())
            .finish();
        let result = tracing::subscriber::with_default(subscriber, f);
        (result, logs.contents())
    }

    fn local_node(config: NodeConfig) -> (StateNode, LocalBus) {
        let bus = LocalBus::new();
        let transport = Box::new(LocalTransport::with_bus(bus.clone()));
        let node = StateNode::with_transport(config, transport).expect("node should initialize");
        (node, bus)
    }

    #[test]
    fn test_tick_period() {
        assert_eq!(tick_period(1.0).unwrap(), Duration::from_secs(1));
        assert_eq!(tick_period(10.0).unwrap(), Duration::from_millis(100));
        assert_eq!(tick_period(0.5).unwrap(), Duration::from_secs(2));
    }

    #[test]
    fn test_invalid_rates_rejected() {
        for rate in [0.0, -1.0, f64::NAN, f64::INFINITY, f64::MIN_POSITIVE] {
            assert!(
                matches!(tick_period(rate), Err(NodeError::InvalidRate(_))),
                "rate {rate} should be rejected"
            );
        }
    }

    #[test]
    fn test_initialize_rejects_zero_rate() {
        let mut config = NodeConfig::default();
        config.node.rate = 0.0;
        let result = StateNode::initialize(config, &TransportRegistry::with_builtin());
        assert!(matches!(result, Err(NodeError::InvalidRate(_))));
    }

    #[test]
    fn test_initialize_unknown_transport() {
        let mut config = NodeConfig::default();
        config.transport.kind = "carrier_pigeon".to_string();
        let result = StateNode::initialize(config, &TransportRegistry::with_builtin());
        assert!(matches!(
            result,
            Err(NodeError::Transport(TransportError::NotFound(_)))
        ));
    }

    #[test]
    fn test_initialize_rejects_invalid_config() {
        let mut config = NodeConfig::default();
        config.shared.service_name = String::new();
        let result = StateNode::initialize(config, &TransportRegistry::with_builtin());
        assert!(matches!(result, Err(NodeError::Config(_))));
    }

    #[test]
    fn test_apply_action_and_snapshot() {
        let mut config = NodeConfig::default();
        config.node.initial_heading = Some(Heading::North);
        config.node.seed = Some(3);
        let (node, _bus) = local_node(config);

        assert_eq!(node.state().heading, Heading::North);
        assert_eq!(node.apply_action(&Action::TurnLeft).heading, Heading::West);
        assert_eq!(node.apply_action(&Action::parse("hop")).heading, Heading::West);

        let snapshot = node.snapshot();
        assert!(snapshot == "west true" || snapshot == "west false", "{snapshot}");
    }

    #[test]
    fn test_defaults() {
        let (node, bus) = local_node(NodeConfig::default());
        assert_eq!(node.name(), "robot");
        assert_eq!(node.tick_period(), Duration::from_secs(1));
        assert_eq!(node.stats(), TickStats::default());
        assert_eq!(bus.subscriber_count("action"), 1);
    }

    #[test]
    fn test_shutdown_before_run_returns_immediately() {
        let (mut node, bus) = local_node(NodeConfig::default());
        node.shutdown().unwrap();
        node.run_loop();

        assert_eq!(node.stats().tick_count, 0);
        assert_eq!(bus.publish("action", "continue").unwrap(), 0);
    }

    #[test]
    fn test_unrepresentable_deadline_waits_for_shutdown() {
        let mut config = NodeConfig::default();
        config.node.rate = 1e-19;
        let (mut node, _bus) = local_node(config);
        assert!(node.tick_period() > Duration::from_secs(1_000_000_000));

        let running = node.running_flag();
        let handle = thread::spawn(move || {
            node.run_loop();
            node
        });
        thread::sleep(Duration::from_millis(100));
        running.store(false, Ordering::SeqCst);

        let node = handle.join().expect("loop should stop without panicking");
        assert_eq!(node.stats().tick_count, 1);
        assert_eq!(node.stats().overruns, 0);
    }

    #[test]
    fn test_load_config_logs_summary() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[node]\nrate = 2.0\n\n[transport]\naction_topic = \"cmd\"").unwrap();

        let (config, logs) = with_captured_logs(|| StateNode::load_config(file.path()));
        assert_eq!(config.unwrap().node.rate, 2.0);
        assert!(logs.contains("Loaded configuration from"), "{logs}");
        assert!(logs.contains("robot: transport=local, rate=2Hz, action='cmd'"), "{logs}");
    }

    #[test]
    fn test_default_config_summary() {
        let ((), logs) = with_captured_logs(|| log_config_summary(None, &NodeConfig::default()));
        assert!(logs.contains("using defaults"), "{logs}");
        assert!(logs.contains("state='state'"), "{logs}");
    }
}
