//! # Robot State Node Binary
//!
//! Simulated robot that publishes its heading and obstacle flag on the
//! `state` topic and turns on operator actions from the `action` topic.
//!
//! # Usage
//!
//! ```bash
//! # Defaults: local transport, 1 Hz, type actions on stdin
//! robot_node
//!
//! # Faster updates with a fixed seed
//! robot_node --rate 5 --seed 42
//!
//! # Network transport from a config file, JSON logs
//! robot_node --config config/robot.toml --transport udp --json
//! ```

#![deny(warnings)]

use clap::Parser;
use robot_common::config::{ConfigLoader, LogLevel};
use robot_common::robot::config::NodeConfig;
use robot_node::console::ConsoleBridge;
use robot_node::core::log_config_summary;
use robot_node::{LocalBus, LocalTransport, StateNode, TransportRegistry};
use std::path::PathBuf;
use std::sync::atomic::Ordering;
use tracing::{Level, error, info};
use tracing_subscriber::EnvFilter;

/// Robot state node - simulated heading/obstacle state over topics
#[derive(Parser, Debug)]
#[command(name = "robot_node")]
#[command(author = "RTS007")]
#[command(version)]
#[command(about = "Simulated robot state node with pluggable topic transports")]
#[command(long_about = None)]
struct Args {
    /// Path to node configuration file (TOML). Defaults are used when absent.
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Publish rate in ticks per second (overrides `node.rate`)
    #[arg(short, long, value_name = "HZ")]
    rate: Option<f64>,

    /// Transport backend (overrides `transport.kind`)
    #[arg(short, long, value_name = "NAME")]
    transport: Option<String>,

    /// RNG seed for reproducible runs (overrides `node.seed`)
    #[arg(long)]
    seed: Option<u64>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Output logs in JSON format
    #[arg(long)]
    json: bool,

    /// Do not bridge stdin/stdout to the local transport
    #[arg(long)]
    no_console: bool,
}

fn main() {
    // Setup failures leave the node inert; the process still exits cleanly.
    if let Err(e) = run() {
        error!("Robot node setup failed: {}", e);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // Read the file before tracing exists so its log level can be applied;
    // validation and reporting happen once the subscriber is installed.
    let config = match &args.config {
        Some(path) => NodeConfig::load(path),
        None => Ok(NodeConfig::default()),
    };
    let log_level = config
        .as_ref()
        .map(|c| c.shared.log_level)
        .unwrap_or_default();
    setup_tracing(&args, log_level);

    info!("Robot node v{} starting...", env!("CARGO_PKG_VERSION"));
    let mut config = config?;
    config.validate()?;
    log_config_summary(args.config.as_deref(), &config);
    apply_overrides(&mut config, &args);

    let (mut node, _console) = if config.transport.kind == "local" && !args.no_console {
        let bus = LocalBus::new();
        let transport_config = config.transport.clone();
        let node =
            StateNode::with_transport(config, Box::new(LocalTransport::with_bus(bus.clone())))?;
        let console = ConsoleBridge::start(bus, &transport_config)?;
        info!("Console attached: type actions (continue, turn_left, turn_right)");
        (node, Some(console))
    } else {
        let registry = TransportRegistry::with_builtin();
        (StateNode::initialize(config, &registry)?, None)
    };

    // Setup signal handler.
    let running = node.running_flag();
    ctrlc::set_handler(move || {
        info!("Received shutdown signal");
        running.store(false, Ordering::SeqCst);
    })?;

    node.run_loop();
    node.shutdown()?;

    let stats = node.stats();
    info!(
        "Robot node shutdown complete ({} ticks, {} overruns, {} publish failures)",
        stats.tick_count, stats.overruns, stats.publish_failures
    );
    Ok(())
}

/// Apply command line overrides on top of the loaded configuration.
fn apply_overrides(config: &mut NodeConfig, args: &Args) {
    if let Some(rate) = args.rate {
        info!("Rate from CLI: {} Hz", rate);
        config.node.rate = rate;
    }
    if let Some(ref kind) = args.transport {
        info!("Transport from CLI: {}", kind);
        config.transport.kind = kind.clone();
    }
    if let Some(seed) = args.seed {
        config.node.seed = Some(seed);
    }
}

/// Setup tracing subscriber based on CLI arguments and configured level.
fn setup_tracing(args: &Args, log_level: LogLevel) {
    let level = if args.verbose {
        Level::DEBUG
    } else {
        Level::from(log_level)
    };

    let filter = EnvFilter::from_default_env().add_directive(level.into());

    if args.json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}
