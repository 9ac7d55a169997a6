//! AirGradient-to-MQTT bridge binary.
//!
//! Wires the emulated cloud endpoint, the translation core and the
//! MQTT shim together. All configuration arrives via CLI flags or the
//! environment; nothing below this file reads the environment.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tokio::sync::mpsc;

use agbridge_bridge::CommandQueueManager;
use agbridge_cloud::{CloudState, MEASUREMENT_CHANNEL_CAPACITY};
use agbridge_core::config::{env_vars, BridgeConfig, DEFAULT_CLOUD_PORT};

/// Bridge AirGradient air-quality sensors to MQTT with Home Assistant
/// discovery.
#[derive(Parser, Debug)]
#[command(name = "airgradient2mqtt")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Port for the emulated AirGradient cloud endpoint.
    #[arg(long, env = env_vars::CLOUD_PORT, default_value_t = DEFAULT_CLOUD_PORT)]
    port: u16,

    /// MQTT broker URL (mqtt://host[:port] or mqtts://host[:port]).
    #[arg(long, env = env_vars::MQTT_BROKER_URL)]
    broker_url: String,

    /// MQTT username.
    #[arg(long, env = env_vars::MQTT_USERNAME)]
    username: Option<String>,

    /// MQTT password. Requires a username.
    #[arg(long, env = env_vars::MQTT_PASSWORD)]
    password: Option<String>,

    /// Validate the broker's TLS certificate.
    #[arg(long, env = env_vars::MQTT_CHECK_CERT, default_value_t = true, action = clap::ArgAction::Set)]
    check_cert: bool,

    /// Emit JSON logs (for container environments).
    #[arg(long)]
    json_logs: bool,

    /// Verbose output.
    #[arg(short, long)]
    verbose: bool,
}

fn init_logging(verbose: bool, json: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let fallback =
        std::env::var(env_vars::LOGLEVEL).unwrap_or_else(|_| default_level.to_string());

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(fallback));

    if json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(env_filter)
            .with_target(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .compact()
            .init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose, args.json_logs);

    let config = BridgeConfig::new(
        args.port,
        &args.broker_url,
        args.username,
        args.password,
        args.check_cert,
    )?;

    let queues = Arc::new(CommandQueueManager::new());
    let (measurement_tx, measurement_rx) = mpsc::channel(MEASUREMENT_CHANNEL_CAPACITY);

    let mqtt_config = config.clone();
    let mqtt_queues = queues.clone();
    tokio::spawn(async move {
        if let Err(e) = agbridge_mqtt::run_bridge(&mqtt_config, mqtt_queues, measurement_rx).await {
            tracing::error!("MQTT bridge terminated: {e}");
        }
    });

    let listen = SocketAddr::from(([0, 0, 0, 0], config.listen_port));
    agbridge_cloud::run(listen, CloudState::new(queues, measurement_tx)).await
}
