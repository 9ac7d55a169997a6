//! MQTT transport shim.
//!
//! Connects to the broker, subscribes to the command namespace, feeds
//! inbound command messages into the per-device queues and publishes
//! whatever the translator produces for each measurement report.
//! Publication is fire-and-forget; failures are logged, never retried.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use rumqttc::{AsyncClient, Event, EventLoop, MqttOptions, Packet, QoS, Transport};
use tokio::sync::mpsc;
use uuid::Uuid;

use agbridge_bridge::{
    command_topic_filter, parse_command, BridgeTranslator, CommandQueueManager, MeasurementEvent,
    TOPIC_PREFIX,
};
use agbridge_core::{BridgeConfig, BrokerScheme, Error, Result};

const KEEP_ALIVE_SECS: u64 = 60;
const RECONNECT_BACKOFF_SECS: u64 = 1;
const REQUEST_CAPACITY: usize = 10;

/// Random client id. Broker client ids are limited to 23 characters,
/// so the suffix is a short hex slug rather than a full UUID.
fn client_id() -> String {
    let slug = Uuid::new_v4().simple().to_string();
    format!("{TOPIC_PREFIX}_{}", &slug[..6])
}

fn transport(config: &BridgeConfig) -> Result<Transport> {
    if config.check_certificate {
        return Ok(Transport::Tls(rumqttc::TlsConfiguration::Native));
    }

    tracing::warn!("Broker certificate validation is disabled");
    let connector = native_tls::TlsConnector::builder()
        .danger_accept_invalid_certs(true)
        .build()
        .map_err(|e| Error::Mqtt(format!("TLS setup failed: {e}")))?;
    Ok(Transport::Tls(rumqttc::TlsConfiguration::NativeConnector(
        connector.into(),
    )))
}

fn mqtt_options(config: &BridgeConfig) -> Result<MqttOptions> {
    let mut options = MqttOptions::new(client_id(), &config.broker.host, config.broker.port);
    options.set_keep_alive(Duration::from_secs(KEEP_ALIVE_SECS));

    if let Some(username) = &config.username {
        options.set_credentials(username, config.password.clone().unwrap_or_default());
    }

    if config.broker.scheme == BrokerScheme::Tls {
        options.set_transport(transport(config)?);
    }

    Ok(options)
}

/// Connect to the broker and run the bridge until the measurement
/// channel closes. Spawns the event-loop task that handles inbound
/// packets; the calling task becomes the publisher.
pub async fn run_bridge(
    config: &BridgeConfig,
    queues: Arc<CommandQueueManager>,
    mut measurements: mpsc::Receiver<MeasurementEvent>,
) -> Result<()> {
    let options = mqtt_options(config)?;
    let (client, eventloop) = AsyncClient::new(options, REQUEST_CAPACITY);

    spawn_event_loop(eventloop, client.clone(), queues);

    let mut translator = BridgeTranslator::new();
    while let Some(event) = measurements.recv().await {
        let messages = translator.handle_measurement(&event, Utc::now());
        for message in messages {
            let topic = message.topic;
            if let Err(e) = client
                .publish(
                    topic.clone(),
                    QoS::AtLeastOnce,
                    message.retain,
                    message.payload.into_bytes(),
                )
                .await
            {
                tracing::warn!("Failed to publish to {topic}: {e}");
            }
        }
    }

    tracing::info!("Measurement pipeline closed, MQTT bridge stopping");
    Ok(())
}

/// Poll the event loop forever. Connection errors are logged and the
/// loop keeps polling; rumqttc reconnects on the next poll. Command
/// subscriptions are (re)established on every ConnAck so they survive
/// reconnects.
fn spawn_event_loop(
    mut eventloop: EventLoop,
    client: AsyncClient,
    queues: Arc<CommandQueueManager>,
) {
    tokio::spawn(async move {
        loop {
            match eventloop.poll().await {
                Ok(Event::Incoming(packet)) => {
                    handle_packet(packet, &client, &queues).await;
                }
                Ok(Event::Outgoing(_)) => {}
                Err(e) => {
                    tracing::warn!("MQTT connection error: {e}");
                    tokio::time::sleep(Duration::from_secs(RECONNECT_BACKOFF_SECS)).await;
                    tracing::info!("Attempting to reconnect to MQTT broker");
                }
            }
        }
    });
}

async fn handle_packet(packet: Packet, client: &AsyncClient, queues: &CommandQueueManager) {
    match packet {
        Packet::ConnAck(_) => {
            tracing::info!("Connected to MQTT broker");
            let filter = command_topic_filter();
            if let Err(e) = client.subscribe(filter.clone(), QoS::AtLeastOnce).await {
                tracing::warn!("Error while subscribing to MQTT command topics: {e}");
            } else {
                tracing::debug!("Requested subscription to {filter}");
            }
        }
        Packet::SubAck(_) => {
            tracing::info!("Successfully subscribed to MQTT command topics");
        }
        Packet::Publish(publish) => {
            let message = String::from_utf8_lossy(&publish.payload);
            handle_command_message(&publish.topic, &message, queues);
        }
        _ => {}
    }
}

/// Translate and enqueue one inbound command message.
fn handle_command_message(topic: &str, message: &str, queues: &CommandQueueManager) {
    if let Some(cmd) = parse_command(topic, message) {
        queues.enqueue(&cmd.device_id, cmd.command.clone());
        tracing::debug!("Successfully queued {} for {}", cmd.command, cmd.device_id);
    }
}
