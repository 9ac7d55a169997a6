//! HTTP surface emulating the AirGradient cloud endpoint.
//!
//! Sensors poll `POST /sensors/airgradient:<serial>/measures` on their
//! own cadence, reporting measurements in the body and receiving the
//! next queued command (or `"OK"`) in the response. This crate is a
//! thin transport shim: measurement bodies are forwarded to the
//! translation core over a bounded channel.

mod shutdown;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use serde_json::Value;
use tokio::sync::mpsc;

use agbridge_bridge::{CommandQueueManager, MeasurementEvent};

/// Segment prefix the vendor firmware puts before the serial number.
const SENSOR_PATH_PREFIX: &str = "airgradient:";

/// Bodies with at most this many keys are keep-alive pings and carry
/// no measurements.
pub const PING_KEY_THRESHOLD: usize = 2;

/// Capacity of the measurement channel between this shim and the
/// bridge dispatch task.
pub const MEASUREMENT_CHANNEL_CAPACITY: usize = 64;

/// Shared state for the poll handler.
#[derive(Clone)]
pub struct CloudState {
    queues: Arc<CommandQueueManager>,
    measurements: mpsc::Sender<MeasurementEvent>,
}

impl CloudState {
    pub fn new(queues: Arc<CommandQueueManager>, measurements: mpsc::Sender<MeasurementEvent>) -> Self {
        Self {
            queues,
            measurements,
        }
    }
}

/// Build the router for the cloud endpoint.
pub fn router(state: CloudState) -> Router {
    Router::new()
        .route("/sensors/:sensor/measures", post(handle_poll))
        .with_state(state)
}

/// Bind and serve until shutdown is signalled.
pub async fn run(listen: SocketAddr, state: CloudState) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(listen).await?;
    tracing::info!("AirGradient cloud endpoint listening on {listen}");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown::shutdown_signal())
        .await?;

    tracing::info!("Cloud endpoint shut down");
    Ok(())
}

async fn handle_poll(
    State(state): State<CloudState>,
    Path(sensor): Path<String>,
    Json(body): Json<Value>,
) -> Result<String, StatusCode> {
    let Some(device_id) = sensor.strip_prefix(SENSOR_PATH_PREFIX) else {
        return Err(StatusCode::NOT_FOUND);
    };

    let next_command = state.queues.dequeue(device_id);
    match &next_command {
        Some(command) => tracing::debug!("Next command for {device_id} is {command}"),
        None => tracing::trace!("No command queued for {device_id}"),
    }

    if let Value::Object(payload) = body {
        if payload.len() > PING_KEY_THRESHOLD {
            let event = MeasurementEvent {
                device_id: device_id.to_string(),
                payload,
            };
            if let Err(e) = state.measurements.send(event).await {
                tracing::warn!("Measurement pipeline closed, dropping report from {device_id}: {e}");
            }
        }
    }

    Ok(next_command.unwrap_or_else(|| "OK".to_string()))
}
