//! Value types exchanged between the core and the transport shims.

use serde_json::{Map, Value};

/// A single bus publication produced by the translator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BusMessage {
    pub topic: String,
    pub payload: String,
    pub retain: bool,
}

impl BusMessage {
    /// A non-retained state message.
    pub fn state(topic: impl Into<String>, payload: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            payload: payload.into(),
            retain: false,
        }
    }

    /// A retained message (discovery configs).
    pub fn retained(topic: impl Into<String>, payload: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            payload: payload.into(),
            retain: true,
        }
    }
}

/// A measurement report received from a device poll.
#[derive(Debug, Clone)]
pub struct MeasurementEvent {
    pub device_id: String,
    pub payload: Map<String, Value>,
}
