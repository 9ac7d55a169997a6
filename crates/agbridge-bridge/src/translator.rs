//! The bridge translator.
//!
//! Owns the per-device discovery timestamps and turns one measurement
//! report into the full ordered set of bus messages: throttled
//! discovery configs first, then the flattened state messages.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use serde_json::{Map, Value};

use crate::discovery;
use crate::measurements::measurement_messages;
use crate::message::{BusMessage, MeasurementEvent};

/// Discovery metadata is republished per device at most this often.
const REPUBLISH_INTERVAL_HOURS: i64 = 4;

/// Protocol/topic mapping core, owned by the single dispatch task.
#[derive(Debug, Default)]
pub struct BridgeTranslator {
    discovery_published: HashMap<String, DateTime<Utc>>,
}

impl BridgeTranslator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Translate one measurement report into bus messages. Discovery
    /// configs (if due) come before the state messages so new
    /// subscribers see entities before their first values.
    pub fn handle_measurement(
        &mut self,
        event: &MeasurementEvent,
        now: DateTime<Utc>,
    ) -> Vec<BusMessage> {
        let mut messages = self.discovery_messages(&event.device_id, &event.payload, now);
        messages.extend(measurement_messages(&event.device_id, &event.payload));
        messages
    }

    /// Retained discovery configs for a device, or nothing if the
    /// device was already published within the republish interval.
    pub fn discovery_messages(
        &mut self,
        device_id: &str,
        payload: &Map<String, Value>,
        now: DateTime<Utc>,
    ) -> Vec<BusMessage> {
        if let Some(last) = self.discovery_published.get(device_id) {
            if now - *last <= Duration::hours(REPUBLISH_INTERVAL_HOURS) {
                return Vec::new();
            }
        }

        let messages = discovery::build_discovery_messages(device_id, payload);
        self.discovery_published.insert(device_id.to_string(), now);
        tracing::info!("Published discovery data for {device_id}");
        messages
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn payload(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            other => panic!("expected object payload, got {other}"),
        }
    }

    fn at(hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, hour, minute, 0).unwrap()
    }

    #[test]
    fn first_sight_publishes_then_throttles() {
        let mut translator = BridgeTranslator::new();
        let body = payload(json!({"wifi": -55, "rco2": 410, "boot": 1}));

        let first = translator.discovery_messages("sensorA", &body, at(0, 0));
        assert_eq!(first.len(), 4);

        // Within four hours: nothing, even at the boundary.
        assert!(translator
            .discovery_messages("sensorA", &body, at(4, 0))
            .is_empty());

        // Strictly past the interval: republished.
        let again = translator.discovery_messages("sensorA", &body, at(4, 1));
        assert_eq!(again.len(), 4);
    }

    #[test]
    fn throttle_is_per_device() {
        let mut translator = BridgeTranslator::new();
        let body = payload(json!({"rco2": 410}));

        assert_eq!(translator.discovery_messages("sensorA", &body, at(0, 0)).len(), 3);
        assert_eq!(translator.discovery_messages("sensorB", &body, at(0, 1)).len(), 3);
        assert!(translator.discovery_messages("sensorA", &body, at(0, 2)).is_empty());
    }

    #[test]
    fn discovery_precedes_state_messages() {
        let mut translator = BridgeTranslator::new();
        let event = MeasurementEvent {
            device_id: "sensorA".to_string(),
            payload: payload(json!({"rco2": 410})),
        };

        let messages = translator.handle_measurement(&event, at(0, 0));
        // rco2 config, two buttons, then the rco2 state message last.
        assert_eq!(messages.len(), 4);
        assert!(messages[..3].iter().all(|m| m.retain));
        let state = &messages[3];
        assert_eq!(state.topic, "airgradient2mqtt/sensorA/rco2");
        assert_eq!(state.payload, "410");
        assert!(!state.retain);

        // A poll right after only yields state.
        let messages = translator.handle_measurement(&event, at(0, 1));
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].topic, "airgradient2mqtt/sensorA/rco2");
    }
}
