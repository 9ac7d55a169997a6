//! Home Assistant MQTT discovery publication.
//!
//! One retained config message per known measurement key lets the
//! consumer auto-register sensor, number and button entities. The
//! per-key metadata lives in a static descriptor table so the topic
//! and payload shaping stays in one place.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::message::BusMessage;
use crate::TOPIC_PREFIX;

/// Entity kind segment of the discovery topic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EntityKind {
    Sensor,
    Number,
    Button,
}

impl EntityKind {
    fn as_str(self) -> &'static str {
        match self {
            EntityKind::Sensor => "sensor",
            EntityKind::Number => "number",
            EntityKind::Button => "button",
        }
    }
}

/// How a measurement key appears to the home-automation consumer.
#[derive(Debug, Clone, Copy)]
struct EntityDescriptor {
    kind: EntityKind,
    name: Option<&'static str>,
    unit: Option<&'static str>,
    device_class: Option<&'static str>,
    icon: Option<&'static str>,
    diagnostic: bool,
}

impl EntityDescriptor {
    const fn sensor(unit: Option<&'static str>, device_class: Option<&'static str>) -> Self {
        Self {
            kind: EntityKind::Sensor,
            name: None,
            unit,
            device_class,
            icon: None,
            diagnostic: false,
        }
    }

    fn named(mut self, name: &'static str) -> Self {
        self.name = Some(name);
        self
    }

    fn with_icon(mut self, icon: &'static str) -> Self {
        self.icon = Some(icon);
        self
    }

    fn as_diagnostic(mut self) -> Self {
        self.diagnostic = true;
        self
    }

    const fn brightness(name: &'static str) -> Self {
        Self {
            kind: EntityKind::Number,
            name: Some(name),
            unit: None,
            device_class: None,
            icon: Some("mdi:brightness-5"),
            diagnostic: false,
        }
    }
}

/// Descriptor table for top-level measurement keys.
fn descriptor(key: &str) -> Option<EntityDescriptor> {
    let desc = match key {
        "wifi" => EntityDescriptor::sensor(Some("dBm"), Some("signal_strength"))
            .named("Wi-Fi Signal")
            .as_diagnostic(),
        "rco2" => EntityDescriptor::sensor(Some("ppm"), Some("carbon_dioxide")),
        "pm01" => EntityDescriptor::sensor(Some("µg/m³"), Some("pm1")),
        "pm02" => EntityDescriptor::sensor(Some("µg/m³"), Some("pm25")),
        "pm10" => EntityDescriptor::sensor(Some("µg/m³"), Some("pm10")),
        "tvoc_index" => EntityDescriptor::sensor(None, None)
            .named("VOC Index")
            .with_icon("mdi:air-filter"),
        "nox_index" => EntityDescriptor::sensor(None, None)
            .named("NOx Index")
            .with_icon("mdi:air-filter"),
        "atmp" => EntityDescriptor::sensor(Some("°C"), Some("temperature")),
        "rhum" => EntityDescriptor::sensor(Some("%"), Some("humidity")),
        "rgb_bri" => EntityDescriptor::brightness("RGB LED Brightness"),
        "oled_bri" => EntityDescriptor::brightness("OLED Display Brightness"),
        _ => return None,
    };
    Some(desc)
}

/// Channel-level entity labels. Only particulate, temperature and
/// humidity readings exist per channel on dual-channel units.
fn channel_label(key: &str) -> Option<&'static str> {
    match key {
        "pm01" => Some("PM1"),
        "pm02" => Some("PM2.5"),
        "pm10" => Some("PM10"),
        "atmp" => Some("Temperature"),
        "rhum" => Some("Humidity"),
        _ => None,
    }
}

/// Discovery config message body.
#[derive(Debug, Clone, Serialize)]
struct DiscoveryConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    state_topic: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    command_topic: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    unit_of_measurement: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    device_class: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    state_class: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    icon: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    entity_category: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    min: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    mode: Option<&'static str>,
    object_id: String,
    unique_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    expire_after: Option<u32>,
    device: DeviceInfo,
}

impl DiscoveryConfig {
    fn empty(object_id: String, device: DeviceInfo) -> Self {
        Self {
            state_topic: None,
            command_topic: None,
            name: None,
            unit_of_measurement: None,
            device_class: None,
            state_class: None,
            icon: None,
            entity_category: None,
            min: None,
            max: None,
            mode: None,
            unique_id: object_id.clone(),
            object_id,
            expire_after: None,
            device,
        }
    }
}

/// Device block attached to every discovery config.
#[derive(Debug, Clone, Serialize)]
struct DeviceInfo {
    manufacturer: &'static str,
    model: &'static str,
    name: String,
    identifiers: Vec<String>,
}

impl DeviceInfo {
    fn for_device(device_id: &str) -> Self {
        Self {
            manufacturer: "AirGradient",
            model: "Air Quality Sensor",
            name: format!("Air Quality Sensor {device_id}"),
            identifiers: vec![format!("{TOPIC_PREFIX}_{device_id}")],
        }
    }
}

fn config_topic(kind: EntityKind, device_id: &str, suffix: &str) -> String {
    format!(
        "homeassistant/{}/{TOPIC_PREFIX}_{device_id}/{device_id}_{suffix}/config",
        kind.as_str()
    )
}

fn retained_json(topic: String, config: &DiscoveryConfig) -> Option<BusMessage> {
    match serde_json::to_string(config) {
        Ok(payload) => Some(BusMessage::retained(topic, payload)),
        Err(e) => {
            tracing::error!("Failed to serialize discovery config for {topic}: {e}");
            None
        }
    }
}

fn entity_message(device_id: &str, base_topic: &str, key: &str, desc: EntityDescriptor) -> Option<BusMessage> {
    let object_id = format!("{TOPIC_PREFIX}_{device_id}_{key}");
    let mut config = DiscoveryConfig::empty(object_id, DeviceInfo::for_device(device_id));
    config.state_topic = Some(format!("{base_topic}/{key}"));
    config.name = desc.name.map(str::to_string);
    config.unit_of_measurement = desc.unit;
    config.device_class = desc.device_class;
    config.icon = desc.icon;
    if desc.diagnostic {
        config.entity_category = Some("diagnostic");
    }
    match desc.kind {
        EntityKind::Sensor => {
            config.state_class = Some("measurement");
            config.expire_after = Some(300);
        }
        EntityKind::Number => {
            config.command_topic = Some(format!("{base_topic}/{key}/set"));
            config.min = Some(0);
            config.max = Some(255);
            config.mode = Some("slider");
        }
        EntityKind::Button => {}
    }

    retained_json(config_topic(desc.kind, device_id, key), &config)
}

fn channel_message(
    device_id: &str,
    base_topic: &str,
    channel_key: &str,
    key: &str,
) -> Option<BusMessage> {
    let label = channel_label(key)?;
    let desc = descriptor(key)?;

    let suffix = format!("channel_{channel_key}_{key}");
    let object_id = format!("{TOPIC_PREFIX}_{device_id}_{suffix}");
    let mut config = DiscoveryConfig::empty(object_id, DeviceInfo::for_device(device_id));
    config.state_topic = Some(format!("{base_topic}/{suffix}"));
    config.name = Some(format!("CH{channel_key}: {label}"));
    config.unit_of_measurement = desc.unit;
    config.device_class = desc.device_class;
    config.state_class = Some("measurement");
    config.entity_category = Some("diagnostic");
    config.expire_after = Some(300);

    retained_json(config_topic(EntityKind::Sensor, device_id, &suffix), &config)
}

fn button_message(
    device_id: &str,
    base_topic: &str,
    suffix: &str,
    name: &'static str,
    icon: &'static str,
    target: &str,
) -> Option<BusMessage> {
    let object_id = format!("{TOPIC_PREFIX}_{device_id}_{suffix}");
    let mut config = DiscoveryConfig::empty(object_id, DeviceInfo::for_device(device_id));
    config.command_topic = Some(format!("{base_topic}/{target}/set"));
    config.name = Some(name.to_string());
    config.icon = Some(icon);
    config.entity_category = Some("diagnostic");

    retained_json(config_topic(EntityKind::Button, device_id, suffix), &config)
}

/// Build the full set of retained discovery messages for one report.
///
/// Unknown top-level and channel keys are logged and skipped;
/// `pm003_count` and `boot` carry no entity and are skipped silently.
/// The reboot and reset-wifi buttons are always emitted.
pub(crate) fn build_discovery_messages(
    device_id: &str,
    payload: &Map<String, Value>,
) -> Vec<BusMessage> {
    let base_topic = format!("{TOPIC_PREFIX}/{device_id}");
    let mut messages = Vec::new();

    for (key, value) in payload {
        match key.as_str() {
            "channels" => {
                let Value::Object(channels) = value else {
                    continue;
                };
                for (channel_key, readings) in channels {
                    let Value::Object(readings) = readings else {
                        continue;
                    };
                    for inner_key in readings.keys() {
                        if inner_key == "pm003_count" {
                            continue;
                        }
                        match channel_message(device_id, &base_topic, channel_key, inner_key) {
                            Some(message) => messages.push(message),
                            None => {
                                tracing::warn!("Received unknown channel payload key {inner_key}")
                            }
                        }
                    }
                }
            }
            "pm003_count" | "boot" => {}
            key => match descriptor(key) {
                Some(desc) => messages.extend(entity_message(device_id, &base_topic, key, desc)),
                None => tracing::warn!("Received unknown payload key {key}"),
            },
        }
    }

    messages.extend(button_message(
        device_id,
        &base_topic,
        "reboot",
        "Reboot",
        "mdi:restart",
        "do_reboot",
    ));
    messages.extend(button_message(
        device_id,
        &base_topic,
        "reset_wifi",
        "Reset Wi-Fi Config",
        "mdi:restart-alert",
        "do_reset_wifi",
    ));

    messages
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn payload(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            other => panic!("expected object payload, got {other}"),
        }
    }

    fn find<'a>(messages: &'a [BusMessage], topic: &str) -> &'a BusMessage {
        messages
            .iter()
            .find(|m| m.topic == topic)
            .unwrap_or_else(|| panic!("no message at {topic}"))
    }

    fn body(message: &BusMessage) -> Value {
        serde_json::from_str(&message.payload).unwrap()
    }

    #[test]
    fn known_keys_plus_buttons_nothing_for_boot() {
        let messages =
            build_discovery_messages("sensorA", &payload(json!({"wifi": -55, "rco2": 410, "boot": 1})));
        assert_eq!(messages.len(), 4);
        assert!(messages.iter().all(|m| m.retain));

        let topics: Vec<&str> = messages.iter().map(|m| m.topic.as_str()).collect();
        assert!(topics.contains(
            &"homeassistant/sensor/airgradient2mqtt_sensorA/sensorA_wifi/config"
        ));
        assert!(topics.contains(
            &"homeassistant/sensor/airgradient2mqtt_sensorA/sensorA_rco2/config"
        ));
        assert!(topics.contains(
            &"homeassistant/button/airgradient2mqtt_sensorA/sensorA_reboot/config"
        ));
        assert!(topics.contains(
            &"homeassistant/button/airgradient2mqtt_sensorA/sensorA_reset_wifi/config"
        ));
    }

    #[test]
    fn wifi_sensor_config_is_complete() {
        let messages = build_discovery_messages("sensorA", &payload(json!({"wifi": -55})));
        let message = find(
            &messages,
            "homeassistant/sensor/airgradient2mqtt_sensorA/sensorA_wifi/config",
        );

        assert_eq!(
            body(message),
            json!({
                "state_topic": "airgradient2mqtt/sensorA/wifi",
                "name": "Wi-Fi Signal",
                "unit_of_measurement": "dBm",
                "device_class": "signal_strength",
                "state_class": "measurement",
                "entity_category": "diagnostic",
                "object_id": "airgradient2mqtt_sensorA_wifi",
                "unique_id": "airgradient2mqtt_sensorA_wifi",
                "expire_after": 300,
                "device": {
                    "manufacturer": "AirGradient",
                    "model": "Air Quality Sensor",
                    "name": "Air Quality Sensor sensorA",
                    "identifiers": ["airgradient2mqtt_sensorA"]
                }
            })
        );
    }

    #[test]
    fn brightness_number_has_command_topic_and_slider() {
        let messages = build_discovery_messages("sensorA", &payload(json!({"rgb_bri": 128})));
        let message = find(
            &messages,
            "homeassistant/number/airgradient2mqtt_sensorA/sensorA_rgb_bri/config",
        );
        let config = body(message);

        assert_eq!(config["state_topic"], "airgradient2mqtt/sensorA/rgb_bri");
        assert_eq!(config["command_topic"], "airgradient2mqtt/sensorA/rgb_bri/set");
        assert_eq!(config["name"], "RGB LED Brightness");
        assert_eq!(config["icon"], "mdi:brightness-5");
        assert_eq!(config["min"], 0);
        assert_eq!(config["max"], 255);
        assert_eq!(config["mode"], "slider");
        // Numbers are live controls: no state_class, no expiry.
        assert!(config.get("state_class").is_none());
        assert!(config.get("expire_after").is_none());
    }

    #[test]
    fn channel_entities_are_diagnostic_and_labelled() {
        let messages = build_discovery_messages(
            "sensorA",
            &payload(json!({"channels": {"1": {"pm02": 12, "pm003_count": 99}}})),
        );
        // pm02 entity plus the two buttons; pm003_count is silent.
        assert_eq!(messages.len(), 3);

        let message = find(
            &messages,
            "homeassistant/sensor/airgradient2mqtt_sensorA/sensorA_channel_1_pm02/config",
        );
        let config = body(message);
        assert_eq!(config["state_topic"], "airgradient2mqtt/sensorA/channel_1_pm02");
        assert_eq!(config["name"], "CH1: PM2.5");
        assert_eq!(config["unit_of_measurement"], "µg/m³");
        assert_eq!(config["device_class"], "pm25");
        assert_eq!(config["entity_category"], "diagnostic");
    }

    #[test]
    fn unknown_keys_emit_no_config() {
        let messages =
            build_discovery_messages("sensorA", &payload(json!({"mystery": 1, "rco2": 410})));
        // rco2 plus the two buttons.
        assert_eq!(messages.len(), 3);
    }

    #[test]
    fn buttons_point_at_command_topics() {
        let messages = build_discovery_messages("sensorA", &payload(json!({})));
        assert_eq!(messages.len(), 2);

        let reboot = find(
            &messages,
            "homeassistant/button/airgradient2mqtt_sensorA/sensorA_reboot/config",
        );
        let config = body(reboot);
        assert_eq!(config["command_topic"], "airgradient2mqtt/sensorA/do_reboot/set");
        assert_eq!(config["name"], "Reboot");
        assert_eq!(config["icon"], "mdi:restart");
        assert!(config.get("state_topic").is_none());

        let reset = find(
            &messages,
            "homeassistant/button/airgradient2mqtt_sensorA/sensorA_reset_wifi/config",
        );
        let config = body(reset);
        assert_eq!(
            config["command_topic"],
            "airgradient2mqtt/sensorA/do_reset_wifi/set"
        );
        assert_eq!(config["icon"], "mdi:restart-alert");
    }
}
