//! Measurement-payload flattening.
//!
//! Every scalar in a device report becomes one state message under
//! `airgradient2mqtt/<device>/...`. Reports from dual-channel units
//! carry a nested `channels` mapping which is flattened to
//! `channel_<ch>_<key>` topics.

use serde_json::{Map, Value};

use crate::message::BusMessage;
use crate::TOPIC_PREFIX;

/// String form of a scalar JSON value. Objects, arrays and nulls have
/// no state representation.
fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Flatten a measurement payload into non-retained state messages.
pub fn measurement_messages(device_id: &str, payload: &Map<String, Value>) -> Vec<BusMessage> {
    let base_topic = format!("{TOPIC_PREFIX}/{device_id}");
    let mut messages = Vec::new();

    for (key, value) in payload {
        if let Some(text) = scalar_text(value) {
            messages.push(BusMessage::state(format!("{base_topic}/{key}"), text));
        }

        if key == "channels" {
            let Value::Object(channels) = value else {
                continue;
            };
            for (channel_key, readings) in channels {
                let Value::Object(readings) = readings else {
                    continue;
                };
                for (inner_key, reading) in readings {
                    // The channel's own reading is published, so two
                    // channels reporting the same key keep distinct values.
                    if let Some(text) = scalar_text(reading) {
                        messages.push(BusMessage::state(
                            format!("{base_topic}/channel_{channel_key}_{inner_key}"),
                            text,
                        ));
                    }
                }
            }
        }
    }

    messages
}
