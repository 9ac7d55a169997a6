//! Inbound command handling.
//!
//! Commands arrive on `airgradient2mqtt/<device>/<target>/set` and are
//! translated into the command strings the device firmware understands.

use crate::TOPIC_PREFIX;

/// Subscription filter matching all command topics.
pub fn command_topic_filter() -> String {
    format!("{TOPIC_PREFIX}/+/+/set")
}

/// A command parsed from an inbound bus message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceCommand {
    pub device_id: String,
    pub command: String,
}

/// Translate a command-topic message into a queueable command string.
///
/// Returns `None` for topics outside the command namespace and for
/// unknown targets; unknown targets are logged, nothing is enqueued.
pub fn parse_command(topic: &str, message: &str) -> Option<DeviceCommand> {
    let parts: Vec<&str> = topic.split('/').collect();
    if parts.len() != 4 || parts[0] != TOPIC_PREFIX || parts[3] != "set" {
        tracing::debug!("Ignoring message on non-command topic {topic}");
        return None;
    }

    let device_id = parts[1];
    let command = match parts[2] {
        "rgb_bri" => format!("CMD_RGB_BRI_{message}"),
        "oled_bri" => format!("CMD_OLED_BRI_{message}"),
        "do_reboot" => "CMD_REBOOT".to_string(),
        "do_reset_wifi" => "CMD_RESET_WIFI".to_string(),
        target => {
            tracing::warn!(
                "Received unknown command {target} for {device_id} with payload {message}"
            );
            return None;
        }
    };

    Some(DeviceCommand {
        device_id: device_id.to_string(),
        command,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn brightness_targets_carry_the_payload() {
        let cmd = parse_command("airgradient2mqtt/sensorA/rgb_bri/set", "128").unwrap();
        assert_eq!(cmd.device_id, "sensorA");
        assert_eq!(cmd.command, "CMD_RGB_BRI_128");

        let cmd = parse_command("airgradient2mqtt/sensorA/oled_bri/set", "0").unwrap();
        assert_eq!(cmd.command, "CMD_OLED_BRI_0");
    }

    #[test]
    fn action_targets_ignore_the_payload() {
        let cmd = parse_command("airgradient2mqtt/sensorA/do_reboot/set", "anything").unwrap();
        assert_eq!(cmd.command, "CMD_REBOOT");

        let cmd = parse_command("airgradient2mqtt/sensorA/do_reset_wifi/set", "").unwrap();
        assert_eq!(cmd.command, "CMD_RESET_WIFI");
    }

    #[test]
    fn unknown_target_is_rejected() {
        assert_eq!(
            parse_command("airgradient2mqtt/sensorA/unknown_target/set", "1"),
            None
        );
    }

    #[test]
    fn topics_outside_the_namespace_are_rejected() {
        assert_eq!(parse_command("othergateway/sensorA/rgb_bri/set", "1"), None);
        assert_eq!(parse_command("airgradient2mqtt/sensorA/rgb_bri", "1"), None);
        assert_eq!(
            parse_command("airgradient2mqtt/sensorA/rgb_bri/get", "1"),
            None
        );
    }

    #[test]
    fn filter_matches_the_command_namespace() {
        assert_eq!(command_topic_filter(), "airgradient2mqtt/+/+/set");
    }
}
