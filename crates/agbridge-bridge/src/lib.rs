//! Protocol-translation core of the AirGradient-to-MQTT bridge.
//!
//! Everything with real logic lives here, isolated from transport:
//! the bounded per-device command queues, the measurement-payload
//! flattening, the command-topic parsing and the throttled Home
//! Assistant discovery publication. The HTTP and MQTT crates are thin
//! shims over this one.

pub mod commands;
pub mod discovery;
pub mod measurements;
pub mod message;
pub mod queue;
pub mod translator;

pub use commands::{command_topic_filter, parse_command, DeviceCommand};
pub use measurements::measurement_messages;
pub use message::{BusMessage, MeasurementEvent};
pub use queue::{CommandQueue, CommandQueueManager, MAX_QUEUE_LEN};
pub use translator::BridgeTranslator;

/// Fixed topic namespace segment for this bridge.
pub const TOPIC_PREFIX: &str = "airgradient2mqtt";
