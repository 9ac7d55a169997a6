//! Shared foundation for the AirGradient-to-MQTT bridge.
//!
//! Holds the unified error type and the configuration surface that the
//! transport shims and the binary are wired with. The core translation
//! logic lives in `agbridge-bridge`.

pub mod config;
pub mod error;

pub use config::{BridgeConfig, BrokerAddr, BrokerScheme};
pub use error::{Error, Result};
