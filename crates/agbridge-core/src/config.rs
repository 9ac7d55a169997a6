//! Bridge configuration.
//!
//! The binary assembles a [`BridgeConfig`] from CLI flags and
//! environment variables; everything downstream takes it as an opaque
//! input and never reads the environment itself.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Environment variable names understood by the binary.
pub mod env_vars {
    /// Listen port for the emulated cloud endpoint.
    pub const CLOUD_PORT: &str = "CLOUD_PORT";
    /// MQTT broker URL (`mqtt://host:port` or `mqtts://host:port`).
    pub const MQTT_BROKER_URL: &str = "MQTT_BROKER_URL";
    /// MQTT username.
    pub const MQTT_USERNAME: &str = "MQTT_USERNAME";
    /// MQTT password. Requires `MQTT_USERNAME`.
    pub const MQTT_PASSWORD: &str = "MQTT_PASSWORD";
    /// Set to `false` to skip broker certificate validation.
    pub const MQTT_CHECK_CERT: &str = "MQTT_CHECK_CERT";
    /// Log verbosity (`trace`, `debug`, `info`, `warn`, `error`).
    pub const LOGLEVEL: &str = "LOGLEVEL";
}

/// Default listen port for the cloud endpoint.
pub const DEFAULT_CLOUD_PORT: u16 = 8000;

/// Transport scheme for the broker connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BrokerScheme {
    /// Plain TCP (`mqtt://`).
    Tcp,
    /// TLS (`mqtts://` / `ssl://`).
    Tls,
}

impl BrokerScheme {
    fn default_port(self) -> u16 {
        match self {
            BrokerScheme::Tcp => 1883,
            BrokerScheme::Tls => 8883,
        }
    }
}

/// Parsed broker address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrokerAddr {
    pub scheme: BrokerScheme,
    pub host: String,
    pub port: u16,
}

impl BrokerAddr {
    /// Parse a broker URL of the form `mqtt://host[:port]` or
    /// `mqtts://host[:port]`. A bare `host[:port]` is treated as plain
    /// TCP. Ports default to 1883 (TCP) / 8883 (TLS).
    pub fn parse(url: &str) -> Result<Self> {
        let url = url.trim();
        let (scheme, rest) = if let Some(rest) = url.strip_prefix("mqtt://") {
            (BrokerScheme::Tcp, rest)
        } else if let Some(rest) = url.strip_prefix("tcp://") {
            (BrokerScheme::Tcp, rest)
        } else if let Some(rest) = url.strip_prefix("mqtts://") {
            (BrokerScheme::Tls, rest)
        } else if let Some(rest) = url.strip_prefix("ssl://") {
            (BrokerScheme::Tls, rest)
        } else if url.contains("://") {
            return Err(Error::Config(format!("Unsupported broker URL scheme: {url}")));
        } else {
            (BrokerScheme::Tcp, url)
        };

        let rest = rest.trim_end_matches('/');
        if rest.is_empty() {
            return Err(Error::Config(format!("Broker URL has no host: {url}")));
        }

        let (host, port) = match rest.rsplit_once(':') {
            Some((host, port)) => {
                let port = port.parse::<u16>().map_err(|_| {
                    Error::Config(format!("Invalid broker port in URL: {url}"))
                })?;
                (host, port)
            }
            None => (rest, scheme.default_port()),
        };
        if host.is_empty() {
            return Err(Error::Config(format!("Broker URL has no host: {url}")));
        }

        Ok(Self {
            scheme,
            host: host.to_string(),
            port,
        })
    }
}

/// Complete bridge configuration.
#[derive(Debug, Clone)]
pub struct BridgeConfig {
    /// Listen port for the emulated cloud endpoint.
    pub listen_port: u16,
    /// MQTT broker address.
    pub broker: BrokerAddr,
    /// Optional broker credentials.
    pub username: Option<String>,
    pub password: Option<String>,
    /// Validate the broker's TLS certificate (TLS schemes only).
    pub check_certificate: bool,
}

impl BridgeConfig {
    /// Build and validate a configuration.
    pub fn new(
        listen_port: u16,
        broker_url: &str,
        username: Option<String>,
        password: Option<String>,
        check_certificate: bool,
    ) -> Result<Self> {
        if password.is_some() && username.is_none() {
            return Err(Error::Config(format!(
                "{} is set but {} is not. {} must be set if {} is set.",
                env_vars::MQTT_PASSWORD,
                env_vars::MQTT_USERNAME,
                env_vars::MQTT_USERNAME,
                env_vars::MQTT_PASSWORD,
            )));
        }

        Ok(Self {
            listen_port,
            broker: BrokerAddr::parse(broker_url)?,
            username,
            password,
            check_certificate,
        })
    }
}
