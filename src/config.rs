//! Configuration management for the echo client
//!
//! The endpoint has no built-in default: it comes from `client.toml` in the
//! working directory and/or `ECHO_CLIENT_*` environment variables, the latter
//! taking precedence.

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, Environment, File, FileFormat};
use serde::Deserialize;
use std::time::Duration;

use crate::session::Endpoint;
use crate::session::SessionSettings;

const CONFIG_FILE: &str = "client";
const ENV_PREFIX: &str = "ECHO_CLIENT";

/// Client configuration
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Destination host name or IP address
    /// Environment: ECHO_CLIENT_HOST
    pub host: String,

    /// Destination TCP port
    /// Environment: ECHO_CLIENT_PORT
    pub port: u16,

    /// Connect timeout in seconds, 0 waits for the OS
    #[serde(default)]
    pub connect_timeout_secs: u64,

    /// Bytes requested per socket read
    #[serde(default = "default_read_buffer_size")]
    pub read_buffer_size: usize,

    /// Milliseconds `close()` waits for queued writes to drain
    #[serde(default = "default_close_linger_ms")]
    pub close_linger_ms: u64,
}

fn default_read_buffer_size() -> usize {
    SessionSettings::default().read_buffer_size
}

fn default_close_linger_ms() -> u64 {
    SessionSettings::default().close_linger.as_millis() as u64
}

impl ClientConfig {
    /// Load configuration from client.toml (optional) with environment overrides
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_builder(
            Config::builder()
                .add_source(File::with_name(CONFIG_FILE).required(false))
                .add_source(Environment::with_prefix(ENV_PREFIX).try_parsing(true)),
        )
    }

    /// Parse configuration from TOML text
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        Self::from_builder(Config::builder().add_source(File::from_str(contents, FileFormat::Toml)))
    }

    fn from_builder(builder: ConfigBuilder<DefaultState>) -> Result<Self, ConfigError> {
        let config: ClientConfig = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.host.trim().is_empty() {
            return Err(ConfigError::Message("host cannot be empty".into()));
        }

        if self.port == 0 {
            return Err(ConfigError::Message("port cannot be 0".into()));
        }

        if self.read_buffer_size == 0 {
            return Err(ConfigError::Message(
                "read_buffer_size must be greater than 0".into(),
            ));
        }

        Ok(())
    }

    pub fn endpoint(&self) -> Endpoint {
        Endpoint::new(self.host.trim(), self.port)
    }

    /// Connect timeout as Duration, `None` when disabled
    pub fn connect_timeout(&self) -> Option<Duration> {
        (self.connect_timeout_secs > 0).then(|| Duration::from_secs(self.connect_timeout_secs))
    }

    pub fn session_settings(&self) -> SessionSettings {
        SessionSettings {
            connect_timeout: self.connect_timeout(),
            read_buffer_size: self.read_buffer_size,
            close_linger: Duration::from_millis(self.close_linger_ms),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_required_keys_with_defaults() {
        let config = ClientConfig::from_toml_str("host = \"192.168.112.10\"\nport = 7\n").unwrap();
        assert_eq!(config.endpoint(), Endpoint::new("192.168.112.10", 7));
        assert_eq!(config.connect_timeout(), None);
        assert_eq!(config.read_buffer_size, 4096);
        assert_eq!(config.session_settings().close_linger, Duration::from_secs(1));
    }

    #[test]
    fn parses_optional_keys() {
        let config = ClientConfig::from_toml_str(
            "host = \"localhost\"\nport = 9000\nconnect_timeout_secs = 5\nread_buffer_size = 512\nclose_linger_ms = 250\n",
        )
        .unwrap();
        let settings = config.session_settings();
        assert_eq!(settings.connect_timeout, Some(Duration::from_secs(5)));
        assert_eq!(settings.read_buffer_size, 512);
        assert_eq!(settings.close_linger, Duration::from_millis(250));
    }

    #[test]
    fn host_and_port_are_required() {
        assert!(ClientConfig::from_toml_str("port = 7\n").is_err());
        assert!(ClientConfig::from_toml_str("host = \"localhost\"\n").is_err());
    }

    #[test]
    fn rejects_invalid_values() {
        let err = ClientConfig::from_toml_str("host = \"  \"\nport = 7\n").unwrap_err();
        assert!(err.to_string().contains("host cannot be empty"));

        let err = ClientConfig::from_toml_str("host = \"localhost\"\nport = 0\n").unwrap_err();
        assert!(err.to_string().contains("port cannot be 0"));

        let err =
            ClientConfig::from_toml_str("host = \"localhost\"\nport = 7\nread_buffer_size = 0\n")
                .unwrap_err();
        assert!(err.to_string().contains("read_buffer_size"));
    }

    #[test]
    fn rejects_out_of_range_port() {
        assert!(ClientConfig::from_toml_str("host = \"localhost\"\nport = 70000\n").is_err());
    }
}
