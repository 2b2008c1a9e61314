//! # Configuration Management
//!
//! Centralized configuration for clients of the framing layer.
//!
//! ## Configuration Sources
//! - TOML files via `from_file()` / `from_toml()`
//! - Direct instantiation with defaults
//! - Environment overrides via `from_env()` (`PACKET_FRAME_*`)
//!
//! ## Limits
//! - `max_packet_size` bounds every frame, header included (default 1024)
//! - `recv_buffer_size` must hold at least one maximum-size frame (default 4096)
//! - Queue capacities bound how many frames wait between tasks (default 256)

use crate::core::header::HEADER_SIZE;
use crate::core::{MAX_BUFFER, MAX_PACKET_SIZE};
use crate::error::{ProtocolError, Result};
use crate::protocol::envelope::DEFAULT_QUEUE_CAPACITY;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::time::Duration;
use tracing::Level;

/// Default server address the client dials.
pub const DEFAULT_SERVER_ADDRESS: &str = "127.0.0.1:8000";

/// Default timeout for a single connection attempt.
pub const DEFAULT_CONNECTION_TIMEOUT: Duration = Duration::from_secs(5);

/// Main configuration structure that contains all configurable settings
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct NetworkConfig {
    /// Client-specific configuration
    #[serde(default)]
    pub client: ClientConfig,

    /// Framing and queue configuration
    #[serde(default)]
    pub transport: TransportConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl NetworkConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut file = File::open(path)
            .map_err(|e| ProtocolError::ConfigError(format!("Failed to open config file: {e}")))?;

        let mut contents = String::new();
        file.read_to_string(&mut contents)
            .map_err(|e| ProtocolError::ConfigError(format!("Failed to read config file: {e}")))?;

        Self::from_toml(&contents)
    }

    /// Load configuration from TOML string
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str::<Self>(content)
            .map_err(|e| ProtocolError::ConfigError(format!("Failed to parse TOML: {e}")))
    }

    /// Defaults overridden by environment variables
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        config.apply_env_with(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Apply overrides from any key lookup (the process environment in
    /// [`from_env`](Self::from_env)). Unparseable values are reported, not
    /// silently ignored.
    pub fn apply_env_with<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(addr) = lookup("PACKET_FRAME_SERVER_ADDRESS") {
            self.client.address = addr;
        }

        if let Some(val) = lookup("PACKET_FRAME_CONNECTION_TIMEOUT_MS") {
            self.client.connection_timeout = Duration::from_millis(parse_env(
                "PACKET_FRAME_CONNECTION_TIMEOUT_MS",
                &val,
            )?);
        }

        if let Some(val) = lookup("PACKET_FRAME_MAX_PACKET_SIZE") {
            self.transport.max_packet_size = parse_env("PACKET_FRAME_MAX_PACKET_SIZE", &val)?;
        }

        if let Some(val) = lookup("PACKET_FRAME_RECV_BUFFER_SIZE") {
            self.transport.recv_buffer_size = parse_env("PACKET_FRAME_RECV_BUFFER_SIZE", &val)?;
        }

        if let Some(val) = lookup("PACKET_FRAME_DISPATCH_QUEUE_CAPACITY") {
            self.transport.dispatch_queue_capacity =
                parse_env("PACKET_FRAME_DISPATCH_QUEUE_CAPACITY", &val)?;
        }

        if let Some(val) = lookup("PACKET_FRAME_LOG_LEVEL") {
            self.logging.log_level = val.parse::<Level>().map_err(|_| {
                ProtocolError::ConfigError(format!("Invalid log level in PACKET_FRAME_LOG_LEVEL: {val}"))
            })?;
        }

        Ok(())
    }

    /// Apply overrides to the default configuration
    pub fn default_with_overrides<F>(mutator: F) -> Self
    where
        F: FnOnce(&mut Self),
    {
        let mut config = Self::default();
        mutator(&mut config);
        config
    }

    /// Generate example configuration file content
    pub fn example_config() -> String {
        toml::to_string_pretty(&Self::default())
            .unwrap_or_else(|_| String::from("# Failed to generate example config"))
    }

    /// Save configuration to a file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| ProtocolError::ConfigError(format!("Failed to serialize config: {e}")))?;

        std::fs::write(path, content)
            .map_err(|e| ProtocolError::ConfigError(format!("Failed to write config file: {e}")))?;

        Ok(())
    }

    /// Validate the configuration for common issues and misconfigurations
    ///
    /// Returns a list of validation errors. Empty list means configuration is valid.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        errors.extend(self.client.validate());
        errors.extend(self.transport.validate());
        errors.extend(self.logging.validate());
        errors
    }

    /// Validate and return Result - convenience method
    pub fn validate_strict(&self) -> Result<()> {
        let errors = self.validate();
        if errors.is_empty() {
            Ok(())
        } else {
            Err(ProtocolError::ConfigError(format!(
                "Configuration validation failed:\n  - {}",
                errors.join("\n  - ")
            )))
        }
    }
}

fn parse_env<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .parse::<T>()
        .map_err(|_| ProtocolError::ConfigError(format!("Invalid value for {key}: '{value}'")))
}

/// Client-specific configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ClientConfig {
    /// Target server address
    pub address: String,

    /// Timeout for the single connection attempt
    #[serde(with = "duration_serde")]
    pub connection_timeout: Duration,

    /// Disable Nagle's algorithm on the socket
    pub nodelay: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            address: String::from(DEFAULT_SERVER_ADDRESS),
            connection_timeout: DEFAULT_CONNECTION_TIMEOUT,
            nodelay: true,
        }
    }
}

impl ClientConfig {
    /// Validate client configuration
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.address.is_empty() {
            errors.push("Client address cannot be empty".to_string());
        } else if self.address.parse::<std::net::SocketAddr>().is_err() {
            errors.push(format!(
                "Invalid client address format: '{}' (expected format: '127.0.0.1:8000')",
                self.address
            ));
        }

        if self.connection_timeout.as_millis() < 100 {
            errors.push("Connection timeout too short (minimum: 100ms)".to_string());
        } else if self.connection_timeout.as_secs() > 300 {
            errors.push("Connection timeout too long (maximum: 300s)".to_string());
        }

        errors
    }
}

/// Framing and queue configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TransportConfig {
    /// Largest accepted frame, header included
    pub max_packet_size: usize,

    /// Receive buffer size
    pub recv_buffer_size: usize,

    /// Envelopes waiting between the read loop and the dispatch loop
    pub dispatch_queue_capacity: usize,

    /// Encoded frames waiting for the writer
    pub outbound_queue_capacity: usize,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            max_packet_size: MAX_PACKET_SIZE,
            recv_buffer_size: MAX_BUFFER,
            dispatch_queue_capacity: DEFAULT_QUEUE_CAPACITY,
            outbound_queue_capacity: DEFAULT_QUEUE_CAPACITY,
        }
    }
}

impl TransportConfig {
    /// Validate transport configuration
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.max_packet_size <= HEADER_SIZE {
            errors.push(format!(
                "Max packet size must be larger than the {HEADER_SIZE}-byte header"
            ));
        } else if self.max_packet_size > u16::MAX as usize {
            errors.push(format!(
                "Max packet size too large: {} bytes (the length field is 16 bits)",
                self.max_packet_size
            ));
        }

        if self.recv_buffer_size < self.max_packet_size {
            errors.push(format!(
                "Receive buffer ({} bytes) must hold at least one maximum-size packet ({} bytes)",
                self.recv_buffer_size, self.max_packet_size
            ));
        }

        if self.dispatch_queue_capacity == 0 {
            errors.push("Dispatch queue capacity must be greater than 0".to_string());
        } else if self.dispatch_queue_capacity > 1_000_000 {
            errors.push(format!(
                "Dispatch queue capacity too large: {} (max recommended: 1,000,000)",
                self.dispatch_queue_capacity
            ));
        }

        if self.outbound_queue_capacity == 0 {
            errors.push("Outbound queue capacity must be greater than 0".to_string());
        }

        errors
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// Application name for logs
    pub app_name: String,

    /// Log level
    #[serde(with = "log_level_serde")]
    pub log_level: Level,

    /// Whether to log to console
    pub log_to_console: bool,

    /// Whether to log to file
    pub log_to_file: bool,

    /// Path to log file (if log_to_file is true)
    pub log_file_path: Option<String>,

    /// Whether to use JSON formatting for logs
    pub json_format: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            app_name: String::from("packet-frame"),
            log_level: Level::INFO,
            log_to_console: true,
            log_to_file: false,
            log_file_path: None,
            json_format: false,
        }
    }
}

impl LoggingConfig {
    /// Validate logging configuration
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.app_name.is_empty() {
            errors.push("Application name cannot be empty".to_string());
        } else if self.app_name.len() > 64 {
            errors.push(format!(
                "Application name too long: {} characters (maximum: 64)",
                self.app_name.len()
            ));
        }

        if self.log_to_file {
            if let Some(ref path) = self.log_file_path {
                if let Some(parent) = Path::new(path).parent() {
                    if !parent.as_os_str().is_empty() && !parent.exists() {
                        errors.push(format!(
                            "Log file directory does not exist: {}",
                            parent.display()
                        ));
                    }
                }
            } else {
                errors.push("log_file_path must be specified when log_to_file is true".to_string());
            }
        }

        if !self.log_to_console && !self.log_to_file {
            errors
                .push("At least one logging output (console or file) must be enabled".to_string());
        }

        errors
    }
}

/// Helper module for Duration serialization/deserialization
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let millis = duration.as_millis() as u64;
        millis.serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}

/// Helper module for tracing::Level serialization/deserialization
mod log_level_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::str::FromStr;
    use tracing::Level;

    pub fn serialize<S>(level: &Level, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let level_str = match *level {
            Level::TRACE => "trace",
            Level::DEBUG => "debug",
            Level::INFO => "info",
            Level::WARN => "warn",
            Level::ERROR => "error",
        };
        level_str.serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Level, D::Error>
    where
        D: Deserializer<'de>,
    {
        let level_str = String::deserialize(deserializer)?;
        Level::from_str(&level_str)
            .map_err(|_| serde::de::Error::custom(format!("Invalid log level: {level_str}")))
    }
}
