//! Integration tests for configuration validation

#![allow(clippy::expect_used, clippy::unwrap_used)]

use packet_frame::config::{ClientConfig, LoggingConfig, NetworkConfig, TransportConfig};
use packet_frame::error::ProtocolError;
use std::collections::HashMap;
use std::time::Duration;
use tracing::Level;

#[test]
fn test_default_config_validates() {
    let config = NetworkConfig::default();
    let errors = config.validate();
    assert!(
        errors.is_empty(),
        "Default config should be valid, but got errors: {:?}",
        errors
    );
}

#[test]
fn test_defaults_match_wire_limits() {
    let config = NetworkConfig::default();
    assert_eq!(config.client.address, "127.0.0.1:8000");
    assert_eq!(config.transport.max_packet_size, 1024);
    assert_eq!(config.transport.recv_buffer_size, 4096);
    assert_eq!(config.transport.dispatch_queue_capacity, 256);
}

#[test]
fn test_invalid_client_address() {
    let mut config = NetworkConfig::default();
    config.client.address = "not-an-address".to_string();

    let errors = config.validate();
    assert!(errors.iter().any(|e| e.contains("Invalid client address")));
}

#[test]
fn test_empty_client_address() {
    let mut config = NetworkConfig::default();
    config.client.address = String::new();

    let errors = config.validate();
    assert!(errors.iter().any(|e| e.contains("cannot be empty")));
}

#[test]
fn test_short_connection_timeout() {
    let mut config = NetworkConfig::default();
    config.client.connection_timeout = Duration::from_millis(50);

    let errors = config.validate();
    assert!(errors
        .iter()
        .any(|e| e.contains("Connection timeout too short")));
}

#[test]
fn test_packet_size_must_exceed_header() {
    let mut config = NetworkConfig::default();
    config.transport.max_packet_size = 5;

    let errors = config.validate();
    assert!(errors.iter().any(|e| e.contains("5-byte header")));
}

#[test]
fn test_packet_size_limited_by_length_field() {
    let mut config = NetworkConfig::default();
    config.transport.max_packet_size = 70_000;
    config.transport.recv_buffer_size = 140_000;

    let errors = config.validate();
    assert!(errors.iter().any(|e| e.contains("length field is 16 bits")));
}

#[test]
fn test_buffer_smaller_than_packet() {
    let config = NetworkConfig::default_with_overrides(|c| {
        c.transport.recv_buffer_size = 512;
    });

    let errors = config.validate();
    assert!(errors
        .iter()
        .any(|e| e.contains("must hold at least one maximum-size packet")));
}

#[test]
fn test_zero_queue_capacity() {
    let transport = TransportConfig {
        dispatch_queue_capacity: 0,
        outbound_queue_capacity: 0,
        ..TransportConfig::default()
    };

    let errors = transport.validate();
    assert_eq!(errors.len(), 2);
}

#[test]
fn test_file_logging_without_path() {
    let logging = LoggingConfig {
        log_to_file: true,
        log_file_path: None,
        ..LoggingConfig::default()
    };

    let errors = logging.validate();
    assert!(errors.iter().any(|e| e.contains("log_file_path must be specified")));
}

#[test]
fn test_no_logging_output() {
    let logging = LoggingConfig {
        log_to_console: false,
        log_to_file: false,
        ..LoggingConfig::default()
    };

    let errors = logging.validate();
    assert!(errors.iter().any(|e| e.contains("At least one logging output")));
}

#[test]
fn test_validate_strict_collects_all_errors() {
    let config = NetworkConfig {
        client: ClientConfig {
            address: String::new(),
            ..ClientConfig::default()
        },
        transport: TransportConfig {
            dispatch_queue_capacity: 0,
            ..TransportConfig::default()
        },
        logging: LoggingConfig::default(),
    };

    match config.validate_strict() {
        Err(ProtocolError::ConfigError(msg)) => {
            assert!(msg.contains("cannot be empty"));
            assert!(msg.contains("Dispatch queue capacity"));
        }
        other => panic!("Expected ConfigError, got {other:?}"),
    }
}

#[test]
fn test_toml_roundtrip() {
    let toml = r#"
        [client]
        address = "10.0.0.2:9000"
        connection_timeout = 2500
        nodelay = false

        [transport]
        max_packet_size = 512
        recv_buffer_size = 2048
        dispatch_queue_capacity = 16
        outbound_queue_capacity = 8

        [logging]
        app_name = "login-client"
        log_level = "debug"
        log_to_console = true
        log_to_file = false
        json_format = true
    "#;

    let config = NetworkConfig::from_toml(toml).unwrap();
    assert_eq!(config.client.address, "10.0.0.2:9000");
    assert_eq!(config.client.connection_timeout, Duration::from_millis(2500));
    assert!(!config.client.nodelay);
    assert_eq!(config.transport.max_packet_size, 512);
    assert_eq!(config.transport.outbound_queue_capacity, 8);
    assert_eq!(config.logging.log_level, Level::DEBUG);
    assert!(config.logging.json_format);
    assert!(config.validate().is_empty());

    let reparsed = NetworkConfig::from_toml(&NetworkConfig::example_config()).unwrap();
    assert_eq!(reparsed.client.address, "127.0.0.1:8000");
}

#[test]
fn test_missing_sections_use_defaults() {
    let config = NetworkConfig::from_toml("[client]\naddress = \"127.0.0.1:7000\"\nconnection_timeout = 1000\nnodelay = true\n").unwrap();
    assert_eq!(config.client.address, "127.0.0.1:7000");
    assert_eq!(config.transport.max_packet_size, 1024);
}

#[test]
fn test_invalid_toml_is_config_error() {
    assert!(matches!(
        NetworkConfig::from_toml("[transport\nmax_packet_size = "),
        Err(ProtocolError::ConfigError(_))
    ));
}

#[test]
fn test_env_overrides() {
    let vars: HashMap<&str, &str> = [
        ("PACKET_FRAME_SERVER_ADDRESS", "192.168.1.5:8000"),
        ("PACKET_FRAME_CONNECTION_TIMEOUT_MS", "750"),
        ("PACKET_FRAME_MAX_PACKET_SIZE", "2048"),
        ("PACKET_FRAME_RECV_BUFFER_SIZE", "8192"),
        ("PACKET_FRAME_LOG_LEVEL", "warn"),
    ]
    .into_iter()
    .collect();

    let mut config = NetworkConfig::default();
    config
        .apply_env_with(|key| vars.get(key).map(|v| v.to_string()))
        .unwrap();

    assert_eq!(config.client.address, "192.168.1.5:8000");
    assert_eq!(config.client.connection_timeout, Duration::from_millis(750));
    assert_eq!(config.transport.max_packet_size, 2048);
    assert_eq!(config.transport.recv_buffer_size, 8192);
    assert_eq!(config.logging.log_level, Level::WARN);
}

#[test]
fn test_env_override_rejects_garbage() {
    let mut config = NetworkConfig::default();
    let result = config.apply_env_with(|key| {
        (key == "PACKET_FRAME_MAX_PACKET_SIZE").then(|| "lots".to_string())
    });
    assert!(matches!(result, Err(ProtocolError::ConfigError(_))));
}

#[test]
fn test_save_and_load_file() {
    let path = std::env::temp_dir().join(format!("packet-frame-config-{}.toml", std::process::id()));
    let config = NetworkConfig::default_with_overrides(|c| c.transport.dispatch_queue_capacity = 32);

    config.save_to_file(&path).unwrap();
    let loaded = NetworkConfig::from_file(&path).unwrap();
    std::fs::remove_file(&path).ok();

    assert_eq!(loaded.transport.dispatch_queue_capacity, 32);
}
