//! Serial link configuration.

use std::time::Duration;

use serde::Deserialize;

/// Configuration for the serial channel to the microcontroller.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SerialConfig {
    /// Device path, e.g. `/dev/ttyUSB0` or `COM3`.
    pub port: String,
    /// Line speed in baud.
    pub baud_rate: u32,
    /// How long to wait after opening while the board resets, in milliseconds.
    pub settle_ms: u64,
    /// How long to wait for an acknowledgement, in milliseconds.
    pub ack_timeout_ms: u64,
    /// Whether the service refuses to start without the device.
    pub required: bool,
}

impl SerialConfig {
    #[must_use]
    pub fn settle(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }

    #[must_use]
    pub fn ack_timeout(&self) -> Duration {
        Duration::from_millis(self.ack_timeout_ms)
    }
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            port: "/dev/ttyUSB0".to_string(),
            baud_rate: 9600,
            settle_ms: 2000,
            ack_timeout_ms: 1000,
            required: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_have_sensible_defaults() {
        let config = SerialConfig::default();
        assert_eq!(config.port, "/dev/ttyUSB0");
        assert_eq!(config.baud_rate, 9600);
        assert_eq!(config.settle(), Duration::from_secs(2));
        assert_eq!(config.ack_timeout(), Duration::from_secs(1));
        assert!(config.required);
    }

    #[test]
    fn should_deserialize_from_toml() {
        let toml = r#"
            port = "COM3"
            baud_rate = 115200
            settle_ms = 500
            ack_timeout_ms = 250
            required = false
        "#;
        let config: SerialConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.port, "COM3");
        assert_eq!(config.baud_rate, 115_200);
        assert_eq!(config.settle_ms, 500);
        assert_eq!(config.ack_timeout_ms, 250);
        assert!(!config.required);
    }

    #[test]
    fn should_use_defaults_for_missing_fields() {
        let toml = r#"port = "/dev/ttyACM0""#;
        let config: SerialConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.port, "/dev/ttyACM0");
        assert_eq!(config.baud_rate, 9600);
        assert_eq!(config.ack_timeout_ms, 1000);
    }
}
