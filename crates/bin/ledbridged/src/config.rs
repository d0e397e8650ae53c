//! Configuration loading — TOML file with environment variable overrides.
//!
//! Looks for `ledbridge.toml` in the working directory. Every field has a
//! sensible default so the file is optional. Environment variables take
//! precedence over file values.

use std::time::Duration;

use serde::Deserialize;

use ledbridge_adapter_serial::SerialConfig;
use ledbridge_app::registry::OutputRegistry;
use ledbridge_domain::error::BridgeError;
use ledbridge_domain::id::{OutputId, PhysicalLine};
use ledbridge_domain::output::{LineState, Output};

/// Top-level configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// HTTP server settings.
    pub server: ServerConfig,
    /// Serial link to the microcontroller.
    pub serial: SerialConfig,
    /// Desired-state store polled by the reconciler.
    pub database: DatabaseConfig,
    /// Logging settings.
    pub logging: LoggingConfig,
    /// Output catalogue, in display order.
    pub outputs: Vec<Output>,
}

/// HTTP listener configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to bind to (e.g. `0.0.0.0`).
    pub host: String,
    /// TCP port.
    pub port: u16,
    /// Upper bound for one request, queueing behind other device commands
    /// included.
    pub request_timeout_secs: u64,
}

/// `SQLite` desired-state store configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Whether the reconciler polls the store.
    pub enabled: bool,
    /// `SQLite` connection URL or file path.
    pub url: String,
    /// Time between two reconciliation passes, in milliseconds.
    pub poll_interval_ms: u64,
}

/// Logging configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive (`RUST_LOG` syntax).
    pub filter: String,
}

impl Config {
    /// Load configuration from `ledbridge.toml` (if present) then apply
    /// environment-variable overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML file exists but is malformed, or if the
    /// result does not validate.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::from_file("ledbridge.toml")?;
        config.apply_overrides(|name| std::env::var(name).ok());
        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(ConfigError::Parse),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(ConfigError::Io(err)),
        }
    }

    fn apply_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(val) = var("LEDBRIDGE_HOST") {
            self.server.host = val;
        }
        if let Some(port) = var("LEDBRIDGE_PORT").and_then(|val| val.parse().ok()) {
            self.server.port = port;
        }
        if let Some(val) = var("LEDBRIDGE_BIND")
            && let Some((host, port)) = val.rsplit_once(':')
        {
            self.server.host = host.to_string();
            if let Ok(port) = port.parse() {
                self.server.port = port;
            }
        }
        if let Some(val) = var("LEDBRIDGE_SERIAL_PORT") {
            self.serial.port = val;
        }
        if let Some(baud_rate) = var("LEDBRIDGE_BAUD_RATE").and_then(|val| val.parse().ok()) {
            self.serial.baud_rate = baud_rate;
        }
        // Naming a store is enough to turn polling on.
        if let Some(val) = var("LEDBRIDGE_DATABASE_URL") {
            self.database.url = val;
            self.database.enabled = true;
        }
        if let Some(val) = var("LEDBRIDGE_LOG") {
            self.logging.filter = val;
        }
        if let Some(val) = var("RUST_LOG") {
            self.logging.filter = val;
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::Validation("port must be non-zero".to_string()));
        }
        if self.server.request_timeout_secs == 0 {
            return Err(ConfigError::Validation("request timeout must be non-zero".to_string()));
        }
        if self.serial.baud_rate == 0 {
            return Err(ConfigError::Validation("baud rate must be non-zero".to_string()));
        }
        if self.serial.ack_timeout_ms == 0 {
            return Err(ConfigError::Validation(
                "acknowledgement timeout must be non-zero".to_string(),
            ));
        }
        if self.database.enabled && self.database.poll_interval_ms == 0 {
            return Err(ConfigError::Validation("poll interval must be non-zero".to_string()));
        }
        self.registry()?;
        Ok(())
    }

    /// Build the output registry from the configured catalogue.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Catalogue`] for duplicate ids or lines, zero
    /// ids or blank labels.
    pub fn registry(&self) -> Result<OutputRegistry, ConfigError> {
        OutputRegistry::new(self.outputs.clone()).map_err(ConfigError::Catalogue)
    }

    /// Return the `host:port` bind address.
    #[must_use]
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.server.request_timeout_secs)
    }

    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.database.poll_interval_ms)
    }
}

/// Twelve LEDs on pins 2 to 13, all off after the board resets.
fn default_outputs() -> Vec<Output> {
    (1..=12u16)
        .map(|n| Output {
            id: OutputId::new(u32::from(n)),
            label: format!("LED {n}"),
            line: PhysicalLine::new(n + 1),
            initial_state: Some(LineState::Off),
        })
        .collect()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            serial: SerialConfig::default(),
            database: DatabaseConfig::default(),
            logging: LoggingConfig::default(),
            outputs: default_outputs(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5001,
            request_timeout_secs: 30,
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            url: "sqlite:ledbridge.db?mode=rwc".to_string(),
            poll_interval_ms: 1000,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "ledbridged=info,ledbridge=info,tower_http=debug".to_string(),
        }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// TOML parse failure.
    #[error("failed to parse config file")]
    Parse(#[from] toml::de::Error),
    /// File I/O failure.
    #[error("failed to read config file")]
    Io(#[from] std::io::Error),
    /// Semantic validation failure.
    #[error("invalid configuration: {0}")]
    Validation(String),
    /// The output catalogue is inconsistent.
    #[error("invalid output catalogue")]
    Catalogue(#[source] BridgeError),
}
