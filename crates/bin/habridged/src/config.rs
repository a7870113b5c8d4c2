//! Daemon settings: `habridge.toml` first, then the environment.
//!
//! The file is optional and every section falls back to its defaults. Hub
//! credentials usually come from `HA_URL` and `HA_TOKEN`.

use std::time::Duration;

use serde::Deserialize;

use habridge_adapter_hass::HassConfig;
use habridge_app::ingestion::Backoff;

/// Everything the daemon needs to start.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Where the API listens.
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub logging: LoggingConfig,
    /// Remote hub connection.
    pub hub: HassConfig,
    /// Initial hydration retry policy.
    pub ingestion: IngestionConfig,
    /// Change broadcast settings.
    pub broadcast: BroadcastConfig,
}

/// API listener.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// Entity store location.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// sqlx `SQLite` URL, `sqlite::memory:` included.
    pub url: String,
    /// Pool size for file databases.
    pub max_connections: u32,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` directives.
    pub filter: String,
}

/// Backoff applied while the first full sync keeps failing.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct IngestionConfig {
    pub initial_backoff_secs: u64,
    pub max_backoff_secs: u64,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct BroadcastConfig {
    /// How many records a slow subscriber may lag before losing the oldest.
    pub capacity: usize,
}

impl Config {
    /// Read `habridge.toml` when it exists, layer the process environment on
    /// top and validate the result.
    ///
    /// # Errors
    ///
    /// Fails on an unreadable or malformed file and on settings the daemon
    /// cannot run with.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::from_file("habridge.toml")?;
        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self, ConfigError> {
        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(err) => return Err(ConfigError::Io(err)),
        };
        Ok(toml::from_str(&raw)?)
    }

    /// Apply overrides from `lookup`, usually the process environment.
    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(val) = lookup("HABRIDGE_HOST") {
            self.server.host = val;
        }
        if let Some(port) = lookup("HABRIDGE_PORT").and_then(|val| val.parse().ok()) {
            self.server.port = port;
        }
        if let Some((host, port)) = lookup("HABRIDGE_BIND")
            .as_deref()
            .and_then(|bind| bind.rsplit_once(':'))
        {
            self.server.host = host.to_owned();
            if let Ok(port) = port.parse() {
                self.server.port = port;
            }
        }
        if let Some(val) = lookup("HA_URL") {
            self.hub.url = val;
        }
        if let Some(val) = lookup("HA_TOKEN") {
            self.hub.token = val;
        }
        if let Some(val) = lookup("DB_URL") {
            self.database.url = val;
        }
        if let Some(val) = lookup("HABRIDGE_DATABASE_URL") {
            self.database.url = val;
        }
        if let Some(val) = lookup("LOG_LEVEL") {
            self.logging.filter = val.to_lowercase();
        }
        if let Some(directives) = lookup("RUST_LOG") {
            self.logging.filter = directives;
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::Validation("server port cannot be 0".to_string()));
        }
        if self.hub.token.trim().is_empty() {
            return Err(ConfigError::Validation(
                "hub token must be set (HA_TOKEN or [hub] token)".to_string(),
            ));
        }
        if self.hub.websocket_url().is_err() {
            return Err(ConfigError::Validation(format!(
                "hub url must start with http:// or https://, got {:?}",
                self.hub.url
            )));
        }
        if self.ingestion.initial_backoff_secs > self.ingestion.max_backoff_secs {
            return Err(ConfigError::Validation(
                "initial backoff must not exceed max backoff".to_string(),
            ));
        }
        if self.broadcast.capacity == 0 {
            return Err(ConfigError::Validation(
                "broadcast capacity must be non-zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Listener address as `host:port`.
    #[must_use]
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

impl IngestionConfig {
    #[must_use]
    pub fn backoff(&self) -> Backoff {
        Backoff::new(
            Duration::from_secs(self.initial_backoff_secs),
            Duration::from_secs(self.max_backoff_secs),
        )
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: String::from("0.0.0.0"),
            port: 8000,
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite:habridge.db?mode=rwc".to_string(),
            max_connections: 5,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "habridged=info,habridge=info,tower_http=debug".to_string(),
        }
    }
}

impl Default for IngestionConfig {
    fn default() -> Self {
        Self {
            initial_backoff_secs: 2,
            max_backoff_secs: 60,
        }
    }
}

impl Default for BroadcastConfig {
    fn default() -> Self {
        Self { capacity: 256 }
    }
}

/// Why the daemon refused its settings.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("habridge.toml is not valid TOML")]
    Parse(#[from] toml::de::Error),
    #[error("cannot read habridge.toml")]
    Io(#[from] std::io::Error),
    #[error("unusable settings: {0}")]
    Validation(String),
}
