//! Daemon configuration: TOML file with environment variable overrides.
//!
//! Looks for `twilight.toml` (or the path given with `--config`). Every
//! field has a sensible default so the file is optional. Environment
//! variables take precedence over file values.
//!
//! This is the daemon's own plumbing. The lighting document (token, dusk
//! profile, devices) lives in a separate JSON file named by
//! `[lighting] config_path`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::TimeDelta;
use serde::Deserialize;

use twilight_adapter_lifx_reqwest::DEFAULT_BASE_URL;
use twilight_app::player::PlayerOptions;
use twilight_domain::plan::DuskStrategy;

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// HTTP server settings.
    pub server: ServerConfig,
    /// Database settings.
    pub database: DatabaseConfig,
    /// Logging settings.
    pub logging: LoggingConfig,
    /// Remote lighting API and lighting document.
    pub lighting: LightingSection,
    /// Automatic sunset triggering and playback.
    pub scheduler: SchedulerConfig,
}

/// HTTP listener configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to bind to (e.g. `127.0.0.1`).
    pub host: String,
    /// TCP port.
    pub port: u16,
}

/// `SQLite` database configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// `SQLite` connection URL or file path.
    pub url: String,
}

/// Logging configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive (`RUST_LOG` syntax).
    pub filter: String,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LightingSection {
    /// Path of the JSON lighting document.
    pub config_path: PathBuf,
    /// Base URL of the LIFX HTTP API.
    pub base_url: String,
    pub request_timeout_secs: u64,
    /// Use the in-memory client instead of the real API.
    pub dry_run: bool,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Run the sunset watcher.
    pub enabled: bool,
    pub poll_interval_secs: u64,
    /// How long after sunset a trigger may still fire.
    pub window_secs: u64,
    /// Strategy used by automatic triggers.
    pub strategy: DuskStrategy,
    pub retries: u32,
    pub retry_delay_secs: u64,
    pub power_off_on_cancel: bool,
}

impl Config {
    /// Load configuration from `path` (if present) then apply
    /// environment-variable overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML file exists but is malformed, or when
    /// the resulting values are inconsistent.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::from_file(path)?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(ConfigError::Parse),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(ConfigError::Io(err)),
        }
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("TWILIGHT_HOST") {
            self.server.host = val;
        }
        if let Ok(val) = std::env::var("TWILIGHT_PORT") {
            if let Ok(port) = val.parse() {
                self.server.port = port;
            }
        }
        if let Ok(val) = std::env::var("TWILIGHT_BIND") {
            if let Some((host, port)) = val.rsplit_once(':') {
                self.server.host = host.to_string();
                if let Ok(port) = port.parse() {
                    self.server.port = port;
                }
            }
        }
        if let Ok(val) = std::env::var("TWILIGHT_DATABASE_URL") {
            self.database.url = val;
        }
        if let Ok(val) = std::env::var("TWILIGHT_LIGHTS_CONFIG") {
            self.lighting.config_path = PathBuf::from(val);
        }
        if let Ok(val) = std::env::var("TWILIGHT_LIFX_URL") {
            self.lighting.base_url = val;
        }
        if let Ok(val) = std::env::var("TWILIGHT_DRY_RUN") {
            self.lighting.dry_run = matches!(val.as_str(), "1" | "true" | "yes");
        }
        if let Ok(val) = std::env::var("TWILIGHT_LOG") {
            self.logging.filter = val;
        }
        if let Ok(val) = std::env::var("RUST_LOG") {
            self.logging.filter = val;
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::Validation("port must be non-zero".to_string()));
        }
        if self.lighting.request_timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "lighting.request_timeout_secs must be non-zero".to_string(),
            ));
        }
        if self.scheduler.window_secs == 0 {
            return Err(ConfigError::Validation(
                "scheduler.window_secs must be non-zero".to_string(),
            ));
        }
        // A tick must land inside every window.
        if self.scheduler.poll_interval_secs == 0
            || self.scheduler.poll_interval_secs >= self.scheduler.window_secs
        {
            return Err(ConfigError::Validation(format!(
                "scheduler.poll_interval_secs must be between 1 and {}",
                self.scheduler.window_secs - 1
            )));
        }
        Ok(())
    }

    /// Return the `host:port` bind address.
    #[must_use]
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// Return the database URL in `sqlx`-compatible format.
    #[must_use]
    pub fn database_url(&self) -> &str {
        &self.database.url
    }
}

impl LightingSection {
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl SchedulerConfig {
    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    #[must_use]
    pub fn window(&self) -> TimeDelta {
        TimeDelta::seconds(i64::try_from(self.window_secs).unwrap_or(i64::MAX))
    }

    #[must_use]
    pub fn player_options(&self) -> PlayerOptions {
        PlayerOptions {
            retries: self.retries,
            retry_delay: Duration::from_secs(self.retry_delay_secs),
            power_off_on_cancel: self.power_off_on_cancel,
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite:twilight.db?mode=rwc".to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "twilightd=info,twilight=info,tower_http=debug".to_string(),
        }
    }
}

impl Default for LightingSection {
    fn default() -> Self {
        Self {
            config_path: PathBuf::from("config.json"),
            base_url: DEFAULT_BASE_URL.to_string(),
            request_timeout_secs: 10,
            dry_run: false,
        }
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            poll_interval_secs: 20,
            window_secs: 60,
            strategy: DuskStrategy::Stepped,
            retries: 2,
            retry_delay_secs: 5,
            power_off_on_cancel: false,
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
}
