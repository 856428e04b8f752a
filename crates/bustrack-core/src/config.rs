//! Application configuration management.
//!
//! Configuration is layered:
//! 1. Built-in defaults (port 4000, the Hyderabad zones and routes)
//! 2. An optional TOML file (`BUSTRACK_CONFIG`, else the platform default path)
//! 3. Environment overrides such as `BUSTRACK_SERVER__PORT=8080`
//!
//! The zone and route catalogs are read once at startup and never change
//! while the server runs.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::routes::{default_routes, Route};
use crate::zones::{default_zones, Zone, ZoneCatalog};

/// Environment variable naming an explicit configuration file.
pub const CONFIG_PATH_ENV: &str = "BUSTRACK_CONFIG";

/// Prefix for environment overrides.
pub const ENV_PREFIX: &str = "BUSTRACK";

/// Default hysteresis margin beyond a zone's radius, in kilometres.
pub const DEFAULT_HYSTERESIS_KM: f64 = 0.2;

/// Result alias for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Errors raised while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// An explicitly requested configuration file does not exist.
    #[error("Configuration file not found: {0}")]
    NotFound(String),

    /// TOML text could not be parsed into the configuration schema.
    #[error("Invalid configuration TOML: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Layered sources could not be merged or deserialized.
    #[error("Failed to load configuration: {0}")]
    LoadError(#[from] config::ConfigError),

    /// A single field failed validation.
    #[error("{field}: {message}")]
    ValidationError {
        /// Dotted path of the offending field.
        field: String,
        /// What is wrong with it.
        message: String,
    },

    /// Several fields failed validation.
    #[error("{} configuration errors", .0.len())]
    MultipleValidationErrors(Vec<ConfigError>),
}

impl ConfigError {
    fn invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ValidationError {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Network listener settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Interface to bind.
    pub host: String,

    /// TCP port to bind.
    pub port: u16,

    /// Maximum number of outbound messages queued per connection before
    /// further messages to that connection are dropped.
    pub subscriber_queue_depth: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 4000,
            subscriber_queue_depth: 256,
        }
    }
}

/// Geofence tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeofenceConfig {
    /// Distance beyond a zone's radius a vehicle must travel before it may
    /// trigger another arrival at that zone.
    pub hysteresis_km: f64,
}

impl Default for GeofenceConfig {
    fn default() -> Self {
        Self {
            hysteresis_km: DEFAULT_HYSTERESIS_KM,
        }
    }
}

/// Main application configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Listener settings.
    pub server: ServerConfig,

    /// Geofence tuning.
    pub geofence: GeofenceConfig,

    /// Zones evaluated on every position report, in order.
    pub zones: Vec<Zone>,

    /// Display-only route catalog.
    pub routes: Vec<Route>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            geofence: GeofenceConfig::default(),
            zones: default_zones(),
            routes: default_routes(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the default location plus environment overrides.
    ///
    /// If `BUSTRACK_CONFIG` is set the file it names must exist; otherwise the
    /// platform default path is used when present.
    ///
    /// # Errors
    ///
    /// Returns an error if a required file is missing, a source cannot be
    /// parsed, or the merged configuration fails validation.
    pub fn load() -> ConfigResult<Self> {
        match std::env::var(CONFIG_PATH_ENV) {
            Ok(path) => Self::load_from(Path::new(&path), true),
            Err(_) => Self::load_from(&default_config_path(), false),
        }
    }

    /// Load configuration from `path` plus environment overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if `required` is set and the file is missing, if a
    /// source cannot be parsed, or if validation fails.
    pub fn load_from(path: &Path, required: bool) -> ConfigResult<Self> {
        if required && !path.exists() {
            return Err(ConfigError::NotFound(path.display().to_string()));
        }

        let file = config::File::from(path.to_path_buf())
            .format(config::FileFormat::Toml)
            .required(required);

        let settings = config::Config::builder()
            .add_source(file)
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: Self = settings.try_deserialize()?;
        config.validate()?;
        tracing::debug!(
            path = %path.display(),
            zones = config.zones.len(),
            routes = config.routes.len(),
            "configuration loaded"
        );
        Ok(config)
    }

    /// Parse configuration from TOML text, filling gaps with defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not valid TOML or fails validation.
    pub fn from_toml_str(content: &str) -> ConfigResult<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Check the configuration for values the tracker cannot work with.
    ///
    /// # Errors
    ///
    /// Returns every problem found, wrapped in
    /// [`ConfigError::MultipleValidationErrors`] when there is more than one.
    pub fn validate(&self) -> ConfigResult<()> {
        let mut errors = Vec::new();

        if self.server.subscriber_queue_depth == 0 {
            errors.push(ConfigError::invalid(
                "server.subscriber_queue_depth",
                "must be at least 1",
            ));
        }

        let hysteresis = self.geofence.hysteresis_km;
        if !hysteresis.is_finite() || hysteresis < 0.0 {
            errors.push(ConfigError::invalid(
                "geofence.hysteresis_km",
                format!("must be a non-negative number (got {hysteresis})"),
            ));
        }

        for (i, zone) in self.zones.iter().enumerate() {
            if zone.name.trim().is_empty() {
                errors.push(ConfigError::invalid(format!("zones[{i}].name"), "cannot be empty"));
            }
            if !zone.radius_km.is_finite() || zone.radius_km <= 0.0 {
                errors.push(ConfigError::invalid(
                    format!("zones[{i}].radius_km"),
                    format!("must be a positive number (got {})", zone.radius_km),
                ));
            }
            if self.zones[..i].iter().any(|other| other.name == zone.name) {
                errors.push(ConfigError::invalid(
                    format!("zones[{i}].name"),
                    format!("duplicate zone name '{}'", zone.name),
                ));
            }
        }

        match errors.len() {
            0 => Ok(()),
            1 => Err(errors.remove(0)),
            _ => Err(ConfigError::MultipleValidationErrors(errors)),
        }
    }

    /// Build the zone catalog from the configured zones.
    #[must_use]
    pub fn zone_catalog(&self) -> ZoneCatalog {
        ZoneCatalog::new(self.zones.clone())
    }

    /// Socket address string the server should bind.
    #[must_use]
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

/// Get the default configuration file path.
#[must_use]
pub fn default_config_path() -> PathBuf {
    // On a server: /etc/bustrack/config.toml
    // For development: ~/.config/bustrack/config.toml
    #[cfg(target_os = "linux")]
    {
        PathBuf::from("/etc/bustrack/config.toml")
    }
    #[cfg(not(target_os = "linux"))]
    {
        directories::ProjectDirs::from("", "", "bustrack").map_or_else(
            || PathBuf::from("config.toml"),
            |dirs| dirs.config_dir().join("config.toml"),
        )
    }
}
