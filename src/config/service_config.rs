//! Service configuration loaded from TOML and the environment.
//!
//! Every section implements `Default`, so a missing or empty file runs the
//! service exactly as the built-in defaults describe.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use super::defaults;

// ============================================================================
// Top-Level Config
// ============================================================================

/// Root configuration for the inference service.
///
/// Load with `ServiceConfig::load()` which searches:
/// 1. an explicit path (the `--config` flag)
/// 2. `$TERRAPULSE_CONFIG`
/// 3. `./inference.toml`
/// 4. Built-in defaults
///
/// then applies environment overrides.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// HTTP server
    #[serde(default)]
    pub server: ServerConfig,

    /// Weather and vegetation providers
    #[serde(default)]
    pub enrichment: EnrichmentConfig,

    /// Event lookup
    #[serde(default)]
    pub events: EventsConfig,

    /// Prediction persistence
    #[serde(default)]
    pub storage: StorageConfig,
}

impl ServiceConfig {
    /// Load configuration using the standard search order, then apply
    /// environment overrides and validate.
    ///
    /// An explicit path that cannot be loaded is an error. The env-var and
    /// local-file candidates fall back with a warning.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = Self::discover(explicit)?;
        config.apply_env_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    fn discover(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        // 1. --config
        if let Some(path) = explicit {
            let config = Self::load_from_file(path)?;
            info!(path = %path.display(), "Loaded service config from --config");
            return Ok(config);
        }

        // 2. Env var
        if let Ok(path) = std::env::var(defaults::CONFIG_ENV_VAR) {
            let p = PathBuf::from(&path);
            if p.exists() {
                match Self::load_from_file(&p) {
                    Ok(config) => {
                        info!(path = %p.display(), "Loaded service config from {}", defaults::CONFIG_ENV_VAR);
                        return Ok(config);
                    }
                    Err(e) => {
                        warn!(path = %p.display(), error = %e, "Failed to load config from {}, falling back", defaults::CONFIG_ENV_VAR);
                    }
                }
            } else {
                warn!(path = %path, "{} points to non-existent file, falling back", defaults::CONFIG_ENV_VAR);
            }
        }

        // 3. Local file
        let local = PathBuf::from(defaults::LOCAL_CONFIG_FILE);
        if local.exists() {
            match Self::load_from_file(&local) {
                Ok(config) => {
                    info!("Loaded service config from ./{}", defaults::LOCAL_CONFIG_FILE);
                    return Ok(config);
                }
                Err(e) => {
                    warn!(error = %e, "Failed to load ./{}, using defaults", defaults::LOCAL_CONFIG_FILE);
                }
            }
        }

        // 4. Defaults
        info!("No config file found, using built-in defaults");
        Ok(Self::default())
    }

    /// Load from a specific TOML file path. Unknown keys are logged, not rejected.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;

        for w in super::validation::validate_unknown_keys(&contents) {
            warn!("{}", w);
        }

        toml::from_str(&contents).map_err(|e| ConfigError::Parse(path.to_path_buf(), e))
    }

    /// Apply the deployment environment on top of file values.
    ///
    /// `API_HOST` / `API_PORT` replace the host or port of `server.addr`
    /// independently. `ALLOWED_ORIGINS` is comma separated.
    pub fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let host = lookup("API_HOST").filter(|h| !h.trim().is_empty());
        let port = lookup("API_PORT").filter(|p| !p.trim().is_empty());
        if host.is_some() || port.is_some() {
            let (current_host, current_port) = self
                .server
                .addr
                .rsplit_once(':')
                .unwrap_or(("0.0.0.0", "8000"));
            let port = match port {
                Some(p) if p.trim().parse::<u16>().is_ok() => p.trim().to_string(),
                Some(p) => {
                    warn!(value = %p, "Ignoring invalid API_PORT");
                    current_port.to_string()
                }
                None => current_port.to_string(),
            };
            let host = host.map_or_else(|| current_host.to_string(), |h| h.trim().to_string());
            self.server.addr = format!("{host}:{port}");
        }

        if let Some(key) = lookup("OPENWEATHER_API_KEY") {
            self.enrichment.openweather_api_key = key.trim().to_string();
        }

        if let Some(origins) = lookup("ALLOWED_ORIGINS") {
            self.server.allowed_origins = origins
                .split(',')
                .map(str::trim)
                .filter(|o| !o.is_empty())
                .map(String::from)
                .collect();
        }

        if let Some(url) = lookup("EVENTS_API_URL").filter(|u| !u.trim().is_empty()) {
            self.events.gateway_url = Some(url.trim().to_string());
        }
    }

    /// Validate values that would make the service misbehave.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut errors: Vec<String> = Vec::new();

        if self.server.addr.trim().is_empty() {
            errors.push("server.addr must not be empty".to_string());
        }

        if self.enrichment.timeout_secs == 0 {
            errors.push("enrichment.timeout_secs must be > 0".to_string());
        }

        let veg = self.enrichment.default_vegetation_density;
        if !veg.is_finite() || !(0.0..=1.0).contains(&veg) {
            errors.push(format!(
                "enrichment.default_vegetation_density = {veg} must be within 0..=1"
            ));
        }

        if self.events.wildfire_category.trim().is_empty() {
            errors.push("events.wildfire_category must not be empty".to_string());
        }

        if self.storage.backend == StorageBackend::Sled && self.storage.path.as_os_str().is_empty() {
            errors.push("storage.path is required for the sled backend".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(errors))
        }
    }
}

// ============================================================================
// Error Type
// ============================================================================

#[derive(Debug)]
pub enum ConfigError {
    Io(PathBuf, std::io::Error),
    Parse(PathBuf, toml::de::Error),
    Validation(Vec<String>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(path, e) => write!(f, "Config I/O error ({}): {}", path.display(), e),
            Self::Parse(path, e) => write!(f, "Config parse error ({}): {}", path.display(), e),
            Self::Validation(errors) => {
                writeln!(f, "Config validation failed:")?;
                for e in errors {
                    writeln!(f, "  - {e}")?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ConfigError {}

// ============================================================================
// Server
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Bind address, `host:port`
    #[serde(default = "default_addr")]
    pub addr: String,

    /// CORS allow-list. Empty disables cross-origin access.
    #[serde(default = "default_allowed_origins")]
    pub allowed_origins: Vec<String>,
}

fn default_addr() -> String {
    defaults::SERVER_ADDR.to_string()
}
fn default_allowed_origins() -> Vec<String> {
    vec![defaults::ALLOWED_ORIGIN.to_string()]
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: default_addr(),
            allowed_origins: default_allowed_origins(),
        }
    }
}

// ============================================================================
// Enrichment
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichmentConfig {
    /// Empty disables weather enrichment.
    #[serde(default)]
    pub openweather_api_key: String,

    #[serde(default = "default_weather_url")]
    pub weather_url: String,

    /// Per-request timeout (seconds)
    #[serde(default = "default_enrichment_timeout")]
    pub timeout_secs: u64,

    /// Vegetation density reported for every coordinate (0-1)
    #[serde(default = "default_vegetation_density")]
    pub default_vegetation_density: f64,
}

fn default_weather_url() -> String {
    defaults::WEATHER_URL.to_string()
}
fn default_enrichment_timeout() -> u64 { defaults::ENRICHMENT_TIMEOUT_SECS }
fn default_vegetation_density() -> f64 { defaults::VEGETATION_DENSITY }

impl Default for EnrichmentConfig {
    fn default() -> Self {
        Self {
            openweather_api_key: String::new(),
            weather_url: default_weather_url(),
            timeout_secs: default_enrichment_timeout(),
            default_vegetation_density: default_vegetation_density(),
        }
    }
}

// ============================================================================
// Events
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventsConfig {
    /// Platform API gateway base URL. When unset, events come from `seed_file`.
    #[serde(default)]
    pub gateway_url: Option<String>,

    /// JSON array of event records served in-process
    #[serde(default)]
    pub seed_file: Option<PathBuf>,

    /// Only events of this category can get a wildfire prediction
    #[serde(default = "default_wildfire_category")]
    pub wildfire_category: String,
}

fn default_wildfire_category() -> String {
    defaults::WILDFIRE_CATEGORY.to_string()
}

impl Default for EventsConfig {
    fn default() -> Self {
        Self {
            gateway_url: None,
            seed_file: None,
            wildfire_category: default_wildfire_category(),
        }
    }
}

// ============================================================================
// Storage
// ============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Memory,
    Sled,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: StorageBackend,

    /// sled database directory
    #[serde(default = "default_storage_path")]
    pub path: PathBuf,

    /// In-memory retention cap, oldest evicted first. 0 = unbounded.
    #[serde(default)]
    pub max_predictions: usize,
}

fn default_storage_path() -> PathBuf {
    PathBuf::from(defaults::STORAGE_PATH)
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::default(),
            path: default_storage_path(),
            max_predictions: 0,
        }
    }
}
