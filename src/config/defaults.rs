//! System-wide default constants.
//!
//! Grouped by subsystem for easy discovery.

// ============================================================================
// Server
// ============================================================================

/// Bind address when neither the config file nor `API_HOST`/`API_PORT` set one.
pub const SERVER_ADDR: &str = "0.0.0.0:8000";

/// Origin of the dashboard dev server.
pub const ALLOWED_ORIGIN: &str = "http://localhost:5173";

// ============================================================================
// Enrichment
// ============================================================================

/// OpenWeather current-weather endpoint.
pub const WEATHER_URL: &str = "https://api.openweathermap.org/data/2.5/weather";

/// Per-request timeout for enrichment calls (seconds).
pub const ENRICHMENT_TIMEOUT_SECS: u64 = 10;

/// Vegetation density returned until a satellite vegetation index is wired in.
pub const VEGETATION_DENSITY: f64 = 0.5;

// ============================================================================
// Events
// ============================================================================

/// Category id the platform assigns to wildfire events.
pub const WILDFIRE_CATEGORY: &str = "wildfires";

/// Timeout for event lookups against the gateway (seconds).
pub const EVENT_LOOKUP_TIMEOUT_SECS: u64 = 10;

// ============================================================================
// Storage
// ============================================================================

/// sled database directory for the durable backend.
pub const STORAGE_PATH: &str = "./data/predictions.db";

// ============================================================================
// Config discovery
// ============================================================================

/// Environment variable naming a config file.
pub const CONFIG_ENV_VAR: &str = "TERRAPULSE_CONFIG";

/// Config file looked up in the working directory.
pub const LOCAL_CONFIG_FILE: &str = "inference.toml";
