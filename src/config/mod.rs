//! Service Configuration Module
//!
//! ## Loading Order
//!
//! 1. `--config <path>` on the command line
//! 2. `TERRAPULSE_CONFIG` environment variable (path to TOML file)
//! 3. `inference.toml` in the current working directory
//! 4. Built-in defaults
//!
//! Environment overrides (`API_HOST`, `API_PORT`, `OPENWEATHER_API_KEY`,
//! `ALLOWED_ORIGINS`, `EVENTS_API_URL`) are applied after the file.
//!
//! ```ignore
//! let config = ServiceConfig::load(cli.config.as_deref())?;
//! ```

mod service_config;
pub mod defaults;
pub mod validation;

pub use service_config::*;
