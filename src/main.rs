//! TerraPulse Inference Service
//!
//! Wildfire spread prediction over HTTP.
//!
//! # Usage
//!
//! ```bash
//! # Serve on 0.0.0.0:8000 with defaults
//! cargo run --release
//!
//! # Serve with a config file and JSON logs
//! ./terrapulse-inference --config inference.toml --log-json
//!
//! # One-off prediction, no server or network
//! ./terrapulse-inference predict --lon -122.33 --lat 37.77 --wind-speed 15 --wind-direction 270
//! ```
//!
//! # Environment Variables
//!
//! - `TERRAPULSE_CONFIG`: Path to a TOML config file
//! - `API_HOST` / `API_PORT`: Bind address
//! - `OPENWEATHER_API_KEY`: Enables weather enrichment
//! - `ALLOWED_ORIGINS`: Comma-separated CORS origins
//! - `EVENTS_API_URL`: Platform API gateway for event lookup
//! - `RUST_LOG`: Logging level (default: info)

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use terrapulse_inference::api::{create_app, ApiState};
use terrapulse_inference::config::ServiceConfig;
use terrapulse_inference::{
    events, storage, EnrichmentClient, PredictionParameters, PredictionService, SpatialAnchor,
    SpreadModel, WildfireHeuristicModel,
};

// ============================================================================
// CLI Arguments
// ============================================================================

#[derive(Parser, Debug)]
#[command(name = "terrapulse-inference")]
#[command(about = "TerraPulse wildfire spread prediction service")]
#[command(version)]
struct CliArgs {
    /// Path to a TOML config file (overrides TERRAPULSE_CONFIG and ./inference.toml)
    #[arg(short, long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Override the server address (default: "0.0.0.0:8000")
    #[arg(short, long, value_name = "HOST:PORT")]
    addr: Option<String>,

    /// Emit logs as JSON lines
    #[arg(long)]
    log_json: bool,

    #[command(subcommand)]
    command: Option<SubCommand>,
}

#[derive(clap::Subcommand, Debug)]
enum SubCommand {
    /// Run the spread model once for a coordinate and print the result as JSON
    Predict {
        /// Longitude of the fire center
        #[arg(long, allow_negative_numbers = true)]
        lon: f64,
        /// Latitude of the fire center
        #[arg(long, allow_negative_numbers = true)]
        lat: f64,
        /// Wind speed (km/h)
        #[arg(long)]
        wind_speed: Option<f64>,
        /// Direction the wind blows from (degrees)
        #[arg(long)]
        wind_direction: Option<f64>,
        /// Vegetation density (0-1)
        #[arg(long)]
        vegetation_density: Option<f64>,
        /// Temperature (°C)
        #[arg(long, allow_negative_numbers = true)]
        temperature: Option<f64>,
        /// Relative humidity (%)
        #[arg(long)]
        humidity: Option<f64>,
        /// Forecast horizon (hours, 1-72)
        #[arg(long)]
        hours: Option<u32>,
    },
}

fn init_logging(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(false)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .init();
    }
}

// ============================================================================
// Offline prediction
// ============================================================================

fn run_predict(lon: f64, lat: f64, params: &PredictionParameters) -> Result<()> {
    if !lon.is_finite() || !lat.is_finite() {
        anyhow::bail!("--lon and --lat must be finite numbers");
    }
    if let Err(errors) = params.validate() {
        anyhow::bail!("invalid parameters: {}", errors.join("; "));
    }

    let result = WildfireHeuristicModel::new().predict(SpatialAnchor::new(lon, lat), &params.resolve());
    let json = serde_json::to_string_pretty(&result).context("Failed to serialize prediction")?;
    println!("{json}");
    Ok(())
}

// ============================================================================
// Server
// ============================================================================

async fn run_http_server(addr: &str, app: axum::Router, cancel_token: CancellationToken) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!(addr = %addr, "HTTP server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            cancel_token.cancelled().await;
            info!("[HttpServer] Received shutdown signal");
        })
        .await
        .context("HTTP server error")?;

    info!("[HttpServer] Graceful shutdown complete");
    Ok(())
}

async fn run_service(config: ServiceConfig) -> Result<()> {
    let store = storage::open_store(&config.storage).context("Failed to open prediction store")?;
    let event_source = events::from_config(&config.events).context("Failed to set up event lookup")?;
    let enrichment = Arc::new(EnrichmentClient::new(&config.enrichment));
    if config.enrichment.openweather_api_key.is_empty() {
        info!("OPENWEATHER_API_KEY not set, weather enrichment disabled");
    }

    let model = Arc::new(WildfireHeuristicModel::new());
    info!(model = model.model_name(), version = model.model_version(), "Spread model loaded");

    let service = Arc::new(PredictionService::new(model, enrichment, store));
    let state = ApiState {
        service: Arc::clone(&service),
        events: event_source,
        wildfire_category: config.events.wildfire_category.clone(),
    };
    let app = create_app(state, &config.server.allowed_origins);

    // Graceful shutdown via Ctrl+C
    let cancel_token = CancellationToken::new();
    let shutdown_token = cancel_token.clone();
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        info!("Received Ctrl+C, initiating shutdown...");
        shutdown_token.cancel();
    });

    let result = run_http_server(&config.server.addr, app, cancel_token).await;
    if let Err(e) = &result {
        error!(error = %e, "Server stopped with an error");
    }

    service.shutdown().await;
    result
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    let args = CliArgs::parse();
    init_logging(args.log_json);

    if let Some(SubCommand::Predict {
        lon,
        lat,
        wind_speed,
        wind_direction,
        vegetation_density,
        temperature,
        humidity,
        hours,
    }) = args.command
    {
        let params = PredictionParameters {
            wind_speed,
            wind_direction,
            vegetation_density,
            temperature,
            humidity,
            forecast_hours: hours,
        };
        return run_predict(lon, lat, &params);
    }

    let mut config = ServiceConfig::load(args.config.as_deref())?;
    if let Some(addr) = args.addr {
        config.server.addr = addr;
    }

    info!("  TerraPulse Inference Service v{}", env!("CARGO_PKG_VERSION"));
    info!(
        addr = %config.server.addr,
        storage = ?config.storage.backend,
        wildfire_category = %config.events.wildfire_category,
        "Configuration loaded"
    );

    run_service(config).await
}
