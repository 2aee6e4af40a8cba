//! ==============================================================================
//! main.rs - entry point
//! ==============================================================================
//!
//! purpose:
//!     wire the pieces together and serve:
//!     - initialize tracing
//!     - read the environment configuration (fatal on missing/invalid values)
//!     - select the reading source (live home assistant client or dummy)
//!     - build the sensor registry and hand it to the web server
//!
//!     there is no polling loop here: every poll is triggered by an incoming
//!     request, and the page refreshes itself client-side.
//!
//! ==============================================================================

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;

use backyard_temp::client::{DummyClient, HomeAssistantClient, ReadingSource};
use backyard_temp::config::{AppConfig, UpstreamMode};
use backyard_temp::registry::SensorRegistry;
use backyard_temp::server::{self, AppState};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = AppConfig::from_env().context("invalid configuration")?;

    let source: Arc<dyn ReadingSource> = match &config.upstream {
        UpstreamMode::Dummy => {
            tracing::info!("using dummy data for temperature");
            Arc::new(DummyClient)
        }
        UpstreamMode::HomeAssistant {
            base_url,
            token,
            timeout,
        } => {
            tracing::info!(%base_url, "using home assistant upstream");
            Arc::new(HomeAssistantClient::new(base_url, token, *timeout)?)
        }
    };

    let registry = Arc::new(SensorRegistry::new(
        &config.entities,
        source,
        config.history_points,
    )?);
    tracing::info!(
        entities = config.entities.len(),
        history_points = config.history_points,
        "sensor registry ready"
    );

    let state = AppState {
        registry,
        refresh_interval_secs: config.refresh_interval_secs,
    };
    server::serve(state, &config.bind_host, config.bind_port).await
}
