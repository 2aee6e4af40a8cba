//! ==============================================================================
//! server.rs - Presentation Layer
//! ==============================================================================
//!
//! purpose:
//!     thin http layer over the registry. polling cadence lives here, not in
//!     the core: each page load or /api/sensors request triggers one poll,
//!     and the page refreshes itself client-side via a meta-refresh tag.
//!
//! routes:
//!     GET /                     dashboard page (polls, then renders)
//!     GET /api/sensors          poll every entity, return the json snapshot
//!     GET /api/sensors/snapshot cached state only, no upstream traffic
//!
//! ==============================================================================

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::sync::Arc;

use anyhow::Result;
use axum::{
    extract::State,
    response::{Html, Json},
    routing::get,
    Router,
};
use tower_http::cors::CorsLayer;

use crate::domain::{ReadingStatus, SensorSnapshot};
use crate::registry::SensorRegistry;
use crate::units;

#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<SensorRegistry>,
    /// drives the page's client-side refresh; the core never schedules
    pub refresh_interval_secs: u64,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(dashboard_handler))
        .route("/api/sensors", get(sensors_handler))
        .route("/api/sensors/snapshot", get(snapshot_handler))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub async fn serve(state: AppState, host: &str, port: u16) -> Result<()> {
    let listener = tokio::net::TcpListener::bind((host, port)).await?;
    tracing::info!("dashboard live at http://{host}:{port}");
    axum::serve(listener, router(state)).await?;
    Ok(())
}

async fn dashboard_handler(State(state): State<AppState>) -> Html<String> {
    tracing::info!("handling request to '/' route");
    state.registry.poll_all().await;
    let snapshots = state.registry.snapshot_all().await;
    Html(render_page(&snapshots, state.refresh_interval_secs))
}

/// json api endpoint for programmatic access; polls before responding
async fn sensors_handler(
    State(state): State<AppState>,
) -> Json<BTreeMap<String, SensorSnapshot>> {
    state.registry.poll_all().await;
    Json(state.registry.snapshot_all().await)
}

/// cached state only; lets callers read between poll cycles for free
async fn snapshot_handler(
    State(state): State<AppState>,
) -> Json<BTreeMap<String, SensorSnapshot>> {
    Json(state.registry.snapshot_all().await)
}

// ==============================================================================
// html rendering
// ==============================================================================

/// "sensor.backyard_temperature" -> "Backyard Temperature"
fn display_name(entity_id: &str) -> String {
    let name = entity_id.rsplit('.').next().unwrap_or(entity_id);
    name.split('_')
        .filter(|w| !w.is_empty())
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Inline svg polyline of the celsius history, or None when there are
/// fewer than two points to draw a line through.
fn sparkline(snapshot: &SensorSnapshot) -> Option<String> {
    const W: f64 = 260.0;
    const H: f64 = 48.0;
    let history = &snapshot.history;
    if history.len() < 2 {
        return None;
    }
    let (mut lo, mut hi) = (f64::INFINITY, f64::NEG_INFINITY);
    for s in history {
        lo = lo.min(s.celsius);
        hi = hi.max(s.celsius);
    }
    let span = if hi > lo { hi - lo } else { 1.0 };
    let step = W / (history.len() - 1) as f64;
    let mut points = String::new();
    for (i, s) in history.iter().enumerate() {
        let x = i as f64 * step;
        // flat history draws a centered line
        let y = H - ((s.celsius - lo) / span) * (H - 4.0) - 2.0;
        let _ = write!(points, "{x:.1},{y:.1} ");
    }
    Some(format!(
        "<svg class=\"sparkline\" viewBox=\"0 0 {W} {H}\" preserveAspectRatio=\"none\">\
         <polyline fill=\"none\" stroke=\"#bd93f9\" stroke-width=\"2\" points=\"{}\"/></svg>",
        points.trim_end()
    ))
}

fn render_card(entity_id: &str, snapshot: &SensorSnapshot) -> String {
    let temperature = match snapshot.celsius {
        Some(c) if snapshot.status == ReadingStatus::Ok => {
            let (c, f) = units::celsius_to_display(c);
            format!("{c:.1}&deg;C / {f:.1}&deg;F")
        }
        _ => "N/A&deg;C / N/A&deg;F".to_string(),
    };
    let last_updated = snapshot
        .last_updated
        .as_deref()
        .map(html_escape)
        .unwrap_or_else(|| "N/A".to_string());
    let trend = sparkline(snapshot).unwrap_or_default();

    format!(
        r#"    <div class="card">
        <h1>{title}</h1>
        <p class="temperature">{temperature}</p>
        {trend}
        <p class="updated">Last updated: {last_updated}</p>
    </div>
"#,
        title = html_escape(&display_name(entity_id)),
    )
}

fn render_page(snapshots: &BTreeMap<String, SensorSnapshot>, refresh_secs: u64) -> String {
    let cards: String = snapshots
        .iter()
        .map(|(entity_id, snapshot)| render_card(entity_id, snapshot))
        .collect();

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <meta http-equiv="refresh" content="{refresh_secs}">
    <title>Sensor Temperatures</title>
    <link href="https://fonts.googleapis.com/css2?family=Roboto:wght@400;700&display=swap" rel="stylesheet">
    <style>
        body {{
            font-family: 'Roboto', sans-serif;
            background-color: #1e1e2f;
            display: flex;
            flex-wrap: wrap;
            gap: 1.5rem;
            align-items: center;
            justify-content: center;
            min-height: 100vh;
            margin: 0;
            color: #f0f0f0;
        }}
        .card {{
            background: #282a36;
            padding: 2rem;
            border-radius: 10px;
            box-shadow: 0 8px 16px rgba(0, 0, 0, 0.4);
            text-align: center;
            max-width: 400px;
            width: 100%;
        }}
        .temperature {{
            font-size: 3rem;
            font-weight: 700;
            color: #ff79c6;
        }}
        .sparkline {{
            width: 100%;
            height: 48px;
        }}
        .updated {{
            font-size: 0.8rem;
            font-style: italic;
            color: #888;
        }}
        h1 {{
            color: #8be9fd;
        }}
    </style>
</head>
<body>
{cards}</body>
</html>
"#
    )
}

/// escape html special characters to prevent xss
fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
