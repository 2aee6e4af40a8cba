//! ==============================================================================
//! client.rs - Upstream Reading Sources
//! ==============================================================================
//!
//! purpose:
//!     fetch one entity's current state. two interchangeable backends:
//!     - HomeAssistantClient: authenticated GET against the live REST API
//!     - DummyClient: deterministic stand-in, no network access
//!
//! the registry holds one `dyn ReadingSource` selected at startup and
//! never learns which backend is behind it.
//!
//! ==============================================================================

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;

/// Celsius used by the dummy provider (77.0 °F).
pub const DUMMY_CELSIUS: f64 = 25.0;

#[derive(Debug, Error)]
pub enum FetchError {
    /// the upstream call exceeded its bounded timeout
    #[error("upstream request timed out")]
    Timeout,
    /// upstream answered 2xx but the body carried no numeric state
    #[error("upstream state is missing or not numeric")]
    InvalidData,
    /// upstream reports the entity itself as unavailable/unknown
    #[error("entity is unavailable upstream")]
    Unavailable,
    /// non-2xx status or transport-level failure (DNS, refused, TLS)
    #[error("upstream failure: {0}")]
    Upstream(String),
}

/// A successfully fetched value, before it becomes a `SensorReading`.
#[derive(Debug, Clone, PartialEq)]
pub struct Fetched {
    pub celsius: f64,
    /// upstream's own last_updated timestamp, passed through for display
    pub last_updated: Option<String>,
}

/// The one capability the registry needs: read an entity's current value.
#[async_trait]
pub trait ReadingSource: Send + Sync {
    async fn fetch(&self, entity_id: &str) -> Result<Fetched, FetchError>;
}

// ==============================================================================
// live client
// ==============================================================================

/// Reads entity state from the Home Assistant REST API.
///
/// One request per fetch, bearer-token auth, bounded timeout. No retries;
/// the caller decides when to poll again.
pub struct HomeAssistantClient {
    http: reqwest::Client,
    base_url: String,
    token: String,
}

/// Relevant subset of Home Assistant's state object. `state` is always a
/// string on the wire, numeric sensors included.
#[derive(Debug, Deserialize)]
struct StateBody {
    state: Option<String>,
    last_updated: Option<String>,
}

impl HomeAssistantClient {
    pub fn new(base_url: &str, token: &str, timeout: Duration) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
        })
    }

    fn states_url(&self, entity_id: &str) -> String {
        format!("{}/api/states/{}", self.base_url, entity_id)
    }
}

#[async_trait]
impl ReadingSource for HomeAssistantClient {
    async fn fetch(&self, entity_id: &str) -> Result<Fetched, FetchError> {
        let url = self.states_url(entity_id);
        tracing::debug!(%url, "requesting entity state");

        let response = self
            .http
            .get(&url)
            .bearer_auth(&self.token)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    FetchError::Timeout
                } else {
                    FetchError::Upstream(e.to_string())
                }
            })?;

        let status = response.status();
        tracing::debug!(%status, "upstream responded");
        if !status.is_success() {
            return Err(FetchError::Upstream(format!("status {status}")));
        }

        let body: StateBody = response.json().await.map_err(|e| {
            if e.is_timeout() {
                FetchError::Timeout
            } else {
                FetchError::InvalidData
            }
        })?;
        parse_state(body)
    }
}

/// Turn a state body into a value, or classify why it isn't one.
/// Home Assistant reports a dead entity with the literal states
/// "unavailable" / "unknown" rather than an HTTP error.
fn parse_state(body: StateBody) -> Result<Fetched, FetchError> {
    let state = body.state.ok_or(FetchError::InvalidData)?;
    match state.as_str() {
        "unavailable" | "unknown" => Err(FetchError::Unavailable),
        s => {
            let celsius = s.trim().parse().map_err(|_| FetchError::InvalidData)?;
            Ok(Fetched {
                celsius,
                last_updated: body.last_updated,
            })
        }
    }
}

// ==============================================================================
// dummy client
// ==============================================================================

/// Deterministic stand-in used when `USE_DUMMY_DATA` is on.
/// Always 25.0 °C, regardless of entity id. No upstream timestamp.
pub struct DummyClient;

#[async_trait]
impl ReadingSource for DummyClient {
    async fn fetch(&self, _entity_id: &str) -> Result<Fetched, FetchError> {
        Ok(Fetched {
            celsius: DUMMY_CELSIUS,
            last_updated: None,
        })
    }
}
