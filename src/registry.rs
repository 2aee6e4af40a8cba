//! ==============================================================================
//! registry.rs - Sensor Registry / Poller
//! ==============================================================================
//!
//! purpose:
//!     owns the configured entity set and one rolling history buffer per
//!     entity. polling is driven entirely by callers (the http handlers);
//!     there is no background loop in here.
//!
//! concurrency:
//!     each entity's current reading + history sits behind its own
//!     tokio::sync::RwLock, so concurrent requests can poll different
//!     entities without contending, and snapshots only hold a read lock
//!     for the length of a copy. upstream fetches happen with no lock held.
//!
//! ==============================================================================

use std::collections::BTreeMap;
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::RwLock;

use crate::client::{FetchError, ReadingSource};
use crate::config::ConfigError;
use crate::domain::{HistorySample, ReadingStatus, SensorReading, SensorSnapshot};
use crate::history::HistoryBuffer;

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("unknown entity: {0}")]
    UnknownEntity(String),
}

/// Current reading plus trend history for one entity.
struct SensorState {
    current: Option<SensorReading>,
    history: HistoryBuffer,
}

/// Fixed set of entities, each with its own history, polled on demand
/// through whichever `ReadingSource` was selected at startup.
pub struct SensorRegistry {
    source: Arc<dyn ReadingSource>,
    sensors: BTreeMap<String, RwLock<SensorState>>,
}

impl std::fmt::Debug for SensorRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SensorRegistry")
            .field("sensors", &self.sensors.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

impl SensorRegistry {
    /// Build the registry once at startup. The entity set is fixed for the
    /// process lifetime; an empty set or a zero history capacity is a
    /// configuration error, fatal before serving begins.
    pub fn new(
        entities: &[String],
        source: Arc<dyn ReadingSource>,
        history_capacity: usize,
    ) -> Result<Self, ConfigError> {
        if entities.is_empty() {
            return Err(ConfigError::EmptyEntities);
        }
        let mut sensors = BTreeMap::new();
        for entity_id in entities {
            sensors.insert(
                entity_id.clone(),
                RwLock::new(SensorState {
                    current: None,
                    history: HistoryBuffer::new(history_capacity)?,
                }),
            );
        }
        Ok(Self { source, sensors })
    }

    pub fn entity_ids(&self) -> impl Iterator<Item = &str> {
        self.sensors.keys().map(String::as_str)
    }

    /// Fetch a fresh reading for one entity, record it, and return it.
    ///
    /// Fetch failures are folded into the reading's `status`; only an
    /// unconfigured entity id is an error, and that path mutates nothing.
    pub async fn poll_one(&self, entity_id: &str) -> Result<SensorReading, RegistryError> {
        let state = self
            .sensors
            .get(entity_id)
            .ok_or_else(|| RegistryError::UnknownEntity(entity_id.to_string()))?;

        // fetch with no lock held; only the record step serializes
        let reading = match self.source.fetch(entity_id).await {
            Ok(fetched) => {
                let reading = SensorReading::ok(entity_id, fetched.celsius, fetched.last_updated);
                tracing::info!(
                    entity_id,
                    celsius = fetched.celsius,
                    "polled entity"
                );
                reading
            }
            Err(e) => {
                let status = status_for(&e);
                tracing::warn!(entity_id, error = %e, "poll failed");
                SensorReading::failed(entity_id, status)
            }
        };

        let mut guard = state.write().await;
        if reading.status == ReadingStatus::Ok {
            guard.history.push(HistorySample::from(&reading));
        }
        guard.current = Some(reading.clone());
        drop(guard);

        Ok(reading)
    }

    /// Poll every configured entity. Each entity's outcome is independent;
    /// a failure shows up in that reading's `status` and never aborts the
    /// rest of the batch.
    pub async fn poll_all(&self) -> BTreeMap<String, SensorReading> {
        let mut readings = BTreeMap::new();
        for entity_id in self.sensors.keys() {
            // cannot be UnknownEntity: the id comes from our own key set
            if let Ok(reading) = self.poll_one(entity_id).await {
                readings.insert(entity_id.clone(), reading);
            }
        }
        readings
    }

    /// Cached state for every entity, without triggering any fetch.
    pub async fn snapshot_all(&self) -> BTreeMap<String, SensorSnapshot> {
        let mut snapshots = BTreeMap::new();
        for (entity_id, state) in &self.sensors {
            let guard = state.read().await;
            snapshots.insert(
                entity_id.clone(),
                SensorSnapshot::from_state(guard.current.as_ref(), guard.history.snapshot()),
            );
        }
        snapshots
    }
}

/// Map a fetch failure onto the reading status the presentation layer shows.
fn status_for(error: &FetchError) -> ReadingStatus {
    match error {
        FetchError::InvalidData | FetchError::Unavailable => ReadingStatus::Unavailable,
        FetchError::Timeout | FetchError::Upstream(_) => ReadingStatus::Error,
    }
}
