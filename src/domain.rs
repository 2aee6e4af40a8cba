use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::units;

/// outcome of one poll of one entity
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ReadingStatus {
    /// a numeric state was read from upstream
    Ok,
    /// upstream answered but carried no usable number
    /// (missing state, non-numeric state, or the "unavailable" sentinel)
    Unavailable,
    /// transport-level failure: timeout, connection error, non-2xx status
    Error,
}

/// one observation of one entity's value plus metadata
#[derive(Clone, Debug, Serialize)]
pub struct SensorReading {
    /// unique sensor identifier (e.g., "sensor.backyard_temperature")
    pub entity_id: String,
    /// celsius value; None whenever status != ok
    pub celsius: Option<f64>,
    /// derived from celsius at construction, never stored independently
    pub fahrenheit: Option<f64>,
    /// when this process fetched the value
    pub observed_at: DateTime<Utc>,
    /// upstream's own last_updated field, passed through for display
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<String>,
    pub status: ReadingStatus,
}

impl SensorReading {
    /// A successful observation. Fahrenheit is computed here and nowhere else.
    pub fn ok(entity_id: &str, celsius: f64, last_updated: Option<String>) -> Self {
        Self {
            entity_id: entity_id.to_string(),
            celsius: Some(celsius),
            fahrenheit: Some(units::to_fahrenheit(celsius)),
            observed_at: Utc::now(),
            last_updated,
            status: ReadingStatus::Ok,
        }
    }

    /// A failed observation. Carries no numeric value.
    pub fn failed(entity_id: &str, status: ReadingStatus) -> Self {
        debug_assert!(status != ReadingStatus::Ok);
        Self {
            entity_id: entity_id.to_string(),
            celsius: None,
            fahrenheit: None,
            observed_at: Utc::now(),
            last_updated: None,
            status,
        }
    }
}

/// one point of the rolling trend history
#[derive(Clone, Debug, Serialize)]
pub struct HistorySample {
    pub observed_at: DateTime<Utc>,
    pub celsius: f64,
    pub fahrenheit: f64,
}

impl From<&SensorReading> for HistorySample {
    fn from(reading: &SensorReading) -> Self {
        // only ok readings enter the history, so the values are present
        Self {
            observed_at: reading.observed_at,
            celsius: reading.celsius.unwrap_or_default(),
            fahrenheit: reading.fahrenheit.unwrap_or_default(),
        }
    }
}

/// per-entity payload of the /api/sensors response:
/// current value in both units plus the recent history for trend display
#[derive(Clone, Debug, Serialize)]
pub struct SensorSnapshot {
    pub celsius: Option<f64>,
    pub fahrenheit: Option<f64>,
    pub status: ReadingStatus,
    /// None until the entity has been polled at least once
    pub observed_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<String>,
    pub history: Vec<HistorySample>,
}

impl SensorSnapshot {
    pub fn from_state(current: Option<&SensorReading>, history: Vec<HistorySample>) -> Self {
        match current {
            Some(r) => Self {
                celsius: r.celsius,
                fahrenheit: r.fahrenheit,
                status: r.status,
                observed_at: Some(r.observed_at),
                last_updated: r.last_updated.clone(),
                history,
            },
            None => Self {
                celsius: None,
                fahrenheit: None,
                status: ReadingStatus::Unavailable,
                observed_at: None,
                last_updated: None,
                history,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ok_reading_derives_fahrenheit() {
        let r = SensorReading::ok("sensor.test", 25.0, None);
        assert_eq!(r.celsius, Some(25.0));
        assert_eq!(r.fahrenheit, Some(77.0));
        assert_eq!(r.status, ReadingStatus::Ok);
    }

    #[test]
    fn failed_reading_carries_no_value() {
        let r = SensorReading::failed("sensor.test", ReadingStatus::Error);
        assert!(r.celsius.is_none());
        assert!(r.fahrenheit.is_none());
    }

    #[test]
    fn status_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&ReadingStatus::Unavailable).unwrap(),
            "\"unavailable\""
        );
        assert_eq!(serde_json::to_string(&ReadingStatus::Ok).unwrap(), "\"ok\"");
    }

    #[test]
    fn snapshot_of_unpolled_entity_is_unavailable() {
        let s = SensorSnapshot::from_state(None, Vec::new());
        assert_eq!(s.status, ReadingStatus::Unavailable);
        assert!(s.observed_at.is_none());
        assert!(s.history.is_empty());
    }
}
