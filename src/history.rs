//! Fixed-capacity rolling history, one buffer per entity.
//!
//! Index-based circular array: once full, each push overwrites the oldest
//! sample in place. The buffer lives for the whole process uptime, so the
//! fixed bound is what keeps indefinite polling from growing memory.

use crate::config::ConfigError;
use crate::domain::HistorySample;

pub const DEFAULT_CAPACITY: usize = 100;

pub struct HistoryBuffer {
    buf: Vec<HistorySample>,
    /// next slot to overwrite once the buffer is full; the oldest sample
    idx: usize,
    cap: usize,
}

impl HistoryBuffer {
    /// Create a buffer holding up to `capacity` samples.
    pub fn new(capacity: usize) -> Result<Self, ConfigError> {
        if capacity == 0 {
            return Err(ConfigError::ZeroHistoryCapacity);
        }
        Ok(Self {
            buf: Vec::with_capacity(capacity),
            idx: 0,
            cap: capacity,
        })
    }

    /// Append a sample, evicting the oldest one once at capacity.
    pub fn push(&mut self, sample: HistorySample) {
        if self.buf.len() < self.cap {
            self.buf.push(sample);
        } else {
            self.buf[self.idx] = sample;
            self.idx = (self.idx + 1) % self.cap;
        }
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.cap
    }

    /// Copy of the samples, oldest first. Does not mutate.
    pub fn snapshot(&self) -> Vec<HistorySample> {
        let mut out = Vec::with_capacity(self.buf.len());
        out.extend_from_slice(&self.buf[self.idx..]);
        out.extend_from_slice(&self.buf[..self.idx]);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn sample(celsius: f64) -> HistorySample {
        HistorySample {
            observed_at: Utc::now(),
            celsius,
            fahrenheit: crate::units::to_fahrenheit(celsius),
        }
    }

    #[test]
    fn zero_capacity_is_rejected() {
        assert!(matches!(
            HistoryBuffer::new(0),
            Err(ConfigError::ZeroHistoryCapacity)
        ));
    }

    #[test]
    fn below_capacity_never_evicts() {
        let mut h = HistoryBuffer::new(5).unwrap();
        for i in 0..3 {
            h.push(sample(i as f64));
        }
        let snap = h.snapshot();
        assert_eq!(h.len(), 3);
        assert_eq!(snap[0].celsius, 0.0);
        assert_eq!(snap[2].celsius, 2.0);
    }

    #[test]
    fn overflow_keeps_last_n_oldest_first() {
        let mut h = HistoryBuffer::new(4).unwrap();
        for i in 0..10 {
            h.push(sample(i as f64));
        }
        assert_eq!(h.len(), 4);
        let values: Vec<f64> = h.snapshot().iter().map(|s| s.celsius).collect();
        assert_eq!(values, vec![6.0, 7.0, 8.0, 9.0]);
    }

    #[test]
    fn snapshot_does_not_mutate() {
        let mut h = HistoryBuffer::new(2).unwrap();
        h.push(sample(1.0));
        h.push(sample(2.0));
        h.push(sample(3.0));
        let a: Vec<f64> = h.snapshot().iter().map(|s| s.celsius).collect();
        let b: Vec<f64> = h.snapshot().iter().map(|s| s.celsius).collect();
        assert_eq!(a, b);
        assert_eq!(a, vec![2.0, 3.0]);
    }
}
