use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;

use super::{PercentileProcedure, SampleStore, StoreError};
use crate::metrics::MetricSample;

/// Process-local sample store for running without Redis.
#[derive(Default)]
pub struct MemorySampleStore {
    samples: RwLock<Vec<MetricSample>>,
}

impl MemorySampleStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SampleStore for MemorySampleStore {
    async fn record(&self, samples: &[MetricSample]) -> Result<(), StoreError> {
        self.samples.write().extend_from_slice(samples);
        Ok(())
    }

    async fn fetch_since(&self, since: DateTime<Utc>) -> Result<Vec<MetricSample>, StoreError> {
        Ok(self
            .samples
            .read()
            .iter()
            .filter(|s| s.recorded_at >= since)
            .cloned()
            .collect())
    }
}

/// Stand-in when no remote aggregate exists; always fails so the
/// coordinator takes the local path.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnavailableProcedure;

#[async_trait]
impl PercentileProcedure for UnavailableProcedure {
    async fn aggregate(&self, _days: u32) -> Result<serde_json::Value, StoreError> {
        Err(StoreError::Unavailable)
    }
}
