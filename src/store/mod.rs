//! Collaborator seams for the percentile service: the raw-sample store,
//! the remote ordered-set aggregate procedure and the capability flag.

pub mod memory;

pub use memory::{MemorySampleStore, UnavailableProcedure};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::metrics::MetricSample;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("redis: {0}")]
    Redis(#[from] redis::RedisError),
    #[error("decode: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("percentile procedure unavailable")]
    Unavailable,
}

/// Durable home of raw samples.
#[async_trait]
pub trait SampleStore: Send + Sync {
    async fn record(&self, samples: &[MetricSample]) -> Result<(), StoreError>;

    /// Every sample with `recorded_at >= since`, unordered.
    async fn fetch_since(&self, since: DateTime<Utc>) -> Result<Vec<MetricSample>, StoreError>;
}

/// Remote ordered-set aggregate over the last `days` days.
///
/// Returns the raw result untouched; shape validation is the caller's job.
#[async_trait]
pub trait PercentileProcedure: Send + Sync {
    async fn aggregate(&self, days: u32) -> Result<serde_json::Value, StoreError>;
}

#[async_trait]
pub trait CapabilityFlags: Send + Sync {
    /// Is the remote-percentile capability switched on?
    async fn remote_percentiles_enabled(&self) -> Result<bool, StoreError>;
}

/// A flag pinned by configuration.
#[derive(Debug, Clone, Copy)]
pub struct StaticFlags(pub bool);

#[async_trait]
impl CapabilityFlags for StaticFlags {
    async fn remote_percentiles_enabled(&self) -> Result<bool, StoreError> {
        Ok(self.0)
    }
}

/// Interpret a flag-store value. Missing means disabled.
pub fn flag_enabled(raw: Option<&str>) -> bool {
    raw.map(|v| {
        matches!(
            v.trim().to_ascii_lowercase().as_str(),
            "1" | "true" | "on" | "yes"
        )
    })
    .unwrap_or(false)
}
