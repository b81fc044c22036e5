use std::sync::Arc;

use chrono::{Duration, Utc};
use thiserror::Error;
use tracing::{debug, error, warn};

use super::{percentiles, remote, AggregatedMetric, CacheGate, MetricSample, Source};
use crate::store::{CapabilityFlags, PercentileProcedure, SampleStore, StoreError};

#[derive(Debug, Error)]
pub enum AggregationError {
    /// The local path could not read raw samples; nothing left to try.
    #[error("raw sample fetch failed: {0}")]
    RawSampleFetch(#[source] StoreError),
}

/// Outcome of one percentile request, ready for the response envelope.
#[derive(Debug, Clone, PartialEq)]
pub struct PercentileReport {
    pub cached: bool,
    /// Sorted by `count` descending.
    pub metrics: Vec<AggregatedMetric>,
    /// `None` on cache hits.
    pub source: Option<Source>,
}

/// Cache gate in front of the remote/local fallback pair.
pub struct PercentileService {
    samples: Arc<dyn SampleStore>,
    procedure: Arc<dyn PercentileProcedure>,
    flags: Arc<dyn CapabilityFlags>,
    cache: CacheGate,
}

impl PercentileService {
    pub fn new(
        samples: Arc<dyn SampleStore>,
        procedure: Arc<dyn PercentileProcedure>,
        flags: Arc<dyn CapabilityFlags>,
        cache: CacheGate,
    ) -> Self {
        Self {
            samples,
            procedure,
            flags,
            cache,
        }
    }

    pub fn cache(&self) -> &CacheGate {
        &self.cache
    }

    pub async fn record(&self, samples: &[MetricSample]) -> Result<(), StoreError> {
        self.samples.record(samples).await
    }

    /// Serve from cache when fresh, otherwise compute and store.
    pub async fn percentiles(&self, days: u32) -> Result<PercentileReport, AggregationError> {
        if let Some(metrics) = self.cache.get(days) {
            debug!(days, "percentile cache hit");
            return Ok(PercentileReport {
                cached: true,
                metrics,
                source: None,
            });
        }
        debug!(days, "percentile cache miss");

        let (metrics, source) = self.compute(days).await?;
        let metrics = sort_by_count(metrics);
        self.cache.put(days, metrics.clone());

        Ok(PercentileReport {
            cached: false,
            metrics,
            source: Some(source),
        })
    }

    async fn compute(&self, days: u32) -> Result<(Vec<AggregatedMetric>, Source), AggregationError> {
        if self.remote_enabled().await {
            match remote::fetch(self.procedure.as_ref(), days).await {
                Ok(metrics) => {
                    debug!(days, rows = metrics.len(), "remote percentile aggregate succeeded");
                    return Ok((metrics, Source::Sql));
                }
                Err(e) => {
                    warn!(days, error = %e, "remote percentile aggregate failed, using local fallback");
                }
            }
        }

        let since = Utc::now() - Duration::days(i64::from(days));
        let samples = self.samples.fetch_since(since).await.map_err(|e| {
            error!(days, error = %e, "raw sample fetch failed");
            AggregationError::RawSampleFetch(e)
        })?;

        debug!(days, samples = samples.len(), "local percentile aggregate");
        Ok((percentiles::aggregate(&samples), Source::Js))
    }

    async fn remote_enabled(&self) -> bool {
        match self.flags.remote_percentiles_enabled().await {
            Ok(enabled) => enabled,
            Err(e) => {
                warn!(error = %e, "capability flag read failed, treating as disabled");
                false
            }
        }
    }
}

/// Stable: equal counts keep their encounter order.
fn sort_by_count(mut metrics: Vec<AggregatedMetric>) -> Vec<AggregatedMetric> {
    metrics.sort_by(|a, b| b.count.cmp(&a.count));
    metrics
}
