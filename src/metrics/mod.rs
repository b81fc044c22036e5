pub mod cache;
pub mod percentiles;
pub mod remote;
pub mod service;
pub mod window;

pub use cache::CacheGate;
pub use service::PercentileService;

use chrono::{DateTime, Utc};
use serde::Serialize;

/// A single raw observation produced by client instrumentation.
/// This is the "write" side — the ingest endpoint and the seeder create these.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricSample {
    /// e.g. "LCP", "CLS", "INP"
    pub metric_name: String,
    pub value: f64,
    pub recorded_at: DateTime<Utc>,
}

impl MetricSample {
    pub fn new(metric_name: impl Into<String>, value: f64, recorded_at: DateTime<Utc>) -> Self {
        Self {
            metric_name: metric_name.into(),
            value,
            recorded_at,
        }
    }
}

/// Distribution summary for one metric name over the requested window.
/// Every statistic is `None` when `count == 0`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregatedMetric {
    pub metric: String,
    pub count: u64,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub avg: Option<f64>,
    pub p50: Option<f64>,
    pub p75: Option<f64>,
    pub p95: Option<f64>,
    pub p99: Option<f64>,
}

impl AggregatedMetric {
    /// All-null summary for a metric with no observations.
    pub fn empty(metric: impl Into<String>) -> Self {
        Self {
            metric: metric.into(),
            count: 0,
            min: None,
            max: None,
            avg: None,
            p50: None,
            p75: None,
            p95: None,
            p99: None,
        }
    }
}

/// Which computation path produced a fresh snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    /// Remote ordered-set aggregate.
    Sql,
    /// Local sort-based fallback.
    Js,
}

/// Round to 3 decimal places, half away from zero.
pub fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round3_keeps_three_decimals() {
        assert_eq!(round3(0.123_44), 0.123);
        assert_eq!(round3(2500.0), 2500.0);
        assert_eq!(round3(-1.98765), -1.988);
    }

    #[test]
    fn source_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Source::Sql).unwrap(), "\"sql\"");
        assert_eq!(serde_json::to_string(&Source::Js).unwrap(), "\"js\"");
    }
}
