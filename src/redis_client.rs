use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Script};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::metrics::MetricSample;
use crate::store::{
    flag_enabled, CapabilityFlags, PercentileProcedure, SampleStore, StoreError,
};

/// Sorted set holding every raw sample, scored by recorded-at epoch ms.
pub const SAMPLES_KEY: &str = "telemetry:samples";

/// Hash of capability switches shared with the rest of the product.
pub const FLAGS_KEY: &str = "feature_flags";

const DAY_MS: i64 = 86_400_000;

/// Creates a single `ConnectionManager` that auto-reconnects on failure.
///
/// `ConnectionManager` is cheaply cloneable — every clone shares the same
/// underlying multiplexed TCP connection.
pub async fn connect(url: &str) -> Result<ConnectionManager, redis::RedisError> {
    let client = redis::Client::open(url)?;
    ConnectionManager::new(client).await
}

/// On-the-wire form of a sample inside the sorted set. `id` keeps
/// members unique when two samples carry the same metric and value.
#[derive(Debug, Serialize, Deserialize)]
struct StoredSample {
    id: String,
    metric: String,
    value: f64,
}

/// Redis-backed implementation of every collaborator seam.
pub struct RedisTelemetryStore {
    conn: ConnectionManager,
    percentile_script: Script,
    samples_key: String,
    flag_field: String,
}

impl RedisTelemetryStore {
    pub fn new(conn: ConnectionManager, flag_field: impl Into<String>) -> Self {
        Self {
            conn,
            percentile_script: Script::new(include_str!("store/percentiles.lua")),
            samples_key: SAMPLES_KEY.to_owned(),
            flag_field: flag_field.into(),
        }
    }

    /// Point the store at a different sample sorted set.
    pub fn with_samples_key(mut self, key: impl Into<String>) -> Self {
        self.samples_key = key.into();
        self
    }
}

#[async_trait]
impl SampleStore for RedisTelemetryStore {
    async fn record(&self, samples: &[MetricSample]) -> Result<(), StoreError> {
        if samples.is_empty() {
            return Ok(());
        }

        let mut pipe = redis::pipe();
        for sample in samples {
            let member = serde_json::to_string(&StoredSample {
                id: uuid::Uuid::new_v4().to_string(),
                metric: sample.metric_name.clone(),
                value: sample.value,
            })?;
            pipe.zadd(&self.samples_key, member, sample.recorded_at.timestamp_millis())
                .ignore();
        }

        let mut conn = self.conn.clone();
        let _: () = pipe.query_async(&mut conn).await?;
        Ok(())
    }

    async fn fetch_since(&self, since: DateTime<Utc>) -> Result<Vec<MetricSample>, StoreError> {
        let mut conn = self.conn.clone();
        let rows: Vec<(String, f64)> = conn
            .zrangebyscore_withscores(&self.samples_key, since.timestamp_millis(), "+inf")
            .await?;

        let mut skipped = 0usize;
        let samples: Vec<MetricSample> = rows
            .into_iter()
            .filter_map(|(member, score)| {
                let parsed = serde_json::from_str::<StoredSample>(&member).ok();
                let recorded_at = Utc.timestamp_millis_opt(score as i64).single();
                match (parsed, recorded_at) {
                    (Some(s), Some(at)) => Some(MetricSample::new(s.metric, s.value, at)),
                    _ => {
                        skipped += 1;
                        None
                    }
                }
            })
            .collect();

        if skipped > 0 {
            warn!(skipped, "ignored undecodable sample members");
        }
        Ok(samples)
    }
}

#[async_trait]
impl PercentileProcedure for RedisTelemetryStore {
    async fn aggregate(&self, days: u32) -> Result<serde_json::Value, StoreError> {
        let since_ms = Utc::now().timestamp_millis() - i64::from(days) * DAY_MS;

        let mut conn = self.conn.clone();
        let raw: String = self
            .percentile_script
            .key(&self.samples_key)
            .arg(since_ms)
            .invoke_async(&mut conn)
            .await?;

        Ok(serde_json::from_str(&raw)?)
    }
}

#[async_trait]
impl CapabilityFlags for RedisTelemetryStore {
    async fn remote_percentiles_enabled(&self) -> Result<bool, StoreError> {
        let mut conn = self.conn.clone();
        let raw: Option<String> = conn.hget(FLAGS_KEY, &self.flag_field).await?;
        Ok(flag_enabled(raw.as_deref()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stored_sample_layout() {
        let json = serde_json::to_value(StoredSample {
            id: "abc".into(),
            metric: "LCP".into(),
            value: 2400.5,
        })
        .unwrap();
        assert_eq!(
            json,
            serde_json::json!({"id": "abc", "metric": "LCP", "value": 2400.5})
        );
    }

    /// Runs against a live server: `cargo test -- --ignored` with
    /// `REDIS_URL` pointing at a scratch instance.
    #[tokio::test]
    #[ignore = "needs a running redis"]
    async fn percentile_script_round_trip() {
        let url = std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1:6379/".into());
        let conn = connect(&url).await.unwrap();
        let key = format!("telemetry:samples:test:{}", uuid::Uuid::new_v4());
        let store = RedisTelemetryStore::new(conn.clone(), "unused").with_samples_key(&key);

        let now = Utc::now();
        let stale = now - chrono::Duration::days(30);
        store
            .record(&[
                MetricSample::new("LCP", 3000.0, now),
                MetricSample::new("LCP", 2000.0, now),
                MetricSample::new("LCP", 2500.0, now),
                MetricSample::new("LCP", 9999.0, stale),
            ])
            .await
            .unwrap();

        let raw = store.aggregate(7).await;
        let fetched = store.fetch_since(now - chrono::Duration::days(7)).await;
        let _: () = conn.clone().del(&key).await.unwrap();

        let rows = crate::metrics::remote::from_rows(raw.unwrap()).unwrap();
        assert_eq!(rows.len(), 1);
        let lcp = &rows[0];
        assert_eq!(lcp.metric, "LCP");
        assert_eq!(lcp.count, 3);
        assert_eq!(lcp.min, Some(2000.0));
        assert_eq!(lcp.max, Some(3000.0));
        assert_eq!(lcp.avg, Some(2500.0));
        // percentile_disc: ceil(p * n)-th value
        assert_eq!(lcp.p50, Some(2500.0));
        assert_eq!(lcp.p75, Some(3000.0));
        assert_eq!(lcp.p95, Some(3000.0));
        assert_eq!(lcp.p99, Some(3000.0));

        let fetched = fetched.unwrap();
        assert_eq!(fetched.len(), 3);
        assert!(fetched.iter().all(|s| s.metric_name == "LCP" && s.value < 9999.0));
    }
}
