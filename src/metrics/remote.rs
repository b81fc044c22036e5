use serde_json::Value;
use thiserror::Error;

use super::{round3, AggregatedMetric};
use crate::store::{PercentileProcedure, StoreError};

#[derive(Debug, Error)]
pub enum RemoteAggregateError {
    #[error("percentile procedure failed: {0}")]
    Store(#[from] StoreError),
    #[error("malformed percentile result: {0}")]
    Malformed(&'static str),
}

/// Invoke the remote ordered-set aggregate for a `days` window and
/// translate its rows into [`AggregatedMetric`]s.
pub async fn fetch(
    procedure: &dyn PercentileProcedure,
    days: u32,
) -> Result<Vec<AggregatedMetric>, RemoteAggregateError> {
    let raw = procedure.aggregate(days).await?;
    from_rows(raw)
}

/// Row ordering is left untouched. Numeric fields may arrive as JSON
/// numbers or numeric strings (database `numeric`/`bigint` encodings).
pub fn from_rows(raw: Value) -> Result<Vec<AggregatedMetric>, RemoteAggregateError> {
    let Value::Array(rows) = raw else {
        return Err(RemoteAggregateError::Malformed("expected an array of rows"));
    };

    rows.iter().map(row_to_metric).collect()
}

fn row_to_metric(row: &Value) -> Result<AggregatedMetric, RemoteAggregateError> {
    let Value::Object(fields) = row else {
        return Err(RemoteAggregateError::Malformed("row is not an object"));
    };
    let metric = fields
        .get("metric")
        .and_then(Value::as_str)
        .ok_or(RemoteAggregateError::Malformed("row without a metric name"))?;

    let stat = |name: &str| fields.get(name).and_then(number).map(round3);

    Ok(AggregatedMetric {
        metric: metric.to_owned(),
        count: fields.get("count").map(count).unwrap_or(0),
        min: stat("min"),
        max: stat("max"),
        avg: stat("avg"),
        p50: stat("p50"),
        p75: stat("p75"),
        p95: stat("p95"),
        p99: stat("p99"),
    })
}

fn number(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse().ok()?,
        _ => return None,
    };
    n.is_finite().then_some(n)
}

/// Null, NaN and negatives all coerce to 0.
fn count(value: &Value) -> u64 {
    match number(value) {
        Some(n) if n > 0.0 => n.floor() as u64,
        _ => 0,
    }
}
