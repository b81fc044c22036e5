use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Query, State,
    },
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::metrics::{window, AggregatedMetric, MetricSample, Source};
use crate::AppState;

use super::AppError;

// ─── Request / response types ────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct PercentilesQuery {
    /// Raw window size in days; validated by `window::parse_days`.
    pub days: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PercentilesResponse {
    pub ok: bool,
    pub cached: bool,
    pub days: u32,
    pub metrics: Vec<AggregatedMetric>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<Source>,
}

#[derive(Debug, Deserialize)]
pub struct IngestSample {
    #[serde(alias = "metricName")]
    pub metric: String,
    pub value: f64,
    #[serde(rename = "recordedAt", default)]
    pub recorded_at: Option<DateTime<Utc>>,
}

/// Either `{"samples": [...]}` or a bare array.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum IngestBody {
    Batch { samples: Vec<IngestSample> },
    Bare(Vec<IngestSample>),
}

impl IngestBody {
    fn into_samples(self) -> Vec<IngestSample> {
        match self {
            Self::Batch { samples } | Self::Bare(samples) => samples,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct IngestResponse {
    pub ok: bool,
    pub accepted: usize,
}

#[derive(Debug, Serialize)]
pub struct ClearResponse {
    pub ok: bool,
    pub cleared: bool,
}

// ─── GET /api/telemetry/percentiles ──────────────────────────────

pub async fn get_percentiles(
    State(state): State<Arc<AppState>>,
    query: Result<Query<PercentilesQuery>, QueryRejection>,
) -> Result<Json<PercentilesResponse>, AppError> {
    // Undecodable query strings (e.g. a repeated `days`) share the envelope
    let Query(query) = query.map_err(|_| AppError::InvalidDays)?;
    let days =
        window::parse_days(query.days.as_deref()).map_err(|_| AppError::InvalidDays)?;

    let report = state
        .telemetry
        .percentiles(days)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

    Ok(Json(PercentilesResponse {
        ok: true,
        cached: report.cached,
        days,
        metrics: report.metrics,
        source: report.source,
    }))
}

// ─── POST /api/telemetry/samples ─────────────────────────────────

pub async fn ingest_samples(
    State(state): State<Arc<AppState>>,
    body: Result<Json<IngestBody>, JsonRejection>,
) -> Result<Json<IngestResponse>, AppError> {
    let Json(body) = body.map_err(|e| AppError::InvalidSample(e.body_text()))?;

    let now = Utc::now();
    let samples = body
        .into_samples()
        .into_iter()
        .map(|s| validate_sample(s, now))
        .collect::<Result<Vec<_>, _>>()?;

    state
        .telemetry
        .record(&samples)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

    Ok(Json(IngestResponse {
        ok: true,
        accepted: samples.len(),
    }))
}

// ─── POST /api/telemetry/cache/clear ─────────────────────────────

pub async fn clear_cache(State(state): State<Arc<AppState>>) -> Json<ClearResponse> {
    Json(ClearResponse {
        ok: true,
        cleared: state.telemetry.cache().clear(),
    })
}

// ─── GET /api/health ─────────────────────────────────────────────

pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "ok": true }))
}

// ─── Helpers ─────────────────────────────────────────────────────

fn validate_sample(sample: IngestSample, now: DateTime<Utc>) -> Result<MetricSample, AppError> {
    let metric = sample.metric.trim();
    if metric.is_empty() {
        return Err(AppError::InvalidSample("empty metric name".into()));
    }
    if !sample.value.is_finite() {
        return Err(AppError::InvalidSample(format!(
            "non-finite value for {metric}"
        )));
    }

    Ok(MetricSample::new(
        metric,
        sample.value,
        sample.recorded_at.unwrap_or(now),
    ))
}
