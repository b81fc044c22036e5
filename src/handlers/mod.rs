pub mod telemetry;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

// ─── Failure envelope ────────────────────────────────────────────

/// Every failed API response carries `{"ok": false, "error": <code>}`
/// so clients can branch on a stable string instead of the status.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorBody {
    pub ok: bool,
    pub error: &'static str,
}

// ─── Unified error type ──────────────────────────────────────────

#[derive(Debug)]
pub enum AppError {
    /// `days` failed parsing or range checks.
    InvalidDays,
    /// Ingest payload contained an unusable sample.
    InvalidSample(String),
    /// Every computation path is exhausted, or a write failed.
    Database(String),
}

impl AppError {
    fn code(&self) -> &'static str {
        match self {
            Self::InvalidDays => "invalid-days",
            Self::InvalidSample(_) => "invalid-sample",
            Self::Database(_) => "db-error",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::InvalidDays | Self::InvalidSample(_) => StatusCode::BAD_REQUEST,
            Self::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        match &self {
            Self::InvalidSample(detail) => tracing::debug!(%detail, "rejected sample batch"),
            Self::Database(detail) => tracing::error!(%detail, "request failed"),
            Self::InvalidDays => {}
        }

        let body = ErrorBody {
            ok: false,
            error: self.code(),
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn error_envelopes() {
        let cases = [
            (AppError::InvalidDays, StatusCode::BAD_REQUEST, "invalid-days"),
            (
                AppError::InvalidSample("value".into()),
                StatusCode::BAD_REQUEST,
                "invalid-sample",
            ),
            (
                AppError::Database("down".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
                "db-error",
            ),
        ];

        for (err, status, code) in cases {
            let resp = err.into_response();
            assert_eq!(resp.status(), status);
            let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
                .await
                .unwrap();
            let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
            assert_eq!(body, serde_json::json!({"ok": false, "error": code}));
        }
    }
}
