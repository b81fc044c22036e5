use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::info;

mod config;
mod handlers;
mod metrics;
mod middleware;
mod mock_data;
mod redis_client;
mod server;
mod store;

use config::{Config, StoreKind};
use metrics::{CacheGate, PercentileService};
use store::{CapabilityFlags, PercentileProcedure, SampleStore, StaticFlags};

/// Shared application state available to every handler via `State<Arc<AppState>>`.
pub struct AppState {
    /// Cache gate plus the remote/local percentile backends.
    pub telemetry: PercentileService,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = Config::parse();

    // ── 1. Wire collaborators ────────────────────────────────────
    let (samples, procedure, flags): (
        Arc<dyn SampleStore>,
        Arc<dyn PercentileProcedure>,
        Arc<dyn CapabilityFlags>,
    ) = match config.store {
        StoreKind::Redis => {
            info!(url = %config.redis_url, "connecting to redis");
            let conn = redis_client::connect(&config.redis_url)
                .await
                .with_context(|| format!("cannot connect to redis at {}", config.redis_url))?;
            let redis = Arc::new(
                redis_client::RedisTelemetryStore::new(conn, config.flag_field.clone())
                    .with_samples_key(config.samples_key.clone()),
            );
            (
                redis.clone() as Arc<dyn SampleStore>,
                redis.clone() as Arc<dyn PercentileProcedure>,
                redis as Arc<dyn CapabilityFlags>,
            )
        }
        StoreKind::Memory => {
            info!("using in-memory sample store; remote percentiles unavailable");
            (
                Arc::new(store::MemorySampleStore::new()) as Arc<dyn SampleStore>,
                Arc::new(store::UnavailableProcedure) as Arc<dyn PercentileProcedure>,
                Arc::new(StaticFlags(false)) as Arc<dyn CapabilityFlags>,
            )
        }
    };
    let flags = match config.sql_percentiles {
        Some(pinned) => Arc::new(StaticFlags(pinned)) as Arc<dyn CapabilityFlags>,
        None => flags,
    };

    // ── 2. Seed mock data ────────────────────────────────────────
    if config.seed {
        mock_data::seed(samples.as_ref())
            .await
            .context("failed to seed samples")?;
    }

    // ── 3. Build shared state ────────────────────────────────────
    let cache = CacheGate::new(config.cache_ttl(), config.cache_per_window);
    let state = Arc::new(AppState {
        telemetry: PercentileService::new(samples, procedure, flags, cache),
    });

    // ── 4. Build Axum router ─────────────────────────────────────
    let app = server::create_router(state);

    // ── 5. Bind & serve ──────────────────────────────────────────
    let listener = tokio::net::TcpListener::bind(&config.bind)
        .await
        .with_context(|| format!("failed to bind {}", config.bind))?;

    info!(
        addr = %config.bind,
        cache_ttl_ms = config.cache_ttl_ms,
        cache_per_window = config.cache_per_window,
        "percentile service listening"
    );

    axum::serve(listener, app).await.context("server exited with error")?;
    Ok(())
}
