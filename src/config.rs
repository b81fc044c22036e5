use std::time::Duration;

use clap::{Parser, ValueEnum};

/// Where raw samples live.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StoreKind {
    Redis,
    /// Process-local; the remote aggregate is unavailable in this mode.
    Memory,
}

/// Runtime configuration. Every flag can also be set from the environment.
#[derive(Debug, Clone, Parser)]
#[command(name = "telemetry-percentiles", version, about = "Rolling-window percentile service for web-performance telemetry")]
pub struct Config {
    /// Address the HTTP server binds to
    #[arg(long, env = "TELEMETRY_BIND", default_value = "0.0.0.0:3000")]
    pub bind: String,

    #[arg(long, env = "REDIS_URL", default_value = "redis://127.0.0.1:6379/")]
    pub redis_url: String,

    #[arg(long, env = "TELEMETRY_STORE", value_enum, default_value_t = StoreKind::Redis)]
    pub store: StoreKind,

    /// Freshness window of the percentile snapshot cache
    #[arg(long, env = "TELEMETRY_CACHE_TTL_MS", default_value_t = 15_000)]
    pub cache_ttl_ms: u64,

    /// Only serve cache hits computed for the same `days`
    #[arg(long, env = "TELEMETRY_CACHE_PER_WINDOW", default_value_t = false)]
    pub cache_per_window: bool,

    /// Pin the remote-percentile capability instead of reading the flag store
    #[arg(long, env = "TELEMETRY_SQL_PERCENTILES")]
    pub sql_percentiles: Option<bool>,

    /// Sorted set holding raw samples
    #[arg(long, env = "TELEMETRY_SAMPLES_KEY", default_value = "telemetry:samples")]
    pub samples_key: String,

    /// Field of the `feature_flags` hash holding the capability switch
    #[arg(long, env = "TELEMETRY_FLAG_FIELD", default_value = "telemetry_sql_percentiles")]
    pub flag_field: String,

    /// Seed synthetic web-vitals samples on startup
    #[arg(long, env = "TELEMETRY_SEED", default_value_t = false)]
    pub seed: bool,
}

impl Config {
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_millis(self.cache_ttl_ms)
    }
}
