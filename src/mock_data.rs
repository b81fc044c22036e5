use chrono::{Duration, Utc};
use rand::rngs::StdRng;
use rand::Rng;
use rand::SeedableRng;
use std::time::Instant;
use tracing::info;

use crate::metrics::MetricSample;
use crate::store::{SampleStore, StoreError};

// ─── Constants ───────────────────────────────────────────────────

const NUM_SAMPLES: usize = 5_000;
/// Samples are spread uniformly over this many trailing days.
const SPREAD_DAYS: i64 = 14;
/// Write batch size — keeps Redis pipelines comfortable.
const BATCH: usize = 500;

/// (metric, typical value, spread) — values are drawn from
/// `typical ± spread` and clamped at zero.
static VITALS: &[(&str, f64, f64)] = &[
    ("LCP", 2_400.0, 1_600.0),
    ("FCP", 1_500.0, 900.0),
    ("INP", 180.0, 150.0),
    ("TTFB", 600.0, 450.0),
    ("CLS", 0.08, 0.07),
];

// ─── Public entry point ──────────────────────────────────────────

pub async fn seed(store: &dyn SampleStore) -> Result<(), StoreError> {
    let start = Instant::now();
    info!(samples = NUM_SAMPLES, days = SPREAD_DAYS, "seeding synthetic web-vitals samples");

    // Deterministic RNG so re-runs produce the same values.
    let mut rng = StdRng::seed_from_u64(42);
    let now = Utc::now();

    for batch_start in (0..NUM_SAMPLES).step_by(BATCH) {
        let batch_end = (batch_start + BATCH).min(NUM_SAMPLES);
        let batch: Vec<MetricSample> = (batch_start..batch_end)
            .map(|_| random_sample(&mut rng, now))
            .collect();
        store.record(&batch).await?;
    }

    info!(elapsed_ms = start.elapsed().as_millis() as u64, "seed complete");
    Ok(())
}

fn random_sample(rng: &mut StdRng, now: chrono::DateTime<Utc>) -> MetricSample {
    let (metric, typical, spread) = VITALS[rng.gen_range(0..VITALS.len())];
    let value = (typical + rng.gen_range(-spread..=spread)).max(0.0);
    let age_ms = rng.gen_range(0..SPREAD_DAYS * Duration::days(1).num_milliseconds());

    MetricSample::new(metric, value, now - Duration::milliseconds(age_ms))
}
